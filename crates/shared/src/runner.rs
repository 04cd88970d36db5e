use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::collector::{promote, resolve_ranking, CategoryCollector};
use crate::config::{PipelineSettings, GLOBAL_CATEGORY};
use crate::events::{EventSink, PipelineEvent, Stage};
use crate::filter::filter_sources;
use crate::gnews::ArticleSource;
use crate::io::{save_raw_log, save_selection};
use crate::judge::Judge;
use crate::models::{Article, RawLog, SeenTitles};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// One collection per configured category
    #[default]
    PerCategory,
    /// A single top-headlines pool ranked as a whole
    Global,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub selection: PathBuf,
    pub raw_log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub name: String,
    pub selected: usize,
    pub attempts: u32,
}

/// Everything gathered before anything is written.
#[derive(Debug, Default)]
pub struct Collection {
    pub selected: Vec<Article>,
    pub raw: Vec<Article>,
    pub categories: Vec<CategorySummary>,
    /// Where the raw candidates were last checkpointed, if anywhere
    pub raw_log: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunReport {
    pub selected: Vec<Article>,
    pub raw_candidates: usize,
    pub categories: Vec<CategorySummary>,
    /// None when nothing was fetched and the previous output was kept
    pub written: Option<PathBuf>,
    pub raw_log: Option<PathBuf>,
}

pub struct PipelineRunner<'a> {
    source: &'a dyn ArticleSource,
    judge: &'a dyn Judge,
    events: &'a dyn EventSink,
    settings: &'a PipelineSettings,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        source: &'a dyn ArticleSource,
        judge: &'a dyn Judge,
        events: &'a dyn EventSink,
        settings: &'a PipelineSettings,
    ) -> Self {
        Self {
            source,
            judge,
            events,
            settings,
        }
    }

    /// Collect every configured category in order, sharing one seen set.
    ///
    /// The raw log, when given, is rewritten after each category so an
    /// interrupted run still leaves the candidates fetched so far.
    pub async fn collect_by_category(&self, raw_log: Option<&Path>) -> Result<Collection> {
        let mut seen = SeenTitles::new();
        let collector = CategoryCollector::new(
            self.source,
            self.judge,
            &self.settings.allowed_sources,
            self.events,
        )
        .with_policy(self.settings.retry)
        .with_similarity_dedup(self.settings.similarity_dedup);

        let mut collection = Collection::default();
        for quota in &self.settings.categories {
            let outcome = collector.collect(quota, &mut seen).await;
            collection.categories.push(CategorySummary {
                name: outcome.category,
                selected: outcome.selected.len(),
                attempts: outcome.attempts,
            });
            collection.selected.extend(outcome.selected);
            collection.raw.extend(outcome.raw);
            if let Some(written) = checkpoint_raw(&collection.raw, raw_log)? {
                collection.raw_log = Some(written);
            }
        }

        Ok(collection)
    }

    /// Single fetch, allow-list filter, one ranking call. If the ranker gives
    /// nothing usable the first allow-listed articles are kept instead.
    /// The raw log is written straight after the fetch.
    pub async fn collect_global(&self, raw_log: Option<&Path>) -> Result<Collection> {
        let category = GLOBAL_CATEGORY;
        let count = self.settings.global_select;
        let mut seen = SeenTitles::new();

        self.events.emit(PipelineEvent::CategoryStarted {
            category: category.to_string(),
        });

        let fetched = self
            .source
            .fetch(category, self.settings.global_fetch_size)
            .await;
        let raw: Vec<Article> = fetched.iter().map(|a| a.tagged(category)).collect();
        let raw_log = checkpoint_raw(&raw, raw_log)?;

        let filtered = filter_sources(fetched, &self.settings.allowed_sources, &seen);
        for (title, reason) in filtered.rejected {
            self.events.emit(PipelineEvent::ArticleRejected {
                category: category.to_string(),
                title,
                stage: Stage::Filtering,
                reason,
            });
        }
        let pool = filtered.kept;

        let ranked = self.judge.rank_important(&pool, count).await;
        let resolution = resolve_ranking(&pool, ranked, count, &seen);
        for title in &resolution.ignored {
            self.events.emit(PipelineEvent::RankedTitleIgnored {
                category: category.to_string(),
                title: title.clone(),
            });
        }

        let usable = resolution.ranked_count();
        if usable < count.min(pool.len()) {
            if usable == 0 {
                warn!(count, pool = pool.len(), "ranker gave nothing usable, keeping first articles");
            }
            self.events.emit(PipelineEvent::RankerShortfall {
                category: category.to_string(),
                requested: count,
                usable,
            });
        }

        let selected = promote(pool, &resolution, category, &mut seen, self.events);
        self.events.emit(PipelineEvent::CategoryFinished {
            category: category.to_string(),
            selected: selected.len(),
        });

        Ok(Collection {
            categories: vec![CategorySummary {
                name: category.to_string(),
                selected: selected.len(),
                attempts: 1,
            }],
            selected,
            raw,
            raw_log,
        })
    }

    /// Collect (checkpointing the raw log if asked), then write the selection.
    ///
    /// The previous selection file is left as it was when not a single
    /// candidate was fetched, or in global mode when nothing passed the
    /// allow-list. Write failures are the only errors.
    pub async fn run(&self, mode: RunMode, paths: &OutputPaths) -> Result<RunReport> {
        let raw_log = paths.raw_log.as_deref();
        let collection = match mode {
            RunMode::PerCategory => self.collect_by_category(raw_log).await?,
            RunMode::Global => self.collect_global(raw_log).await?,
        };

        let mut report = RunReport {
            selected: Vec::new(),
            raw_candidates: collection.raw.len(),
            categories: collection.categories,
            written: None,
            raw_log: collection.raw_log,
        };

        if collection.raw.is_empty() {
            warn!(
                path = %paths.selection.display(),
                "no candidates fetched, previous selection left untouched"
            );
            return Ok(report);
        }
        if mode == RunMode::Global && collection.selected.is_empty() {
            warn!(
                path = %paths.selection.display(),
                candidates = report.raw_candidates,
                "no trusted headlines, previous selection left untouched"
            );
            return Ok(report);
        }

        let written = save_selection(&collection.selected, &paths.selection)
            .context("Failed to save selected articles")?;
        info!(
            path = %written.display(),
            selected = collection.selected.len(),
            candidates = report.raw_candidates,
            "selection written"
        );

        report.selected = collection.selected;
        report.written = Some(written);
        Ok(report)
    }
}

fn checkpoint_raw(raw: &[Article], path: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(path) = path.filter(|_| !raw.is_empty()) else {
        return Ok(None);
    };
    save_raw_log(&RawLog::new(raw.to_vec()), path)
        .map(Some)
        .context("Failed to save raw candidate log")
}
