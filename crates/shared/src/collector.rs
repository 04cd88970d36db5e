use std::collections::HashSet;

use crate::events::{EventSink, PipelineEvent, RejectReason, Stage};
use crate::filter::filter_sources;
use crate::gnews::ArticleSource;
use crate::judge::Judge;
use crate::models::{Article, CategoryQuota, SeenTitles};
use crate::retry::{Pacer, RetryPolicy};

/// What one category contributed to the run.
#[derive(Debug, Default)]
pub struct CategoryOutcome {
    pub category: String,
    pub selected: Vec<Article>,
    /// Everything fetched across all attempts, before filtering
    pub raw: Vec<Article>,
    pub attempts: u32,
}

/// One slot of a resolved selection: an index into the pool and whether it
/// came from backfill rather than the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    pub index: usize,
    pub backfilled: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub picks: Vec<Pick>,
    /// Ranked titles that were absent from the pool, repeated, or already seen
    pub ignored: Vec<String>,
}

impl Resolution {
    pub fn ranked_count(&self) -> usize {
        self.picks.iter().filter(|p| !p.backfilled).count()
    }
}

/// Turn an advisory ranking into at most `quota` pool positions.
///
/// Ranked titles are taken first, in ranked order, if they match a pool
/// title exactly and are not in `seen`. Remaining slots are backfilled from
/// the pool in its original order.
pub fn resolve_ranking(
    pool: &[Article],
    ranked: Vec<String>,
    quota: usize,
    seen: &SeenTitles,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut taken: HashSet<usize> = HashSet::new();

    for title in ranked {
        if resolution.picks.len() >= quota {
            break;
        }
        let index = pool.iter().position(|a| a.title == title);
        match index {
            Some(index) if !seen.contains(&title) && taken.insert(index) => {
                resolution.picks.push(Pick {
                    index,
                    backfilled: false,
                });
            }
            _ => resolution.ignored.push(title),
        }
    }

    for (index, article) in pool.iter().enumerate() {
        if resolution.picks.len() >= quota {
            break;
        }
        if seen.contains(&article.title) || taken.contains(&index) {
            continue;
        }
        taken.insert(index);
        resolution.picks.push(Pick {
            index,
            backfilled: true,
        });
    }

    resolution
}

/// Runs fetch → filter → relevance → similarity → ranking for one category,
/// retrying the whole sequence until something survives to be ranked.
pub struct CategoryCollector<'a> {
    source: &'a dyn ArticleSource,
    judge: &'a dyn Judge,
    allowed_sources: &'a HashSet<String>,
    events: &'a dyn EventSink,
    policy: RetryPolicy,
    similarity_dedup: bool,
}

impl<'a> CategoryCollector<'a> {
    pub fn new(
        source: &'a dyn ArticleSource,
        judge: &'a dyn Judge,
        allowed_sources: &'a HashSet<String>,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            source,
            judge,
            allowed_sources,
            events,
            policy: RetryPolicy::default(),
            similarity_dedup: true,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_similarity_dedup(mut self, enabled: bool) -> Self {
        self.similarity_dedup = enabled;
        self
    }

    pub async fn collect(&self, quota: &CategoryQuota, seen: &mut SeenTitles) -> CategoryOutcome {
        let category = quota.name.as_str();
        let max_attempts = self.policy.attempts_for(quota);
        let mut outcome = CategoryOutcome {
            category: category.to_string(),
            ..Default::default()
        };

        self.emit(PipelineEvent::CategoryStarted {
            category: category.to_string(),
        });

        let mut ranked = false;
        for attempt in 1..=max_attempts {
            outcome.attempts = attempt;
            self.emit(PipelineEvent::AttemptStarted {
                category: category.to_string(),
                attempt,
                max_attempts,
            });

            let fetched = self.source.fetch(category, quota.fetch_size).await;
            if fetched.is_empty() {
                self.attempt_empty(category, attempt, Stage::Fetching);
                continue;
            }
            outcome.raw.extend(fetched.iter().map(|a| a.tagged(category)));

            let mut pacer = self.policy.pacer();
            let pool = self
                .working_pool(category, attempt, fetched, seen, &mut pacer)
                .await;
            if pool.is_empty() {
                continue;
            }

            pacer.wait().await;
            outcome.selected = self.rank(quota, pool, seen).await;
            ranked = true;
            break;
        }

        if !ranked {
            self.emit(PipelineEvent::AttemptsExhausted {
                category: category.to_string(),
                attempts: max_attempts,
            });
        }

        self.emit(PipelineEvent::CategoryFinished {
            category: category.to_string(),
            selected: outcome.selected.len(),
        });

        outcome
    }

    /// Filtering plus the two model checks. Empty means the attempt failed.
    async fn working_pool(
        &self,
        category: &str,
        attempt: u32,
        fetched: Vec<Article>,
        seen: &SeenTitles,
        pacer: &mut Pacer,
    ) -> Vec<Article> {
        let filtered = filter_sources(fetched, self.allowed_sources, seen);
        for (title, reason) in filtered.rejected {
            self.reject(category, title, Stage::Filtering, reason);
        }
        if filtered.kept.is_empty() {
            self.attempt_empty(category, attempt, Stage::Filtering);
            return Vec::new();
        }

        let mut relevant = Vec::with_capacity(filtered.kept.len());
        for article in filtered.kept {
            pacer.wait().await;
            if self.judge.judge_relevance(&article, category).await {
                relevant.push(article);
            } else {
                self.reject(
                    category,
                    article.title,
                    Stage::JudgingRelevance,
                    RejectReason::NotRelevant,
                );
            }
        }
        if relevant.is_empty() {
            self.attempt_empty(category, attempt, Stage::JudgingRelevance);
            return Vec::new();
        }

        if !self.similarity_dedup {
            return relevant;
        }

        let mut pool: Vec<Article> = Vec::with_capacity(relevant.len());
        for candidate in relevant {
            match self.find_duplicate(&candidate, &pool, pacer).await {
                Some(original) => self.reject(
                    category,
                    candidate.title,
                    Stage::JudgingSimilarity,
                    RejectReason::DuplicateOf(original),
                ),
                None => pool.push(candidate),
            }
        }
        pool
    }

    async fn find_duplicate(
        &self,
        candidate: &Article,
        accepted: &[Article],
        pacer: &mut Pacer,
    ) -> Option<String> {
        for existing in accepted {
            pacer.wait().await;
            if self.judge.judge_similarity(candidate, existing).await {
                return Some(existing.title.clone());
            }
        }
        None
    }

    async fn rank(
        &self,
        quota: &CategoryQuota,
        pool: Vec<Article>,
        seen: &mut SeenTitles,
    ) -> Vec<Article> {
        let category = quota.name.as_str();
        let ranked = self.judge.rank_important(&pool, quota.max_accept).await;
        let resolution = resolve_ranking(&pool, ranked, quota.max_accept, seen);

        for title in &resolution.ignored {
            self.emit(PipelineEvent::RankedTitleIgnored {
                category: category.to_string(),
                title: title.clone(),
            });
        }

        let wanted = quota.max_accept.min(pool.len());
        let usable = resolution.ranked_count();
        if usable < wanted {
            self.emit(PipelineEvent::RankerShortfall {
                category: category.to_string(),
                requested: quota.max_accept,
                usable,
            });
        }

        promote(pool, &resolution, category, seen, self.events)
    }

    fn attempt_empty(&self, category: &str, attempt: u32, stage: Stage) {
        self.emit(PipelineEvent::AttemptEmpty {
            category: category.to_string(),
            attempt,
            stage,
        });
    }

    fn reject(&self, category: &str, title: String, stage: Stage, reason: RejectReason) {
        self.emit(PipelineEvent::ArticleRejected {
            category: category.to_string(),
            title,
            stage,
            reason,
        });
    }

    fn emit(&self, event: PipelineEvent) {
        self.events.emit(event);
    }
}

/// Move the picked articles out of the pool, label them and record their
/// titles as seen.
pub(crate) fn promote(
    pool: Vec<Article>,
    resolution: &Resolution,
    category: &str,
    seen: &mut SeenTitles,
    events: &dyn EventSink,
) -> Vec<Article> {
    let mut slots: Vec<Option<Article>> = pool.into_iter().map(Some).collect();
    let mut selected = Vec::with_capacity(resolution.picks.len());

    for pick in &resolution.picks {
        let Some(mut article) = slots.get_mut(pick.index).and_then(Option::take) else {
            continue;
        };
        if !seen.insert(article.title.clone()) {
            continue;
        }
        article.category = Some(category.to_string());
        events.emit(PipelineEvent::ArticleAccepted {
            category: category.to_string(),
            title: article.title.clone(),
            backfilled: pick.backfilled,
        });
        selected.push(article);
    }

    selected
}
