use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::llm::LanguageModel;
use crate::models::Article;

const YES_NO_MAX_TOKENS: u32 = 10;
const RANKING_MAX_TOKENS: u32 = 300;

/// The editorial decisions the pipeline delegates to a model.
///
/// Every method answers conservatively when the model fails or rambles:
/// not relevant, not similar, no titles.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge_relevance(&self, article: &Article, category: &str) -> bool;

    /// Not guaranteed symmetric: each call is an independent query.
    async fn judge_similarity(&self, candidate: &Article, accepted: &Article) -> bool;

    /// Titles of the most important articles, best first. Advisory only.
    async fn rank_important(&self, articles: &[Article], count: usize) -> Vec<String>;
}

/// `Judge` backed by free-text completions.
pub struct LlmJudge<M> {
    model: M,
    guidance: Option<String>,
}

impl<M: LanguageModel> LlmJudge<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            guidance: None,
        }
    }

    /// Extra editorial instruction appended to ranking prompts.
    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }
}

#[async_trait]
impl<M: LanguageModel> Judge for LlmJudge<M> {
    async fn judge_relevance(&self, article: &Article, category: &str) -> bool {
        let prompt = relevance_prompt(article, category);
        match self.model.complete(&prompt, YES_NO_MAX_TOKENS).await {
            Ok(answer) => {
                debug!(title = %article.title, category, answer = %answer, "relevance answer");
                is_affirmative(&answer)
            }
            Err(e) => {
                warn!(title = %article.title, category, error = %e, "relevance check failed, treating as not relevant");
                false
            }
        }
    }

    async fn judge_similarity(&self, candidate: &Article, accepted: &Article) -> bool {
        let prompt = similarity_prompt(candidate, accepted);
        match self.model.complete(&prompt, YES_NO_MAX_TOKENS).await {
            Ok(answer) => {
                debug!(candidate = %candidate.title, accepted = %accepted.title, answer = %answer, "similarity answer");
                is_affirmative(&answer)
            }
            Err(e) => {
                warn!(candidate = %candidate.title, error = %e, "similarity check failed, treating as distinct");
                false
            }
        }
    }

    async fn rank_important(&self, articles: &[Article], count: usize) -> Vec<String> {
        if articles.is_empty() || count == 0 {
            return Vec::new();
        }

        let prompt = ranking_prompt(articles, count, self.guidance.as_deref());
        match self.model.complete(&prompt, RANKING_MAX_TOKENS).await {
            Ok(answer) => parse_title_lines(&answer),
            Err(e) => {
                warn!(pool = articles.len(), error = %e, "ranking failed");
                Vec::new()
            }
        }
    }
}

pub fn relevance_prompt(article: &Article, category: &str) -> String {
    format!(
        r#"You are a news editor sorting stories into sections. Does the following article belong in the "{}" section?

{}

Answer with a single word: yes or no."#,
        category,
        article.summary()
    )
}

pub fn similarity_prompt(candidate: &Article, accepted: &Article) -> String {
    format!(
        r#"You are a news editor removing duplicate coverage. Do these two articles report the same underlying news story?

Article 1:
{}

Article 2:
{}

Answer with a single word: yes or no."#,
        candidate.summary(),
        accepted.summary()
    )
}

#[derive(Serialize)]
struct RankingItem<'a> {
    title: &'a str,
    description: &'a str,
}

pub fn ranking_prompt(articles: &[Article], count: usize, guidance: Option<&str>) -> String {
    let items: Vec<RankingItem> = articles
        .iter()
        .map(|a| RankingItem {
            title: &a.title,
            description: a.description.as_deref().unwrap_or(""),
        })
        .collect();
    let listing = serde_json::to_string_pretty(&items).unwrap_or_default();

    let guidance = guidance.map(|g| format!(" {}", g)).unwrap_or_default();

    format!(
        "You are a news editor. Here are {} news articles. Choose the {} most important and relevant stories for a general audience today.{} Return ONLY the titles of the selected articles, exactly as written, one per line.\n\n{}\n",
        articles.len(),
        count,
        guidance,
        listing
    )
}

/// The whole yes/no contract: does the lowercased answer contain "yes".
pub fn is_affirmative(answer: &str) -> bool {
    answer.to_lowercase().contains("yes")
}

/// One title per non-blank line, with list markers and wrapping quotes removed.
pub fn parse_title_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = strip_list_marker(line.trim());
            let title = trimmed
                .trim_matches(|c: char| c == '"' || c == '\u{201C}' || c == '\u{201D}')
                .trim();
            if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            }
        })
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    // "1. Title" / "2) Title", but not "2.5 million ..."
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if after.starts_with(char::is_whitespace) {
                return after.trim_start();
            }
        }
    }

    for marker in ['-', '*', '•'] {
        if let Some(after) = line.strip_prefix(marker) {
            return after.trim_start();
        }
    }

    line
}
