use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A news article as it moves through the pipeline.
///
/// `title` is the identity key within a run: filtering, deduplication and
/// ranked-title lookup all compare titles by exact string equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Assigned by the collector, never by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Provider-native fields (publishedAt, image, content, source, ...)
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Article {
    pub fn new(title: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            source_name: source_name.into(),
            url: None,
            category: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Copy of this article labelled with the category it was fetched for.
    pub fn tagged(&self, category: &str) -> Self {
        let mut article = self.clone();
        article.category = Some(category.to_string());
        article
    }

    /// Short text block used when showing the article to the model.
    pub fn summary(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => {
                format!("Title: {}\nDescription: {}", self.title, description)
            }
            _ => format!("Title: {}", self.title),
        }
    }
}

/// Titles already accepted into the final output during the current run.
///
/// One instance lives for the whole run and is lent mutably to each category
/// collection in turn, so a story picked for one category can never be picked
/// again for another.
#[derive(Debug, Default)]
pub struct SeenTitles(HashSet<String>);

impl SeenTitles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.0.contains(title)
    }

    /// Returns false if the title was already present.
    pub fn insert(&mut self, title: impl Into<String>) -> bool {
        self.0.insert(title.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-category limits, fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuota {
    pub name: String,
    /// How many articles to ask the provider for
    pub fetch_size: usize,
    /// Upper bound on articles accepted into the selection
    pub max_accept: usize,
    /// Overrides the retry policy's attempt budget when set
    pub max_attempts: Option<u32>,
}

impl CategoryQuota {
    pub fn new(name: impl Into<String>, fetch_size: usize, max_accept: usize) -> Self {
        Self {
            name: name.into(),
            fetch_size,
            max_accept,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Diagnostic dump of every candidate fetched during a run, before filtering.
#[derive(Debug, Serialize, Deserialize)]
pub struct RawLog {
    pub version: String,
    pub created_at: String,
    pub articles: Vec<Article>,
}

impl RawLog {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            version: "1.0".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            articles,
        }
    }
}
