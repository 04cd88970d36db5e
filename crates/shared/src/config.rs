use anyhow::{Context, Result};
use std::collections::HashSet;
use std::env;
use std::time::Duration;

use crate::models::CategoryQuota;
use crate::retry::RetryPolicy;

pub const LANG: &str = "en";
pub const COUNTRY: &str = "gb";
pub const ALLOWED_SOURCES: &[&str] = &["BBC", "Sky News", "The Guardian"];

/// (category, fetch size, max accepted), processed in this order
pub const CATEGORIES: &[(&str, usize, usize)] = &[
    ("world", 10, 3),
    ("politics", 10, 2),
    ("business", 10, 2),
    ("technology", 10, 1),
    ("sport", 5, 2),
];

/// "sport" is fetched as one search per subtopic
pub const SPORT_SUBTOPICS: &[&str] = &["football", "tennis", "rugby", "cricket", "motor racing"];

pub const MAX_ATTEMPTS: u32 = 2;
pub const JUDGE_PACING: Duration = Duration::from_millis(1200);

/// Single-pool variant: one top-headlines fetch ranked as a whole
pub const GLOBAL_CATEGORY: &str = "top";
pub const GLOBAL_MAX_REQUESTED: usize = 20;
pub const GLOBAL_SELECT: usize = 5;
pub const GLOBAL_GUIDANCE: &str =
    "Ensure at least 1 story is about politics and 1 about sport if possible.";

pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

#[derive(Debug, Clone)]
pub struct Config {
    pub gnews_api_key: String,
    pub anthropic_api_key: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let gnews_api_key = env::var("GNEWS_API_KEY").context(
            "GNEWS_API_KEY not found.\n\n\
                To fix this, create ~/.config/save-news/.env with:\n  \
                GNEWS_API_KEY=your_token_here\n  \
                ANTHROPIC_API_KEY=your_key_here\n\n\
                Get a GNews API key from: https://gnews.io/dashboard",
        )?;

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").context(
            "ANTHROPIC_API_KEY not found.\n\n\
                To fix this, create ~/.config/save-news/.env with:\n  \
                GNEWS_API_KEY=your_token_here\n  \
                ANTHROPIC_API_KEY=your_key_here\n\n\
                Get your Anthropic API key from: https://console.anthropic.com/settings/keys",
        )?;

        let model = env::var("NEWS_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            gnews_api_key,
            anthropic_api_key,
            model,
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/save-news/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("save-news").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Editorial configuration of a run. Built from the constants above.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub language: String,
    pub country: String,
    pub allowed_sources: HashSet<String>,
    pub categories: Vec<CategoryQuota>,
    pub retry: RetryPolicy,
    /// Pairwise same-story check before ranking
    pub similarity_dedup: bool,
    pub global_fetch_size: usize,
    pub global_select: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            language: LANG.to_string(),
            country: COUNTRY.to_string(),
            allowed_sources: ALLOWED_SOURCES.iter().map(|s| s.to_string()).collect(),
            categories: CATEGORIES
                .iter()
                .map(|&(name, fetch_size, max_accept)| {
                    CategoryQuota::new(name, fetch_size, max_accept)
                })
                .collect(),
            retry: RetryPolicy::default(),
            similarity_dedup: true,
            global_fetch_size: GLOBAL_MAX_REQUESTED,
            global_select: GLOBAL_SELECT,
        }
    }
}

impl PipelineSettings {
    /// Upper bound on the size of a per-category selection.
    pub fn selection_cap(&self) -> usize {
        self.categories.iter().map(|q| q.max_accept).sum()
    }

    pub fn is_configured_category(&self, name: &str) -> bool {
        name == GLOBAL_CATEGORY || self.categories.iter().any(|q| q.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_constants() {
        let settings = PipelineSettings::default();

        assert_eq!(settings.language, "en");
        assert_eq!(settings.country, "gb");
        assert_eq!(settings.categories.len(), CATEGORIES.len());
        assert_eq!(settings.categories[0].name, "world");
        assert!(settings.allowed_sources.contains("BBC"));
        assert_eq!(settings.retry.max_attempts, MAX_ATTEMPTS);
        assert!(settings.similarity_dedup);
    }

    #[test]
    fn test_quotas_are_usable() {
        let settings = PipelineSettings::default();
        for quota in &settings.categories {
            assert!(quota.fetch_size > 0, "{} fetches nothing", quota.name);
            assert!(quota.max_accept > 0, "{} accepts nothing", quota.name);
            assert!(quota.max_accept <= quota.fetch_size);
        }
        assert_eq!(settings.selection_cap(), 10);
    }

    #[test]
    fn test_configured_category_lookup() {
        let settings = PipelineSettings::default();
        assert!(settings.is_configured_category("sport"));
        assert!(settings.is_configured_category(GLOBAL_CATEGORY));
        assert!(!settings.is_configured_category("gardening"));
    }
}
