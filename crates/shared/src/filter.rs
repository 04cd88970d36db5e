use std::collections::HashSet;

use crate::events::RejectReason;
use crate::models::{Article, SeenTitles};

#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<Article>,
    /// (title, reason) for every dropped article, in input order
    pub rejected: Vec<(String, RejectReason)>,
}

pub fn is_trusted(source_name: &str, allowed_sources: &HashSet<String>) -> bool {
    allowed_sources.contains(source_name)
}

/// Keep articles from trusted publishers whose titles are new to this run.
///
/// Order-preserving and free of side effects: the same input, allow-list and
/// seen set always produce the same output. A title repeated within the batch
/// only survives at its first occurrence.
pub fn filter_sources(
    articles: Vec<Article>,
    allowed_sources: &HashSet<String>,
    seen: &SeenTitles,
) -> FilterOutcome {
    let mut batch_titles: HashSet<String> = HashSet::new();
    let mut outcome = FilterOutcome::default();

    for article in articles {
        if !is_trusted(&article.source_name, allowed_sources) {
            let reason = RejectReason::UntrustedSource(article.source_name.clone());
            outcome.rejected.push((article.title, reason));
            continue;
        }
        if seen.contains(&article.title) || !batch_titles.insert(article.title.clone()) {
            outcome.rejected.push((article.title, RejectReason::AlreadySeen));
            continue;
        }
        outcome.kept.push(article);
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_untrusted_sources_are_dropped_in_order() {
        let articles = vec![
            Article::new("A", "bbc"),
            Article::new("B", "itv"),
            Article::new("C", "bbc"),
        ];

        let outcome = filter_sources(articles, &allow(&["bbc"]), &SeenTitles::new());

        assert_eq!(titles(&outcome.kept), vec!["A", "C"]);
        assert_eq!(
            outcome.rejected,
            vec![("B".to_string(), RejectReason::UntrustedSource("itv".into()))]
        );
    }

    #[test]
    fn test_source_match_is_exact() {
        let outcome = filter_sources(
            vec![Article::new("A", "BBC News"), Article::new("B", "bbc")],
            &allow(&["BBC"]),
            &SeenTitles::new(),
        );
        assert!(outcome.kept.is_empty());
    }

    #[test]
    fn test_seen_titles_are_dropped() {
        let mut seen = SeenTitles::new();
        seen.insert("A");

        let outcome = filter_sources(
            vec![Article::new("A", "bbc"), Article::new("B", "bbc")],
            &allow(&["bbc"]),
            &seen,
        );

        assert_eq!(titles(&outcome.kept), vec!["B"]);
        assert_eq!(outcome.rejected[0].1, RejectReason::AlreadySeen);
    }

    #[test]
    fn test_identical_titles_keep_first_occurrence() {
        let articles = vec![
            Article::new("Same story", "BBC"),
            Article::new("Same story", "Sky News"),
        ];

        let outcome = filter_sources(articles, &allow(&["BBC", "Sky News"]), &SeenTitles::new());

        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].source_name, "BBC");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut seen = SeenTitles::new();
        seen.insert("D");
        let allowed = allow(&["bbc", "sky"]);
        let input = vec![
            Article::new("A", "bbc"),
            Article::new("B", "itv"),
            Article::new("A", "sky"),
            Article::new("D", "bbc"),
            Article::new("E", "sky"),
        ];

        let first = filter_sources(input.clone(), &allowed, &seen);
        let second = filter_sources(input, &allowed, &seen);

        assert_eq!(first.kept, second.kept);
        assert_eq!(first.rejected, second.rejected);
        assert_eq!(titles(&first.kept), vec!["A", "E"]);
        assert!(!seen.contains("A"));
    }
}
