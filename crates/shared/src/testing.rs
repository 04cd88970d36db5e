//! Deterministic stand-ins for the provider and the model.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::events::{EventSink, PipelineEvent};
use crate::gnews::ArticleSource;
use crate::judge::Judge;
use crate::models::Article;

pub fn article(title: &str, source: &str) -> Article {
    Article::new(title, source).with_description(format!("About {}", title))
}

/// Replays queued batches per category; an exhausted queue fetches nothing.
#[derive(Default)]
pub struct ScriptedSource {
    batches: Mutex<HashMap<String, VecDeque<Vec<Article>>>>,
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, category: &str, batch: Vec<Article>) -> Self {
        self.batches
            .lock()
            .unwrap()
            .entry(category.to_string())
            .or_default()
            .push_back(batch);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ArticleSource for ScriptedSource {
    async fn fetch(&self, category: &str, max: usize) -> Vec<Article> {
        self.calls.lock().unwrap().push((category.to_string(), max));
        self.batches
            .lock()
            .unwrap()
            .get_mut(category)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_default()
    }
}

/// Relevant unless listed, distinct unless the ordered pair is listed,
/// rankings replayed from a queue.
#[derive(Default)]
pub struct ScriptedJudge {
    irrelevant: HashSet<String>,
    similar: HashSet<(String, String)>,
    rankings: Mutex<VecDeque<Vec<String>>>,
    pub relevance_calls: Mutex<usize>,
    pub similarity_calls: Mutex<usize>,
    pub rank_requests: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn irrelevant(mut self, title: &str) -> Self {
        self.irrelevant.insert(title.to_string());
        self
    }

    /// `candidate` is judged the same story as the already accepted `accepted`.
    pub fn similar(mut self, candidate: &str, accepted: &str) -> Self {
        self.similar
            .insert((candidate.to_string(), accepted.to_string()));
        self
    }

    pub fn ranking(self, titles: &[&str]) -> Self {
        self.rankings
            .lock()
            .unwrap()
            .push_back(titles.iter().map(|t| t.to_string()).collect());
        self
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge_relevance(&self, article: &Article, _category: &str) -> bool {
        *self.relevance_calls.lock().unwrap() += 1;
        !self.irrelevant.contains(&article.title)
    }

    async fn judge_similarity(&self, candidate: &Article, accepted: &Article) -> bool {
        *self.similarity_calls.lock().unwrap() += 1;
        self.similar
            .contains(&(candidate.title.clone(), accepted.title.clone()))
    }

    async fn rank_important(&self, articles: &[Article], count: usize) -> Vec<String> {
        self.rank_requests
            .lock()
            .unwrap()
            .push((articles.len(), count));
        self.rankings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn snapshot(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
