use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SPORT_SUBTOPICS;
use crate::error::TransportError;
use crate::models::Article;

const SERVICE: &str = "GNews";
const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";

/// Categories the provider's top-headlines endpoint accepts directly.
/// "world" is left out on purpose: it is served by the generic feed.
const NATIVE_CATEGORIES: &[&str] = &[
    "general",
    "nation",
    "business",
    "technology",
    "entertainment",
    "science",
    "health",
];

/// Anything that can hand the collector candidate articles for a category.
///
/// Implementations swallow their own failures: an unreachable provider is an
/// empty `Vec`, which the collector's retry loop absorbs.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, category: &str, max: usize) -> Vec<Article>;
}

/// How a pipeline category maps onto provider requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    TopHeadlines,
    Category(&'static str),
    Subtopics(&'static [&'static str]),
}

pub fn route_for(category: &str) -> Route {
    match category.to_ascii_lowercase().as_str() {
        "world" | "top" | "general" => Route::TopHeadlines,
        "politics" => Route::Category("nation"),
        "sport" | "sports" => Route::Subtopics(SPORT_SUBTOPICS),
        other => NATIVE_CATEGORIES
            .iter()
            .find(|native| **native == other)
            .copied()
            .map(Route::Category)
            .unwrap_or(Route::TopHeadlines),
    }
}

#[derive(Debug, Deserialize)]
struct GNewsResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct GNewsArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: GNewsSource,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GNewsSource {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
}

impl From<GNewsArticle> for Article {
    fn from(raw: GNewsArticle) -> Self {
        let mut metadata = raw.extra;
        // Keep the provider's nested shape so older consumers reading
        // `source.name` still work.
        metadata.insert(
            "source".to_string(),
            serde_json::json!({ "name": raw.source.name, "url": raw.source.url }),
        );

        Article {
            title: raw.title,
            description: raw.description,
            source_name: raw.source.name,
            url: raw.url,
            category: None,
            metadata,
        }
    }
}

pub struct GNewsClient {
    client: Client,
    api_key: String,
    language: String,
    country: String,
    base_url: String,
}

impl GNewsClient {
    pub fn new(api_key: String, language: &str, country: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            language: language.to_string(),
            country: country.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Top headlines, optionally narrowed to one provider category.
    pub async fn top_headlines(
        &self,
        category: Option<&str>,
        max: usize,
    ) -> Result<Vec<Article>, TransportError> {
        let mut params = Vec::new();
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        params.push(("max", max.to_string()));
        self.request("top-headlines", params).await
    }

    pub async fn search(&self, query: &str, max: usize) -> Result<Vec<Article>, TransportError> {
        self.request(
            "search",
            vec![("q", query.to_string()), ("max", max.to_string())],
        )
        .await
    }

    async fn request(
        &self,
        endpoint: &str,
        mut params: Vec<(&str, String)>,
    ) -> Result<Vec<Article>, TransportError> {
        params.push(("lang", self.language.clone()));
        params.push(("country", self.country.clone()));
        params.push(("apikey", self.api_key.clone()));

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}/{}?{}", self.base_url, endpoint, query);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                service: SERVICE,
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransportError::from_response(SERVICE, response).await);
        }

        let body = response
            .json::<GNewsResponse>()
            .await
            .map_err(|source| TransportError::Decode {
                service: SERVICE,
                source,
            })?;

        Ok(body
            .articles
            .into_iter()
            .map(Article::from)
            .filter(|article| !article.title.trim().is_empty())
            .collect())
    }

    fn or_empty(category: &str, result: Result<Vec<Article>, TransportError>) -> Vec<Article> {
        match result {
            Ok(articles) => {
                debug!(category, count = articles.len(), "fetched headlines");
                articles
            }
            Err(e) => {
                warn!(category, error = %e, "headline fetch failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ArticleSource for GNewsClient {
    async fn fetch(&self, category: &str, max: usize) -> Vec<Article> {
        match route_for(category) {
            Route::TopHeadlines => Self::or_empty(category, self.top_headlines(None, max).await),
            Route::Category(native) => {
                Self::or_empty(category, self.top_headlines(Some(native), max).await)
            }
            Route::Subtopics(topics) => {
                let mut articles = Vec::new();
                for topic in topics {
                    articles.extend(Self::or_empty(topic, self.search(topic, max).await));
                }
                articles
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GNewsClient {
        GNewsClient::new("test-key".to_string(), "en", "gb")
            .expect("client should build")
            .with_base_url(server.uri())
    }

    fn headline(title: &str, source: &str) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "description": format!("About {}", title),
            "content": "Body text",
            "url": "https://example.com/story",
            "image": "https://example.com/img.jpg",
            "publishedAt": "2025-06-01T10:00:00Z",
            "source": { "name": source, "url": "https://example.com" }
        })
    }

    #[test]
    fn test_route_for_known_labels() {
        assert_eq!(route_for("world"), Route::TopHeadlines);
        assert_eq!(route_for("politics"), Route::Category("nation"));
        assert_eq!(route_for("Business"), Route::Category("business"));
        assert_eq!(route_for("sport"), Route::Subtopics(SPORT_SUBTOPICS));
        assert_eq!(route_for("gardening"), Route::TopHeadlines);
    }

    #[tokio::test]
    async fn test_category_request_parses_articles() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("category", "business"))
            .and(query_param("lang", "en"))
            .and(query_param("country", "gb"))
            .and(query_param("max", "10"))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalArticles": 2,
                "articles": [headline("Rates held", "BBC"), headline("Shares fall", "Sky News")]
            })))
            .mount(&server)
            .await;

        let articles = client(&server).fetch("business", 10).await;

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Rates held");
        assert_eq!(articles[0].source_name, "BBC");
        assert_eq!(articles[0].description.as_deref(), Some("About Rates held"));
        assert_eq!(articles[0].category, None);
        assert_eq!(articles[0].metadata["publishedAt"], "2025-06-01T10:00:00Z");
        assert_eq!(articles[0].metadata["source"]["name"], "BBC");
        assert_eq!(articles[1].source_name, "Sky News");
    }

    #[tokio::test]
    async fn test_world_uses_generic_headlines() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [headline("Summit opens", "BBC")]
            })))
            .mount(&server)
            .await;

        let articles = client(&server).fetch("world", 5).await;

        assert_eq!(articles.len(), 1);
        let requests = server.received_requests().await.unwrap();
        let query = requests[0].url.query().unwrap_or_default().to_string();
        assert!(!query.contains("category="), "unexpected query: {}", query);
    }

    #[tokio::test]
    async fn test_error_status_becomes_empty_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let gnews = client(&server);
        let err = gnews.top_headlines(None, 10).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { .. }));
        assert!(err.to_string().contains("quota exceeded"));

        assert!(gnews.fetch("world", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_becomes_empty_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        assert!(client(&server).fetch("technology", 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_sport_concatenates_subtopics_and_skips_failures() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "football"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [headline("Cup final", "BBC")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "motor racing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [headline("Grand Prix", "Sky News")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let articles = client(&server).fetch("sport", 5).await;

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Cup final", "Grand Prix"]);
        assert_eq!(
            server.received_requests().await.unwrap().len(),
            SPORT_SUBTOPICS.len()
        );
    }

    #[tokio::test]
    async fn test_untitled_records_are_dropped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [
                    { "title": "   ", "source": { "name": "BBC" } },
                    headline("Real story", "BBC")
                ]
            })))
            .mount(&server)
            .await;

        let articles = client(&server).fetch("world", 5).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Real story");
    }

    #[tokio::test]
    async fn test_titles_are_kept_verbatim() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "articles": [headline("  Markets rally ", "BBC")]
            })))
            .mount(&server)
            .await;

        let articles = client(&server).fetch("business", 5).await;
        assert_eq!(articles[0].title, "  Markets rally ");
    }
}
