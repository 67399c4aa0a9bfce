use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::app::{NewsError, Result};
use crate::config::ApiConfig;
use crate::domain::{Article, Category, RemotePage};
use crate::fetcher::{FeedQuery, Fetcher};
use crate::normalizer::Normalizer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsResponse {
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// reqwest client for a NewsAPI-shaped service.
pub struct NewsApiClient {
    client: Client,
    base_url: Url,
    config: ApiConfig,
    normalizer: Normalizer,
}

impl NewsApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("newsreel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            config,
            normalizer: Normalizer::new(),
        })
    }

    /// Full request URL for `query`, including the API key.
    pub fn request_url(&self, query: &FeedQuery, page: u32, page_size: u32) -> Result<Url> {
        let (endpoint, mut params): (&str, Vec<(&str, String)>) = match query {
            FeedQuery::Headlines(Category::Business) => (
                "top-headlines",
                vec![
                    ("country", self.config.country.clone()),
                    ("category", Category::Business.as_str().to_string()),
                ],
            ),
            FeedQuery::Headlines(Category::Technology) => (
                "top-headlines",
                vec![("sources", self.config.technology_sources.clone())],
            ),
            FeedQuery::Search(q) => (
                "everything",
                vec![
                    ("q", q.clone()),
                    ("sortBy", "publishedAt".to_string()),
                    ("language", self.config.language.clone()),
                ],
            ),
        };
        params.push(("page", page.max(1).to_string()));
        params.push(("pageSize", page_size.to_string()));
        if !self.config.api_key.is_empty() {
            params.push(("apiKey", self.config.api_key.clone()));
        }

        let mut url = self.base_url.join(endpoint)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }
}

#[async_trait]
impl Fetcher for NewsApiClient {
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        page: u32,
        page_size: u32,
    ) -> Result<RemotePage> {
        let url = self.request_url(query, page, page_size)?;
        tracing::debug!("GET {} page {} ({} per page)", query.label(), page, page_size);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|e| match (e.code, e.message) {
                    (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
                    (_, message) => message,
                })
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            tracing::warn!("{} rejected with {}: {}", query.label(), status, message);
            return Err(NewsError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: NewsResponse = serde_json::from_slice(&body)?;
        let returned = parsed.articles.len();
        let articles = self.normalizer.normalize(parsed.articles);

        Ok(RemotePage {
            articles,
            returned,
            total_results: parsed.total_results,
        })
    }
}
