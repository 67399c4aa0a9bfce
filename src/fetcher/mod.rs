pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Category, RemotePage};

/// One remote request shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedQuery {
    /// The fixed headline feed for a category.
    Headlines(Category),
    /// Free-text search across everything.
    Search(String),
}

impl FeedQuery {
    pub fn label(&self) -> String {
        match self {
            FeedQuery::Headlines(category) => category.as_str().to_string(),
            FeedQuery::Search(query) => format!("search:{}", query),
        }
    }
}

#[async_trait]
pub trait Fetcher {
    /// Fetch `page` (1-based) of `query` with `page_size` articles.
    ///
    /// Network failures surface as [`NewsError::Http`](crate::app::NewsError::Http)
    /// or `Io`; rejected requests as `Server`.
    async fn fetch_page(&self, query: &FeedQuery, page: u32, page_size: u32)
        -> Result<RemotePage>;
}
