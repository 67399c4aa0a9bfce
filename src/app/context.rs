use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::app::error::{NewsError, Result};
use crate::bookmarks::Bookmarks;
use crate::config::Config;
use crate::fetcher::http_fetcher::NewsApiClient;
use crate::fetcher::Fetcher;
use crate::pipeline::{ArticleFilter, Paginator};
use crate::search::{SearchController, SearchHandle, SearchOutcome};
use crate::store::{BookmarkStore, SqliteStore};

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub paginator: Arc<Paginator>,
    pub bookmarks: Arc<Bookmarks>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store: Arc<dyn BookmarkStore + Send + Sync> = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store: Arc<dyn BookmarkStore + Send + Sync> = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<dyn BookmarkStore + Send + Sync>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(NewsApiClient::new(config.api.clone())?);
        let paginator = Paginator::new(fetcher.clone())
            .with_page_size(config.feed.page_size)
            .with_filter(ArticleFilter::new(&config.feed.technology_tokens));
        let bookmarks = Bookmarks::new(store)?;

        if config.api.api_key.is_empty() {
            tracing::warn!("No API key configured; requests will likely be rejected");
        }

        Ok(Self {
            config,
            fetcher,
            paginator: Arc::new(paginator),
            bookmarks: Arc::new(bookmarks),
        })
    }

    /// Start a search controller using the configured debounce window.
    pub fn spawn_search(&self) -> (SearchHandle, mpsc::Receiver<SearchOutcome>) {
        SearchController::spawn(self.paginator.clone(), self.config.feed.debounce_window())
    }

    pub fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NewsError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("newsreel");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("newsreel.db"))
    }
}
