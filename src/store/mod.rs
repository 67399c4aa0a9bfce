pub mod sqlite;

use std::collections::HashSet;

use crate::app::Result;
use crate::domain::BookmarkedArticle;

pub use sqlite::SqliteStore;

pub trait BookmarkStore {
    /// Insert, or replace the row with the same URL.
    fn upsert(&self, bookmark: &BookmarkedArticle) -> Result<()>;
    /// Returns whether a row was deleted.
    fn delete(&self, url: &str) -> Result<bool>;
    fn get(&self, url: &str) -> Result<Option<BookmarkedArticle>>;
    fn exists(&self, url: &str) -> Result<bool>;
    /// Newest bookmark first.
    fn list_all(&self) -> Result<Vec<BookmarkedArticle>>;
    fn bookmarked_urls(&self) -> Result<HashSet<String>>;
}
