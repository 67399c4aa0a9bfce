use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{NewsError, Result};
use crate::domain::BookmarkedArticle;
use crate::store::BookmarkStore;

const BOOKMARK_COLUMNS: &str = "url, title, description, url_to_image, published_at, content,
     source_name, source_id, author, bookmarked_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| NewsError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            NewsError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn row_to_bookmark(row: &Row<'_>) -> rusqlite::Result<BookmarkedArticle> {
        Ok(BookmarkedArticle {
            url: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            url_to_image: row.get(3)?,
            published_at: row.get(4)?,
            content: row.get(5)?,
            source_name: row.get(6)?,
            source_id: row.get(7)?,
            author: row.get(8)?,
            bookmarked_at: row.get(9)?,
        })
    }
}

impl BookmarkStore for SqliteStore {
    fn upsert(&self, bookmark: &BookmarkedArticle) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO bookmarked_articles
                (url, title, description, url_to_image, published_at, content,
                 source_name, source_id, author, bookmarked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                url_to_image = excluded.url_to_image,
                published_at = excluded.published_at,
                content = excluded.content,
                source_name = excluded.source_name,
                source_id = excluded.source_id,
                author = excluded.author,
                bookmarked_at = excluded.bookmarked_at",
            params![
                bookmark.url,
                bookmark.title,
                bookmark.description,
                bookmark.url_to_image,
                bookmark.published_at,
                bookmark.content,
                bookmark.source_name,
                bookmark.source_id,
                bookmark.author,
                bookmark.bookmarked_at,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM bookmarked_articles WHERE url = ?1",
            params![url],
        )?;
        Ok(deleted > 0)
    }

    fn get(&self, url: &str) -> Result<Option<BookmarkedArticle>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM bookmarked_articles WHERE url = ?1",
                    BOOKMARK_COLUMNS
                ),
                params![url],
                Self::row_to_bookmark,
            )
            .optional()?;
        Ok(result)
    }

    fn exists(&self, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM bookmarked_articles WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_all(&self) -> Result<Vec<BookmarkedArticle>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM bookmarked_articles ORDER BY bookmarked_at DESC, id DESC",
            BOOKMARK_COLUMNS
        ))?;

        let bookmarks = stmt
            .query_map([], Self::row_to_bookmark)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookmarks)
    }

    fn bookmarked_urls(&self) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT url FROM bookmarked_articles")?;
        let urls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(urls)
    }
}
