//! Bookmark adapter over a [`BookmarkStore`].
//!
//! Writes are broadcast as [`BookmarkEvent`]s so every screen can update its
//! derived `bookmarked` flags, and the newest-first list is republished on a
//! watch channel after each write.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::Stream;
use tokio::sync::{broadcast, watch, OwnedMutexGuard};

use crate::app::Result;
use crate::domain::{Article, BookmarkEvent, BookmarkedArticle};
use crate::store::BookmarkStore;

const EVENT_CAPACITY: usize = 64;

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

pub struct Bookmarks {
    store: Arc<dyn BookmarkStore + Send + Sync>,
    events: broadcast::Sender<BookmarkEvent>,
    snapshot: watch::Sender<Vec<BookmarkedArticle>>,
    /// Held while reading the store and publishing the list, so a stale read
    /// never overwrites a newer one.
    publishing: Mutex<()>,
    locks: LockMap,
}

impl Bookmarks {
    pub fn new(store: Arc<dyn BookmarkStore + Send + Sync>) -> Result<Self> {
        let initial = store.list_all()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (snapshot, _) = watch::channel(initial);
        Ok(Self {
            store,
            events,
            snapshot,
            publishing: Mutex::new(()),
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookmarkEvent> {
        self.events.subscribe()
    }

    /// Live newest-first view of all bookmarks.
    pub fn list_all(&self) -> BookmarkFeed {
        BookmarkFeed {
            rx: self.snapshot.subscribe(),
        }
    }

    pub async fn add(&self, article: &Article) -> Result<()> {
        let _lock = self.lock_url(&article.url).await;
        self.insert(article)
    }

    /// Returns whether a bookmark was removed.
    pub async fn remove(&self, url: &str) -> Result<bool> {
        let _lock = self.lock_url(url).await;
        self.delete(url)
    }

    pub fn is_bookmarked(&self, url: &str) -> Result<bool> {
        self.store.exists(url)
    }

    pub fn get(&self, url: &str) -> Result<Option<BookmarkedArticle>> {
        self.store.get(url)
    }

    pub fn bookmarked_urls(&self) -> Result<HashSet<String>> {
        self.store.bookmarked_urls()
    }

    /// Flip the bookmark the caller saw on `article`.
    ///
    /// The target is `!article.bookmarked`. If the store already holds the
    /// target state, nothing is written. Returns the resulting state.
    pub async fn toggle(&self, article: &Article) -> Result<bool> {
        let target = !article.bookmarked;
        let _lock = self.lock_url(&article.url).await;

        if self.store.exists(&article.url)? == target {
            tracing::debug!("Bookmark for {} already {}", article.url, target);
            return Ok(target);
        }

        if target {
            self.insert(article)?;
        } else {
            self.delete(&article.url)?;
        }
        Ok(target)
    }

    fn insert(&self, article: &Article) -> Result<()> {
        self.store.upsert(&BookmarkedArticle::from_article(article))?;
        tracing::info!("Bookmarked {}", article.url);
        self.publish(&article.url, true)
    }

    fn delete(&self, url: &str) -> Result<bool> {
        if !self.store.delete(url)? {
            return Ok(false);
        }
        tracing::info!("Removed bookmark {}", url);
        self.publish(url, false)?;
        Ok(true)
    }

    fn publish(&self, url: &str, bookmarked: bool) -> Result<()> {
        {
            let _publishing = self.publishing.lock().unwrap_or_else(|e| e.into_inner());
            self.snapshot.send_replace(self.store.list_all()?);
        }
        // No subscribers is fine.
        let _ = self.events.send(BookmarkEvent {
            url: url.to_string(),
            bookmarked,
        });
        Ok(())
    }

    async fn lock_url(&self, url: &str) -> UrlLock<'_> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(url.to_string()).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        UrlLock {
            locks: &self.locks,
            url: url.to_string(),
            guard: Some(guard),
        }
    }
}

/// Held for the duration of one write to a URL. Dropping the last holder
/// removes the URL's entry from the lock map.
struct UrlLock<'a> {
    locks: &'a LockMap,
    url: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UrlLock<'_> {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one in our guard.
        if locks
            .get(&self.url)
            .is_some_and(|entry| Arc::strong_count(entry) == 2)
        {
            locks.remove(&self.url);
        }
        drop(guard);
    }
}

/// Receiver side of [`Bookmarks::list_all`].
pub struct BookmarkFeed {
    rx: watch::Receiver<Vec<BookmarkedArticle>>,
}

impl BookmarkFeed {
    pub fn current(&self) -> Vec<BookmarkedArticle> {
        self.rx.borrow().clone()
    }

    /// Wait for the next write. `None` once the adapter is gone.
    pub async fn changed(&mut self) -> Option<Vec<BookmarkedArticle>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Current list first, then one item per write.
    pub fn into_stream(self) -> impl Stream<Item = Vec<BookmarkedArticle>> {
        futures::stream::unfold((self.rx, true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let value = rx.borrow_and_update().clone();
            Some((value, (rx, false)))
        })
    }
}
