//! # Newsreel
//!
//! A news headline reader: business and technology feeds merged into one
//! paged, filterable, sortable stream, with debounced search and local
//! bookmarks.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Paginator (merge, dedup) → Filter → Sort → FeedSession
//!                                                     Bookmarks ──┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Two pages of headlines, technology only
//! newsreel headlines --pages 2 --category technology
//!
//! # Search, oldest first
//! newsreel search "chip export" --oldest
//!
//! # Bookmarks
//! newsreel bookmarks list
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, fetcher,
/// paginator and bookmarks.
pub mod app;

/// Bookmark adapter with per-URL serialized writes and change notifications.
pub mod bookmarks;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/newsreel/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Article`](domain::Article): one remote news record
/// - [`BookmarkedArticle`](domain::BookmarkedArticle): persisted bookmark
/// - [`SessionState`](domain::SessionState): filters, sort and query
pub mod domain;

/// Remote access.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for page fetching
/// - [`NewsApiClient`](fetcher::http_fetcher::NewsApiClient): reqwest-based implementation
pub mod fetcher;

/// Cleanup of decoded API records.
pub mod normalizer;

/// Merge-pagination, filtering, sorting and the per-screen feed session.
pub mod pipeline;

/// Debounced, cancel-and-replace search.
pub mod search;

/// SQLite persistence layer.
///
/// - [`BookmarkStore`](store::BookmarkStore): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
