pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Category, FilterState, SortOrder};

#[derive(Parser)]
#[command(name = "newsreel")]
#[command(about = "Business and technology headlines with local bookmarks", long_about = None)]
pub struct Cli {
    /// Bookmark database path (default: <data dir>/newsreel/newsreel.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the merged headline feed
    Headlines(ListingArgs),
    /// Search all articles
    Search {
        /// Free-text query
        query: String,

        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Manage bookmarks
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkAction,
    },
}

#[derive(Args, Clone, Debug)]
pub struct ListingArgs {
    /// Number of pages to load
    #[arg(short, long = "pages", visible_alias = "page", default_value_t = 1)]
    pub pages: u32,

    /// Restrict to a category (business, technology); repeatable
    #[arg(short, long = "category")]
    pub categories: Vec<Category>,

    /// Restrict to sources whose name contains this text; repeatable
    #[arg(short, long = "source")]
    pub sources: Vec<String>,

    /// Oldest articles first
    #[arg(long)]
    pub oldest: bool,
}

impl ListingArgs {
    pub fn filter(&self) -> FilterState {
        FilterState::new(self.categories.iter().copied(), self.sources.iter().cloned())
    }

    pub fn order(&self) -> SortOrder {
        if self.oldest {
            SortOrder::OldestFirst
        } else {
            SortOrder::NewestFirst
        }
    }
}

#[derive(Subcommand)]
pub enum BookmarkAction {
    /// List bookmarks, newest first
    List,
    /// Bookmark an article by URL
    Add {
        url: String,
        /// Title to store with the bookmark
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Remove a bookmark
    Remove { url: String },
}
