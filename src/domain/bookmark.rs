use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{Article, ArticleSource};

/// Persisted copy of an article the user saved.
///
/// Rows are created from an [`Article`] and deleted on un-bookmark; they are
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkedArticle {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
    pub source_name: String,
    pub source_id: Option<String>,
    pub author: Option<String>,
    /// Epoch milliseconds on the local clock.
    pub bookmarked_at: i64,
}

impl BookmarkedArticle {
    pub fn from_article(article: &Article) -> Self {
        Self::from_article_at(article, Utc::now().timestamp_millis())
    }

    pub fn from_article_at(article: &Article, bookmarked_at: i64) -> Self {
        Self {
            url: article.url.clone(),
            title: article.title.clone().unwrap_or_default(),
            description: article.description.clone(),
            url_to_image: article.url_to_image.clone(),
            published_at: article.published_at.clone(),
            content: article.content.clone(),
            source_name: article.source.name.clone().unwrap_or_default(),
            source_id: article.source.id.clone(),
            author: article.author.clone(),
            bookmarked_at,
        }
    }

    /// Rebuild an article for display, with the bookmark flag set.
    pub fn to_article(&self) -> Article {
        Article {
            url: self.url.clone(),
            title: Some(self.title.clone()).filter(|t| !t.is_empty()),
            description: self.description.clone(),
            content: self.content.clone(),
            author: self.author.clone(),
            url_to_image: self.url_to_image.clone(),
            published_at: self.published_at.clone(),
            source: ArticleSource {
                id: self.source_id.clone(),
                name: Some(self.source_name.clone()).filter(|n| !n.is_empty()),
            },
            bookmarked: true,
        }
    }
}

/// Change notification emitted by the bookmark adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkEvent {
    pub url: String,
    pub bookmarked: bool,
}
