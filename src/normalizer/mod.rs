use html_escape::decode_html_entities;

use crate::domain::Article;

/// Title the API substitutes for articles that were taken down.
const REMOVED_MARKER: &str = "[Removed]";

/// Cleans raw API records into displayable articles.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Decode entities, trim, blank out empty strings and drop records that
    /// have no usable URL or were removed upstream.
    pub fn normalize(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .filter_map(|article| self.normalize_one(article))
            .collect()
    }

    fn normalize_one(&self, mut article: Article) -> Option<Article> {
        article.url = article.url.trim().to_string();
        if article.url.is_empty() {
            return None;
        }

        article.title = clean(article.title);
        if article.title.as_deref() == Some(REMOVED_MARKER) {
            tracing::debug!("Skipping removed article {}", article.url);
            return None;
        }

        article.description = clean(article.description);
        article.content = clean(article.content);
        article.author = clean(article.author);
        article.url_to_image = clean(article.url_to_image);
        article.published_at = clean(article.published_at);
        article.source.name = clean(article.source.name);
        article.source.id = clean(article.source.id);
        article.bookmarked = false;

        Some(article)
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| decode_html_entities(v.trim()).to_string())
        .filter(|v| !v.is_empty())
}
