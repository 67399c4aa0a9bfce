//! Category and source allow-lists.
//!
//! Matching is deliberately loose: case-insensitive substring, so "BBC"
//! selects "BBC News" and a stored "TechCrunch" token catches "TechCrunch
//! Japan".

use std::collections::BTreeSet;

use crate::domain::{Article, Category};

pub const DEFAULT_TECHNOLOGY_TOKENS: [&str; 1] = ["techcrunch"];

/// Classifies articles into categories and applies filter sets.
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    technology_tokens: Vec<String>,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TECHNOLOGY_TOKENS)
    }
}

impl ArticleFilter {
    pub fn new<I>(technology_tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let technology_tokens = technology_tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { technology_tokens }
    }

    /// Category derived from the source name.
    pub fn classify(&self, article: &Article) -> Category {
        let source = article.source_name().to_lowercase();
        if self
            .technology_tokens
            .iter()
            .any(|token| source.contains(token.as_str()))
        {
            Category::Technology
        } else {
            Category::Business
        }
    }

    pub fn matches(
        &self,
        article: &Article,
        categories: &BTreeSet<Category>,
        sources: &BTreeSet<String>,
    ) -> bool {
        if !categories.is_empty() && !categories.contains(&self.classify(article)) {
            return false;
        }
        sources.is_empty() || matches_source(article, sources)
    }

    /// Order-preserving; empty sets let everything through.
    pub fn apply(
        &self,
        articles: &[Article],
        categories: &BTreeSet<Category>,
        sources: &BTreeSet<String>,
    ) -> Vec<Article> {
        if categories.is_empty() && sources.is_empty() {
            return articles.to_vec();
        }
        articles
            .iter()
            .filter(|article| self.matches(article, categories, sources))
            .cloned()
            .collect()
    }
}

fn matches_source(article: &Article, sources: &BTreeSet<String>) -> bool {
    let name = article.source_name().to_lowercase();
    sources
        .iter()
        .any(|source| name.contains(source.to_lowercase().as_str()))
}

/// [`ArticleFilter::apply`] with the default technology tokens.
pub fn apply_filters(
    articles: &[Article],
    categories: &BTreeSet<Category>,
    sources: &BTreeSet<String>,
) -> Vec<Article> {
    ArticleFilter::default().apply(articles, categories, sources)
}
