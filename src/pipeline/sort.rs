//! Stable ordering by publish time.

use std::cmp::Reverse;

use crate::domain::{Article, SortOrder};
use crate::pipeline::timestamp;

/// Sort by publish time. Ties keep their input order in both directions.
pub fn sort_articles(mut articles: Vec<Article>, order: SortOrder) -> Vec<Article> {
    sort_in_place(&mut articles, order);
    articles
}

pub fn sort_in_place(articles: &mut [Article], order: SortOrder) {
    match order {
        SortOrder::NewestFirst => {
            articles.sort_by_cached_key(|a| Reverse(timestamp::sort_key(a.published_at.as_deref())))
        }
        SortOrder::OldestFirst => {
            articles.sort_by_cached_key(|a| timestamp::sort_key(a.published_at.as_deref()))
        }
    }
}
