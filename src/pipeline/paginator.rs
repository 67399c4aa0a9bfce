//! Merges the per-category headline feeds into one paged stream.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::future::join_all;

use crate::app::{FailureCause, LoadFailure};
use crate::domain::{Article, Category, FilterState, Page, SortOrder};
use crate::fetcher::{FeedQuery, Fetcher};
use crate::pipeline::filter::ArticleFilter;
use crate::pipeline::sort::sort_articles;

pub const DEFAULT_PAGE_SIZE: u32 = 5;

pub struct Paginator {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    /// Priority order. Earlier feeds win dedup ties.
    feeds: Vec<Category>,
    page_size: u32,
    filter: ArticleFilter,
}

impl Paginator {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            feeds: Category::ALL.to_vec(),
            page_size: DEFAULT_PAGE_SIZE,
            filter: ArticleFilter::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_filter(mut self, filter: ArticleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Restrict the configured feeds. Priority follows [`Category`] order.
    pub fn with_feeds<I: IntoIterator<Item = Category>>(mut self, feeds: I) -> Self {
        let feeds: BTreeSet<Category> = feeds.into_iter().collect();
        self.feeds = feeds.into_iter().collect();
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter(&self) -> &ArticleFilter {
        &self.filter
    }

    /// Load page `index` of the merged headline stream.
    ///
    /// Feeds outside `filter.categories` are not requested. A failing feed
    /// contributes nothing unless every requested feed failed.
    pub async fn load_page(
        &self,
        index: u32,
        filter: &FilterState,
        order: SortOrder,
    ) -> Result<Page, LoadFailure> {
        let index = index.max(1);
        let active: Vec<Category> = self
            .feeds
            .iter()
            .copied()
            .filter(|category| filter.includes_category(*category))
            .collect();

        if active.is_empty() {
            tracing::debug!("No active feeds for page {}", index);
            return Ok(Page::empty(index));
        }

        let requests = active.iter().map(|category| {
            let query = FeedQuery::Headlines(*category);
            let fetcher = self.fetcher.clone();
            let page_size = self.page_size;
            async move { fetcher.fetch_page(&query, index, page_size).await }
        });
        // join_all keeps request order, which is feed priority.
        let results = join_all(requests).await;

        let mut merged = Vec::new();
        let mut seen = HashSet::new();
        let mut has_next = false;
        let mut failed = 0;
        let mut cause = FailureCause::Unknown;
        let mut message = String::new();

        for (category, result) in active.iter().zip(results) {
            match result {
                Ok(remote) => {
                    tracing::debug!(
                        "{} page {}: {} articles (declared total {})",
                        category.as_str(),
                        index,
                        remote.articles.len(),
                        remote.total_results
                    );
                    if remote.returned >= self.page_size as usize {
                        has_next = true;
                    }
                    push_unique(&mut merged, &mut seen, remote.articles);
                }
                Err(e) => {
                    tracing::warn!("{} feed page {} failed: {}", category.as_str(), index, e);
                    failed += 1;
                    cause = cause.more_specific(FailureCause::from(&e));
                    if message.is_empty() {
                        message = e.to_string();
                    }
                }
            }
        }

        if failed == active.len() {
            tracing::error!("All {} feeds failed for page {}", failed, index);
            return Err(LoadFailure::new(cause, message));
        }

        let filtered = self.filter.apply(&merged, &BTreeSet::new(), &filter.sources);
        Ok(Page {
            index,
            articles: sort_articles(filtered, order),
            has_next,
        })
    }

    /// Load page `index` of a free-text search, through the same filter and
    /// sort stages as the merged stream.
    pub async fn load_search_page(
        &self,
        query: &str,
        index: u32,
        filter: &FilterState,
        order: SortOrder,
    ) -> Result<Page, LoadFailure> {
        let index = index.max(1);
        let query = FeedQuery::Search(query.to_string());
        let remote = self
            .fetcher
            .fetch_page(&query, index, self.page_size)
            .await
            .map_err(|e| {
                tracing::warn!("Search {} page {} failed: {}", query.label(), index, e);
                LoadFailure::from(e)
            })?;

        let has_next = remote.returned >= self.page_size as usize;
        let mut unique = Vec::new();
        push_unique(&mut unique, &mut HashSet::new(), remote.articles);

        let filtered = self
            .filter
            .apply(&unique, &filter.categories, &filter.sources);
        Ok(Page {
            index,
            articles: sort_articles(filtered, order),
            has_next,
        })
    }
}

fn push_unique(out: &mut Vec<Article>, seen: &mut HashSet<String>, articles: Vec<Article>) {
    for article in articles {
        if seen.insert(article.url.clone()) {
            out.push(article);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{article, FakeFetcher, Scripted};
    use super::*;

    const BUSINESS: FeedQuery = FeedQuery::Headlines(Category::Business);
    const TECH: FeedQuery = FeedQuery::Headlines(Category::Technology);

    fn urls(page: &Page) -> Vec<&str> {
        page.articles.iter().map(|a| a.url.as_str()).collect()
    }

    fn paginator(fetcher: &Arc<FakeFetcher>) -> Paginator {
        Paginator::new(fetcher.clone())
    }

    #[tokio::test]
    async fn test_merges_and_sorts_newest_first() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(
            BUSINESS,
            1,
            Scripted::Page(vec![
                article("1", "2024-01-02T10:00:00Z", "Reuters"),
                article("2", "2024-01-01T10:00:00Z", "Reuters"),
            ]),
        );
        fetcher.respond(
            TECH,
            1,
            Scripted::Page(vec![article("3", "2024-01-03T10:00:00Z", "TechCrunch")]),
        );

        let page = paginator(&fetcher)
            .load_page(1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(urls(&page), vec!["3", "1", "2"]);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_dedup_keeps_business_copy() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut business = article("x", "2024-01-01T00:00:05Z", "Reuters");
        business.title = Some("business copy".into());
        let mut tech = article("x", "2024-01-01T00:00:10Z", "TechCrunch");
        tech.title = Some("tech copy".into());
        fetcher.respond(BUSINESS, 1, Scripted::Page(vec![business]));
        fetcher.respond(TECH, 1, Scripted::Page(vec![tech]));

        let page = paginator(&fetcher)
            .load_page(1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(page.articles.len(), 1);
        assert_eq!(page.articles[0].title.as_deref(), Some("business copy"));
        assert_eq!(page.articles[0].source_name(), "Reuters");
    }

    #[tokio::test]
    async fn test_inactive_feed_is_not_requested() {
        let fetcher = Arc::new(FakeFetcher::default());
        let filter = FilterState::new([Category::Technology], Vec::<String>::new());

        paginator(&fetcher)
            .load_page(3, &filter, SortOrder::NewestFirst)
            .await
            .unwrap();

        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (TECH, 3, DEFAULT_PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_no_configured_feeds_yields_empty_page() {
        let fetcher = Arc::new(FakeFetcher::default());
        let page = paginator(&fetcher)
            .with_feeds([Category::Business])
            .load_page(
                1,
                &FilterState::new([Category::Technology], Vec::<String>::new()),
                SortOrder::NewestFirst,
            )
            .await
            .unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_has_next_when_any_feed_is_full() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(
            BUSINESS,
            1,
            Scripted::Page(vec![
                article("a", "2024-01-01", "Reuters"),
                article("b", "2024-01-02", "Reuters"),
            ]),
        );
        fetcher.respond(TECH, 1, Scripted::Page(vec![article("c", "2024-01-03", "TechCrunch")]));

        let page = paginator(&fetcher)
            .with_page_size(2)
            .load_page(1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert!(page.has_next);
        assert_eq!(page.next_index(), Some(2));
    }

    #[tokio::test]
    async fn test_has_next_counts_records_dropped_by_normalizer() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(
            BUSINESS,
            1,
            Scripted::Trimmed(
                vec![
                    article("a", "2024-01-01", "Reuters"),
                    article("b", "2024-01-02", "Reuters"),
                ],
                3,
            ),
        );
        fetcher.respond(
            FeedQuery::Search("q".into()),
            1,
            Scripted::Trimmed(vec![article("s", "2024-01-01", "Wired")], 3),
        );
        let paginator = paginator(&fetcher).with_page_size(3);

        let page = paginator
            .load_page(1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(page.articles.len(), 2);
        assert!(page.has_next);

        let page = paginator
            .load_search_page("q", 1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn test_single_feed_failure_is_swallowed() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(BUSINESS, 1, Scripted::Server(500));
        fetcher.respond(TECH, 1, Scripted::Page(vec![article("t", "2024-01-01", "TechCrunch")]));

        let page = paginator(&fetcher)
            .load_page(1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(urls(&page), vec!["t"]);
    }

    #[tokio::test]
    async fn test_all_feeds_failing_reports_most_specific_cause() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(BUSINESS, 2, Scripted::Server(503));
        fetcher.respond(TECH, 2, Scripted::Network);

        let failure = paginator(&fetcher)
            .load_page(2, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap_err();
        assert_eq!(failure.cause, FailureCause::Network);
        assert!(failure.message.contains("503"));
    }

    #[tokio::test]
    async fn test_source_filter_applied_after_merge() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(
            BUSINESS,
            1,
            Scripted::Page(vec![
                article("bbc", "2024-01-01", "BBC News"),
                article("reuters", "2024-01-02", "Reuters"),
            ]),
        );
        let filter = FilterState::new(Vec::<Category>::new(), ["bbc"]);

        let page = paginator(&fetcher)
            .load_page(1, &filter, SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(urls(&page), vec!["bbc"]);

        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
    }

    #[tokio::test]
    async fn test_page_zero_is_clamped() {
        let fetcher = Arc::new(FakeFetcher::default());
        let page = paginator(&fetcher)
            .load_page(0, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap();
        assert_eq!(page.index, 1);
    }

    #[tokio::test]
    async fn test_search_routes_through_filter_and_sort() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(
            FeedQuery::Search("rust".into()),
            1,
            Scripted::Page(vec![
                article("old", "2023-05-01T00:00:00Z", "TechCrunch"),
                article("biz", "2024-05-01T00:00:00Z", "Bloomberg"),
                article("new", "2024-06-01T00:00:00Z", "TechCrunch"),
                article("new", "2024-06-01T00:00:00Z", "TechCrunch"),
            ]),
        );
        let filter = FilterState::new([Category::Technology], Vec::<String>::new());

        let page = paginator(&fetcher)
            .with_page_size(4)
            .load_search_page("rust", 1, &filter, SortOrder::OldestFirst)
            .await
            .unwrap();
        assert_eq!(urls(&page), vec!["old", "new"]);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn test_search_failure_is_load_failure() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(FeedQuery::Search("x".into()), 1, Scripted::Server(401));

        let failure = paginator(&fetcher)
            .load_search_page("x", 1, &FilterState::default(), SortOrder::NewestFirst)
            .await
            .unwrap_err();
        assert_eq!(failure.cause, FailureCause::Server);
    }
}
