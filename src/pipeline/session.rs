//! Per-screen coordinator for the accumulated article list.
//!
//! A [`FeedSession`] owns the session state and the articles loaded so far.
//! Loads are split into two halves so several pages can be in flight at
//! once: [`FeedSession::next_ticket`] hands out a [`PageTicket`], the caller
//! runs [`PageTicket::fetch`] wherever it likes, and
//! [`FeedSession::complete`] folds the result back in. Pages are appended in
//! ticket order no matter when they finish, and tickets issued before a
//! reset or cancel are ignored.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::app::LoadFailure;
use crate::domain::{Article, BookmarkEvent, FilterState, Page, SessionAction, SessionState, SortOrder};
use crate::pipeline::paginator::Paginator;
use crate::pipeline::sort::sort_in_place;
use crate::search::SearchOutcome;

/// A request for one page, stamped with the session generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub index: u32,
    pub filter: FilterState,
    pub order: SortOrder,
    /// Empty for the merged headline stream.
    pub query: String,
}

impl PageTicket {
    pub async fn fetch(&self, paginator: &Paginator) -> Result<Page, LoadFailure> {
        if self.query.is_empty() {
            paginator.load_page(self.index, &self.filter, self.order).await
        } else {
            paginator
                .load_search_page(&self.query, self.index, &self.filter, self.order)
                .await
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Ticket belonged to an earlier generation; nothing changed.
    Stale,
    /// Arrived ahead of an earlier page; held until that page lands.
    Buffered,
    /// Pages were appended; `appended` counts new articles.
    Applied { appended: usize },
    /// The next page in order failed. Loaded articles are kept.
    Failed(LoadFailure),
    /// No page left to request; nothing was fetched.
    Exhausted,
}

#[derive(Debug, Default)]
pub struct FeedSession {
    state: SessionState,
    articles: Vec<Article>,
    seen: HashSet<String>,
    generation: u64,
    next_to_request: u32,
    next_to_apply: u32,
    buffered: BTreeMap<u32, Result<Page, LoadFailure>>,
    exhausted: bool,
    failed_index: Option<u32>,
    last_error: Option<LoadFailure>,
    bookmarked: HashSet<String>,
    sources_seen: BTreeSet<String>,
}

impl FeedSession {
    pub fn new() -> Self {
        Self::with_state(SessionState::default())
    }

    pub fn with_state(state: SessionState) -> Self {
        Self {
            state,
            next_to_request: 1,
            next_to_apply: 1,
            ..Default::default()
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn last_error(&self) -> Option<&LoadFailure> {
        self.last_error.as_ref()
    }

    /// Source names seen in any loaded page, for a source picker.
    pub fn available_sources(&self) -> &BTreeSet<String> {
        &self.sources_seen
    }

    /// Apply a user action. Returns `true` when the list was reset and the
    /// caller should load the first page again.
    pub fn dispatch(&mut self, action: SessionAction) -> bool {
        let next = self.state.reduce(action);
        if next == self.state {
            return false;
        }

        let reload = next.filter != self.state.filter || next.query != self.state.query;
        let resort = next.sort.order != self.state.sort.order;
        self.state = next;

        if reload {
            self.reset();
        } else if resort {
            sort_in_place(&mut self.articles, self.state.sort.order);
        }
        reload
    }

    /// Ticket for the next page, or `None` when the stream is exhausted or a
    /// failed page must be retried first.
    pub fn next_ticket(&mut self) -> Option<PageTicket> {
        if self.exhausted || self.failed_index.is_some() {
            return None;
        }
        let index = self.next_to_request;
        self.next_to_request += 1;
        Some(self.ticket(index))
    }

    /// Ticket re-requesting the page that last failed.
    pub fn retry_ticket(&mut self) -> Option<PageTicket> {
        let index = self.failed_index.take()?;
        self.last_error = None;
        Some(self.ticket(index))
    }

    fn ticket(&self, index: u32) -> PageTicket {
        PageTicket {
            generation: self.generation,
            index,
            filter: self.state.filter.clone(),
            order: self.state.sort.order,
            query: self.state.query.clone(),
        }
    }

    pub fn complete(&mut self, ticket: &PageTicket, result: Result<Page, LoadFailure>) -> Completion {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Dropping page {} from generation {} (current {})",
                ticket.index,
                ticket.generation,
                self.generation
            );
            return Completion::Stale;
        }
        if self.exhausted || ticket.index < self.next_to_apply {
            return Completion::Stale;
        }

        self.buffered.insert(ticket.index, result);

        let mut appended = None;
        while let Some(result) = self.buffered.remove(&self.next_to_apply) {
            match result {
                Ok(page) => {
                    *appended.get_or_insert(0) += self.append(page.articles);
                    self.next_to_apply += 1;
                    if !page.has_next {
                        self.exhausted = true;
                        self.buffered.clear();
                        break;
                    }
                }
                Err(failure) => {
                    tracing::warn!("Page {} failed: {}", self.next_to_apply, failure);
                    self.failed_index = Some(self.next_to_apply);
                    self.last_error = Some(failure.clone());
                    return Completion::Failed(failure);
                }
            }
        }

        match appended {
            Some(appended) => {
                sort_in_place(&mut self.articles, self.state.sort.order);
                Completion::Applied { appended }
            }
            None => Completion::Buffered,
        }
    }

    /// Fetch and apply the next page (or retry the failed one).
    pub async fn load_next(&mut self, paginator: &Paginator) -> Completion {
        let ticket = match self.retry_ticket().or_else(|| self.next_ticket()) {
            Some(ticket) => ticket,
            None => return Completion::Exhausted,
        };
        let result = ticket.fetch(paginator).await;
        self.complete(&ticket, result)
    }

    /// Adopt the first page of a committed search. A cleared search resets
    /// the list so the caller can reload the merged stream.
    pub fn accept_search(&mut self, outcome: SearchOutcome) -> Completion {
        if !self.dispatch(SessionAction::SetQuery(outcome.query.clone())) {
            self.reset();
        }
        if outcome.query.is_empty() {
            return Completion::Applied { appended: 0 };
        }
        let Some(ticket) = self.next_ticket() else {
            return Completion::Stale;
        };
        let result = match outcome.error {
            Some(failure) => Err(failure),
            None => Ok(Page {
                index: ticket.index,
                articles: outcome.articles,
                has_next: outcome.has_next,
            }),
        };
        self.complete(&ticket, result)
    }

    /// Invalidate in-flight tickets without discarding loaded articles.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.buffered.clear();
        self.next_to_request = self.next_to_apply;
    }

    pub fn set_bookmarked_urls(&mut self, urls: HashSet<String>) {
        self.bookmarked = urls;
        for article in &mut self.articles {
            article.bookmarked = self.bookmarked.contains(&article.url);
        }
    }

    /// Fold one [`Bookmarks`](crate::bookmarks::Bookmarks) notification into
    /// the loaded list. Screens forward every event from
    /// `Bookmarks::subscribe` here so flags stay in step with other screens.
    pub fn apply_bookmark_event(&mut self, event: &BookmarkEvent) {
        if event.bookmarked {
            self.bookmarked.insert(event.url.clone());
        } else {
            self.bookmarked.remove(&event.url);
        }
        for article in self.articles.iter_mut().filter(|a| a.url == event.url) {
            article.bookmarked = event.bookmarked;
        }
    }

    fn append(&mut self, articles: Vec<Article>) -> usize {
        let before = self.articles.len();
        for mut article in articles {
            if !self.seen.insert(article.url.clone()) {
                continue;
            }
            if let Some(name) = article.source.name.as_deref() {
                self.sources_seen.insert(name.to_string());
            }
            article.bookmarked = self.bookmarked.contains(&article.url);
            self.articles.push(article);
        }
        self.articles.len() - before
    }

    fn reset(&mut self) {
        self.cancel();
        self.articles.clear();
        self.seen.clear();
        self.next_to_request = 1;
        self.next_to_apply = 1;
        self.exhausted = false;
        self.failed_index = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::app::FailureCause;
    use crate::domain::Category;
    use crate::fetcher::FeedQuery;
    use crate::pipeline::paginator::testing::{article, FakeFetcher, Scripted};

    fn page(index: u32, urls: &[(&str, &str)], has_next: bool) -> Result<Page, LoadFailure> {
        Ok(Page {
            index,
            articles: urls
                .iter()
                .map(|(url, ts)| article(url, ts, "Reuters"))
                .collect(),
            has_next,
        })
    }

    fn urls(session: &FeedSession) -> Vec<&str> {
        session.articles().iter().map(|a| a.url.as_str()).collect()
    }

    #[test]
    fn test_out_of_order_pages_append_in_request_order() {
        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        let second = session.next_ticket().unwrap();

        let done = session.complete(&second, page(2, &[("b", "2024-01-01")], true));
        assert_eq!(done, Completion::Buffered);
        assert!(session.articles().is_empty());

        let done = session.complete(&first, page(1, &[("a", "2024-01-02")], true));
        assert_eq!(done, Completion::Applied { appended: 2 });
        assert_eq!(urls(&session), vec!["a", "b"]);
    }

    #[test]
    fn test_full_list_is_resorted_after_append() {
        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        session.complete(&first, page(1, &[("old", "2024-01-01")], true));
        let second = session.next_ticket().unwrap();
        session.complete(&second, page(2, &[("new", "2024-02-01")], true));

        assert_eq!(urls(&session), vec!["new", "old"]);
    }

    #[test]
    fn test_duplicates_across_pages_are_skipped() {
        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        session.complete(&first, page(1, &[("a", "2024-01-01")], true));
        let second = session.next_ticket().unwrap();
        let done = session.complete(&second, page(2, &[("a", "2024-01-01"), ("b", "2023-01-01")], true));

        assert_eq!(done, Completion::Applied { appended: 1 });
        assert_eq!(urls(&session), vec!["a", "b"]);
    }

    #[test]
    fn test_filter_change_invalidates_in_flight_tickets() {
        let mut session = FeedSession::new();
        let ticket = session.next_ticket().unwrap();

        let reload = session.dispatch(SessionAction::ApplyFilters(FilterState::new(
            [Category::Business],
            Vec::<String>::new(),
        )));
        assert!(reload);

        let done = session.complete(&ticket, page(1, &[("a", "2024-01-01")], true));
        assert_eq!(done, Completion::Stale);
        assert!(session.articles().is_empty());

        let fresh = session.next_ticket().unwrap();
        assert_eq!(fresh.index, 1);
        assert_eq!(fresh.filter.categories.len(), 1);
    }

    #[test]
    fn test_sort_change_resorts_without_reload() {
        let mut session = FeedSession::new();
        let ticket = session.next_ticket().unwrap();
        session.complete(&ticket, page(1, &[("a", "2024-01-01"), ("b", "2024-02-01")], true));
        assert_eq!(urls(&session), vec!["b", "a"]);

        let reload = session.dispatch(SessionAction::SetSort(SortOrder::OldestFirst));
        assert!(!reload);
        assert_eq!(urls(&session), vec!["a", "b"]);
        assert!(session.state().sort.user_selected);
    }

    #[test]
    fn test_failure_keeps_loaded_articles_and_retries_same_index() {
        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        session.complete(&first, page(1, &[("a", "2024-01-01")], true));

        let second = session.next_ticket().unwrap();
        let third = session.next_ticket().unwrap();
        let failure = LoadFailure::new(FailureCause::Network, "offline");
        assert_eq!(
            session.complete(&third, page(3, &[("c", "2023-01-01")], true)),
            Completion::Buffered
        );
        assert_eq!(
            session.complete(&second, Err(failure.clone())),
            Completion::Failed(failure.clone())
        );
        assert_eq!(urls(&session), vec!["a"]);
        assert_eq!(session.last_error(), Some(&failure));
        assert!(session.next_ticket().is_none());

        let retry = session.retry_ticket().unwrap();
        assert_eq!(retry.index, 2);
        assert!(session.last_error().is_none());

        let done = session.complete(&retry, page(2, &[("b", "2023-06-01")], true));
        assert_eq!(done, Completion::Applied { appended: 2 });
        assert_eq!(urls(&session), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_last_page_exhausts_stream() {
        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        let second = session.next_ticket().unwrap();
        session.complete(&first, page(1, &[("a", "2024-01-01")], false));

        assert!(session.is_exhausted());
        assert!(session.next_ticket().is_none());
        assert_eq!(
            session.complete(&second, page(2, &[("b", "2024-01-01")], false)),
            Completion::Stale
        );
    }

    #[test]
    fn test_cancel_keeps_articles() {
        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        session.complete(&first, page(1, &[("a", "2024-01-01")], true));
        let pending = session.next_ticket().unwrap();

        session.cancel();
        assert_eq!(
            session.complete(&pending, page(2, &[("b", "2024-01-01")], true)),
            Completion::Stale
        );
        assert_eq!(urls(&session), vec!["a"]);
        assert_eq!(session.next_ticket().unwrap().index, 2);
    }

    #[test]
    fn test_bookmark_annotation() {
        let mut session = FeedSession::new();
        session.set_bookmarked_urls(HashSet::from(["b".to_string()]));
        let ticket = session.next_ticket().unwrap();
        session.complete(&ticket, page(1, &[("a", "2024-02-01"), ("b", "2024-01-01")], true));

        assert!(!session.articles()[0].bookmarked);
        assert!(session.articles()[1].bookmarked);

        session.apply_bookmark_event(&BookmarkEvent {
            url: "a".into(),
            bookmarked: true,
        });
        assert!(session.articles()[0].bookmarked);
    }

    #[test]
    fn test_available_sources() {
        let mut session = FeedSession::new();
        let ticket = session.next_ticket().unwrap();
        let mut articles = vec![article("a", "2024-01-01", "BBC News")];
        articles.push(article("b", "2024-01-01", "Wired"));
        session.complete(
            &ticket,
            Ok(Page {
                index: 1,
                articles,
                has_next: true,
            }),
        );
        let sources: Vec<_> = session.available_sources().iter().cloned().collect();
        assert_eq!(sources, vec!["BBC News".to_string(), "Wired".to_string()]);
    }

    #[test]
    fn test_accept_search_outcome() {
        let mut session = FeedSession::new();
        let done = session.accept_search(SearchOutcome {
            generation: 1,
            query: "rust".into(),
            articles: vec![article("r", "2024-01-01", "TechCrunch")],
            has_next: true,
            error: None,
        });
        assert_eq!(done, Completion::Applied { appended: 1 });
        assert_eq!(session.state().query, "rust");

        let next = session.next_ticket().unwrap();
        assert_eq!(next.index, 2);
        assert_eq!(next.query, "rust");

        session.accept_search(SearchOutcome::cleared(2));
        assert!(session.articles().is_empty());
        assert!(!session.state().is_searching());
    }

    #[tokio::test]
    async fn test_concurrent_loads_with_slow_first_page() {
        let fetcher = Arc::new(FakeFetcher::default());
        let business = FeedQuery::Headlines(Category::Business);
        fetcher.respond(
            business.clone(),
            1,
            Scripted::Page(vec![article("p1", "2024-01-01", "Reuters")]),
        );
        fetcher.respond(
            business.clone(),
            2,
            Scripted::Page(vec![article("p2", "2024-01-02", "Reuters")]),
        );
        fetcher.delay(business, 1, Duration::from_millis(50));
        let paginator = Paginator::new(fetcher.clone()).with_page_size(1);

        let mut session = FeedSession::new();
        let first = session.next_ticket().unwrap();
        let second = session.next_ticket().unwrap();

        let (r1, r2) = tokio::join!(first.fetch(&paginator), second.fetch(&paginator));
        assert_eq!(session.complete(&second, r2), Completion::Buffered);
        assert_eq!(session.complete(&first, r1), Completion::Applied { appended: 2 });
        assert_eq!(urls(&session), vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_load_next_uses_search_when_query_set() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.respond(
            FeedQuery::Search("ai".into()),
            1,
            Scripted::Page(vec![article("s", "2024-01-01", "Wired")]),
        );
        let paginator = Paginator::new(fetcher.clone());

        let mut session = FeedSession::new();
        session.dispatch(SessionAction::SetQuery("ai".into()));
        let done = session.load_next(&paginator).await;

        assert_eq!(done, Completion::Applied { appended: 1 });
        assert!(session.is_exhausted());
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_load_next_after_last_page_is_exhausted() {
        let fetcher = Arc::new(FakeFetcher::default());
        let paginator = Paginator::new(fetcher.clone());

        let mut session = FeedSession::new();
        let first = session.load_next(&paginator).await;
        assert_eq!(first, Completion::Applied { appended: 0 });
        assert!(session.is_exhausted());

        assert_eq!(session.load_next(&paginator).await, Completion::Exhausted);
        assert_eq!(fetcher.call_count(), 2);
    }
}
