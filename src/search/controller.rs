use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};

use crate::app::{FailureCause, LoadFailure};
use crate::domain::{Article, FilterState, Page, SortOrder};
use crate::pipeline::Paginator;
use crate::search::debounce::DebounceState;

/// Result of one committed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Generation of the input that produced this outcome.
    pub generation: u64,
    /// Empty when the search was cleared.
    pub query: String,
    pub articles: Vec<Article>,
    pub has_next: bool,
    /// Set when the request failed; `articles` is then empty.
    pub error: Option<LoadFailure>,
}

impl SearchOutcome {
    pub fn cleared(generation: u64) -> Self {
        Self {
            generation,
            query: String::new(),
            articles: Vec::new(),
            has_next: false,
            error: None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.query.is_empty()
    }

    fn from_result(generation: u64, query: String, result: Result<Page, LoadFailure>) -> Self {
        match result {
            Ok(page) => Self {
                generation,
                query,
                articles: page.articles,
                has_next: page.has_next,
                error: None,
            },
            Err(failure) => Self {
                generation,
                query,
                articles: Vec::new(),
                has_next: false,
                error: Some(failure),
            },
        }
    }
}

enum Command {
    Input { raw: String, generation: u64 },
    Configure { filter: FilterState, order: SortOrder },
}

/// Caller side of a running [`SearchController`].
#[derive(Clone)]
pub struct SearchHandle {
    tx: mpsc::UnboundedSender<Command>,
    generation: Arc<AtomicU64>,
}

impl SearchHandle {
    /// Send one keystroke's worth of query text.
    pub fn input(&self, raw: impl Into<String>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.tx.send(Command::Input {
            raw: raw.into(),
            generation,
        });
    }

    /// Filter and sort applied to subsequent searches. Re-runs the committed
    /// search, if any.
    pub fn configure(&self, filter: FilterState, order: SortOrder) {
        let _ = self.tx.send(Command::Configure { filter, order });
    }

    /// Whether no input has been sent since `outcome` was produced.
    pub fn is_current(&self, outcome: &SearchOutcome) -> bool {
        outcome.generation == self.generation.load(Ordering::SeqCst)
    }
}

struct InFlight {
    generation: u64,
    query: String,
    handle: JoinHandle<Result<Page, LoadFailure>>,
}

/// Debounced search with at most one request in flight.
///
/// Every raw input aborts the in-flight request; a commit starts a new one.
/// Settling back on a committed query whose results were never delivered
/// starts it again.
pub struct SearchController {
    paginator: Arc<Paginator>,
    debounce: DebounceState,
    filter: FilterState,
    order: SortOrder,
    generation: Arc<AtomicU64>,
    latest: u64,
    /// Whether the committed query's outcome reached the receiver.
    delivered: bool,
}

impl SearchController {
    pub fn spawn(
        paginator: Arc<Paginator>,
        window: Duration,
    ) -> (SearchHandle, mpsc::Receiver<SearchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::channel(32);
        let generation = Arc::new(AtomicU64::new(0));

        let controller = Self {
            paginator,
            debounce: DebounceState::new(window),
            filter: FilterState::default(),
            order: SortOrder::default(),
            generation: generation.clone(),
            latest: 0,
            delivered: true,
        };
        tokio::spawn(controller.run(rx, out_tx));

        (SearchHandle { tx, generation }, out_rx)
    }

    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        out: mpsc::Sender<SearchOutcome>,
    ) {
        let mut in_flight: Option<InFlight> = None;

        loop {
            let deadline = self.debounce.deadline();
            tokio::select! {
                biased;
                command = rx.recv() => match command {
                    Some(Command::Input { raw, generation }) => {
                        self.latest = generation;
                        cancel(&mut in_flight);
                        if self.debounce.input(&raw, Instant::now()).is_some() {
                            self.delivered = true;
                            if out.send(SearchOutcome::cleared(generation)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Command::Configure { filter, order }) => {
                        self.filter = filter;
                        self.order = order;
                        let committed = self.debounce.committed().to_string();
                        if !committed.is_empty() {
                            cancel(&mut in_flight);
                            in_flight = Some(self.start(committed));
                        }
                    }
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(query) = self.debounce.fire(Instant::now()) {
                        in_flight = Some(self.start(query));
                    } else if self.debounce.deadline().is_none()
                        && !self.delivered
                        && !self.debounce.committed().is_empty()
                    {
                        let committed = self.debounce.committed().to_string();
                        tracing::debug!("Restarting undelivered search for {:?}", committed);
                        in_flight = Some(self.start(committed));
                    }
                }
                joined = join_in_flight(&mut in_flight), if in_flight.is_some() => {
                    let Some(finished) = in_flight.take() else {
                        continue;
                    };
                    let result = joined.unwrap_or_else(|e| {
                        Err(LoadFailure::new(FailureCause::Unknown, e.to_string()))
                    });
                    if finished.generation != self.generation.load(Ordering::SeqCst) {
                        tracing::debug!("Discarding stale results for {:?}", finished.query);
                        continue;
                    }
                    let outcome = SearchOutcome::from_result(finished.generation, finished.query, result);
                    self.delivered = true;
                    if out.send(outcome).await.is_err() {
                        break;
                    }
                }
            }
        }

        cancel(&mut in_flight);
    }

    fn start(&mut self, query: String) -> InFlight {
        self.delivered = false;
        tracing::info!("Searching for {:?}", query);
        let paginator = self.paginator.clone();
        let filter = self.filter.clone();
        let order = self.order;
        let q = query.clone();
        let handle = tokio::spawn(async move {
            paginator.load_search_page(&q, 1, &filter, order).await
        });
        InFlight {
            generation: self.latest,
            query,
            handle,
        }
    }
}

fn cancel(in_flight: &mut Option<InFlight>) {
    if let Some(previous) = in_flight.take() {
        previous.handle.abort();
        tracing::debug!("Cancelled search for {:?}", previous.query);
    }
}

async fn join_in_flight(
    in_flight: &mut Option<InFlight>,
) -> Result<Result<Page, LoadFailure>, JoinError> {
    match in_flight {
        Some(current) => (&mut current.handle).await,
        None => std::future::pending().await,
    }
}
