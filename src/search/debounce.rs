//! Keystroke debouncing.
//!
//! Non-empty input is committed once no new input has arrived for the quiet
//! window. The empty string commits at once so clearing a search snaps back
//! without delay. A commit equal to the previous one is suppressed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Clock-driven debounce state, free of any task or channel.
#[derive(Debug, Clone)]
pub struct DebounceState {
    window: Duration,
    pending: Option<(String, Instant)>,
    committed: String,
}

impl DebounceState {
    /// The committed value starts out empty, i.e. "no search".
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            committed: String::new(),
        }
    }

    /// Feed a raw input. Returns a commit only for an immediate (empty) one.
    pub fn input(&mut self, raw: &str, now: Instant) -> Option<String> {
        let query = raw.trim();
        if query.is_empty() {
            self.pending = None;
            return self.commit(String::new());
        }
        self.pending = Some((query.to_string(), now + self.window));
        None
    }

    /// When the pending input becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Commit the pending input if its window has elapsed.
    pub fn fire(&mut self, now: Instant) -> Option<String> {
        if !self.deadline().is_some_and(|at| at <= now) {
            return None;
        }
        let (query, _) = self.pending.take()?;
        self.commit(query)
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    fn commit(&mut self, query: String) -> Option<String> {
        if query == self.committed {
            return None;
        }
        self.committed = query.clone();
        Some(query)
    }
}

/// Debouncer running on its own task: raw strings in, commits out.
///
/// For callers that only need the committed text, e.g. to drive a local
/// filter box. [`SearchController`](crate::search::SearchController) embeds
/// [`DebounceState`] directly so it can cancel requests between commits.
///
/// ```no_run
/// # async fn demo() {
/// use newsreel::search::{Debouncer, DEFAULT_DEBOUNCE};
///
/// let (debouncer, mut commits) = Debouncer::spawn(DEFAULT_DEBOUNCE);
/// debouncer.push("ru");
/// debouncer.push("rust");
/// assert_eq!(commits.recv().await.as_deref(), Some("rust"));
/// # }
/// ```
pub struct Debouncer {
    tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Debouncer {
    pub fn spawn(window: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(DebounceState::new(window), rx, out_tx));
        (Self { tx, task }, out_rx)
    }

    pub fn push(&self, raw: impl Into<String>) {
        let _ = self.tx.send(raw.into());
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut state: DebounceState,
    mut rx: mpsc::UnboundedReceiver<String>,
    out: mpsc::UnboundedSender<String>,
) {
    loop {
        let deadline = state.deadline();
        let commit = tokio::select! {
            biased;
            raw = rx.recv() => match raw {
                Some(raw) => state.input(&raw, Instant::now()),
                None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                state.fire(Instant::now())
            }
        };

        if let Some(query) = commit {
            tracing::debug!("Search query committed: {:?}", query);
            if out.send(query).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[test]
    fn test_state_commits_after_window() {
        let start = Instant::now();
        let mut state = DebounceState::new(WINDOW);

        assert_eq!(state.input("a", start), None);
        assert_eq!(state.input("ab", start + Duration::from_millis(100)), None);
        assert_eq!(state.fire(start + Duration::from_millis(399)), None);
        assert_eq!(
            state.fire(start + Duration::from_millis(400)),
            Some("ab".to_string())
        );
        assert_eq!(state.deadline(), None);
        assert_eq!(state.committed(), "ab");
    }

    #[test]
    fn test_state_suppresses_duplicate_commit() {
        let start = Instant::now();
        let mut state = DebounceState::new(WINDOW);
        state.input("rust", start);
        assert!(state.fire(start + WINDOW).is_some());

        state.input("rus", start + WINDOW);
        state.input("rust", start + WINDOW + Duration::from_millis(50));
        assert_eq!(state.fire(start + WINDOW * 3), None);
    }

    #[test]
    fn test_state_empty_commits_immediately() {
        let start = Instant::now();
        let mut state = DebounceState::new(WINDOW);
        state.input("rust", start);
        state.fire(start + WINDOW);

        state.input("rusty", start + WINDOW);
        assert_eq!(state.input("   ", start + WINDOW), Some(String::new()));
        assert_eq!(state.deadline(), None);
        assert_eq!(state.input("", start + WINDOW), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_commits_once() {
        let (debouncer, mut commits) = Debouncer::spawn(WINDOW);
        let start = Instant::now();

        debouncer.push("a");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("ab");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.push("abc");

        let committed = commits.recv().await.unwrap();
        assert_eq!(committed, "abc");
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        let more = tokio::time::timeout(Duration::from_secs(5), commits.recv()).await;
        assert!(more.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_is_not_delayed() {
        let (debouncer, mut commits) = Debouncer::spawn(WINDOW);

        debouncer.push("news");
        assert_eq!(commits.recv().await.unwrap(), "news");

        let cleared_at = Instant::now();
        debouncer.push("");
        assert_eq!(commits.recv().await.unwrap(), "");
        assert_eq!(cleared_at.elapsed(), Duration::ZERO);
    }
}
