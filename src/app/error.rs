use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NewsError>;

/// Coarse classification of why a load failed, used to pick user-facing copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCause {
    /// No connectivity, timeout, or a transport-level IO failure.
    Network,
    /// Non-2xx response or a payload that could not be decoded.
    Server,
    Unknown,
}

impl FailureCause {
    /// Higher is more specific. `Unknown` loses to anything else.
    fn specificity(self) -> u8 {
        match self {
            FailureCause::Unknown => 0,
            FailureCause::Server => 1,
            FailureCause::Network => 2,
        }
    }

    pub fn more_specific(self, other: FailureCause) -> FailureCause {
        if other.specificity() > self.specificity() {
            other
        } else {
            self
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            FailureCause::Network => "Check your internet connection and try again",
            FailureCause::Server | FailureCause::Unknown => "Something went wrong, please try again",
        }
    }
}

impl From<&NewsError> for FailureCause {
    fn from(err: &NewsError) -> Self {
        match err {
            NewsError::Http(e) if e.is_status() || e.is_decode() => FailureCause::Server,
            NewsError::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                FailureCause::Network
            }
            NewsError::Http(_) | NewsError::Io(_) => FailureCause::Network,
            NewsError::Server { .. } | NewsError::Decode(_) => FailureCause::Server,
            _ => FailureCause::Unknown,
        }
    }
}

/// A page or search load that produced nothing usable.
///
/// Retrying is always the caller's decision; nothing in the pipeline retries
/// on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LoadFailure {
    pub cause: FailureCause,
    pub message: String,
}

impl LoadFailure {
    pub fn new(cause: FailureCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.cause.user_message()
    }
}

impl From<NewsError> for LoadFailure {
    fn from(err: NewsError) -> Self {
        let cause = FailureCause::from(&err);
        Self {
            cause,
            message: err.to_string(),
        }
    }
}
