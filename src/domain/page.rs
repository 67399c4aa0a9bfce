use crate::domain::Article;

/// One batch of articles plus a continuation signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based.
    pub index: u32,
    pub articles: Vec<Article>,
    pub has_next: bool,
}

impl Page {
    pub fn empty(index: u32) -> Self {
        Self {
            index,
            articles: Vec::new(),
            has_next: false,
        }
    }

    pub fn next_index(&self) -> Option<u32> {
        self.has_next.then_some(self.index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// A raw page as returned by the remote API, before merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePage {
    pub articles: Vec<Article>,
    /// Records the server sent, counted before normalization dropped any.
    pub returned: usize,
    /// Declared by the server. Informational only; continuation uses page fill.
    pub total_results: u64,
}
