pub mod filter;
pub mod paginator;
pub mod session;
pub mod sort;
pub mod timestamp;

pub use filter::{apply_filters, ArticleFilter};
pub use paginator::Paginator;
pub use session::{Completion, FeedSession, PageTicket};
pub use sort::sort_articles;
