pub mod article;
pub mod bookmark;
pub mod page;
pub mod state;

pub use article::{Article, ArticleSource};
pub use bookmark::{BookmarkEvent, BookmarkedArticle};
pub use page::{Page, RemotePage};
pub use state::{
    Category, FilterState, FilterSummary, SessionAction, SessionState, SortOrder, SortPreference,
};
