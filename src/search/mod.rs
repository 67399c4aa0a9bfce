pub mod controller;
pub mod debounce;

pub use controller::{SearchController, SearchHandle, SearchOutcome};
pub use debounce::{DebounceState, Debouncer, DEFAULT_DEBOUNCE};
