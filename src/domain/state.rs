//! Browsing session state: filters, sort preference and search query.
//!
//! [`SessionState`] is an immutable value. Every user action is a
//! [`SessionAction`] fed through [`SessionState::reduce`], which returns the
//! next state and leaves the previous one untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two logical feeds the merged list is built from.
///
/// Ordering is feed priority: when the same article appears in both feeds,
/// the copy from the earlier category wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Technology,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Business, Category::Technology];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Technology => "technology",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Business => f.write_str("Business"),
            Category::Technology => f.write_str("Technology"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "business" => Ok(Category::Business),
            "technology" | "tech" => Ok(Category::Technology),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Sort order plus whether the user picked it.
///
/// `user_selected` lets a caller tell "default newest-first" apart from
/// "user explicitly chose newest-first".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortPreference {
    pub order: SortOrder,
    pub user_selected: bool,
}

/// Empty sets mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub categories: BTreeSet<Category>,
    pub sources: BTreeSet<String>,
}

impl FilterState {
    pub fn new<C, S>(categories: C, sources: S) -> Self
    where
        C: IntoIterator<Item = Category>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            categories: categories.into_iter().collect(),
            sources: sources
                .into_iter()
                .map(|s| {
                    let s: String = s.into();
                    s.trim().to_string()
                })
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.categories.is_empty() || !self.sources.is_empty()
    }

    /// Whether the feed for `category` should be queried at all.
    pub fn includes_category(&self, category: Category) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

/// What a filter chip row would show: selected categories, selected sources,
/// and whether anything is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSummary {
    pub categories: Vec<Category>,
    pub sources: Vec<String>,
    pub any_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    SetSort(SortOrder),
    ResetSort,
    ApplyFilters(FilterState),
    ToggleSource { source: String, checked: bool },
    ClearFilters,
    SetQuery(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub filter: FilterState,
    pub sort: SortPreference,
    pub query: String,
}

impl SessionState {
    pub fn reduce(&self, action: SessionAction) -> SessionState {
        let mut next = self.clone();
        match action {
            SessionAction::SetSort(order) => {
                next.sort = SortPreference {
                    order,
                    user_selected: true,
                };
            }
            SessionAction::ResetSort => {
                next.sort = SortPreference::default();
            }
            SessionAction::ApplyFilters(filter) => {
                next.filter = filter;
            }
            SessionAction::ToggleSource { source, checked } => {
                let source = source.trim().to_string();
                if !source.is_empty() {
                    if checked {
                        next.filter.sources.insert(source);
                    } else {
                        next.filter.sources.remove(&source);
                    }
                }
            }
            SessionAction::ClearFilters => {
                next.filter = FilterState::default();
            }
            SessionAction::SetQuery(query) => {
                next.query = query.trim().to_string();
            }
        }
        next
    }

    pub fn has_active_filters(&self) -> bool {
        self.filter.is_active()
    }

    pub fn filter_summary(&self) -> FilterSummary {
        FilterSummary {
            categories: self.filter.categories.iter().copied().collect(),
            sources: self.filter.sources.iter().cloned().collect(),
            any_active: self.filter.is_active(),
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }
}
