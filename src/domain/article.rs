use serde::{Deserialize, Serialize};

/// Publisher of an article as reported by the news API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Canonical URL. Doubles as the dedup and bookmark key.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    /// Raw ISO-8601 string from the API. Left unparsed; may be malformed.
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(skip)]
    pub bookmarked: bool,
}

impl Article {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }

    pub fn source_name(&self) -> &str {
        self.source.name.as_deref().unwrap_or("")
    }

    /// Body text for a detail view.
    ///
    /// The API truncates `content` with a `[+1234 chars]` marker; everything
    /// from the marker on is dropped. Falls back to the description.
    pub fn full_content(&self) -> Option<&str> {
        let content = self
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.split('[').next().unwrap_or(c).trim_end());

        content
            .filter(|c| !c.is_empty())
            .or_else(|| {
                self.description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
            })
    }

    /// Date part of the raw timestamp, e.g. `2024-01-02`.
    pub fn published_date(&self) -> &str {
        self.published_at
            .as_deref()
            .map(|s| s.split('T').next().unwrap_or(s))
            .unwrap_or("")
    }
}
