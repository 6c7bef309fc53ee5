//! Keyword targets: one configured (keyword, post) pair to watch.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category tag grouping keywords for reporting (e.g. `cancer`, `cream`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Which part of the target set a job works on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Category(Category),
}

impl Scope {
    /// Whether a category belongs to this scope.
    pub fn contains(&self, category: &Category) -> bool {
        match self {
            Scope::All => true,
            Scope::Category(c) => c == category,
        }
    }

    /// Label used in summaries.
    pub fn label(&self) -> &str {
        match self {
            Scope::All => "all",
            Scope::Category(c) => c.as_str(),
        }
    }

    /// [`label`](Self::label) reduced to a single safe file-name component.
    pub fn file_label(&self) -> String {
        self.label()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl From<Option<String>> for Scope {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(id) => Scope::Category(Category(id)),
            None => Scope::All,
        }
    }
}

/// One configured row: a keyword and the post expected to surface for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTarget {
    pub category: Category,

    pub keyword: String,

    /// Raw post URL; empty means the keyword has not been published yet
    #[serde(default)]
    pub target_url: String,

    #[serde(default)]
    pub priority: String,

    /// Opaque handle used by the store to write results back (e.g. sheet row)
    #[serde(default)]
    pub row_reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_id: String,

    /// Cafe the post was published to (sheet `카페` column)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cafe: String,
}

impl KeywordTarget {
    /// Whether a post has been published for this keyword.
    pub fn has_url(&self) -> bool {
        !self.target_url.trim().is_empty()
    }
}
