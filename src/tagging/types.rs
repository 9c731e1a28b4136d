//! Shared types for identifier assignment.

use serde::{Deserialize, Serialize};

/// The numbering sequence a story belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The single sequence of a prefix scheme.
    Implicit,
    /// A named sequence of a categorized scheme, e.g. `API`.
    Code(String),
}

impl Category {
    pub fn code(code: impl Into<String>) -> Self {
        Category::Code(code.into())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Implicit => write!(f, "(default)"),
            Category::Code(code) => write!(f, "{}", code),
        }
    }
}

/// An identifier embedded in a story title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub category: Category,
    pub number: u64,
}

impl Identifier {
    pub fn new(category: Category, number: u64) -> Self {
        Self { category, number }
    }
}

/// One entry of a categorized scheme: the code written into titles and the
/// human-readable label that selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub code: String,
    pub label: String,
}

impl CategoryDef {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }

    /// Parse a `CODE=label` mapping.
    pub fn parse(entry: &str) -> Option<Self> {
        let (code, label) = entry.split_once('=')?;
        Self::new(code, label).normalized()
    }

    /// Trimmed copy, or `None` when the code or label is blank.
    pub fn normalized(&self) -> Option<Self> {
        let (code, label) = (self.code.trim(), self.label.trim());
        if code.is_empty() || label.is_empty() {
            return None;
        }
        Some(Self::new(code, label))
    }
}

/// How identifiers look and which sequences exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggingScheme {
    /// One implicit sequence: `PROJ12 - Title`.
    Prefix(String),
    /// One sequence per category code: `API-3: Title`.
    Categorized(Vec<CategoryDef>),
}

impl TaggingScheme {
    pub fn is_categorized(&self) -> bool {
        matches!(self, TaggingScheme::Categorized(_))
    }
}
