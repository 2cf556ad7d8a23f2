//! Evidence items: short, sourced snippets that ground model output.

use serde::{Deserialize, Serialize};

/// Where a piece of evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Project,
    Resume,
    Activity,
    Section,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Resume => write!(f, "resume"),
            Self::Activity => write!(f, "activity"),
            Self::Section => write!(f, "section"),
        }
    }
}

/// A normalized evidence snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    /// Unique id, e.g. `project:etl-kit` or `resume:role:0`
    pub id: String,
    pub title: String,
    pub url: String,
    pub source_kind: SourceKind,
    /// Bounded-length, whitespace-normalized text
    pub snippet: String,
    /// Normalized topic tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_slug: Option<String>,
}

impl EvidenceItem {
    /// The text the ranker tokenizes: title, snippet and tags.
    pub fn haystack(&self) -> String {
        format!("{} {} {}", self.title, self.snippet, self.tags.join(" "))
    }
}
