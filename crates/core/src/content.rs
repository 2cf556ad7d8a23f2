//! Content collaborator records and the `ContentSource` trait.
//!
//! These are the native records the evidence builder maps into
//! [`EvidenceItem`](crate::evidence::EvidenceItem)s. Field names follow the
//! camelCase JSON files the site ships, and every field is defaulted so a
//! partially filled file still loads.

use crate::error::ContentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A portfolio project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectMeta {
    pub slug: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub tags: Vec<String>,
    pub stack: Vec<String>,
    pub repo_url: String,
    pub pinned: bool,
    pub stars: u32,
    pub readme_highlights: Vec<String>,
}

/// Wrapper matching `projects/projects.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectIndex {
    pub updated_at: String,
    pub projects: Vec<ProjectMeta>,
}

/// One role on the résumé.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeRole {
    pub title: String,
    pub company: String,
    pub start: String,
    pub end: String,
    pub highlights: Vec<String>,
}

/// Structured data derived from the résumé.
///
/// `skill_clusters` is an ordered map so cluster evidence ids are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDerived {
    pub name: Option<String>,
    pub about: String,
    pub experience: Vec<ResumeRole>,
    pub skills: Vec<String>,
    pub skill_clusters: BTreeMap<String, Vec<String>>,
}

/// A journal / "now" activity entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityEntry {
    pub id: String,
    pub date: String,
    pub category: String,
    pub details: Vec<String>,
}

/// Wrapper matching `now/entries.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityFeed {
    pub expire_days: u32,
    pub entries: Vec<ActivityEntry>,
}

/// The kind of a pre-built search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchDocKind {
    Project,
    Section,
    Now,
}

/// A pre-built search index document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDoc {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SearchDocKind,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body: String,
}

/// A provider of the records evidence is built from.
///
/// Implementations may cache; the evidence builder calls every method once
/// per admitted request.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Projects in display order.
    async fn projects(&self) -> Result<Vec<ProjectMeta>, ContentError>;

    /// Résumé-derived data.
    async fn resume(&self) -> Result<ResumeDerived, ContentError>;

    /// Recent activity entries, newest first.
    async fn activity(&self) -> Result<Vec<ActivityEntry>, ContentError>;

    /// Pre-built search documents.
    async fn search_docs(&self) -> Result<Vec<SearchDoc>, ContentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_parses_with_missing_fields() {
        let json = r#"{"slug":"etl","name":"ETL Kit","stack":["python","dbt"]}"#;
        let project: ProjectMeta = serde_json::from_str(json).unwrap();
        assert_eq!(project.slug, "etl");
        assert!(project.tags.is_empty());
        assert!(!project.pinned);
    }

    #[test]
    fn resume_clusters_keep_key_order() {
        let json = r#"{"skillClusters":{"data":["sql"],"ai":["llm"]}}"#;
        let resume: ResumeDerived = serde_json::from_str(json).unwrap();
        let keys: Vec<_> = resume.skill_clusters.keys().cloned().collect();
        assert_eq!(keys, vec!["ai", "data"]);
    }

    #[test]
    fn search_doc_reads_type_field() {
        let json = r#"{"id":"section:proof","type":"Section","title":"Proof","url":"/#proof"}"#;
        let doc: SearchDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.kind, SearchDocKind::Section);
        assert!(doc.body.is_empty());
    }
}
