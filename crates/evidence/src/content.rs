//! Content collaborators.
//!
//! [`FileContentSource`] reads the JSON files under a content root:
//!
//! ```text
//! <root>/projects/projects.json
//! <root>/resume/derived.json
//! <root>/now/entries.json
//! <root>/search-index.json
//! ```
//!
//! A missing or unparseable file never fails a request; it is logged and the
//! collaborator answers with empty defaults instead.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vouch_core::content::{
    ActivityEntry, ActivityFeed, ContentSource, ProjectIndex, ProjectMeta, ResumeDerived, SearchDoc,
    SearchDocKind,
};
use vouch_core::error::ContentError;

/// Reads content records from JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FileContentSource {
    root: PathBuf,
}

impl FileContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects_path(&self) -> PathBuf {
        self.root.join("projects").join("projects.json")
    }

    pub fn resume_path(&self) -> PathBuf {
        self.root.join("resume").join("derived.json")
    }

    pub fn activity_path(&self) -> PathBuf {
        self.root.join("now").join("entries.json")
    }

    pub fn search_index_path(&self) -> PathBuf {
        self.root.join("search-index.json")
    }

    /// Strict read: surfaces missing files and parse failures.
    pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ContentError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| ContentError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Lenient read: any failure falls back to `T::default()`.
    async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
        match Self::read_json(path).await {
            Ok(value) => {
                debug!(path = %path.display(), "Loaded content file");
                value
            }
            Err(e) => {
                warn!(error = %e, "Content unavailable, using defaults");
                T::default()
            }
        }
    }
}

/// Pinned first, then most stars, then name.
pub fn sort_projects(projects: &mut [ProjectMeta]) {
    projects.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.stars.cmp(&a.stars))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Section documents used when no search index has been built.
pub fn default_section_docs() -> Vec<SearchDoc> {
    vec![
        SearchDoc {
            id: "section:proof".into(),
            kind: SearchDocKind::Section,
            title: "Proof".into(),
            url: "/#proof".into(),
            tags: vec!["timeline".into(), "skills".into(), "metrics".into()],
            body: "Impact timeline, systems counters, and skills graph.".into(),
        },
        SearchDoc {
            id: "section:projects".into(),
            kind: SearchDocKind::Section,
            title: "Projects".into(),
            url: "/#projects".into(),
            tags: vec!["case-study".into(), "github".into(), "portfolio".into()],
            body: "Flagship projects and artifacts.".into(),
        },
    ]
}

#[async_trait]
impl ContentSource for FileContentSource {
    async fn projects(&self) -> Result<Vec<ProjectMeta>, ContentError> {
        let index: ProjectIndex = Self::read_json_or_default(&self.projects_path()).await;
        let mut projects = index.projects;
        sort_projects(&mut projects);
        Ok(projects)
    }

    async fn resume(&self) -> Result<ResumeDerived, ContentError> {
        Ok(Self::read_json_or_default(&self.resume_path()).await)
    }

    async fn activity(&self) -> Result<Vec<ActivityEntry>, ContentError> {
        let feed: ActivityFeed = Self::read_json_or_default(&self.activity_path()).await;
        Ok(feed.entries)
    }

    async fn search_docs(&self) -> Result<Vec<SearchDoc>, ContentError> {
        let docs: Vec<SearchDoc> = Self::read_json_or_default(&self.search_index_path()).await;
        if docs.is_empty() {
            return Ok(default_section_docs());
        }
        Ok(docs)
    }
}

/// Serves fixed records from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticContentSource {
    pub projects: Vec<ProjectMeta>,
    pub resume: ResumeDerived,
    pub activity: Vec<ActivityEntry>,
    pub search_docs: Vec<SearchDoc>,
}

#[async_trait]
impl ContentSource for StaticContentSource {
    async fn projects(&self) -> Result<Vec<ProjectMeta>, ContentError> {
        Ok(self.projects.clone())
    }

    async fn resume(&self) -> Result<ResumeDerived, ContentError> {
        Ok(self.resume.clone())
    }

    async fn activity(&self) -> Result<Vec<ActivityEntry>, ContentError> {
        Ok(self.activity.clone())
    }

    async fn search_docs(&self) -> Result<Vec<SearchDoc>, ContentError> {
        Ok(self.search_docs.clone())
    }
}
