//! Evidence context building.
//!
//! Maps collaborator records into one deduplicated pool of
//! [`EvidenceItem`]s, in the order projects, résumé, activity, sections,
//! and derives the skill universe used for priority-skill inference.

use crate::sanitize::to_title_case;
use crate::text::{compact_snippet, normalize, tokenize};
use std::collections::HashSet;
use tracing::debug;
use vouch_core::content::{ActivityEntry, ContentSource, ProjectMeta, ResumeDerived, SearchDoc, SearchDocKind};
use vouch_core::error::ContentError;
use vouch_core::evidence::{EvidenceItem, SourceKind};

/// Project stack entries that count as tags and skills.
const STACK_PREFIX: usize = 8;
/// Activity entries considered per request.
const ACTIVITY_LIMIT: usize = 16;
const ROLE_TAG_LIMIT: usize = 16;
const ACTIVITY_TAG_LIMIT: usize = 12;

/// Skills assumed when no content declares any.
pub const FALLBACK_SKILLS: &[&str] = &["data", "analytics", "ai", "python", "sql", "dbt"];

/// Everything the generation engine needs from content, built per request.
#[derive(Debug, Clone, Default)]
pub struct EvidenceContext {
    pub evidence: Vec<EvidenceItem>,
    pub projects: Vec<ProjectMeta>,
    pub skill_universe: Vec<String>,
}

/// Load all collaborators and build the evidence pool.
pub async fn build_evidence_context(
    source: &dyn ContentSource,
) -> Result<EvidenceContext, ContentError> {
    let (projects, resume, activity, search_docs) = tokio::try_join!(
        source.projects(),
        source.resume(),
        source.activity(),
        source.search_docs()
    )?;

    let context = assemble(projects, &resume, &activity, &search_docs);
    debug!(
        evidence = context.evidence.len(),
        projects = context.projects.len(),
        skills = context.skill_universe.len(),
        "Built evidence context"
    );
    Ok(context)
}

/// Pure mapping from collaborator records to an [`EvidenceContext`].
pub fn assemble(
    projects: Vec<ProjectMeta>,
    resume: &ResumeDerived,
    activity: &[ActivityEntry],
    search_docs: &[SearchDoc],
) -> EvidenceContext {
    let mut pool = Vec::new();
    pool.extend(projects.iter().map(project_evidence));
    pool.extend(resume_evidence(resume));
    pool.extend(activity.iter().take(ACTIVITY_LIMIT).map(activity_evidence));
    pool.extend(
        search_docs
            .iter()
            .filter(|doc| doc.kind == SearchDocKind::Section)
            .map(section_evidence),
    );

    let skill_universe = skill_universe(resume, &projects);

    EvidenceContext {
        evidence: dedupe(pool),
        projects,
        skill_universe,
    }
}

fn normalized_tags<'a>(values: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| normalize(v))
        .filter(|v| !v.is_empty())
        .collect()
}

pub fn project_evidence(project: &ProjectMeta) -> EvidenceItem {
    let lead = if project.tagline.trim().is_empty() {
        &project.description
    } else {
        &project.tagline
    };
    let snippet = compact_snippet(&format!("{} {}", lead, project.readme_highlights.join(" ")));

    EvidenceItem {
        id: format!("project:{}", project.slug),
        title: project.name.clone(),
        url: format!("/projects/{}", project.slug),
        source_kind: SourceKind::Project,
        snippet,
        tags: normalized_tags(project.tags.iter().chain(project.stack.iter().take(STACK_PREFIX))),
        project_slug: Some(project.slug.clone()),
    }
}

pub fn resume_evidence(resume: &ResumeDerived) -> Vec<EvidenceItem> {
    let clusters = resume
        .skill_clusters
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(cluster, items)| EvidenceItem {
            id: format!("resume:cluster:{cluster}"),
            title: format!("{} cluster", to_title_case(cluster)),
            url: "/resume".into(),
            source_kind: SourceKind::Resume,
            snippet: compact_snippet(&items.join(" · ")),
            tags: normalized_tags(items),
            project_slug: None,
        });

    let roles = resume.experience.iter().enumerate().map(|(index, role)| {
        let highlights = role.highlights.join(" ");
        EvidenceItem {
            id: format!("resume:role:{index}"),
            title: format!("{} @ {}", role.title, role.company),
            url: "/resume".into(),
            source_kind: SourceKind::Resume,
            snippet: compact_snippet(&highlights),
            tags: tokenize(&format!("{} {} {}", role.title, role.company, highlights))
                .into_iter()
                .take(ROLE_TAG_LIMIT)
                .collect(),
            project_slug: None,
        }
    });

    clusters.chain(roles).collect()
}

pub fn activity_evidence(entry: &ActivityEntry) -> EvidenceItem {
    let details = entry.details.join(" ");
    EvidenceItem {
        id: format!("activity:{}", entry.id),
        title: entry.category.to_uppercase(),
        url: "/archive/now".into(),
        source_kind: SourceKind::Activity,
        snippet: compact_snippet(&details),
        tags: tokenize(&format!("{} {}", entry.category, details))
            .into_iter()
            .take(ACTIVITY_TAG_LIMIT)
            .collect(),
        project_slug: None,
    }
}

pub fn section_evidence(doc: &SearchDoc) -> EvidenceItem {
    EvidenceItem {
        id: doc.id.clone(),
        title: doc.title.clone(),
        url: doc.url.clone(),
        source_kind: SourceKind::Section,
        snippet: compact_snippet(&doc.body),
        tags: normalized_tags(&doc.tags),
        project_slug: None,
    }
}

/// Keep the first item for each id.
pub fn dedupe(items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Distinct normalized skills from résumé clusters and project stacks.
pub fn skill_universe(resume: &ResumeDerived, projects: &[ProjectMeta]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut skills = Vec::new();

    let cluster_skills = resume.skill_clusters.values().flatten();
    let stack_skills = projects.iter().flat_map(|p| p.stack.iter().take(STACK_PREFIX));

    for skill in cluster_skills.chain(stack_skills) {
        let normalized = normalize(skill);
        if !normalized.is_empty() && seen.insert(normalized.clone()) {
            skills.push(normalized);
        }
    }

    if skills.is_empty() {
        skills = FALLBACK_SKILLS.iter().map(|s| s.to_string()).collect();
    }
    skills
}
