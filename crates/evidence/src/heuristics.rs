//! Deterministic signal used when the model is unavailable or its output is
//! rejected: priority-skill inference, the capability radar and heatmap, and
//! job-description skill matching.

use crate::rank::rank_evidence;
use crate::sanitize::sanitize_free_text;
use crate::text::{overlap_score, tokenize};
use std::collections::{HashMap, HashSet};
use vouch_core::content::ProjectMeta;
use vouch_core::evidence::{EvidenceItem, SourceKind};
use vouch_core::insight::{CapabilityHeatmapCell, CapabilityRadarPoint};

/// Longest skill label kept after normalizing.
pub const SKILL_MAX_LEN: usize = 80;
/// Evidence items counted per radar skill.
const RADAR_EVIDENCE_LIMIT: usize = 6;
/// Job-description tokens reported as skill candidates.
const JOB_SKILL_LIMIT: usize = 14;
const MIN_HEATMAP_STRENGTH: f64 = 0.14;

/// Lowercased, sanitized skill label used as a comparison key.
pub fn normalize_skill(value: &str) -> String {
    sanitize_free_text(&value.to_lowercase(), SKILL_MAX_LEN)
}

/// Pick up to `limit` skills to analyse.
///
/// Explicit `requested` skills win (normalized, deduped, order kept).
/// Otherwise `fallback` skills are ordered by how many evidence items mention
/// every token of the skill; ties keep `fallback` order.
pub fn infer_priority_skills(
    requested: &[String],
    fallback: &[String],
    evidence: &[EvidenceItem],
    limit: usize,
) -> Vec<String> {
    let requested = dedupe_nonempty(requested.iter().map(|s| normalize_skill(s)));
    if !requested.is_empty() {
        return requested.into_iter().take(limit).collect();
    }

    let haystacks: Vec<HashSet<String>> = evidence
        .iter()
        .map(|item| tokenize(&item.haystack()).into_iter().collect())
        .collect();

    let mut counted: Vec<(&String, usize)> = fallback
        .iter()
        .map(|skill| {
            let needle = tokenize(skill);
            let hits = if needle.is_empty() {
                0
            } else {
                haystacks
                    .iter()
                    .filter(|tokens| needle.iter().all(|t| tokens.contains(t)))
                    .count()
            };
            (skill, hits)
        })
        .collect();

    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted
        .into_iter()
        .take(limit)
        .map(|(skill, _)| skill.clone())
        .collect()
}

/// One radar point per skill, scored by how much evidence backs it.
pub fn build_capability_radar(
    skills: &[String],
    evidence: &[EvidenceItem],
) -> Vec<CapabilityRadarPoint> {
    skills
        .iter()
        .map(|skill| {
            let backing = rank_evidence(skill, evidence, RADAR_EVIDENCE_LIMIT).len();
            CapabilityRadarPoint {
                skill: skill.clone(),
                score: (35 + 11 * backing).min(100) as u8,
                confidence: round2((0.42 + 0.08 * backing as f64).min(1.0)),
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Skill × project cells for the strongest `max_per_skill` projects per skill.
///
/// A cell is emitted only when the project's own evidence item is present in
/// `evidence`, so every cell points at something the caller can show.
pub fn build_capability_heatmap(
    skills: &[String],
    projects: &[ProjectMeta],
    evidence: &[EvidenceItem],
    max_per_skill: usize,
) -> Vec<CapabilityHeatmapCell> {
    let mut by_slug: HashMap<&str, &EvidenceItem> = HashMap::new();
    for item in evidence {
        if item.source_kind == SourceKind::Project {
            if let Some(slug) = item.project_slug.as_deref() {
                by_slug.insert(slug, item);
            }
        }
    }

    let project_tokens: Vec<Vec<String>> = projects
        .iter()
        .map(|p| {
            tokenize(&format!(
                "{} {} {} {} {}",
                p.name,
                p.tagline,
                p.description,
                p.stack.join(" "),
                p.tags.join(" ")
            ))
        })
        .collect();

    let mut cells = Vec::new();
    for skill in skills {
        let needle = tokenize(skill);
        let mut ranked: Vec<(f64, &ProjectMeta)> = projects
            .iter()
            .zip(&project_tokens)
            .map(|(project, tokens)| (overlap_score(&needle, tokens), project))
            .filter(|(strength, _)| *strength > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (strength, project) in ranked.into_iter().take(max_per_skill) {
            let Some(item) = by_slug.get(project.slug.as_str()) else {
                continue;
            };
            cells.push(CapabilityHeatmapCell {
                skill: skill.clone(),
                project_slug: project.slug.clone(),
                strength: strength.clamp(MIN_HEATMAP_STRENGTH, 1.0),
                evidence_id: item.id.clone(),
            });
        }
    }
    cells
}

/// Tokens that occur more than once in a job description, most frequent
/// first, ties in order of first appearance.
pub fn extract_job_skills(job_description: &str) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokenize(job_description) {
        let count = counts.entry(token.clone()).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    let mut repeated: Vec<(String, usize)> = order
        .into_iter()
        .filter_map(|token| {
            let count = counts.get(&token).copied().unwrap_or(0);
            (count > 1).then_some((token, count))
        })
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1));
    repeated
        .into_iter()
        .take(JOB_SKILL_LIMIT)
        .map(|(token, _)| token)
        .collect()
}

/// Job skills split by whether the candidate's skill universe covers them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

pub fn compute_skill_match(job_skills: &[String], known: &[String]) -> SkillMatch {
    let known: HashSet<String> = known.iter().map(|s| normalize_skill(s)).collect();
    let (matched, missing): (Vec<String>, Vec<String>) = job_skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| !s.is_empty())
        .partition(|s| known.contains(s));

    SkillMatch {
        matched: dedupe_nonempty(matched),
        missing: dedupe_nonempty(missing),
    }
}

fn dedupe_nonempty(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn item(id: &str, snippet: &str, slug: Option<&str>) -> EvidenceItem {
        EvidenceItem {
            id: id.into(),
            title: id.to_uppercase(),
            url: format!("/{id}"),
            source_kind: if slug.is_some() {
                SourceKind::Project
            } else {
                SourceKind::Activity
            },
            snippet: snippet.into(),
            tags: vec![],
            project_slug: slug.map(str::to_string),
        }
    }

    #[test]
    fn inference_orders_by_evidence_count() {
        let evidence = vec![
            item("a", "dbt models", None),
            item("b", "more dbt tests", None),
            item("c", "dbt and sql", None),
            item("d", "writing", None),
        ];
        let inferred = infer_priority_skills(&[], &strings(&["sql", "python", "dbt"]), &evidence, 8);
        assert_eq!(inferred, vec!["dbt", "sql", "python"]);
    }

    #[test]
    fn inference_respects_limit() {
        let inferred = infer_priority_skills(&[], &strings(&["a1", "b2", "c3"]), &[], 2);
        assert_eq!(inferred, vec!["a1", "b2"]);
    }

    #[test]
    fn multi_token_skill_needs_every_token() {
        let evidence = vec![
            item("a", "machine tooling", None),
            item("b", "machine learning pipelines", None),
        ];
        let universe = strings(&["sql", "machine learning"]);
        let inferred = infer_priority_skills(&[], &universe, &evidence, 8);
        assert_eq!(inferred, vec!["machine learning", "sql"]);
    }

    #[test]
    fn requested_skills_win() {
        let requested = strings(&["  SQL ", "sql", "", "Python"]);
        let inferred = infer_priority_skills(&requested, &strings(&["dbt"]), &[], 8);
        assert_eq!(inferred, vec!["sql", "python"]);
    }

    #[test]
    fn radar_scales_with_backing_evidence() {
        let evidence: Vec<_> = (0..8)
            .map(|i| item(&format!("e{i}"), "dbt project", None))
            .collect();
        let radar = build_capability_radar(&strings(&["dbt", "rust"]), &evidence);

        assert_eq!(radar[0].skill, "dbt");
        assert_eq!(radar[0].score, 100);
        assert_eq!(radar[0].confidence, 0.9);

        assert_eq!(radar[1].score, 35);
        assert_eq!(radar[1].confidence, 0.42);
    }

    #[test]
    fn radar_partial_backing() {
        let evidence = vec![item("a", "sql reports", None), item("b", "sql tuning", None)];
        let radar = build_capability_radar(&strings(&["sql"]), &evidence);
        assert_eq!(radar[0].score, 57);
        assert_eq!(radar[0].confidence, 0.58);
    }

    fn project(slug: &str, stack: &[&str]) -> ProjectMeta {
        ProjectMeta {
            slug: slug.into(),
            name: slug.into(),
            stack: strings(stack),
            ..ProjectMeta::default()
        }
    }

    #[test]
    fn heatmap_requires_project_evidence() {
        let projects = vec![
            project("warehouse", &["dbt", "sql"]),
            project("etl", &["dbt"]),
            project("site", &["astro"]),
        ];
        let evidence = vec![item("project:warehouse", "w", Some("warehouse"))];
        let cells = build_capability_heatmap(&strings(&["dbt", "astro"]), &projects, &evidence, 4);

        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].skill, "dbt");
        assert_eq!(cells[0].project_slug, "warehouse");
        assert_eq!(cells[0].evidence_id, "project:warehouse");
        assert_eq!(cells[0].strength, 1.0);
    }

    #[test]
    fn heatmap_caps_projects_per_skill() {
        let projects: Vec<_> = (0..6).map(|i| project(&format!("p{i}"), &["sql"])).collect();
        let evidence: Vec<_> = projects
            .iter()
            .map(|p| item(&format!("project:{}", p.slug), "x", Some(p.slug.as_str())))
            .collect();
        let cells = build_capability_heatmap(&strings(&["sql"]), &projects, &evidence, 4);
        let slugs: Vec<_> = cells.iter().map(|c| c.project_slug.as_str()).collect();
        assert_eq!(slugs, vec!["p0", "p1", "p2", "p3"]);
    }

    #[test]
    fn heatmap_strength_has_floor() {
        let projects = vec![project("wide", &["sql"])];
        let evidence = vec![item("project:wide", "x", Some("wide"))];
        let skill = "sql alpha beta gamma delta epsilon zeta eta theta iota";
        let cells = build_capability_heatmap(&strings(&[skill]), &projects, &evidence, 4);
        assert_eq!(cells[0].strength, 0.14);
    }

    #[test]
    fn job_skills_are_repeated_tokens() {
        let jd = "python sql python sql kafka";
        assert_eq!(extract_job_skills(jd), vec!["python", "sql"]);

        let jd = "sql python sql python dbt dbt dbt";
        assert_eq!(extract_job_skills(jd), vec!["dbt", "sql", "python"]);
    }

    #[test]
    fn job_skills_capped() {
        let jd: String = (0..20).map(|i| format!("tool{i} tool{i} ")).collect();
        assert_eq!(extract_job_skills(&jd).len(), 14);
    }

    #[test]
    fn skill_match_splits_and_dedupes() {
        let result = compute_skill_match(
            &strings(&["SQL", "kafka", "sql", "dbt", "kafka"]),
            &strings(&["sql", "DBT", "python"]),
        );
        assert_eq!(result.matched, vec!["sql", "dbt"]);
        assert_eq!(result.missing, vec!["kafka"]);
    }
}
