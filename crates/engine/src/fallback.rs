//! Heuristic results used as the base layer of every response.

use chrono::{DateTime, Utc};
use vouch_core::evidence::EvidenceItem;
use vouch_core::insight::{FitAssessment, MatchingEvidence};
use vouch_evidence::SkillMatch;
use vouch_evidence::sanitize::clamp_number;

const SUMMARY_TOP_SKILLS: usize = 3;
const SUMMARY_EVIDENCE_TITLES: usize = 2;
const FIT_GAPS: usize = 6;
const FIT_EVIDENCE: usize = 6;
const RATIONALE_MATCHED: usize = 5;
const RATIONALE_MISSING: usize = 3;

pub const HEURISTIC_EVIDENCE_REASON: &str =
    "Evidence aligns with role requirements and portfolio outcomes.";

/// Four-sentence summary built from the resolved skills and top evidence.
pub fn scorecard_summary(
    role: Option<&str>,
    industry: Option<&str>,
    skills: &[String],
    evidence: &[EvidenceItem],
) -> String {
    let role = role.unwrap_or("the target role");
    let industry = industry.unwrap_or("the target industry");

    let top_skills = if skills.is_empty() {
        "core analytics engineering skills".to_string()
    } else {
        skills
            .iter()
            .take(SUMMARY_TOP_SKILLS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    let titles: Vec<&str> = evidence
        .iter()
        .take(SUMMARY_EVIDENCE_TITLES)
        .map(|item| item.title.as_str())
        .collect();
    let evidence_sentence = if titles.is_empty() {
        "Evidence from projects and resume artifacts reinforces delivery across data systems and analytics execution.".to_string()
    } else {
        format!(
            "Evidence from {} reinforces delivery across data systems, analytics execution, and cross-functional ownership.",
            titles.join(" and ")
        )
    };

    [
        format!("For {role} in {industry}, portfolio signal is strongest around {top_skills}."),
        evidence_sentence,
        "Primary risk is uneven depth in specialized role-tailored artifacts, especially when requirements call for niche tooling.".to_string(),
        "Best next move: add one targeted case study that mirrors the target role language and includes measurable business impact.".to_string(),
    ]
    .join(" ")
}

/// Skill-overlap fit assessment. `model` is left empty for the caller.
pub fn fit_assessment(
    skill_match: &SkillMatch,
    evidence: &[EvidenceItem],
    generated_at: DateTime<Utc>,
) -> FitAssessment {
    let matched = skill_match.matched.len();
    let compared = (matched + skill_match.missing.len()).max(1);
    let fit_score = clamp_number(matched as f64 / compared as f64 * 100.0, 18.0, 96.0).round() as u8;
    let confidence = clamp_number(0.4 + 0.06 * matched as f64, 0.35, 0.92);

    let matching_evidence = evidence
        .iter()
        .take(FIT_EVIDENCE)
        .enumerate()
        .map(|(index, item)| {
            let relevance = clamp_number(92.0 - 11.0 * index as f64, 45.0, 99.0) as u8;
            MatchingEvidence::from_item(item, relevance, HEURISTIC_EVIDENCE_REASON)
        })
        .collect();

    FitAssessment {
        fit_score,
        rationale: fit_rationale(skill_match),
        matching_evidence,
        gaps: skill_match.missing.iter().take(FIT_GAPS).cloned().collect(),
        recommendations: fit_recommendations(skill_match),
        confidence,
        generated_at,
        model: String::new(),
    }
}

fn list_or(values: &[String], limit: usize, fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values
            .iter()
            .take(limit)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn fit_rationale(skill_match: &SkillMatch) -> String {
    format!(
        "Found alignment in {}. Fit is constrained by gaps in {}.",
        list_or(&skill_match.matched, RATIONALE_MATCHED, "core portfolio themes"),
        list_or(&skill_match.missing, RATIONALE_MISSING, "specialized requirements"),
    )
}

fn fit_recommendations(skill_match: &SkillMatch) -> Vec<String> {
    let first = match skill_match.missing.first() {
        Some(gap) => format!("Add a portfolio proof artifact for {gap}."),
        None => "Add one targeted case study for role-specific requirements.".to_string(),
    };
    vec![
        first,
        "Mirror job language in project summaries to improve recruiter scanning.".to_string(),
        "Attach quantified outcomes to top three matching projects.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_core::evidence::SourceKind;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn evidence(n: usize) -> Vec<EvidenceItem> {
        (0..n)
            .map(|i| EvidenceItem {
                id: format!("e{i}"),
                title: format!("Item {i}"),
                url: format!("/e{i}"),
                source_kind: SourceKind::Resume,
                snippet: "s".into(),
                tags: vec![],
                project_slug: None,
            })
            .collect()
    }

    #[test]
    fn summary_with_everything() {
        let summary = scorecard_summary(
            Some("Analytics Engineer"),
            Some("fintech"),
            &strings(&["dbt", "sql", "python", "airflow"]),
            &evidence(3),
        );
        assert!(summary.starts_with(
            "For Analytics Engineer in fintech, portfolio signal is strongest around dbt, sql, python."
        ));
        assert!(summary.contains("Evidence from Item 0 and Item 1 reinforces"));
        assert!(summary.ends_with("measurable business impact."));
    }

    #[test]
    fn summary_defaults() {
        let summary = scorecard_summary(None, None, &[], &[]);
        assert!(summary.starts_with(
            "For the target role in the target industry, portfolio signal is strongest around core analytics engineering skills."
        ));
        assert!(summary.contains("Evidence from projects and resume artifacts"));
    }

    #[test]
    fn fit_scores_and_clamps() {
        let now = Utc::now();
        let half = SkillMatch {
            matched: strings(&["sql", "dbt"]),
            missing: strings(&["kafka", "spark"]),
        };
        let fit = fit_assessment(&half, &evidence(8), now);
        assert_eq!(fit.fit_score, 50);
        assert!((fit.confidence - 0.52).abs() < 1e-9);
        assert_eq!(fit.gaps, strings(&["kafka", "spark"]));
        assert_eq!(fit.matching_evidence.len(), 6);
        let relevance: Vec<u8> = fit.matching_evidence.iter().map(|m| m.relevance).collect();
        assert_eq!(relevance, vec![92, 81, 70, 59, 48, 45]);
        assert_eq!(
            fit.rationale,
            "Found alignment in sql, dbt. Fit is constrained by gaps in kafka, spark."
        );
        assert_eq!(fit.recommendations[0], "Add a portfolio proof artifact for kafka.");

        let none = fit_assessment(&SkillMatch::default(), &[], now);
        assert_eq!(none.fit_score, 18);
        assert!((none.confidence - 0.4).abs() < 1e-9);
        assert_eq!(
            none.rationale,
            "Found alignment in core portfolio themes. Fit is constrained by gaps in specialized requirements."
        );
        assert_eq!(
            none.recommendations[0],
            "Add one targeted case study for role-specific requirements."
        );

        let all = SkillMatch {
            matched: strings(&["sql"]),
            missing: vec![],
        };
        assert_eq!(fit_assessment(&all, &[], now).fit_score, 96);
    }
}
