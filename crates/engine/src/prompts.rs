//! Prompt construction.
//!
//! Prompts list the evidence pool one item per line so the model can only
//! cite ids it was shown.

use vouch_core::evidence::EvidenceItem;

pub const SYSTEM_PROMPT: &str = "You are Vouch, a portfolio analysis assistant that answers in strict JSON. \
Ground every statement in the evidence provided and keep output concise.";

const SCORECARD_SHAPE: &str = r#"{"summary":"string","capabilityRadar":[{"skill":"string","score":0-100,"confidence":0-1,"evidenceIds":["id"]}]}"#;

const FIT_SHAPE: &str = r#"{"fitScore":0-100,"rationale":"string","matchingEvidence":[{"id":"string","reason":"string","relevance":0-100}],"gaps":["string"],"recommendations":["string"],"confidence":0-1}"#;

const UNSPECIFIED: &str = "unspecified";

/// One `- id=.. | title=.. | ...` line per evidence item.
pub fn format_evidence(evidence: &[EvidenceItem]) -> String {
    evidence
        .iter()
        .map(|item| {
            let tags = if item.tags.is_empty() {
                "tags=none".to_string()
            } else {
                format!("tags={}", item.tags.join(","))
            };
            format!(
                "- id={} | title={} | source={} | {} | snippet={}",
                item.id, item.title, item.source_kind, tags, item.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn scorecard_prompt(
    role: Option<&str>,
    industry: Option<&str>,
    priority_skills: &[String],
    evidence: &[EvidenceItem],
) -> String {
    let skills = if priority_skills.is_empty() {
        UNSPECIFIED.to_string()
    } else {
        priority_skills.join(", ")
    };

    [
        "Assess a technical portfolio as a capability analyst.".to_string(),
        "Only use the evidence listed below. Never invent projects, links, or claims.".into(),
        "Write an executive summary that ties the target role, industry and priority skills to concrete evidence.".into(),
        "Summary rules:".into(),
        "- 110 to 170 words of plain text, no markdown".into(),
        "- open with a direct fit statement for the target role and industry".into(),
        "- name the top 3 priority skills with the signal behind each".into(),
        "- cite at least two evidence titles by name".into(),
        "- end with one weak-signal area and one practical next step".into(),
        format!("Target role: {}", role.unwrap_or(UNSPECIFIED)),
        format!("Target industry: {}", industry.unwrap_or(UNSPECIFIED)),
        format!("Priority skills: {skills}"),
        "Respond with strict JSON of this shape:".into(),
        SCORECARD_SHAPE.into(),
        "evidenceIds must come from the evidence list.".into(),
        "Evidence:".into(),
        format_evidence(evidence),
    ]
    .join("\n")
}

pub fn fit_prompt(job_description: &str, known_skills: &[String], evidence: &[EvidenceItem]) -> String {
    [
        "Evaluate how well a portfolio fits the job description below.".to_string(),
        "Only cite evidence ids from the list and skills from the known skills.".into(),
        "Respond with strict JSON of this shape:".into(),
        FIT_SHAPE.into(),
        "Keep recommendations short and concrete.".into(),
        format!("Known skills: {}", known_skills.join(", ")),
        format!("Job description: {job_description}"),
        "Evidence:".into(),
        format_evidence(evidence),
    ]
    .join("\n")
}
