//! The generation pipeline shared by scorecards and fit assessments.
//!
//! Every request follows the same steps:
//!
//! 1. **Build context** from the content source
//! 2. **Rank** the evidence pool against the request
//! 3. **Compute** a complete heuristic result
//! 4. **Ask the model** for a JSON refinement
//! 5. **Overlay** validated model fields onto the heuristic
//!
//! A malformed model reply never fails a request; an upstream failure does.

use crate::fallback;
use crate::prompts;
use crate::request::{FitRequest, JOB_DESCRIPTION_MAX_LEN, ScorecardRequest};
use crate::schema::{self, FitOutput, RadarOutput};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use vouch_core::content::ContentSource;
use vouch_core::error::{ContentError, ProviderError};
use vouch_core::evidence::EvidenceItem;
use vouch_core::insight::{CapabilityRadarPoint, FitAssessment, MatchingEvidence, SignalScorecard};
use vouch_core::message::Message;
use vouch_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use vouch_evidence::sanitize::{clamp_number, sanitize_free_text};
use vouch_evidence::{
    build_capability_heatmap, build_capability_radar, build_evidence_context, compute_skill_match,
    extract_job_skills, infer_priority_skills, normalize_skill, rank_evidence,
};

const PRIORITY_SKILL_LIMIT: usize = 8;
const RANKED_EVIDENCE_LIMIT: usize = 16;
const HEATMAP_PROJECTS_PER_SKILL: usize = 4;
const KNOWN_SKILLS_IN_PROMPT: usize = 80;

const SUMMARY_MAX_LEN: usize = 920;
const RATIONALE_MAX_LEN: usize = 520;
const GAP_MAX_LEN: usize = 120;
const RECOMMENDATION_MAX_LEN: usize = 140;
const REASON_MAX_LEN: usize = 200;
const MODEL_LIST_MAX: usize = 8;

/// A generated payload with the token usage it cost.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub payload: T,
    pub usage: Usage,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Upstream model call failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Evidence unavailable: {0}")]
    Content(#[from] ContentError),
}

impl EngineError {
    /// Whether the failure looks like the upstream ran out of quota.
    pub fn is_quota_like(&self) -> bool {
        match self {
            Self::Upstream(ProviderError::RateLimited { .. }) => true,
            Self::Upstream(e) => {
                let text = e.to_string().to_lowercase();
                ["quota", "rate", "limit"].iter().any(|k| text.contains(k))
            }
            Self::Content(_) => false,
        }
    }
}

/// Produces scorecards and fit assessments grounded in portfolio evidence.
pub struct Engine {
    provider: Arc<dyn Provider>,
    content: Arc<dyn ContentSource>,
    model: String,
    temperature: f32,
}

impl Engine {
    pub fn new(
        provider: Arc<dyn Provider>,
        content: Arc<dyn ContentSource>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            content,
            model: model.into(),
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn from_config(
        config: &vouch_config::AppConfig,
        provider: Arc<dyn Provider>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        Self::new(provider, content, config.provider.model.clone())
            .with_temperature(config.provider.temperature)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Capability radar, heatmap and summary for an optional role/industry.
    pub async fn generate_scorecard(
        &self,
        request: &ScorecardRequest,
    ) -> Result<Generated<SignalScorecard>, EngineError> {
        let context = build_evidence_context(self.content.as_ref()).await?;

        let requested = request.priority_skills.clone().unwrap_or_default();
        let skills = infer_priority_skills(
            &requested,
            &context.skill_universe,
            &context.evidence,
            PRIORITY_SKILL_LIMIT,
        );

        let role = non_blank(request.role.as_deref());
        let industry = non_blank(request.industry.as_deref());
        let query = role
            .into_iter()
            .chain(industry)
            .chain(skills.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let evidence = rank_or_prefix(&query, &context.evidence);

        let mut radar = build_capability_radar(&skills, &evidence);
        let heatmap = build_capability_heatmap(
            &skills,
            &context.projects,
            &evidence,
            HEATMAP_PROJECTS_PER_SKILL,
        );
        let mut summary = fallback::scorecard_summary(role, industry, &skills, &evidence);
        debug!(
            skills = skills.len(),
            evidence = evidence.len(),
            cells = heatmap.len(),
            "Computed heuristic scorecard"
        );

        let prompt = prompts::scorecard_prompt(role, industry, &skills, &evidence);
        let response = self.complete(prompt).await?;

        match schema::parse_scorecard(&response.message.content) {
            Ok(output) => {
                let model_summary = sanitize_free_text(&output.summary, SUMMARY_MAX_LEN);
                if !model_summary.is_empty() {
                    summary = model_summary;
                }
                if let Some(points) = &output.capability_radar {
                    overlay_radar(&mut radar, points);
                }
            }
            Err(e) => debug!(error = %e, "Model scorecard rejected, keeping heuristic"),
        }

        info!(model = %response.model, tokens = response.usage.total_tokens, "Generated scorecard");
        Ok(Generated {
            payload: SignalScorecard {
                capability_radar: radar,
                heatmap,
                evidence,
                summary,
                generated_at: Utc::now(),
                model: response.model,
            },
            usage: response.usage,
        })
    }

    /// Fit score, matching evidence and gaps for a job description.
    pub async fn generate_fit(
        &self,
        request: &FitRequest,
    ) -> Result<Generated<FitAssessment>, EngineError> {
        let job_description = sanitize_free_text(&request.job_description, JOB_DESCRIPTION_MAX_LEN);
        let context = build_evidence_context(self.content.as_ref()).await?;

        let evidence = rank_or_prefix(&job_description, &context.evidence);
        let job_skills = extract_job_skills(&job_description);
        let skill_match = compute_skill_match(&job_skills, &context.skill_universe);
        let mut assessment = fallback::fit_assessment(&skill_match, &evidence, Utc::now());
        debug!(
            matched = skill_match.matched.len(),
            missing = skill_match.missing.len(),
            evidence = evidence.len(),
            "Computed heuristic fit"
        );

        let known_skills: Vec<String> = context
            .skill_universe
            .iter()
            .take(KNOWN_SKILLS_IN_PROMPT)
            .cloned()
            .collect();
        let prompt = prompts::fit_prompt(&job_description, &known_skills, &evidence);
        let response = self.complete(prompt).await?;

        match schema::parse_fit(&response.message.content) {
            Ok(output) => overlay_fit(&mut assessment, output, &evidence),
            Err(e) => debug!(error = %e, "Model fit assessment rejected, keeping heuristic"),
        }

        info!(model = %response.model, tokens = response.usage.total_tokens, "Generated fit assessment");
        assessment.model = response.model;
        Ok(Generated {
            payload: assessment,
            usage: response.usage,
        })
    }

    async fn complete(&self, user_prompt: String) -> Result<ProviderResponse, EngineError> {
        let mut request = ProviderRequest::json(
            self.model.clone(),
            vec![Message::system(prompts::SYSTEM_PROMPT), Message::user(user_prompt)],
        );
        request.temperature = self.temperature;

        self.provider.complete(request).await.map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Upstream completion failed");
            EngineError::Upstream(e)
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Ranked evidence, or the head of the pool when nothing matches.
fn rank_or_prefix(query: &str, pool: &[EvidenceItem]) -> Vec<EvidenceItem> {
    let ranked = rank_evidence(query, pool, RANKED_EVIDENCE_LIMIT);
    if ranked.is_empty() {
        return pool.iter().take(RANKED_EVIDENCE_LIMIT).cloned().collect();
    }
    ranked
}

/// Overwrite heuristic radar points the model also scored. Skills the
/// heuristic does not track are ignored.
fn overlay_radar(radar: &mut [CapabilityRadarPoint], points: &[RadarOutput]) {
    for point in points {
        let key = normalize_skill(&point.skill);
        if let Some(existing) = radar.iter_mut().find(|p| normalize_skill(&p.skill) == key) {
            existing.score = clamp_number(point.score, 0.0, 100.0).round() as u8;
            existing.confidence = clamp_number(point.confidence, 0.0, 1.0);
        }
    }
}

fn clean_list(values: &[String], max_len: usize) -> Vec<String> {
    values
        .iter()
        .map(|v| sanitize_free_text(v, max_len))
        .filter(|v| !v.is_empty())
        .take(MODEL_LIST_MAX)
        .collect()
}

fn overlay_fit(assessment: &mut FitAssessment, output: FitOutput, evidence: &[EvidenceItem]) {
    assessment.fit_score = clamp_number(output.fit_score, 0.0, 100.0).round() as u8;

    let rationale = sanitize_free_text(&output.rationale, RATIONALE_MAX_LEN);
    if !rationale.is_empty() {
        assessment.rationale = rationale;
    }
    if let Some(gaps) = &output.gaps {
        assessment.gaps = clean_list(gaps, GAP_MAX_LEN);
    }
    if let Some(recommendations) = &output.recommendations {
        assessment.recommendations = clean_list(recommendations, RECOMMENDATION_MAX_LEN);
    }
    if let Some(confidence) = output.confidence {
        assessment.confidence = clamp_number(confidence, 0.0, 1.0);
    }

    let Some(cited) = output.matching_evidence.filter(|c| !c.is_empty()) else {
        return;
    };
    let by_id: HashMap<&str, &EvidenceItem> =
        evidence.iter().map(|item| (item.id.as_str(), item)).collect();
    let resolved: Vec<MatchingEvidence> = cited
        .iter()
        .filter_map(|c| {
            let item = by_id.get(c.id.as_str())?;
            let relevance = clamp_number(c.relevance, 0.0, 100.0).round() as u8;
            Some(MatchingEvidence::from_item(
                item,
                relevance,
                sanitize_free_text(&c.reason, REASON_MAX_LEN),
            ))
        })
        .take(MODEL_LIST_MAX)
        .collect();

    if resolved.is_empty() {
        debug!(cited = cited.len(), "Model cited only unknown evidence, keeping heuristic list");
    } else {
        assessment.matching_evidence = resolved;
    }
}
