//! Generated insight payloads returned to callers.
//!
//! Every payload here is always fully populated: the engine builds a
//! deterministic heuristic version first and only overlays validated model
//! output on top of it.

use crate::evidence::{EvidenceItem, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One skill on the capability radar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRadarPoint {
    pub skill: String,
    /// 0–100
    pub score: u8,
    /// 0.0–1.0
    pub confidence: f64,
}

/// Which project evidence supports which priority skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityHeatmapCell {
    pub skill: String,
    pub project_slug: String,
    /// 0.14–1.0
    pub strength: f64,
    pub evidence_id: String,
}

/// The capability scorecard response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalScorecard {
    pub capability_radar: Vec<CapabilityRadarPoint>,
    pub heatmap: Vec<CapabilityHeatmapCell>,
    pub evidence: Vec<EvidenceItem>,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
}

/// An evidence item cited in a fit assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingEvidence {
    pub evidence_id: String,
    pub title: String,
    pub url: String,
    pub source_kind: SourceKind,
    /// 0–100
    pub relevance: u8,
    pub reason: String,
}

impl MatchingEvidence {
    pub fn from_item(item: &EvidenceItem, relevance: u8, reason: impl Into<String>) -> Self {
        Self {
            evidence_id: item.id.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            source_kind: item.source_kind,
            relevance: relevance.min(100),
            reason: reason.into(),
        }
    }
}

/// The opportunity-fit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitAssessment {
    /// 0–100
    pub fit_score: u8,
    pub rationale: String,
    pub matching_evidence: Vec<MatchingEvidence>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    /// 0.0–1.0
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> EvidenceItem {
        EvidenceItem {
            id: "project:etl".into(),
            title: "ETL Kit".into(),
            url: "/projects/etl".into(),
            source_kind: SourceKind::Project,
            snippet: "Batch pipelines with dbt".into(),
            tags: vec!["dbt".into()],
            project_slug: Some("etl".into()),
        }
    }

    #[test]
    fn matching_evidence_copies_item_fields() {
        let m = MatchingEvidence::from_item(&item(), 150, "aligned");
        assert_eq!(m.evidence_id, "project:etl");
        assert_eq!(m.source_kind, SourceKind::Project);
        assert_eq!(m.relevance, 100);
    }

    #[test]
    fn fit_serializes_camel_case() {
        let fit = FitAssessment {
            fit_score: 72,
            rationale: "Strong dbt signal".into(),
            matching_evidence: vec![MatchingEvidence::from_item(&item(), 92, "aligned")],
            gaps: vec!["spark".into()],
            recommendations: vec![],
            confidence: 0.52,
            generated_at: Utc::now(),
            model: "heuristic".into(),
        };
        let json = serde_json::to_value(&fit).unwrap();
        assert_eq!(json["fitScore"], 72);
        assert_eq!(json["matchingEvidence"][0]["evidenceId"], "project:etl");
        assert_eq!(json["matchingEvidence"][0]["sourceKind"], "project");
        assert!(json.get("generatedAt").is_some());
    }
}
