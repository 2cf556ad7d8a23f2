//! Strict parsing of model output.
//!
//! The model is asked for a JSON object, but nothing it returns is trusted:
//! content is unfenced, decoded into typed structs and range-checked before
//! any of it reaches a response.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use vouch_evidence::sanitize::strip_markdown_code_fence;

#[derive(Debug, Error)]
pub enum ModelOutputError {
    #[error("model returned no content")]
    Empty,

    #[error("model output is not the expected JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model output field `{field}` {problem}")]
    Invalid { field: String, problem: String },
}

impl ModelOutputError {
    fn invalid(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarOutput {
    pub skill: String,
    pub score: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardOutput {
    pub summary: String,
    #[serde(default)]
    pub capability_radar: Option<Vec<RadarOutput>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceOutput {
    pub id: String,
    pub reason: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOutput {
    pub fit_score: f64,
    pub rationale: String,
    #[serde(default)]
    pub matching_evidence: Option<Vec<EvidenceOutput>>,
    #[serde(default)]
    pub gaps: Option<Vec<String>>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

trait Validate {
    fn validate(&self) -> Result<(), ModelOutputError>;
}

fn require_text(field: &str, value: &str) -> Result<(), ModelOutputError> {
    if value.trim().is_empty() {
        return Err(ModelOutputError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn require_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ModelOutputError> {
    if !(min..=max).contains(&value) {
        return Err(ModelOutputError::invalid(
            field,
            format!("must be within {min}..={max}, got {value}"),
        ));
    }
    Ok(())
}

impl Validate for ScorecardOutput {
    fn validate(&self) -> Result<(), ModelOutputError> {
        require_text("summary", &self.summary)?;
        for (i, point) in self.capability_radar.iter().flatten().enumerate() {
            require_text(&format!("capabilityRadar[{i}].skill"), &point.skill)?;
            require_range(&format!("capabilityRadar[{i}].score"), point.score, 0.0, 100.0)?;
            require_range(
                &format!("capabilityRadar[{i}].confidence"),
                point.confidence,
                0.0,
                1.0,
            )?;
        }
        Ok(())
    }
}

impl Validate for FitOutput {
    fn validate(&self) -> Result<(), ModelOutputError> {
        require_range("fitScore", self.fit_score, 0.0, 100.0)?;
        require_text("rationale", &self.rationale)?;
        for (i, item) in self.matching_evidence.iter().flatten().enumerate() {
            require_text(&format!("matchingEvidence[{i}].id"), &item.id)?;
            require_text(&format!("matchingEvidence[{i}].reason"), &item.reason)?;
            require_range(
                &format!("matchingEvidence[{i}].relevance"),
                item.relevance,
                0.0,
                100.0,
            )?;
        }
        if let Some(confidence) = self.confidence {
            require_range("confidence", confidence, 0.0, 1.0)?;
        }
        Ok(())
    }
}

fn parse<T: DeserializeOwned + Validate>(raw: &str) -> Result<T, ModelOutputError> {
    let body = strip_markdown_code_fence(raw);
    if body.is_empty() {
        return Err(ModelOutputError::Empty);
    }
    let output: T = serde_json::from_str(&body)?;
    output.validate()?;
    Ok(output)
}

pub fn parse_scorecard(raw: &str) -> Result<ScorecardOutput, ModelOutputError> {
    parse(raw)
}

pub fn parse_fit(raw: &str) -> Result<FitOutput, ModelOutputError> {
    parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_scorecard() {
        let raw = "```json\n{\"summary\":\"Strong dbt signal.\",\"capabilityRadar\":[{\"skill\":\"dbt\",\"score\":88,\"confidence\":0.7}]}\n```";
        let out = parse_scorecard(raw).unwrap();
        assert_eq!(out.summary, "Strong dbt signal.");
        let radar = out.capability_radar.unwrap();
        assert_eq!(radar[0].skill, "dbt");
    }

    #[test]
    fn radar_citations_are_ignored() {
        let raw = r#"{"summary":"ok","capabilityRadar":[{"skill":"sql","score":70,"confidence":0.6,"evidenceIds":["project:x"]}]}"#;
        let radar = parse_scorecard(raw).unwrap().capability_radar.unwrap();
        assert_eq!(radar.len(), 1);
        assert_eq!(radar[0].score, 70.0);
    }

    #[test]
    fn empty_content() {
        assert!(matches!(parse_scorecard("  "), Err(ModelOutputError::Empty)));
        assert!(matches!(parse_fit("```\n```"), Err(ModelOutputError::Empty)));
    }

    #[test]
    fn not_json() {
        assert!(matches!(
            parse_scorecard("Sure! Here is your summary."),
            Err(ModelOutputError::Json(_))
        ));
    }

    #[test]
    fn missing_and_mistyped_fields() {
        assert!(parse_scorecard(r#"{"capabilityRadar":[]}"#).is_err());
        assert!(parse_fit(r#"{"fitScore":"high","rationale":"x"}"#).is_err());
    }

    #[test]
    fn out_of_range_values() {
        let err = parse_scorecard(
            r#"{"summary":"ok","capabilityRadar":[{"skill":"sql","score":140,"confidence":0.5}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("capabilityRadar[0].score"));

        assert!(parse_fit(r#"{"fitScore":50,"rationale":"ok","confidence":1.5}"#).is_err());
        assert!(
            parse_fit(
                r#"{"fitScore":50,"rationale":"ok","matchingEvidence":[{"id":"a","reason":"r","relevance":-1}]}"#
            )
            .is_err()
        );
    }

    #[test]
    fn blank_strings_rejected() {
        assert!(parse_scorecard(r#"{"summary":"   "}"#).is_err());
        assert!(parse_fit(r#"{"fitScore":10,"rationale":""}"#).is_err());
    }

    #[test]
    fn minimal_fit() {
        let out = parse_fit(r#"{"fitScore":72.4,"rationale":"Good overlap","extra":true}"#).unwrap();
        assert_eq!(out.fit_score, 72.4);
        assert!(out.gaps.is_none());
        assert!(out.matching_evidence.is_none());
    }
}
