//! Caller input for the two generation endpoints, and its validation.
//!
//! Validation trims free text and reports every problem at once so a client
//! can fix a payload in one round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROLE_MAX_LEN: usize = 100;
pub const INDUSTRY_MAX_LEN: usize = 100;
pub const PRIORITY_SKILLS_MAX: usize = 12;
pub const PRIORITY_SKILL_MAX_LEN: usize = 60;
pub const JOB_DESCRIPTION_MIN_LEN: usize = 40;
pub const JOB_DESCRIPTION_MAX_LEN: usize = 8000;

/// A rejected request payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub issues: Vec<String>,
}

impl ValidationError {
    fn new(message: &str, issues: Vec<String>) -> Self {
        Self {
            message: message.to_string(),
            issues,
        }
    }
}

/// Input for a capability scorecard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub priority_skills: Option<Vec<String>>,
}

impl ScorecardRequest {
    pub const INVALID: &'static str = "Invalid scorecard payload.";

    /// Decode and validate a JSON body.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value::<Self>(value)
            .map_err(|e| ValidationError::new(Self::INVALID, vec![e.to_string()]))?
            .validate()
    }

    /// Trim every field and check bounds.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();

        let role = self.role.map(|r| r.trim().to_string());
        check_max("role", role.as_deref(), ROLE_MAX_LEN, &mut issues);

        let industry = self.industry.map(|i| i.trim().to_string());
        check_max("industry", industry.as_deref(), INDUSTRY_MAX_LEN, &mut issues);

        let priority_skills = self.priority_skills.map(|skills| {
            skills
                .iter()
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        });
        if let Some(skills) = &priority_skills {
            if skills.len() > PRIORITY_SKILLS_MAX {
                issues.push(format!(
                    "prioritySkills: at most {PRIORITY_SKILLS_MAX} entries allowed"
                ));
            }
            for (index, skill) in skills.iter().enumerate() {
                let len = skill.chars().count();
                if len == 0 || len > PRIORITY_SKILL_MAX_LEN {
                    issues.push(format!(
                        "prioritySkills[{index}]: must be 1-{PRIORITY_SKILL_MAX_LEN} characters"
                    ));
                }
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(Self::INVALID, issues));
        }

        Ok(Self {
            role,
            industry,
            priority_skills,
        })
    }
}

/// Input for a job-description fit assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitRequest {
    pub job_description: String,
}

impl FitRequest {
    pub const INVALID: &'static str = "Invalid fit payload.";

    pub fn new(job_description: impl Into<String>) -> Self {
        Self {
            job_description: job_description.into(),
        }
    }

    /// Decode and validate a JSON body.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value::<Self>(value)
            .map_err(|e| ValidationError::new(Self::INVALID, vec![e.to_string()]))?
            .validate()
    }

    pub fn validate(self) -> Result<Self, ValidationError> {
        let job_description = self.job_description.trim().to_string();
        let len = job_description.chars().count();

        let issue = if len < JOB_DESCRIPTION_MIN_LEN {
            Some(format!(
                "jobDescription: must be at least {JOB_DESCRIPTION_MIN_LEN} characters"
            ))
        } else if len > JOB_DESCRIPTION_MAX_LEN {
            Some(format!(
                "jobDescription: must be at most {JOB_DESCRIPTION_MAX_LEN} characters"
            ))
        } else {
            None
        };

        match issue {
            Some(issue) => Err(ValidationError::new(Self::INVALID, vec![issue])),
            None => Ok(Self { job_description }),
        }
    }
}

fn check_max(field: &str, value: Option<&str>, max: usize, issues: &mut Vec<String>) {
    if let Some(value) = value {
        if value.chars().count() > max {
            issues.push(format!("{field}: must be at most {max} characters"));
        }
    }
}
