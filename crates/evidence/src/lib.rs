//! Evidence handling for Vouch.
//!
//! Turns portfolio content into a ranked, deduplicated evidence pool and
//! derives the heuristic signal the generation engine falls back on.

pub mod content;
pub mod context;
pub mod heuristics;
pub mod rank;
pub mod sanitize;
pub mod text;

pub use content::{FileContentSource, StaticContentSource};
pub use context::{EvidenceContext, build_evidence_context};
pub use heuristics::{
    SkillMatch, build_capability_heatmap, build_capability_radar, compute_skill_match,
    extract_job_skills, infer_priority_skills, normalize_skill,
};
pub use rank::rank_evidence;
