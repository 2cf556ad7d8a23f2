//! # Vouch Core
//!
//! Domain types, traits, and error definitions for the Vouch gateway.
//! This crate has **zero framework dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The seams to the outside world (the upstream model and the content
//! collaborators) are traits defined here. Implementations live in their
//! respective crates, so tests can swap in scripted providers and in-memory
//! content without touching the pipeline.

pub mod content;
pub mod error;
pub mod evidence;
pub mod insight;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use content::{
    ActivityEntry, ActivityFeed, ContentSource, ProjectIndex, ProjectMeta, ResumeDerived, ResumeRole,
    SearchDoc, SearchDocKind,
};
pub use error::{ContentError, ProviderError};
pub use evidence::{EvidenceItem, SourceKind};
pub use insight::{
    CapabilityHeatmapCell, CapabilityRadarPoint, FitAssessment, MatchingEvidence,
    SignalScorecard,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
