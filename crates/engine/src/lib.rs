//! Evidence-grounded generation for Vouch.
//!
//! The engine always computes a deterministic heuristic result from the
//! evidence pool, asks the configured model to refine it, and keeps only the
//! parts of the model's reply that survive strict validation.

pub mod fallback;
pub mod pipeline;
pub mod prompts;
pub mod request;
pub mod schema;

pub use pipeline::{Engine, EngineError, Generated};
pub use request::{FitRequest, ScorecardRequest, ValidationError};
pub use schema::ModelOutputError;
