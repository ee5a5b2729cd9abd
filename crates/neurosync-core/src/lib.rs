//! Domain layer for NeuroSync.
//!
//! Study content types, the ingest boundary, scoring rules, the session state
//! machine and the [`StudyGenerator`] seam implemented by the interaction
//! layer.

pub mod config;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod model;
pub mod session;
pub mod stats;

// Re-export common types
pub use config::{Credential, Settings};
pub use error::{Result, StudyError};
pub use generator::StudyGenerator;
pub use ingest::{IngestDraft, InputContext, InputKind};
pub use model::{
    ChallengeEvaluation, DeepDiveContent, GameQuestion, QuestionType, SocraticEvaluation,
    StudyConcept, StudySessionData,
};
pub use session::StudySession;
pub use stats::{PlayerStats, StabilityHistory};
