//! Session domain module.
//!
//! This module contains the state machine for an active study session.
//!
//! # Module Structure
//!
//! - `model`: the session object (`StudySession`), views and progress
//! - `data_core`: concept browsing, deep dives and the sync protocol
//! - `quiz`: the simulation (quiz) flow
//! - `operation`: pending / succeeded / failed markers for generator calls
//!
//! # Usage
//!
//! ```ignore
//! use neurosync_core::session::{StudySession, SessionView, DeepDiveStart};
//! ```

mod data_core;
mod model;
mod operation;
mod quiz;

// Re-export public API
pub use data_core::{ChallengeState, ChallengeTicket, ConceptMode, DeepDiveStart, SyncSubmission};
pub use model::{SessionProgress, SessionView, StudySession};
pub use operation::{OperationKey, OperationKind, OperationState, OperationTracker};
pub use quiz::{QuestionOutcome, QuizState, SimulationPhase, SocraticSubmission};
