//! Application layer for NeuroSync.
//!
//! [`FlowController`] owns the outer flow from ingestion to an active study
//! session; [`StudySessionController`] drives the session around generator
//! calls.

pub mod flow;
pub mod session_controller;

pub use flow::{FlowController, FlowState};
pub use session_controller::{ActionOutcome, StudySessionController};
