use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::data_core::{ChallengeState, ConceptMode};
use super::operation::{OperationKey, OperationKind, OperationState, OperationTracker};
use super::quiz::QuizState;
use crate::error::{Result, StudyError};
use crate::ingest::InputContext;
use crate::model::{DeepDiveContent, StudyConcept, StudySessionData};
use crate::stats::{PlayerStats, Scoreboard, StabilityHistory};

/// Top-level view inside an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SessionView {
    /// Concept browsing.
    DataCore,
    /// Quiz flow.
    Simulation,
}

/// Read-only progress summary for the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub mastered: usize,
    pub total_concepts: usize,
    pub answered_questions: usize,
    pub total_questions: usize,
    pub is_complete: bool,
}

/// All mutable state of one study session.
///
/// Mutated only through the named transitions in this module. Transitions
/// that need the generative service come in pairs: a `begin_*` that
/// validates and marks the call pending, and a `complete_*` / `fail_*` that
/// applies the outcome. Stats and mastery change only on success.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub(super) id: String,
    pub(super) input: InputContext,
    pub(super) data: StudySessionData,
    pub(super) scoreboard: Scoreboard,
    pub(super) deep_dives: HashMap<String, DeepDiveContent>,
    pub(super) view: SessionView,
    pub(super) selected: Option<String>,
    pub(super) mode: ConceptMode,
    pub(super) challenge: ChallengeState,
    /// Bumped whenever challenge state is cleared; stale tickets carry an
    /// older value.
    pub(super) challenge_epoch: u64,
    pub(super) quiz: QuizState,
    pub(super) operations: OperationTracker,
    pub(super) notice: Option<String>,
}

impl StudySession {
    /// Starts a session on freshly generated content.
    ///
    /// Mastery flags are reset regardless of what the content carried.
    pub fn new(mut data: StudySessionData, input: InputContext) -> Self {
        data.reset_mastery();
        let quiz = QuizState::new(data.questions.len());
        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!(
            session_id = %id,
            concepts = data.concepts.len(),
            questions = data.questions.len(),
            "study session started"
        );

        Self {
            id,
            input,
            data,
            scoreboard: Scoreboard::default(),
            deep_dives: HashMap::new(),
            view: SessionView::DataCore,
            selected: None,
            mode: ConceptMode::Overview,
            challenge: ChallengeState::default(),
            challenge_epoch: 0,
            quiz,
            operations: OperationTracker::default(),
            notice: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input(&self) -> &InputContext {
        &self.input
    }

    pub fn data(&self) -> &StudySessionData {
        &self.data
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.scoreboard.stats
    }

    pub fn history(&self) -> &StabilityHistory {
        &self.scoreboard.history
    }

    pub fn view(&self) -> SessionView {
        self.view
    }

    pub fn switch_view(&mut self, view: SessionView) {
        self.view = view;
    }

    /// Cached deep dive for a concept, if one was fetched.
    pub fn deep_dive(&self, concept_id: &str) -> Option<&DeepDiveContent> {
        self.deep_dives.get(concept_id)
    }

    pub fn operation_state(&self, kind: OperationKind, target: &str) -> Option<&OperationState> {
        self.operations.state(&OperationKey::new(kind, target))
    }

    /// Last "operation failed" message, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            mastered: self.data.mastered_count(),
            total_concepts: self.data.concepts.len(),
            answered_questions: self.quiz.answered_count(),
            total_questions: self.data.questions.len(),
            is_complete: self.quiz.is_complete(),
        }
    }

    pub(super) fn concept_or_err(&self, concept_id: &str) -> Result<&StudyConcept> {
        self.data
            .concept(concept_id)
            .ok_or_else(|| StudyError::invalid_input(format!("Unknown concept '{}'", concept_id)))
    }

    /// Applies a scoring event to stats and history.
    pub(super) fn score(&mut self, delta: f64) -> f64 {
        let stability = self.scoreboard.apply(delta);
        tracing::debug!(
            session_id = %self.id,
            delta,
            stability,
            streak = self.scoreboard.stats.streak,
            "stability updated"
        );
        stability
    }
}
