//! Concept browsing: overview, deep dive and the sync protocol.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::model::StudySession;
use super::operation::{OperationKey, OperationKind};
use crate::error::{Result, StudyError};
use crate::model::{ChallengeEvaluation, DeepDiveContent};
use crate::stats::{SYNC_FAIL_DELTA, SYNC_PASS_DELTA};

/// Sub-mode for the selected concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ConceptMode {
    Overview,
    DeepDive,
    SyncProtocol,
}

/// Question, answer and grading of the current sync protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeState {
    pub question: Option<String>,
    pub answer: String,
    pub evaluation: Option<ChallengeEvaluation>,
    /// Set after a passing result; the answer can no longer change.
    pub locked: bool,
}

/// Result of asking for a deep dive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepDiveStart {
    /// Already cached; the mode switched without a call.
    Cached,
    /// A call for this concept is outstanding; nothing new was started.
    AlreadyPending,
    /// Issue a call for this concept.
    Fetch { concept_id: String, term: String },
}

/// Identifies one challenge-generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTicket {
    pub concept_id: String,
    pub term: String,
    epoch: u64,
}

/// Identifies one challenge-evaluation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSubmission {
    pub concept_id: String,
    pub question: String,
    pub answer: String,
    epoch: u64,
}

impl StudySession {
    pub fn selected_concept_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn concept_mode(&self) -> ConceptMode {
        self.mode
    }

    pub fn challenge(&self) -> &ChallengeState {
        &self.challenge
    }

    /// Selects a concept, resetting its sub-mode to overview and discarding
    /// any challenge in progress.
    pub fn select_concept(&mut self, concept_id: &str) -> Result<()> {
        self.concept_or_err(concept_id)?;
        self.selected = Some(concept_id.to_string());
        self.mode = ConceptMode::Overview;
        self.reset_challenge();
        Ok(())
    }

    /// Returns to the overview of the selected concept.
    pub fn show_overview(&mut self) -> Result<()> {
        self.selected_id()?;
        self.mode = ConceptMode::Overview;
        Ok(())
    }

    pub fn begin_deep_dive(&mut self) -> Result<DeepDiveStart> {
        let concept_id = self.selected_id()?;

        if self.deep_dives.contains_key(&concept_id) {
            self.mode = ConceptMode::DeepDive;
            return Ok(DeepDiveStart::Cached);
        }

        let key = OperationKey::new(OperationKind::DeepDive, concept_id.clone());
        if !self.operations.start(key) {
            return Ok(DeepDiveStart::AlreadyPending);
        }

        let term = self.concept_or_err(&concept_id)?.term.clone();
        Ok(DeepDiveStart::Fetch { concept_id, term })
    }

    /// Caches a fetched deep dive. Switches mode only if the concept is still
    /// selected. The first cached value for a concept wins.
    pub fn complete_deep_dive(&mut self, concept_id: &str, content: DeepDiveContent) {
        self.operations
            .succeed(OperationKey::new(OperationKind::DeepDive, concept_id));
        self.deep_dives
            .entry(concept_id.to_string())
            .or_insert(content);

        if self.selected.as_deref() == Some(concept_id) {
            self.mode = ConceptMode::DeepDive;
        }
    }

    pub fn fail_deep_dive(&mut self, concept_id: &str, message: impl Into<String>) {
        let message = message.into();
        self.operations.fail(
            OperationKey::new(OperationKind::DeepDive, concept_id),
            message.clone(),
        );
        self.notice = Some(message);
    }

    /// Opens a fresh sync protocol for the selected concept.
    ///
    /// Previous question, answer and feedback are cleared; a new challenge is
    /// always generated.
    pub fn begin_sync(&mut self) -> Result<ChallengeTicket> {
        let concept_id = self.selected_id()?;
        let term = self.concept_or_err(&concept_id)?.term.clone();

        self.reset_challenge();
        self.mode = ConceptMode::SyncProtocol;
        self.operations
            .start(OperationKey::new(OperationKind::Challenge, concept_id.clone()));

        Ok(ChallengeTicket {
            concept_id,
            term,
            epoch: self.challenge_epoch,
        })
    }

    /// Installs a generated challenge question. Returns `false` when the
    /// ticket is stale and the question was dropped.
    pub fn complete_sync(&mut self, ticket: &ChallengeTicket, question: String) -> bool {
        self.operations.succeed(OperationKey::new(
            OperationKind::Challenge,
            ticket.concept_id.clone(),
        ));
        if !self.is_current(&ticket.concept_id, ticket.epoch) {
            return false;
        }
        self.challenge.question = Some(question);
        true
    }

    pub fn fail_sync(&mut self, ticket: &ChallengeTicket, message: impl Into<String>) {
        let message = message.into();
        self.operations.fail(
            OperationKey::new(OperationKind::Challenge, ticket.concept_id.clone()),
            message.clone(),
        );
        self.notice = Some(message);
    }

    /// Edits the answer. Ignored once a passing result locked the box.
    pub fn set_sync_answer(&mut self, answer: impl Into<String>) {
        if !self.challenge.locked {
            self.challenge.answer = answer.into();
        }
    }

    pub fn can_submit_sync(&self) -> bool {
        let Some(concept_id) = self.selected.as_deref() else {
            return false;
        };
        self.challenge.question.is_some()
            && !self.challenge.answer.trim().is_empty()
            && !self.challenge.locked
            && !self.operations.is_pending(&OperationKey::new(
                OperationKind::ChallengeEvaluation,
                concept_id,
            ))
    }

    pub fn begin_sync_submit(&mut self) -> Result<SyncSubmission> {
        if !self.can_submit_sync() {
            return Err(StudyError::invalid_input(
                "Sync submission needs a challenge question and a non-empty answer",
            ));
        }
        let concept_id = self.selected_id()?;
        let question = self.challenge.question.clone().unwrap_or_default();

        self.operations.start(OperationKey::new(
            OperationKind::ChallengeEvaluation,
            concept_id.clone(),
        ));

        Ok(SyncSubmission {
            concept_id,
            question,
            answer: self.challenge.answer.trim().to_string(),
            epoch: self.challenge_epoch,
        })
    }

    /// Applies a challenge grading.
    ///
    /// Mastery and stats follow the concept the answer was submitted for.
    /// The visible feedback and lock only apply while that challenge is still
    /// on screen. Returns the stability delta applied.
    pub fn complete_sync_submit(
        &mut self,
        submission: &SyncSubmission,
        evaluation: ChallengeEvaluation,
    ) -> f64 {
        self.operations.succeed(OperationKey::new(
            OperationKind::ChallengeEvaluation,
            submission.concept_id.clone(),
        ));

        let delta = if evaluation.passed {
            self.mark_mastered(&submission.concept_id);
            SYNC_PASS_DELTA
        } else {
            SYNC_FAIL_DELTA
        };
        self.score(delta);

        if self.is_current(&submission.concept_id, submission.epoch) {
            self.challenge.locked = evaluation.passed;
            self.challenge.evaluation = Some(evaluation);
        }
        delta
    }

    pub fn fail_sync_submit(&mut self, submission: &SyncSubmission, message: impl Into<String>) {
        let message = message.into();
        self.operations.fail(
            OperationKey::new(OperationKind::ChallengeEvaluation, submission.concept_id.clone()),
            message.clone(),
        );
        self.notice = Some(message);
    }

    fn mark_mastered(&mut self, concept_id: &str) {
        let Some(concept) = self.data.concepts.iter_mut().find(|c| c.id == concept_id) else {
            return;
        };
        if !concept.mastered {
            concept.mastered = true;
            self.scoreboard.stats.synced_nodes += 1;
            tracing::info!(session_id = %self.id, concept_id, "concept mastered");
        }
    }

    fn selected_id(&self) -> Result<String> {
        self.selected
            .clone()
            .ok_or_else(|| StudyError::invalid_state("No concept selected"))
    }

    fn is_current(&self, concept_id: &str, epoch: u64) -> bool {
        self.selected.as_deref() == Some(concept_id) && self.challenge_epoch == epoch
    }

    fn reset_challenge(&mut self) {
        self.challenge = ChallengeState::default();
        self.challenge_epoch += 1;
    }
}
