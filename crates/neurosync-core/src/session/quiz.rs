//! The simulation: sequential traversal of the quiz questions.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::model::StudySession;
use super::operation::{OperationKey, OperationKind};
use crate::error::{Result, StudyError};
use crate::model::{GameQuestion, QuestionType, SocraticEvaluation};
use crate::stats::{SOCRATIC_BONUS, SOCRATIC_PASS_THRESHOLD, STABILITY_BONUS, STABILITY_PENALTY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SimulationPhase {
    /// Waiting for an answer to the current question.
    Answering,
    /// A free text answer is being graded.
    Evaluating,
    /// The current question has been scored.
    Answered,
    /// Every question has been answered.
    Complete,
}

/// How one question was scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub correct: bool,
    pub delta: f64,
    /// Model score for free text answers.
    pub score: Option<f64>,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizState {
    pub index: usize,
    pub selected_option: Option<usize>,
    pub defense: String,
    pub phase: SimulationPhase,
    pub outcome: Option<QuestionOutcome>,
    total: usize,
    answered: usize,
}

impl QuizState {
    pub(super) fn new(total: usize) -> Self {
        Self {
            index: 0,
            selected_option: None,
            defense: String::new(),
            phase: if total == 0 {
                SimulationPhase::Complete
            } else {
                SimulationPhase::Answering
            },
            outcome: None,
            total,
            answered: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SimulationPhase::Complete
    }

    pub fn answered_count(&self) -> usize {
        self.answered
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Identifies one free text grading call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocraticSubmission {
    pub question_index: usize,
    pub question: String,
    pub answer: String,
}

impl StudySession {
    pub fn quiz(&self) -> &QuizState {
        &self.quiz
    }

    pub fn current_question(&self) -> Option<&GameQuestion> {
        if self.quiz.is_complete() {
            return None;
        }
        self.data.questions.get(self.quiz.index)
    }

    pub fn select_option(&mut self, option: usize) -> Result<()> {
        let question = self.answerable_question()?;
        if question.question_type != QuestionType::ConceptCheck {
            return Err(StudyError::invalid_input(
                "This question expects a written answer",
            ));
        }
        if option >= question.option_count() {
            return Err(StudyError::invalid_input(format!(
                "Option {} is out of range",
                option + 1
            )));
        }
        self.quiz.selected_option = Some(option);
        Ok(())
    }

    pub fn set_defense(&mut self, text: impl Into<String>) -> Result<()> {
        let question = self.answerable_question()?;
        if !question.question_type.is_free_text() {
            return Err(StudyError::invalid_input("This question expects an option"));
        }
        self.quiz.defense = text.into();
        Ok(())
    }

    /// Whether the submit action is enabled for the current question.
    pub fn can_submit_answer(&self) -> bool {
        let Ok(question) = self.answerable_question() else {
            return false;
        };
        if question.question_type.is_free_text() {
            !self.quiz.defense.trim().is_empty()
        } else {
            self.quiz.selected_option.is_some()
        }
    }

    /// Scores a concept check locally.
    pub fn submit_concept_check(&mut self) -> Result<QuestionOutcome> {
        let question = self.answerable_question()?;
        if question.question_type != QuestionType::ConceptCheck {
            return Err(StudyError::invalid_input(
                "This question expects a written answer",
            ));
        }
        let selected = self
            .quiz
            .selected_option
            .ok_or_else(|| StudyError::invalid_input("Select an option first"))?;

        let correct = Some(selected) == question.correct_option_index;
        let feedback = question.explanation.clone();
        let delta = if correct {
            STABILITY_BONUS
        } else {
            -STABILITY_PENALTY
        };
        Ok(self.record_outcome(correct, delta, None, feedback))
    }

    pub fn begin_socratic_submit(&mut self) -> Result<SocraticSubmission> {
        let question = self.answerable_question()?;
        if !question.question_type.is_free_text() {
            return Err(StudyError::invalid_input("This question expects an option"));
        }
        let answer = self.quiz.defense.trim().to_string();
        if answer.is_empty() {
            return Err(StudyError::invalid_input("Write an answer first"));
        }

        let submission = SocraticSubmission {
            question_index: self.quiz.index,
            question: question.question.clone(),
            answer,
        };
        self.operations.start(OperationKey::new(
            OperationKind::SocraticEvaluation,
            submission.question_index.to_string(),
        ));
        self.quiz.phase = SimulationPhase::Evaluating;
        Ok(submission)
    }

    /// Applies the model's score. Passing requires `score >= 70`.
    pub fn complete_socratic_submit(
        &mut self,
        submission: &SocraticSubmission,
        evaluation: SocraticEvaluation,
    ) -> Result<QuestionOutcome> {
        self.operations.succeed(OperationKey::new(
            OperationKind::SocraticEvaluation,
            submission.question_index.to_string(),
        ));
        self.expect_evaluating(submission)?;

        let passed = evaluation.score >= SOCRATIC_PASS_THRESHOLD;
        let delta = if passed {
            SOCRATIC_BONUS
        } else {
            -STABILITY_PENALTY
        };
        Ok(self.record_outcome(passed, delta, Some(evaluation.score), evaluation.feedback))
    }

    /// Returns the question to answering so the user can resubmit.
    pub fn fail_socratic_submit(
        &mut self,
        submission: &SocraticSubmission,
        message: impl Into<String>,
    ) {
        let message = message.into();
        self.operations.fail(
            OperationKey::new(
                OperationKind::SocraticEvaluation,
                submission.question_index.to_string(),
            ),
            message.clone(),
        );
        if self.expect_evaluating(submission).is_ok() {
            self.quiz.phase = SimulationPhase::Answering;
        }
        self.notice = Some(message);
    }

    /// Moves to the next question, or to `Complete` after the last one.
    pub fn advance(&mut self) -> Result<SimulationPhase> {
        if self.quiz.phase != SimulationPhase::Answered {
            return Err(StudyError::invalid_state(
                "Answer the current question before advancing",
            ));
        }

        if self.quiz.index + 1 >= self.data.questions.len() {
            self.quiz.phase = SimulationPhase::Complete;
            tracing::info!(
                session_id = %self.id,
                stability = self.scoreboard.stats.stability,
                "simulation complete"
            );
        } else {
            self.quiz.index += 1;
            self.quiz.phase = SimulationPhase::Answering;
        }
        self.quiz.selected_option = None;
        self.quiz.defense.clear();
        self.quiz.outcome = None;
        Ok(self.quiz.phase)
    }

    fn answerable_question(&self) -> Result<&GameQuestion> {
        match self.quiz.phase {
            SimulationPhase::Answering => self
                .data
                .questions
                .get(self.quiz.index)
                .ok_or_else(|| StudyError::invalid_state("No question at the current index")),
            SimulationPhase::Evaluating => {
                Err(StudyError::invalid_state("An answer is already being graded"))
            }
            SimulationPhase::Answered => {
                Err(StudyError::invalid_state("This question was already answered"))
            }
            SimulationPhase::Complete => Err(StudyError::invalid_state("The simulation is complete")),
        }
    }

    fn expect_evaluating(&self, submission: &SocraticSubmission) -> Result<()> {
        if self.quiz.phase == SimulationPhase::Evaluating && self.quiz.index == submission.question_index {
            Ok(())
        } else {
            Err(StudyError::invalid_state(format!(
                "No grading outstanding for question {}",
                submission.question_index + 1
            )))
        }
    }

    fn record_outcome(
        &mut self,
        correct: bool,
        delta: f64,
        score: Option<f64>,
        feedback: String,
    ) -> QuestionOutcome {
        self.score(delta);
        let outcome = QuestionOutcome {
            correct,
            delta,
            score,
            feedback,
        };
        self.quiz.answered += 1;
        self.quiz.phase = SimulationPhase::Answered;
        self.quiz.outcome = Some(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::fixtures::*;
    use super::super::operation::OperationState;
    use super::*;

    fn session() -> StudySession {
        StudySession::new(session_data(7), input())
    }

    #[test]
    fn test_concept_check_requires_selection() {
        let mut session = session();
        assert!(!session.can_submit_answer());
        assert!(session.submit_concept_check().unwrap_err().is_input());
    }

    #[test]
    fn test_concept_check_correct_and_wrong() {
        let mut session = session();
        session.select_option(1).unwrap();
        let outcome = session.submit_concept_check().unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.delta, 10.0);
        assert_eq!(session.stats().stability, 60.0);

        session.advance().unwrap();
        session.select_option(0).unwrap();
        let outcome = session.submit_concept_check().unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.delta, -15.0);
        assert_eq!(session.stats().stability, 45.0);
    }

    #[test]
    fn test_option_out_of_range() {
        let mut session = session();
        assert!(session.select_option(4).is_err());
        assert_eq!(session.quiz().selected_option, None);
    }

    #[test]
    fn test_question_scored_once() {
        let mut session = session();
        session.select_option(1).unwrap();
        session.submit_concept_check().unwrap();
        assert!(session.select_option(2).is_err());
        assert!(session.submit_concept_check().is_err());
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_cannot_advance_unanswered() {
        let mut session = session();
        assert!(session.advance().is_err());
    }

    fn reach_socratic(session: &mut StudySession) {
        for option in [1, 2] {
            session.select_option(option).unwrap();
            session.submit_concept_check().unwrap();
            session.advance().unwrap();
        }
    }

    #[test]
    fn test_socratic_threshold_boundary() {
        for (score, passed, delta) in [(70.0, true, 15.0), (69.5, false, -15.0)] {
            let mut session = session();
            reach_socratic(&mut session);
            session.set_defense("Because energy is conserved.").unwrap();
            let submission = session.begin_socratic_submit().unwrap();
            assert_eq!(session.quiz().phase, SimulationPhase::Evaluating);

            let outcome = session
                .complete_socratic_submit(
                    &submission,
                    SocraticEvaluation {
                        score,
                        feedback: "ok".into(),
                    },
                )
                .unwrap();
            assert_eq!(outcome.correct, passed);
            assert_eq!(outcome.delta, delta);
            assert_eq!(outcome.score, Some(score));
        }
    }

    #[test]
    fn test_socratic_failure_allows_resubmit() {
        let mut session = session();
        reach_socratic(&mut session);
        session.set_defense("draft").unwrap();
        let submission = session.begin_socratic_submit().unwrap();
        let before = *session.stats();

        session.fail_socratic_submit(&submission, "Operation failed");
        assert_eq!(session.quiz().phase, SimulationPhase::Answering);
        assert_eq!(session.stats(), &before);
        assert!(session.can_submit_answer());
    }

    #[test]
    fn test_rejected_socratic_result_still_settles_operation() {
        let mut session = session();
        reach_socratic(&mut session);
        session.set_defense("Because energy is conserved.").unwrap();
        let submission = session.begin_socratic_submit().unwrap();
        let before = *session.stats();
        let index = submission.question_index.to_string();
        assert_eq!(
            session.operation_state(OperationKind::SocraticEvaluation, &index),
            Some(&OperationState::Pending)
        );

        session.quiz.phase = SimulationPhase::Answering;
        let result = session.complete_socratic_submit(
            &submission,
            SocraticEvaluation {
                score: 90.0,
                feedback: "late".into(),
            },
        );
        assert!(result.is_err());
        assert_eq!(
            session.operation_state(OperationKind::SocraticEvaluation, &index),
            Some(&OperationState::Succeeded)
        );
        assert_eq!(session.stats(), &before);

        session.set_defense("Second attempt.").unwrap();
        assert!(session.begin_socratic_submit().is_ok());
    }

    #[test]
    fn test_socratic_requires_text() {
        let mut session = session();
        reach_socratic(&mut session);
        session.set_defense("   ").unwrap();
        assert!(!session.can_submit_answer());
        assert!(session.begin_socratic_submit().is_err());
    }

    #[test]
    fn test_all_correct_reaches_complete_at_85() {
        let mut session = session();
        reach_socratic(&mut session);
        session.set_defense("A rigorous defence.").unwrap();
        let submission = session.begin_socratic_submit().unwrap();
        session
            .complete_socratic_submit(
                &submission,
                SocraticEvaluation {
                    score: 92.0,
                    feedback: "Excellent".into(),
                },
            )
            .unwrap();

        assert_eq!(session.advance().unwrap(), SimulationPhase::Complete);
        assert_eq!(session.stats().stability, 85.0);
        assert_eq!(session.stats().streak, 3);
        assert!(session.current_question().is_none());
        assert!(session.progress().is_complete);
    }
}
