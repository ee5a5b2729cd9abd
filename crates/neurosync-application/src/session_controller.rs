//! Drives an active study session around generator calls.
//!
//! Each async action runs the session's `begin_*` transition, awaits the
//! generator and applies the result with the matching `complete_*` or
//! `fail_*`. Generator errors stop here: they are logged, stored as the
//! session notice and reported as [`ActionOutcome::Failed`].

use std::sync::Arc;

use neurosync_core::error::StudyError;
use neurosync_core::generator::StudyGenerator;
use neurosync_core::model::QuestionType;
use neurosync_core::session::{DeepDiveStart, SessionView, SimulationPhase, StudySession};

/// What happened when the user triggered an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The transition completed.
    Done,
    /// Served from the session cache without calling the service.
    Cached,
    /// Nothing new was started, or the result no longer applied.
    Ignored,
    /// The action is not enabled in the current state.
    Rejected(String),
    /// The service call failed; the session notice holds the message.
    Failed(String),
}

impl ActionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<StudyError> for ActionOutcome {
    fn from(err: StudyError) -> Self {
        Self::Rejected(err.to_string())
    }
}

pub struct StudySessionController {
    session: StudySession,
    generator: Arc<dyn StudyGenerator>,
}

impl StudySessionController {
    pub fn new(session: StudySession, generator: Arc<dyn StudyGenerator>) -> Self {
        Self { session, generator }
    }

    pub fn session(&self) -> &StudySession {
        &self.session
    }

    /// Direct access for synchronous transitions (selection, typing, view
    /// switches).
    pub fn session_mut(&mut self) -> &mut StudySession {
        &mut self.session
    }

    pub fn switch_view(&mut self, view: SessionView) {
        self.session.switch_view(view);
    }

    /// Shows the deep dive for the selected concept, fetching it on first use.
    pub async fn request_deep_dive(&mut self) -> ActionOutcome {
        let (concept_id, term) = match self.session.begin_deep_dive() {
            Ok(DeepDiveStart::Cached) => return ActionOutcome::Cached,
            Ok(DeepDiveStart::AlreadyPending) => return ActionOutcome::Ignored,
            Ok(DeepDiveStart::Fetch { concept_id, term }) => (concept_id, term),
            Err(err) => return err.into(),
        };

        let generator = Arc::clone(&self.generator);
        match generator.generate_deep_dive(&term, self.session.input()).await {
            Ok(content) => {
                self.session.complete_deep_dive(&concept_id, content);
                ActionOutcome::Done
            }
            Err(err) => {
                let message = self.report("deep dive", &err);
                self.session.fail_deep_dive(&concept_id, message.clone());
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Opens a fresh sync protocol challenge for the selected concept.
    pub async fn initiate_sync(&mut self) -> ActionOutcome {
        let ticket = match self.session.begin_sync() {
            Ok(ticket) => ticket,
            Err(err) => return err.into(),
        };

        let generator = Arc::clone(&self.generator);
        match generator
            .generate_challenge(&ticket.term, self.session.input())
            .await
        {
            Ok(question) => {
                if self.session.complete_sync(&ticket, question) {
                    ActionOutcome::Done
                } else {
                    ActionOutcome::Ignored
                }
            }
            Err(err) => {
                let message = self.report("challenge generation", &err);
                self.session.fail_sync(&ticket, message.clone());
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Submits the sync answer for grading.
    pub async fn submit_sync(&mut self) -> ActionOutcome {
        let submission = match self.session.begin_sync_submit() {
            Ok(submission) => submission,
            Err(err) => return err.into(),
        };

        let generator = Arc::clone(&self.generator);
        match generator
            .evaluate_challenge(&submission.question, &submission.answer, self.session.input())
            .await
        {
            Ok(evaluation) => {
                self.session.complete_sync_submit(&submission, evaluation);
                ActionOutcome::Done
            }
            Err(err) => {
                let message = self.report("challenge evaluation", &err);
                self.session.fail_sync_submit(&submission, message.clone());
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Submits the answer to the current quiz question.
    ///
    /// Concept checks are scored locally; free text answers go to the
    /// service for grading.
    pub async fn submit_answer(&mut self) -> ActionOutcome {
        let question_type = match self.session.current_question() {
            Some(question) => question.question_type,
            None => return ActionOutcome::Rejected("The simulation is complete".to_string()),
        };

        if question_type == QuestionType::ConceptCheck {
            return match self.session.submit_concept_check() {
                Ok(_) => ActionOutcome::Done,
                Err(err) => err.into(),
            };
        }

        let submission = match self.session.begin_socratic_submit() {
            Ok(submission) => submission,
            Err(err) => return err.into(),
        };

        let generator = Arc::clone(&self.generator);
        match generator
            .evaluate_socratic_answer(&submission.question, &submission.answer, self.session.input())
            .await
        {
            Ok(evaluation) => match self.session.complete_socratic_submit(&submission, evaluation) {
                Ok(_) => ActionOutcome::Done,
                Err(_) => ActionOutcome::Ignored,
            },
            Err(err) => {
                let message = self.report("answer evaluation", &err);
                self.session.fail_socratic_submit(&submission, message.clone());
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Moves to the next quiz question, or completes the simulation.
    pub fn advance(&mut self) -> Result<SimulationPhase, StudyError> {
        self.session.advance()
    }

    fn report(&self, operation: &str, err: &StudyError) -> String {
        tracing::warn!(
            session_id = %self.session.id(),
            operation,
            error = %err,
            "generation call failed"
        );
        err.user_message()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use neurosync_core::error::{Result, StudyError};
    use neurosync_core::generator::StudyGenerator;
    use neurosync_core::ingest::InputContext;
    use neurosync_core::model::{
        ChallengeEvaluation, DeepDiveContent, GameQuestion, QuestionType, SocraticEvaluation,
        StudyConcept, StudySessionData,
    };

    /// In-memory generator with scripted answers and call counters.
    #[derive(Default)]
    pub struct MockGenerator {
        pub calls: Mutex<HashMap<&'static str, usize>>,
        pub fail_all: bool,
        pub challenge_pass: bool,
        pub socratic_score: f64,
    }

    impl MockGenerator {
        pub fn passing() -> Self {
            Self {
                challenge_pass: true,
                socratic_score: 90.0,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_all: true,
                ..Self::default()
            }
        }

        pub fn count(&self, operation: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .get(operation)
                .copied()
                .unwrap_or(0)
        }

        fn hit(&self, operation: &'static str) -> Result<()> {
            *self.calls.lock().unwrap().entry(operation).or_default() += 1;
            if self.fail_all {
                Err(StudyError::generation_status(503, "service unavailable"))
            } else {
                Ok(())
            }
        }
    }

    pub fn sample_data() -> StudySessionData {
        let concepts = (1..=7)
            .map(|i| StudyConcept {
                id: format!("c{i}"),
                term: format!("Term {i}"),
                definition: "definition".to_string(),
                analogy: "analogy".to_string(),
                mastered: true,
            })
            .collect();
        let check = |id: &str, correct: usize| GameQuestion {
            id: id.to_string(),
            question_type: QuestionType::ConceptCheck,
            question: "Pick one".to_string(),
            options: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_option_index: Some(correct),
            explanation: "Because".to_string(),
            difficulty: "easy".to_string(),
        };
        StudySessionData {
            title: "Thermodynamics".to_string(),
            summary: "Energy and entropy".to_string(),
            concepts,
            questions: vec![
                check("q1", 0),
                check("q2", 3),
                GameQuestion {
                    id: "q3".to_string(),
                    question_type: QuestionType::SocraticDefense,
                    question: "Defend the second law.".to_string(),
                    options: None,
                    correct_option_index: None,
                    explanation: "Cite statistical mechanics.".to_string(),
                    difficulty: "hard".to_string(),
                },
            ],
        }
    }

    #[async_trait]
    impl StudyGenerator for MockGenerator {
        async fn generate_session(&self, _input: &InputContext) -> Result<StudySessionData> {
            self.hit("generate_session")?;
            let mut data = sample_data();
            data.reset_mastery();
            Ok(data)
        }

        async fn generate_deep_dive(
            &self,
            term: &str,
            _input: &InputContext,
        ) -> Result<DeepDiveContent> {
            self.hit("generate_deep_dive")?;
            Ok(DeepDiveContent {
                theoretical_underpinnings: format!("{term}: theory"),
                real_world_application: format!("{term}: practice"),
                interdisciplinary_connection: format!("{term}: elsewhere"),
            })
        }

        async fn generate_challenge(&self, term: &str, _input: &InputContext) -> Result<String> {
            self.hit("generate_challenge")?;
            Ok(format!("How would you apply {term} to a refrigerator?"))
        }

        async fn evaluate_challenge(
            &self,
            _question: &str,
            _answer: &str,
            _input: &InputContext,
        ) -> Result<ChallengeEvaluation> {
            self.hit("evaluate_challenge")?;
            Ok(ChallengeEvaluation {
                passed: self.challenge_pass,
                score: if self.challenge_pass { 90.0 } else { 20.0 },
                feedback: "graded".to_string(),
            })
        }

        async fn evaluate_socratic_answer(
            &self,
            _question: &str,
            _answer: &str,
            _input: &InputContext,
        ) -> Result<SocraticEvaluation> {
            self.hit("evaluate_socratic_answer")?;
            Ok(SocraticEvaluation {
                score: self.socratic_score,
                feedback: "graded".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MockGenerator, sample_data};
    use super::*;
    use neurosync_core::ingest::InputContext;
    use neurosync_core::session::ConceptMode;

    fn controller(generator: Arc<MockGenerator>) -> StudySessionController {
        let session = StudySession::new(sample_data(), InputContext::text("material"));
        StudySessionController::new(session, generator)
    }

    #[tokio::test]
    async fn test_deep_dive_fetched_once_per_concept() {
        let generator = Arc::new(MockGenerator::passing());
        let mut controller = controller(generator.clone());
        controller.session_mut().select_concept("c1").unwrap();

        assert_eq!(controller.request_deep_dive().await, ActionOutcome::Done);
        controller.session_mut().select_concept("c1").unwrap();
        assert_eq!(controller.request_deep_dive().await, ActionOutcome::Cached);
        assert_eq!(generator.count("generate_deep_dive"), 1);
        assert_eq!(controller.session().concept_mode(), ConceptMode::DeepDive);
    }

    #[tokio::test]
    async fn test_deep_dive_failure_sets_notice_only() {
        let generator = Arc::new(MockGenerator::failing());
        let mut controller = controller(generator.clone());
        controller.session_mut().select_concept("c1").unwrap();

        let outcome = controller.request_deep_dive().await;
        assert!(outcome.is_failed());
        assert_eq!(controller.session().concept_mode(), ConceptMode::Overview);
        assert!(controller.session().deep_dive("c1").is_none());
        assert!(controller.session().notice().unwrap().starts_with("Operation failed"));

        // No automatic retry; a repeated user action issues a new call.
        controller.request_deep_dive().await;
        assert_eq!(generator.count("generate_deep_dive"), 2);
    }

    #[tokio::test]
    async fn test_sync_always_fetches_fresh_challenge() {
        let generator = Arc::new(MockGenerator::passing());
        let mut controller = controller(generator.clone());
        controller.session_mut().select_concept("c2").unwrap();

        controller.initiate_sync().await;
        controller.initiate_sync().await;
        assert_eq!(generator.count("generate_challenge"), 2);
        assert!(controller.session().challenge().question.is_some());
    }

    #[tokio::test]
    async fn test_sync_pass_masters_concept() {
        let generator = Arc::new(MockGenerator::passing());
        let mut controller = controller(generator.clone());
        controller.session_mut().select_concept("c2").unwrap();

        assert!(matches!(controller.submit_sync().await, ActionOutcome::Rejected(_)));
        assert_eq!(generator.count("evaluate_challenge"), 0);

        controller.initiate_sync().await;
        controller
            .session_mut()
            .set_sync_answer("Work moves heat from cold to hot.");
        assert_eq!(controller.submit_sync().await, ActionOutcome::Done);

        let session = controller.session();
        assert!(session.data().concept("c2").unwrap().mastered);
        assert_eq!(session.stats().synced_nodes, 1);
        assert_eq!(session.stats().stability, 60.0);
        assert!(session.challenge().locked);
    }

    #[tokio::test]
    async fn test_failed_evaluation_leaves_stats_untouched() {
        let generator = Arc::new(MockGenerator::failing());
        let mut controller = controller(generator);
        controller.session_mut().select_concept("c1").unwrap();
        controller.switch_view(SessionView::Simulation);
        controller.session_mut().select_option(0).unwrap();
        controller.submit_answer().await;
        controller.advance().unwrap();
        controller.session_mut().select_option(3).unwrap();
        controller.submit_answer().await;
        controller.advance().unwrap();

        let before = *controller.session().stats();
        controller.session_mut().set_defense("My defence").unwrap();
        assert!(controller.submit_answer().await.is_failed());
        assert_eq!(controller.session().stats(), &before);
        assert_eq!(controller.session().quiz().phase, SimulationPhase::Answering);
    }
}
