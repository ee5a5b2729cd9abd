//! The seam between session logic and the generative service.

use async_trait::async_trait;

use crate::error::Result;
use crate::ingest::InputContext;
use crate::model::{ChallengeEvaluation, DeepDiveContent, SocraticEvaluation, StudySessionData};

/// Produces study content from an [`InputContext`].
///
/// Implementations hold their credential and transport; they keep no data
/// between calls. Every method either returns a schema-valid result or a
/// generation error. Callers must not retry automatically.
#[async_trait]
pub trait StudyGenerator: Send + Sync {
    /// Title, summary, concepts and quiz questions for the material.
    ///
    /// Returned concepts always have `mastered == false`.
    async fn generate_session(&self, input: &InputContext) -> Result<StudySessionData>;

    /// Three-part elaboration on one concept.
    async fn generate_deep_dive(&self, term: &str, input: &InputContext)
    -> Result<DeepDiveContent>;

    /// One open-ended application or synthesis question about a concept.
    async fn generate_challenge(&self, term: &str, input: &InputContext) -> Result<String>;

    /// Strict pass/fail grading of a challenge answer.
    async fn evaluate_challenge(
        &self,
        question: &str,
        answer: &str,
        input: &InputContext,
    ) -> Result<ChallengeEvaluation>;

    /// Scores a free text quiz answer.
    async fn evaluate_socratic_answer(
        &self,
        question: &str,
        answer: &str,
        input: &InputContext,
    ) -> Result<SocraticEvaluation>;
}
