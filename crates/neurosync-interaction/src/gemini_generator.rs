//! [`StudyGenerator`] backed by the Gemini REST API.

use async_trait::async_trait;
use neurosync_core::config::{Credential, Settings};
use neurosync_core::error::Result;
use neurosync_core::generator::StudyGenerator;
use neurosync_core::ingest::InputContext;
use neurosync_core::model::{
    ChallengeEvaluation, DeepDiveContent, SocraticEvaluation, StudySessionData,
};
use serde_json::Value;

use crate::gemini_api_agent::GeminiApiAgent;
use crate::prompts::PromptLibrary;
use crate::schemas::{self, OP_EVALUATE_CHALLENGE, OP_EVALUATE_SOCRATIC, OP_GENERATE_CHALLENGE,
    OP_GENERATE_DEEP_DIVE, OP_GENERATE_SESSION};

pub struct GeminiStudyGenerator {
    agent: GeminiApiAgent,
    prompts: PromptLibrary,
    max_text_chars: usize,
}

impl GeminiStudyGenerator {
    pub fn new(credential: Credential, settings: &Settings) -> Result<Self> {
        Ok(Self {
            agent: GeminiApiAgent::new(credential, settings)?,
            prompts: PromptLibrary::new()?,
            max_text_chars: settings.max_text_chars,
        })
    }

    async fn call(
        &self,
        operation: &'static str,
        instruction: String,
        input: &InputContext,
        schema: Value,
    ) -> Result<String> {
        let parts = self.prompts.parts(instruction, input, self.max_text_chars)?;
        let text = self.agent.generate_json(operation, parts, schema).await?;
        tracing::debug!(operation, bytes = text.len(), "Gemini response received");
        Ok(text)
    }
}

#[async_trait]
impl StudyGenerator for GeminiStudyGenerator {
    async fn generate_session(&self, input: &InputContext) -> Result<StudySessionData> {
        let text = self
            .call(
                OP_GENERATE_SESSION,
                self.prompts.session()?,
                input,
                schemas::session_schema(),
            )
            .await?;
        let data = schemas::parse_session(&text)?;
        tracing::info!(
            model = self.agent.model(),
            title = %data.title,
            concepts = data.concepts.len(),
            questions = data.questions.len(),
            "study session generated"
        );
        Ok(data)
    }

    async fn generate_deep_dive(&self, term: &str, input: &InputContext) -> Result<DeepDiveContent> {
        let text = self
            .call(
                OP_GENERATE_DEEP_DIVE,
                self.prompts.deep_dive(term)?,
                input,
                schemas::deep_dive_schema(),
            )
            .await?;
        schemas::parse_deep_dive(&text)
    }

    async fn generate_challenge(&self, term: &str, input: &InputContext) -> Result<String> {
        let text = self
            .call(
                OP_GENERATE_CHALLENGE,
                self.prompts.challenge(term)?,
                input,
                schemas::challenge_schema(),
            )
            .await?;
        schemas::parse_challenge(&text)
    }

    async fn evaluate_challenge(
        &self,
        question: &str,
        answer: &str,
        input: &InputContext,
    ) -> Result<ChallengeEvaluation> {
        let text = self
            .call(
                OP_EVALUATE_CHALLENGE,
                self.prompts.evaluate_challenge(question, answer)?,
                input,
                schemas::challenge_evaluation_schema(),
            )
            .await?;
        schemas::parse_challenge_evaluation(&text)
    }

    async fn evaluate_socratic_answer(
        &self,
        question: &str,
        answer: &str,
        input: &InputContext,
    ) -> Result<SocraticEvaluation> {
        let text = self
            .call(
                OP_EVALUATE_SOCRATIC,
                self.prompts.evaluate_socratic(question, answer)?,
                input,
                schemas::socratic_evaluation_schema(),
            )
            .await?;
        schemas::parse_socratic_evaluation(&text)
    }
}
