//! Outer application flow: ingest, process, study.

use std::sync::Arc;

use neurosync_core::config::Credential;
use neurosync_core::error::{Result, StudyError};
use neurosync_core::generator::StudyGenerator;
use neurosync_core::ingest::InputContext;
use neurosync_core::session::StudySession;

use crate::session_controller::StudySessionController;

/// Observable state of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Init,
    /// Fatal: no credential. Nothing leaves this state.
    ConfigError,
    Ingestion,
    Processing,
    SessionActive,
    /// Reserved for an end-of-session report; nothing enters it yet.
    SessionSummary,
}

enum Stage {
    Init,
    ConfigError(String),
    Ingestion { error: Option<String> },
    Processing(InputContext),
    SessionActive(Box<StudySessionController>),
}

/// Owns the generator (and through it the credential) and the active session.
pub struct FlowController {
    stage: Stage,
    generator: Option<Arc<dyn StudyGenerator>>,
}

impl FlowController {
    /// Starts the application.
    ///
    /// Without a credential, or when the generator cannot be built, the flow
    /// stops in [`FlowState::ConfigError`] for good.
    pub fn boot<F>(credential: Option<Credential>, factory: F) -> Self
    where
        F: FnOnce(Credential) -> Result<Arc<dyn StudyGenerator>>,
    {
        let mut flow = Self {
            stage: Stage::Init,
            generator: None,
        };

        let Some(credential) = credential else {
            let message =
                "No API key configured. Set GEMINI_API_KEY or add it to secret.json.".to_string();
            tracing::error!("{}", message);
            flow.stage = Stage::ConfigError(message);
            return flow;
        };

        match factory(credential) {
            Ok(generator) => {
                flow.generator = Some(generator);
                flow.stage = Stage::Ingestion { error: None };
                tracing::info!("ready for ingestion");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to initialise the generation client");
                flow.stage = Stage::ConfigError(err.to_string());
            }
        }
        flow
    }

    pub fn state(&self) -> FlowState {
        match self.stage {
            Stage::Init => FlowState::Init,
            Stage::ConfigError(_) => FlowState::ConfigError,
            Stage::Ingestion { .. } => FlowState::Ingestion,
            Stage::Processing(_) => FlowState::Processing,
            Stage::SessionActive(_) => FlowState::SessionActive,
        }
    }

    pub fn config_error(&self) -> Option<&str> {
        match &self.stage {
            Stage::ConfigError(message) => Some(message),
            _ => None,
        }
    }

    /// Error kept from the last failed generation, shown on the ingest screen.
    pub fn ingestion_error(&self) -> Option<&str> {
        match &self.stage {
            Stage::Ingestion { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&StudySessionController> {
        match &self.stage {
            Stage::SessionActive(controller) => Some(controller),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut StudySessionController> {
        match &mut self.stage {
            Stage::SessionActive(controller) => Some(controller),
            _ => None,
        }
    }

    /// Accepts study material and moves to processing.
    pub fn submit_input(&mut self, input: InputContext) -> Result<()> {
        self.ensure_configured()?;
        if !matches!(self.stage, Stage::Ingestion { .. }) {
            return Err(self.wrong_state("submit input"));
        }
        tracing::info!(input = %input.label(), "material submitted");
        self.stage = Stage::Processing(input);
        Ok(())
    }

    /// Generates the session for the submitted material.
    ///
    /// A generation failure is not an error for the caller: the flow returns
    /// to ingestion with the message kept in [`Self::ingestion_error`].
    pub async fn process(&mut self) -> Result<FlowState> {
        self.ensure_configured()?;
        let Stage::Processing(input) = &self.stage else {
            return Err(self.wrong_state("process"));
        };
        let input = input.clone();
        let generator = self
            .generator
            .clone()
            .ok_or_else(|| StudyError::internal("generator missing after boot"))?;

        match generator.generate_session(&input).await {
            Ok(data) => {
                let session = StudySession::new(data, input);
                self.stage =
                    Stage::SessionActive(Box::new(StudySessionController::new(session, generator)));
            }
            Err(err) => {
                tracing::warn!(error = %err, "session generation failed");
                self.stage = Stage::Ingestion {
                    error: Some(err.user_message()),
                };
            }
        }
        Ok(self.state())
    }

    /// `submit_input` followed by `process`.
    pub async fn start(&mut self, input: InputContext) -> Result<FlowState> {
        self.submit_input(input)?;
        self.process().await
    }

    /// Leaves the active session and discards all of its state.
    pub fn exit_session(&mut self) -> Result<()> {
        self.ensure_configured()?;
        if !matches!(self.stage, Stage::SessionActive(_)) {
            return Err(self.wrong_state("exit session"));
        }
        tracing::info!("session closed");
        self.stage = Stage::Ingestion { error: None };
        Ok(())
    }

    fn ensure_configured(&self) -> Result<()> {
        match &self.stage {
            Stage::ConfigError(message) => Err(StudyError::config(message.clone())),
            _ => Ok(()),
        }
    }

    fn wrong_state(&self, action: &str) -> StudyError {
        StudyError::invalid_state(format!("Cannot {} while in {:?}", action, self.state()))
    }
}
