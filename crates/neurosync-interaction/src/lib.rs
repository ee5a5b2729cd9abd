//! Interaction layer for NeuroSync.
//!
//! Talks to the Gemini REST API and implements
//! [`neurosync_core::StudyGenerator`] on top of it.

pub mod config;
pub mod gemini_api_agent;
pub mod gemini_generator;
pub mod prompts;
pub mod schemas;

pub use config::{LoadedConfig, default_config_dir, load_config};
pub use gemini_api_agent::GeminiApiAgent;
pub use gemini_generator::GeminiStudyGenerator;
