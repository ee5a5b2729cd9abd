//! Study content produced by the generative service.
//!
//! Field names serialize in camelCase so the types double as the JSON
//! contract with the service.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The content of one study session: a summary, the extracted concepts and
/// the quiz questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySessionData {
    pub title: String,
    pub summary: String,
    pub concepts: Vec<StudyConcept>,
    pub questions: Vec<GameQuestion>,
}

impl StudySessionData {
    /// Looks up a concept by id.
    pub fn concept(&self, id: &str) -> Option<&StudyConcept> {
        self.concepts.iter().find(|c| c.id == id)
    }

    /// Marks every concept as not yet mastered.
    ///
    /// Applied to freshly generated content; whatever the model put in the
    /// field is discarded.
    pub fn reset_mastery(&mut self) {
        for concept in &mut self.concepts {
            concept.mastered = false;
        }
    }

    /// Number of mastered concepts.
    pub fn mastered_count(&self) -> usize {
        self.concepts.iter().filter(|c| c.mastered).count()
    }
}

/// A single extracted term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyConcept {
    pub id: String,
    pub term: String,
    pub definition: String,
    pub analogy: String,
    #[serde(default)]
    pub mastered: bool,
}

/// Kind of quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    /// Multiple choice, graded locally.
    ConceptCheck,
    /// Free text defence of a position, graded by the model.
    SocraticDefense,
    /// Free text counter-argument, graded like a socratic defence.
    CounterTheory,
}

impl QuestionType {
    /// Whether answers are free text graded by the generative service.
    pub fn is_free_text(self) -> bool {
        !matches!(self, Self::ConceptCheck)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_index: Option<usize>,
    pub explanation: String,
    pub difficulty: String,
}

impl GameQuestion {
    /// Number of selectable options (zero for free text questions).
    pub fn option_count(&self) -> usize {
        self.options.as_ref().map_or(0, Vec::len)
    }
}

/// Supplementary elaboration on one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepDiveContent {
    pub theoretical_underpinnings: String,
    pub real_world_application: String,
    pub interdisciplinary_connection: String,
}

/// Strict pass/fail grading of a sync protocol answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeEvaluation {
    pub passed: bool,
    pub score: f64,
    pub feedback: String,
}

/// Grading of a free text quiz answer. Pass/fail is decided by the caller.
///
/// `score` is kept exactly as graded (0 to 100, possibly fractional) so the
/// pass threshold sees the raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocraticEvaluation {
    pub score: f64,
    pub feedback: String,
}
