//! Response schemas sent to Gemini and the typed contracts they map onto.
//!
//! Parsing fails fast: missing required fields, out-of-range scores and
//! inconsistent questions are rejected rather than patched up.

use std::collections::HashSet;

use neurosync_core::error::{Result, StudyError};
use neurosync_core::model::{
    ChallengeEvaluation, DeepDiveContent, QuestionType, SocraticEvaluation, StudySessionData,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

pub const OP_GENERATE_SESSION: &str = "generate_session";
pub const OP_GENERATE_DEEP_DIVE: &str = "generate_deep_dive";
pub const OP_GENERATE_CHALLENGE: &str = "generate_challenge";
pub const OP_EVALUATE_CHALLENGE: &str = "evaluate_challenge";
pub const OP_EVALUATE_SOCRATIC: &str = "evaluate_socratic_answer";

pub fn session_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {"type": "STRING"},
            "summary": {"type": "STRING"},
            "concepts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": {"type": "STRING"},
                        "term": {"type": "STRING"},
                        "definition": {"type": "STRING"},
                        "analogy": {"type": "STRING"}
                    },
                    "required": ["id", "term", "definition", "analogy"]
                }
            },
            "questions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": {"type": "STRING"},
                        "type": {
                            "type": "STRING",
                            "enum": ["CONCEPT_CHECK", "SOCRATIC_DEFENSE", "COUNTER_THEORY"]
                        },
                        "question": {"type": "STRING"},
                        "options": {"type": "ARRAY", "items": {"type": "STRING"}},
                        "correctOptionIndex": {"type": "INTEGER"},
                        "explanation": {"type": "STRING"},
                        "difficulty": {"type": "STRING"}
                    },
                    "required": ["id", "type", "question", "explanation", "difficulty"]
                }
            }
        },
        "required": ["title", "summary", "concepts", "questions"]
    })
}

pub fn deep_dive_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "theoreticalUnderpinnings": {"type": "STRING"},
            "realWorldApplication": {"type": "STRING"},
            "interdisciplinaryConnection": {"type": "STRING"}
        },
        "required": ["theoreticalUnderpinnings", "realWorldApplication", "interdisciplinaryConnection"]
    })
}

pub fn challenge_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": {"type": "STRING"}
        },
        "required": ["question"]
    })
}

pub fn challenge_evaluation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "passed": {"type": "BOOLEAN"},
            "score": {"type": "NUMBER"},
            "feedback": {"type": "STRING"}
        },
        "required": ["passed", "score", "feedback"]
    })
}

pub fn socratic_evaluation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": {"type": "NUMBER"},
            "feedback": {"type": "STRING"}
        },
        "required": ["score", "feedback"]
    })
}

#[derive(Deserialize)]
struct ChallengeWire {
    question: String,
}

#[derive(Deserialize)]
struct ChallengeEvaluationWire {
    passed: bool,
    score: f64,
    feedback: String,
}

#[derive(Deserialize)]
struct SocraticEvaluationWire {
    score: f64,
    feedback: String,
}

fn parse<T: DeserializeOwned>(operation: &'static str, text: &str) -> Result<T> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StudyError::generation(format!(
            "{operation}: empty response payload"
        )));
    }
    serde_json::from_str(text).map_err(|err| StudyError::schema(operation, err.to_string()))
}

/// Rejects scores outside 0-100. Fractional scores pass through unchanged.
fn score_0_100(operation: &'static str, score: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&score) {
        return Err(StudyError::schema(
            operation,
            format!("score {score} is outside 0-100"),
        ));
    }
    Ok(score)
}

/// Parses a generated session and forces every concept to unmastered.
pub fn parse_session(text: &str) -> Result<StudySessionData> {
    let mut data: StudySessionData = parse(OP_GENERATE_SESSION, text)?;
    validate_session(&data)?;
    data.reset_mastery();
    Ok(data)
}

fn validate_session(data: &StudySessionData) -> Result<()> {
    let fail = |message: String| Err(StudyError::schema(OP_GENERATE_SESSION, message));

    if data.concepts.is_empty() {
        return fail("no concepts returned".to_string());
    }
    if data.questions.is_empty() {
        return fail("no questions returned".to_string());
    }

    let mut seen = HashSet::new();
    for concept in &data.concepts {
        if concept.id.trim().is_empty() {
            return fail(format!("concept '{}' has an empty id", concept.term));
        }
        if !seen.insert(concept.id.as_str()) {
            return fail(format!("duplicate concept id '{}'", concept.id));
        }
    }

    for question in &data.questions {
        if question.question_type != QuestionType::ConceptCheck {
            continue;
        }
        let options = question.option_count();
        match question.correct_option_index {
            _ if options < 2 => {
                return fail(format!(
                    "question '{}' needs at least two options",
                    question.id
                ));
            }
            Some(index) if index < options => {}
            Some(index) => {
                return fail(format!(
                    "question '{}' marks option {index} correct but has {options} options",
                    question.id
                ));
            }
            None => {
                return fail(format!(
                    "question '{}' has no correctOptionIndex",
                    question.id
                ));
            }
        }
    }
    Ok(())
}

pub fn parse_deep_dive(text: &str) -> Result<DeepDiveContent> {
    parse(OP_GENERATE_DEEP_DIVE, text)
}

pub fn parse_challenge(text: &str) -> Result<String> {
    let wire: ChallengeWire = parse(OP_GENERATE_CHALLENGE, text)?;
    let question = wire.question.trim().to_string();
    if question.is_empty() {
        return Err(StudyError::schema(OP_GENERATE_CHALLENGE, "empty question"));
    }
    Ok(question)
}

pub fn parse_challenge_evaluation(text: &str) -> Result<ChallengeEvaluation> {
    let wire: ChallengeEvaluationWire = parse(OP_EVALUATE_CHALLENGE, text)?;
    Ok(ChallengeEvaluation {
        passed: wire.passed,
        score: score_0_100(OP_EVALUATE_CHALLENGE, wire.score)?,
        feedback: wire.feedback,
    })
}

pub fn parse_socratic_evaluation(text: &str) -> Result<SocraticEvaluation> {
    let wire: SocraticEvaluationWire = parse(OP_EVALUATE_SOCRATIC, text)?;
    Ok(SocraticEvaluation {
        score: score_0_100(OP_EVALUATE_SOCRATIC, wire.score)?,
        feedback: wire.feedback,
    })
}
