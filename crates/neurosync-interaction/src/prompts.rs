//! Instruction templates and request part assembly.

use minijinja::{Environment, context};
use neurosync_core::error::{Result, StudyError};
use neurosync_core::ingest::InputContext;

use crate::gemini_api_agent::{InlineDataPayload, Part};

const SESSION_TEMPLATE: &str = r#"You are an expert tutor building an interactive study session from the provided academic material.

Produce:
- a short, engaging title
- a summary of the material in 2-3 sentences
- between 6 and 8 key concepts, each with a unique id, the term, a precise definition and a memorable analogy
- exactly 3 questions: 2 of type CONCEPT_CHECK (multiple choice with 4 options and the zero-based correctOptionIndex) and 1 of type SOCRATIC_DEFENSE (an open question asking the learner to defend or critique a claim from the material)

Every question needs an explanation and a difficulty.
Respond with JSON only."#;

const DEEP_DIVE_TEMPLATE: &str = r#"Give a deep dive on the concept "{{ term }}" as it appears in the provided material.

Cover three aspects:
- theoreticalUnderpinnings: the theory and mechanisms behind it
- realWorldApplication: a concrete real-world application
- interdisciplinaryConnection: a connection to a different discipline

Respond with JSON only."#;

const CHALLENGE_TEMPLATE: &str = r#"Write one challenging, open-ended question about the concept "{{ term }}" from the provided material.

The question must test application or synthesis: the learner should apply the concept to a new situation or combine it with other ideas. Do NOT ask for a definition or for recall of facts.

Respond with JSON only."#;

const EVALUATE_CHALLENGE_TEMPLATE: &str = r#"You are a strict examiner. Grade the learner's answer to the question below using the provided material as ground truth.

Question: {{ question }}
Learner answer: {{ answer }}

Pass only if the answer shows real understanding and correct application. Vague, circular or definition-only answers fail.
Return passed, a score from 0 to 100 and concise feedback.
Respond with JSON only."#;

const EVALUATE_SOCRATIC_TEMPLATE: &str = r#"Grade the learner's defence below using the provided material as ground truth.

Question: {{ question }}
Learner answer: {{ answer }}

Score from 0 to 100 for reasoning quality, accuracy and use of evidence, and give concise feedback.
Respond with JSON only."#;

const MATERIAL_TEMPLATE: &str = r#"{{ instruction }}

STUDY MATERIAL:
{{ material }}"#;

/// Renders the instruction text for each generator operation.
pub struct PromptLibrary {
    env: Environment<'static>,
}

impl PromptLibrary {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("session", SESSION_TEMPLATE),
            ("deep_dive", DEEP_DIVE_TEMPLATE),
            ("challenge", CHALLENGE_TEMPLATE),
            ("evaluate_challenge", EVALUATE_CHALLENGE_TEMPLATE),
            ("evaluate_socratic", EVALUATE_SOCRATIC_TEMPLATE),
            ("material", MATERIAL_TEMPLATE),
        ] {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    pub fn session(&self) -> Result<String> {
        self.render("session", context! {})
    }

    pub fn deep_dive(&self, term: &str) -> Result<String> {
        self.render("deep_dive", context! { term })
    }

    pub fn challenge(&self, term: &str) -> Result<String> {
        self.render("challenge", context! { term })
    }

    pub fn evaluate_challenge(&self, question: &str, answer: &str) -> Result<String> {
        self.render("evaluate_challenge", context! { question, answer })
    }

    pub fn evaluate_socratic(&self, question: &str, answer: &str) -> Result<String> {
        self.render("evaluate_socratic", context! { question, answer })
    }

    /// Builds the request parts for an instruction over the study material.
    ///
    /// Files travel as inline data ahead of the instruction; text is
    /// embedded in the prompt, cut to `max_text_chars`.
    pub fn parts(
        &self,
        instruction: String,
        input: &InputContext,
        max_text_chars: usize,
    ) -> Result<Vec<Part>> {
        match input.prompt_text(max_text_chars) {
            Some(material) => {
                let text = self.render("material", context! { instruction, material })?;
                Ok(vec![Part::Text { text }])
            }
            None => Ok(vec![
                Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: input
                            .mime_type
                            .clone()
                            .unwrap_or_else(|| "application/octet-stream".to_string()),
                        data: input.content.clone(),
                    },
                },
                Part::Text { text: instruction },
            ]),
        }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(template_error)
    }
}

fn template_error(err: minijinja::Error) -> StudyError {
    StudyError::internal(format!("Prompt template error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_prompt_names_term() {
        let prompts = PromptLibrary::new().unwrap();
        let text = prompts.challenge("Entropy").unwrap();
        assert!(text.contains("\"Entropy\""));
        assert!(text.contains("Do NOT ask for a definition"));
    }

    #[test]
    fn test_text_material_truncated() {
        let prompts = PromptLibrary::new().unwrap();
        let input = InputContext::text(format!("{}{}", "a".repeat(10), "b".repeat(10)));
        let parts = prompts.parts("Summarise".into(), &input, 10).unwrap();

        assert_eq!(parts.len(), 1);
        let Part::Text { text } = &parts[0] else {
            panic!("expected a text part");
        };
        assert!(text.starts_with("Summarise"));
        assert!(text.contains(&"a".repeat(10)));
        assert!(!text.contains('b'));
    }

    #[test]
    fn test_file_material_sent_inline() {
        let prompts = PromptLibrary::new().unwrap();
        let input = InputContext::file("JVBERi0xLjQ=", "application/pdf", "paper.pdf");
        let parts = prompts.parts("Summarise".into(), &input, 10).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: "application/pdf".into(),
                    data: "JVBERi0xLjQ=".into(),
                }
            }
        );
        assert_eq!(
            parts[1],
            Part::Text {
                text: "Summarise".into()
            }
        );
    }

    #[test]
    fn test_evaluation_prompt_embeds_answer() {
        let prompts = PromptLibrary::new().unwrap();
        let text = prompts
            .evaluate_socratic("Is entropy subjective?", "No, it is a state function.")
            .unwrap();
        assert!(text.contains("Learner answer: No, it is a state function."));
    }
}
