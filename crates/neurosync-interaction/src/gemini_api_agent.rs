//! GeminiApiAgent - Direct REST API client for Gemini.
//!
//! Sends `generateContent` requests constrained to a JSON response schema and
//! returns the raw JSON text of the first candidate.

use std::time::Duration;

use neurosync_core::config::{Credential, Settings};
use neurosync_core::error::{Result, StudyError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    credential: Credential,
    model: String,
    base_url: String,
}

impl GeminiApiAgent {
    /// Creates a client for the configured model, endpoint and timeout.
    pub fn new(credential: Credential, settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|err| StudyError::config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            credential,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs one schema-constrained generation and returns the JSON text.
    ///
    /// `operation` names the call in logs and errors.
    pub async fn generate_json(
        &self,
        operation: &'static str,
        parts: Vec<Part>,
        response_schema: Value,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
            },
        };

        tracing::debug!(operation, model = %self.model, "sending Gemini request");
        self.send_request(&request).await
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.credential.expose())])
            .json(body)
            .send()
            .await
            .map_err(|err| {
                StudyError::generation(format!(
                    "Gemini API request failed: {}",
                    err.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            StudyError::generation(format!(
                "Failed to parse Gemini response: {}",
                err.without_url()
            ))
        })?;

        extract_text_response(parsed)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

/// One content part of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineDataPayload {
    pub mime_type: String,
    pub data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| StudyError::generation("Gemini API returned no text in the response candidates"))
}

fn map_http_error(status: StatusCode, body: String) -> StudyError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    StudyError::generation_status(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_request_wire_format() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineDataPayload {
                            mime_type: "application/pdf".to_string(),
                            data: "JVBERi0=".to_string(),
                        },
                    },
                    Part::Text {
                        text: "Summarise".to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: json!({"type": "OBJECT"}),
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(value["contents"][0]["parts"][1]["text"], "Summarise");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_extract_text_from_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"question\":\"Why?\"}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(
            extract_text_response(response).unwrap(),
            "{\"question\":\"Why?\"}"
        );
    }

    #[test]
    fn test_empty_candidates_is_generation_error() {
        for body in [json!({}), json!({"candidates": []}), json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]})] {
            let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
            assert!(extract_text_response(response).unwrap_err().is_generation());
        }
    }

    #[test]
    fn test_http_error_message_parsed() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let err = map_http_error(StatusCode::BAD_REQUEST, body.to_string());
        assert_eq!(
            err,
            StudyError::generation_status(400, "INVALID_ARGUMENT: API key not valid")
        );
    }

    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&received).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/v1beta/models")
    }

    fn agent_for(base_url: String) -> GeminiApiAgent {
        let settings = Settings {
            base_url,
            request_timeout_secs: 5,
            ..Settings::default()
        };
        GeminiApiAgent::new(Credential::new("test-key").unwrap(), &settings).unwrap()
    }

    #[tokio::test]
    async fn test_generate_json_round_trip_over_http() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"question\":\"How would a heat pump exploit this?\"}"}]}}]
        })
        .to_string();
        let agent = agent_for(serve_once("HTTP/1.1 200 OK", body).await);

        let text = agent
            .generate_json(
                "generate_challenge",
                vec![Part::Text {
                    text: "prompt".to_string(),
                }],
                json!({"type": "OBJECT"}),
            )
            .await
            .unwrap();
        assert!(text.contains("heat pump"));
    }

    #[tokio::test]
    async fn test_generate_json_maps_http_failure() {
        let body = json!({"error": {"message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}}).to_string();
        let agent = agent_for(serve_once("HTTP/1.1 429 Too Many Requests", body).await);

        let err = agent
            .generate_json("generate_session", Vec::new(), json!({}))
            .await
            .unwrap_err();
        match err {
            StudyError::Generation { status_code, message } => {
                assert_eq!(status_code, Some(429));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
