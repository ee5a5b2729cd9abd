//! Ingest boundary: turning pasted text or an uploaded file into an
//! [`InputContext`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};

/// Pasted text must be longer than this many characters to start a session.
pub const MIN_TEXT_CHARS: usize = 50;

/// Default character budget for text embedded in a prompt.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 30_000;

const PDF_MIME: &str = "application/pdf";
const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    File,
}

/// The raw study material for one session.
///
/// For [`InputKind::File`] the content is base64 encoded binary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputContext {
    pub kind: InputKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl InputContext {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: InputKind::Text,
            content: content.into(),
            mime_type: None,
            file_name: None,
        }
    }

    pub fn file(
        data_base64: impl Into<String>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: InputKind::File,
            content: data_base64.into(),
            mime_type: Some(mime_type.into()),
            file_name: Some(file_name.into()),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == InputKind::File
    }

    /// Text to embed in a prompt, cut to at most `max_chars` characters.
    ///
    /// Returns `None` for file inputs, which travel as inline data instead.
    pub fn prompt_text(&self, max_chars: usize) -> Option<&str> {
        match self.kind {
            InputKind::File => None,
            InputKind::Text => Some(truncate_chars(&self.content, max_chars)),
        }
    }

    /// Short human readable label for logs and the front-end.
    pub fn label(&self) -> String {
        match (&self.kind, &self.file_name) {
            (_, Some(name)) => name.clone(),
            (InputKind::Text, None) => format!("pasted text ({} chars)", self.content.chars().count()),
            (InputKind::File, None) => "uploaded file".to_string(),
        }
    }
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// How an uploaded file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    /// `text/plain`, `.md`, `.txt`: read as text.
    PlainText,
    /// `application/pdf`: read as base64.
    Pdf,
}

impl UploadFormat {
    /// Classifies an upload by MIME type first, then by file extension.
    pub fn detect(file_name: &str, mime_type: Option<&str>) -> Result<Self> {
        match mime_type.map(str::to_ascii_lowercase).as_deref() {
            Some(TEXT_MIME) | Some("text/markdown") => return Ok(Self::PlainText),
            Some(PDF_MIME) => return Ok(Self::Pdf),
            _ => {}
        }

        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("md") | Some("txt") => Ok(Self::PlainText),
            Some("pdf") => Ok(Self::Pdf),
            _ => Err(StudyError::invalid_input(format!(
                "Unsupported file type for '{}'. Please upload a PDF, .txt or .md file.",
                file_name
            ))),
        }
    }
}

/// A file that has been read and accepted at the ingest boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// Editable ingest form state.
///
/// Holds either pasted text or a loaded binary file, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestDraft {
    text: String,
    text_source: Option<String>,
    file: Option<LoadedFile>,
}

impl IngestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the pasted text. Clears any loaded file.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.text_source = None;
        self.file = None;
    }

    /// Accepts an uploaded file.
    ///
    /// Text files land in the pasted text area; PDFs are held as base64 and
    /// clear the pasted text. Anything else is rejected and leaves the draft
    /// untouched.
    pub fn load_file(&mut self, file_name: &str, mime_type: Option<&str>, bytes: &[u8]) -> Result<()> {
        match UploadFormat::detect(file_name, mime_type)? {
            UploadFormat::PlainText => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                    StudyError::invalid_input(format!("'{}' is not valid UTF-8 text", file_name))
                })?;
                self.text = text;
                self.text_source = Some(file_name.to_string());
                self.file = None;
            }
            UploadFormat::Pdf => {
                self.file = Some(LoadedFile {
                    file_name: file_name.to_string(),
                    mime_type: PDF_MIME.to_string(),
                    data_base64: BASE64_STANDARD.encode(bytes),
                });
                self.text.clear();
                self.text_source = None;
            }
        }
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file(&self) -> Option<&LoadedFile> {
        self.file.as_ref()
    }

    /// Whether the start action is enabled: a file is loaded, or the pasted
    /// text is longer than [`MIN_TEXT_CHARS`] and not only whitespace.
    pub fn can_start(&self) -> bool {
        self.file.is_some()
            || (self.text.chars().count() > MIN_TEXT_CHARS && !self.text.trim().is_empty())
    }

    /// Builds the session input, or explains why the draft is not ready.
    pub fn build(&self) -> Result<InputContext> {
        if let Some(file) = &self.file {
            return Ok(InputContext::file(
                file.data_base64.clone(),
                file.mime_type.clone(),
                file.file_name.clone(),
            ));
        }

        if !self.can_start() {
            return Err(StudyError::invalid_input(format!(
                "Please provide more than {} characters of study material",
                MIN_TEXT_CHARS
            )));
        }

        let mut input = InputContext::text(self.text.clone());
        input.file_name = self.text_source.clone();
        Ok(input)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_rejected() {
        let mut draft = IngestDraft::new();
        draft.set_text("a".repeat(MIN_TEXT_CHARS));
        assert!(!draft.can_start());
        assert!(draft.build().unwrap_err().is_input());
    }

    #[test]
    fn test_long_text_accepted() {
        let mut draft = IngestDraft::new();
        draft.set_text("a".repeat(MIN_TEXT_CHARS + 1));
        assert!(draft.can_start());
        let input = draft.build().unwrap();
        assert_eq!(input.kind, InputKind::Text);
    }

    #[test]
    fn test_length_boundary_counts_whitespace() {
        let mut draft = IngestDraft::new();
        draft.set_text(format!("{} ", "a".repeat(MIN_TEXT_CHARS - 1)));
        assert!(!draft.can_start());

        draft.set_text(format!("{} ", "a".repeat(MIN_TEXT_CHARS)));
        assert!(draft.can_start());
        let input = draft.build().unwrap();
        assert_eq!(input.content.chars().count(), MIN_TEXT_CHARS + 1);
        assert!(input.content.ends_with(' '));
    }

    #[test]
    fn test_whitespace_only_text_rejected() {
        let mut draft = IngestDraft::new();
        draft.set_text(" \n".repeat(40));
        assert!(!draft.can_start());
        assert!(draft.build().unwrap_err().is_input());
    }

    #[test]
    fn test_pdf_accepted_without_text_and_clears_text() {
        let mut draft = IngestDraft::new();
        draft.set_text("short");
        draft
            .load_file("notes.pdf", Some("application/pdf"), b"%PDF-1.4")
            .unwrap();
        assert_eq!(draft.text(), "");
        assert!(draft.can_start());

        let input = draft.build().unwrap();
        assert!(input.is_file());
        assert_eq!(input.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(input.content, BASE64_STANDARD.encode(b"%PDF-1.4"));
    }

    #[test]
    fn test_pasting_text_clears_file() {
        let mut draft = IngestDraft::new();
        draft.load_file("paper.pdf", None, b"bytes").unwrap();
        draft.set_text("x".repeat(80));
        assert!(draft.file().is_none());
        assert!(!draft.build().unwrap().is_file());
    }

    #[test]
    fn test_markdown_read_as_text() {
        let mut draft = IngestDraft::new();
        draft
            .load_file("lecture.md", None, "# Thermodynamics\n".as_bytes())
            .unwrap();
        assert_eq!(draft.text(), "# Thermodynamics\n");
        assert!(draft.file().is_none());
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let mut draft = IngestDraft::new();
        draft.set_text("kept");
        let err = draft
            .load_file("slides.pptx", Some("application/vnd.ms-powerpoint"), b"..")
            .unwrap_err();
        assert!(err.is_input());
        assert_eq!(draft.text(), "kept");
    }

    #[test]
    fn test_prompt_text_truncates_on_char_boundary() {
        let input = InputContext::text("ééééé");
        assert_eq!(input.prompt_text(3), Some("ééé"));
        assert_eq!(input.prompt_text(10), Some("ééééé"));

        let file = InputContext::file("AAAA", "application/pdf", "a.pdf");
        assert_eq!(file.prompt_text(3), None);
    }
}
