//! Wire types for the assistant backend

use crate::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Largest PDF accepted for upload
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// Body of a successful login or signup
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClearSourceRequest {
    pub source_type: SourceScope,
}

#[derive(Debug, Serialize)]
pub(crate) struct WebsiteRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextToSpeechRequest<'a> {
    pub text: &'a str,
}

/// Assistant reply to a chat message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub loaded_sources: Vec<String>,
}

/// Generic `{success, message}` acknowledgement
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceFlags {
    #[serde(default)]
    pub pdf: bool,
    #[serde(default)]
    pub website: bool,
}

/// Read-only snapshot from `GET /api/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub uptime: String,
    #[serde(default)]
    pub conversations: u64,
    #[serde(default)]
    pub sources: SourceFlags,
    #[serde(default)]
    pub total_sources_loaded: u32,
}

impl SourceStatus {
    pub fn server_state(&self) -> &str {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    pub fn active_session_count(&self) -> u64 {
        self.conversations
    }

    pub fn pdf_loaded(&self) -> bool {
        self.sources.pdf
    }

    pub fn website_loaded(&self) -> bool {
        self.sources.website
    }

    pub fn total_sources_loaded(&self) -> u32 {
        self.total_sources_loaded
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |loaded: bool| if loaded { "yes" } else { "no" };
        write!(
            f,
            "server: {} | uptime: {} | sessions: {} | pdf: {} | website: {} | sources: {}/2",
            self.status,
            self.uptime,
            self.conversations,
            yes_no(self.sources.pdf),
            yes_no(self.sources.website),
            self.total_sources_loaded
        )
    }
}

/// Which backend knowledge to clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceScope {
    Pdf,
    Website,
    All,
}

impl SourceScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceScope::Pdf => "pdf",
            SourceScope::Website => "website",
            SourceScope::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(SourceScope::Pdf),
            "website" => Some(SourceScope::Website),
            "all" => Some(SourceScope::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfLoaded {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteLoaded {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/speech-to-text`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl Transcription {
    /// Collapse into transcript text, or the reason nothing was recognized
    pub fn into_text(self) -> Result<String> {
        let text = self.text.trim();
        if self.success && !text.is_empty() {
            Ok(text.to_string())
        } else {
            Err(ChatError::NoSpeechDetected(
                self.error
                    .unwrap_or_else(|| "No speech detected in audio".to_string()),
            ))
        }
    }
}

/// Body of `POST /api/text-to-speech`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechSynthesis {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// A validated PDF ready for upload
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();

        if !file_name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(ChatError::InvalidInput("File must be a PDF".into()));
        }
        if bytes.is_empty() {
            return Err(ChatError::InvalidInput("No file selected".into()));
        }
        if bytes.len() > MAX_PDF_BYTES {
            return Err(ChatError::InvalidInput("PDF exceeds the 10MB limit".into()));
        }

        Ok(Self { file_name, bytes })
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ChatError::InvalidInput(format!("Not a file: {}", path.display())))?
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        Self::new(file_name, bytes)
    }
}
