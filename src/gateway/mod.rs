//! Remote Operation Gateway
//!
//! One operation per backend capability, split by concern:
//!
//! - **AuthApi**: login, signup, logout
//! - **ChatApi**: chat, status, source management, document ingestion
//! - **SpeechApi**: speech-to-text and text-to-speech
//!
//! Every call is single-attempt. Failures come back as typed [`ChatError`]s
//! carrying a human-readable reason; a 401 from any operation invalidates the
//! session before the error is returned.
//!
//! [`ChatError`]: crate::ChatError

pub mod http;
pub mod interceptor;
pub mod types;

pub use http::HttpGateway;
pub use interceptor::{authorize, SessionProvider};
pub use types::{
    Acknowledgement, AuthResponse, ChatReply, PdfDocument, PdfLoaded, SourceFlags, SourceScope,
    SourceStatus, SpeechSynthesis, Transcription, User, WebsiteLoaded, MAX_PDF_BYTES,
};

use crate::recording::AudioBlob;
use crate::Result;
use futures::future::BoxFuture;

/// Backend operations, with their route and fallback failure reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Signup,
    Logout,
    SendMessage,
    Status,
    ClearSource,
    UploadPdf,
    LoadWebsite,
    SpeechToText,
    TextToSpeech,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::Login => "/api/login",
            Operation::Signup => "/api/signup",
            Operation::Logout => "/api/logout",
            Operation::SendMessage => "/api/chat",
            Operation::Status => "/api/status",
            Operation::ClearSource => "/api/clear_source",
            Operation::UploadPdf => "/api/load_pdf",
            Operation::LoadWebsite => "/api/load_website",
            Operation::SpeechToText => "/api/speech-to-text",
            Operation::TextToSpeech => "/api/text-to-speech",
        }
    }

    /// Reason used when the response carries no detail
    pub fn fallback_reason(&self) -> &'static str {
        match self {
            Operation::Login => "Login failed",
            Operation::Signup => "Signup failed",
            Operation::Logout => "Logout failed",
            Operation::SendMessage => "Failed to send message",
            Operation::Status => "Failed to load status",
            Operation::ClearSource => "Failed to clear sources",
            Operation::UploadPdf => "Failed to upload PDF",
            Operation::LoadWebsite => "Failed to load website",
            Operation::SpeechToText => "Speech recognition failed",
            Operation::TextToSpeech => "Text-to-speech failed",
        }
    }
}

pub trait AuthApi: Send + Sync {
    fn login<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<AuthResponse>>;

    fn signup<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthResponse>>;

    fn logout(&self) -> BoxFuture<'_, Result<Acknowledgement>>;
}

pub trait ChatApi: Send + Sync {
    fn send_message<'a>(
        &'a self,
        message: &'a str,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<ChatReply>>;

    fn get_status(&self) -> BoxFuture<'_, Result<SourceStatus>>;

    fn clear_source(&self, scope: SourceScope) -> BoxFuture<'_, Result<Acknowledgement>>;

    fn upload_pdf(&self, document: PdfDocument) -> BoxFuture<'_, Result<PdfLoaded>>;

    fn load_website<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<WebsiteLoaded>>;
}

pub trait SpeechApi: Send + Sync {
    fn speech_to_text(&self, audio: AudioBlob) -> BoxFuture<'_, Result<Transcription>>;

    fn text_to_speech<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<SpeechSynthesis>>;
}
