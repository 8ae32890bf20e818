pub mod auth;
pub mod config;
pub mod conversation;
pub mod dashboard;
pub mod gateway;
pub mod messages;
pub mod playback;
pub mod recording;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("No audio data captured")]
    EmptyRecording,

    #[error("No speech detected: {0}")]
    NoSpeechDetected(String),

    #[error("Speech playback failed: {0}")]
    PlaybackFailed(String),

    #[error("Text-to-speech is not supported on this platform")]
    UnsupportedPlatform,

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Server error ({status}): {detail}")]
    ServerError { status: u16, detail: String },

    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::IOError(e.to_string())
    }
}

impl ChatError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/permission problems need the user to act
            ChatError::DeviceUnavailable(_) => false,
            ChatError::EmptyRecording => true,
            ChatError::NoSpeechDetected(_) => true,
            ChatError::PlaybackFailed(_) => true,
            ChatError::UnsupportedPlatform => false,
            // A retry is always a new explicit user action
            ChatError::TransportFailure(_) => true,
            ChatError::ServerError { .. } => true,
            // Requires logging in again
            ChatError::AuthExpired(_) => false,
            ChatError::InvalidInput(_) => true,
            ChatError::ConfigError(_) => false,
            ChatError::IOError(_) => false,
        }
    }

    /// Human-readable reason, as shown in notices and error transcript entries
    pub fn reason(&self) -> String {
        match self {
            ChatError::DeviceUnavailable(detail)
            | ChatError::NoSpeechDetected(detail)
            | ChatError::PlaybackFailed(detail)
            | ChatError::TransportFailure(detail)
            | ChatError::AuthExpired(detail)
            | ChatError::InvalidInput(detail)
            | ChatError::ConfigError(detail)
            | ChatError::IOError(detail) => detail.clone(),
            ChatError::ServerError { detail, .. } => detail.clone(),
            ChatError::EmptyRecording => {
                "No audio data captured. Please try recording again.".to_string()
            }
            ChatError::UnsupportedPlatform => {
                "Text-to-speech not supported on this system".to_string()
            }
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            ChatError::DeviceUnavailable(_) => {
                "Microphone unavailable. Please check your audio device and permissions.".to_string()
            }
            ChatError::EmptyRecording => {
                "No audio data captured. Please try recording again.".to_string()
            }
            ChatError::NoSpeechDetected(_) => {
                "No speech detected. Please speak clearly and try again.".to_string()
            }
            ChatError::PlaybackFailed(_) => "Speech playback failed".to_string(),
            ChatError::UnsupportedPlatform => {
                "Text-to-speech not supported on this system".to_string()
            }
            ChatError::TransportFailure(_) => {
                "Could not reach the assistant. Please try again.".to_string()
            }
            ChatError::ServerError { detail, .. } => detail.clone(),
            ChatError::AuthExpired(_) => {
                "Your session has expired. Please log in again.".to_string()
            }
            ChatError::InvalidInput(detail) => detail.clone(),
            ChatError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            ChatError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
