use super::notice::{Notice, NoticeLevel, NoticeQueue};
use crate::gateway::{ChatApi, ChatReply, PdfDocument, SourceScope, SourceStatus};
use crate::messages::types::parse_server_timestamp;
use crate::messages::{ChatMessage, Transcript};
use crate::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a submitted message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// Another send is outstanding, nothing happened
    Busy,
    /// Assistant reply appended
    Answered,
    /// Server answered without a reply; notice only
    Declined,
    /// Error entry appended
    Failed,
}

/// A user message already in the transcript, waiting for its reply
#[derive(Debug, Clone)]
pub struct PendingSend {
    message: String,
    session_id: String,
}

impl PendingSend {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Perform the network call. Touches no conversation state.
    pub async fn dispatch<A: ChatApi + ?Sized>(self, api: &A) -> SendResolution {
        let result = api.send_message(&self.message, &self.session_id).await;
        SendResolution::new(result)
    }
}

/// Result of a dispatched send, ready to merge
#[derive(Debug)]
pub struct SendResolution {
    result: Result<ChatReply>,
}

impl SendResolution {
    pub fn new(result: Result<ChatReply>) -> Self {
        Self { result }
    }
}

/// Owns the transcript and reconciles it with the backend
pub struct ConversationReconciler<A: ChatApi> {
    api: Arc<A>,
    transcript: Transcript,
    input: String,
    session_id: String,
    in_flight: bool,
    status: Option<SourceStatus>,
    notices: NoticeQueue,
}

impl<A: ChatApi> ConversationReconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            transcript: Transcript::new(),
            input: String::new(),
            session_id: format!("session-{}", Utc::now().timestamp_millis()),
            in_flight: false,
            status: None,
            notices: NoticeQueue::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.get_all()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the input control is disabled by an outstanding send
    pub fn is_sending(&self) -> bool {
        self.in_flight
    }

    pub fn status(&self) -> Option<&SourceStatus> {
        self.status.as_ref()
    }

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(level, text);
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Optimistic half of a send: append the user message and lock input.
    pub fn begin_submit(&mut self, text: &str) -> std::result::Result<PendingSend, SendOutcome> {
        if text.trim().is_empty() {
            return Err(SendOutcome::Ignored);
        }
        if self.in_flight {
            debug!("Send already in flight, ignoring submit");
            return Err(SendOutcome::Busy);
        }

        self.transcript.append(ChatMessage::user(text));
        self.input.clear();
        self.in_flight = true;

        Ok(PendingSend {
            message: text.to_string(),
            session_id: self.session_id.clone(),
        })
    }

    /// Merge the reply (or failure) of the outstanding send
    pub fn complete_submit(&mut self, resolution: SendResolution) -> SendOutcome {
        self.in_flight = false;

        match resolution.result {
            Ok(reply) if reply.success => {
                let timestamp = reply
                    .timestamp
                    .as_deref()
                    .and_then(parse_server_timestamp)
                    .unwrap_or_else(Utc::now);

                let message = ChatMessage::assistant(reply.response)
                    .with_timestamp(timestamp)
                    .with_sources(reply.loaded_sources);
                self.transcript.append(message);
                SendOutcome::Answered
            }
            Ok(_) => {
                warn!("Backend answered without a response");
                self.notices.error("Failed to get response from assistant");
                SendOutcome::Declined
            }
            Err(e) => {
                let reason = e.reason();
                warn!("Send failed: {}", e);
                self.notices.error(reason.clone());
                self.transcript.append(ChatMessage::error(&reason));
                SendOutcome::Failed
            }
        }
    }

    /// Send `text` and merge the outcome. Never fails.
    pub async fn submit_user_message(&mut self, text: &str) -> SendOutcome {
        let pending = match self.begin_submit(text) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };

        let api = Arc::clone(&self.api);
        let resolution = pending.dispatch(api.as_ref()).await;
        let outcome = self.complete_submit(resolution);

        if outcome == SendOutcome::Answered {
            self.refresh_status().await;
        }
        outcome
    }

    /// Send whatever is in the input buffer
    pub async fn submit_input(&mut self) -> SendOutcome {
        let text = self.input.clone();
        self.submit_user_message(&text).await
    }

    /// Reload the source status snapshot; failures are only logged
    pub async fn refresh_status(&mut self) -> Option<&SourceStatus> {
        match self.api.get_status().await {
            Ok(status) => self.status = Some(status),
            Err(e) => warn!("Failed to load status: {}", e),
        }
        self.status.as_ref()
    }

    pub async fn upload_document(&mut self, path: &Path) -> bool {
        let document = match PdfDocument::from_path(path).await {
            Ok(document) => document,
            Err(e) => {
                self.notices.error(e.reason());
                return false;
            }
        };

        match self.api.upload_pdf(document).await {
            Ok(loaded) if loaded.success => {
                info!("Uploaded {} ({} words)", loaded.filename, loaded.word_count);
                self.notices.success("PDF uploaded successfully!");
                self.refresh_status().await;
                self.transcript.append(ChatMessage::system(format!(
                    "📄 PDF uploaded: {} ({} words)",
                    loaded.filename, loaded.word_count
                )));
                true
            }
            Ok(loaded) => {
                self.notices.error(
                    loaded
                        .message
                        .unwrap_or_else(|| "Failed to upload PDF".to_string()),
                );
                false
            }
            Err(e) => {
                self.notices.error(e.reason());
                false
            }
        }
    }

    pub async fn load_website(&mut self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }

        match self.api.load_website(url).await {
            Ok(loaded) if loaded.success => {
                info!("Loaded {} ({} words)", loaded.url, loaded.word_count);
                self.notices.success("Website content loaded successfully!");
                self.refresh_status().await;
                self.transcript.append(ChatMessage::system(format!(
                    "🌐 Website loaded: {} ({} words)",
                    loaded.url, loaded.word_count
                )));
                true
            }
            Ok(loaded) => {
                self.notices.error(
                    loaded
                        .message
                        .unwrap_or_else(|| "Failed to load website".to_string()),
                );
                false
            }
            Err(e) => {
                self.notices.error(e.reason());
                false
            }
        }
    }

    /// Clear backend knowledge. Clearing `All` also resets the transcript,
    /// since earlier answers can no longer be grounded.
    pub async fn clear_sources(&mut self, scope: SourceScope) -> bool {
        match self.api.clear_source(scope).await {
            Ok(ack) if ack.success => {
                let message = ack
                    .message
                    .unwrap_or_else(|| format!("Cleared {} sources", scope.as_str()));
                self.notices.success(message);
                self.refresh_status().await;

                if scope == SourceScope::All {
                    self.transcript.clear();
                }
                true
            }
            Ok(ack) => {
                self.notices.error(
                    ack.message
                        .unwrap_or_else(|| "Failed to clear sources".to_string()),
                );
                false
            }
            Err(e) => {
                self.notices.error(e.reason());
                false
            }
        }
    }

    /// Clear the visible conversation only
    pub fn clear_history(&mut self) {
        self.transcript.clear();
    }

    /// Merge a recording's transcription into the input buffer
    pub fn apply_transcription(&mut self, outcome: Result<String>) {
        match outcome {
            Ok(text) => {
                self.input = text;
                self.notices.success("Speech converted to text!");
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                self.notices.error(e.reason());
            }
        }
    }
}
