//! Dashboard
//!
//! Composes the auth flows, the conversation, voice input, and read-aloud
//! behind a single command surface. The terminal loop in `main` feeds it
//! parsed [`DashboardCommand`]s and prints whatever [`Dashboard::take_updates`]
//! returns.

pub mod commands;

pub use commands::{DashboardCommand, HELP};

use crate::auth::{AuthManager, AuthSession, AuthState};
use crate::conversation::{ConversationReconciler, NoticeLevel};
use crate::gateway::{AuthApi, ChatApi, SpeechApi};
use crate::messages::ChatMessage;
use crate::playback::PlaybackController;
use crate::recording::RecordingManager;
use crate::ChatError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Whether the loop should keep going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Dashboard<G>
where
    G: AuthApi + ChatApi + SpeechApi,
{
    gateway: Arc<G>,
    auth: AuthManager<G>,
    conversation: ConversationReconciler<G>,
    recorder: Option<RecordingManager>,
    playback: PlaybackController,
    auth_rx: watch::Receiver<AuthState>,
    was_authenticated: bool,
    rendered: usize,
}

impl<G> Dashboard<G>
where
    G: AuthApi + ChatApi + SpeechApi,
{
    /// `recorder` is `None` when no capture backend is available
    pub fn new(
        gateway: Arc<G>,
        session: AuthSession,
        recorder: Option<RecordingManager>,
        playback: PlaybackController,
    ) -> Self {
        let auth_rx = session.subscribe();
        let was_authenticated = session.is_authenticated();

        Self {
            auth: AuthManager::new(Arc::clone(&gateway), session),
            conversation: ConversationReconciler::new(Arc::clone(&gateway)),
            gateway,
            recorder,
            playback,
            auth_rx,
            was_authenticated,
            rendered: 0,
        }
    }

    pub fn session(&self) -> &AuthSession {
        self.auth.session()
    }

    pub fn conversation(&self) -> &ConversationReconciler<G> {
        &self.conversation
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.as_ref().is_some_and(|r| r.is_recording())
    }

    /// Called once at startup; loads the status panel for a restored session
    pub async fn start(&mut self) {
        if let Some(user) = self.session().user() {
            self.conversation
                .notify(NoticeLevel::Info, format!("Logged in as {}", user.name));
            self.conversation.refresh_status().await;
        } else {
            self.conversation.notify(
                NoticeLevel::Info,
                "Please log in with /login <email> <password> or /signup <name> <email> <password>",
            );
        }
    }

    pub async fn handle(&mut self, command: DashboardCommand) -> Flow {
        debug!("Handling {:?}", command);

        if command.requires_auth() && !self.session().is_authenticated() {
            self.conversation
                .notify(NoticeLevel::Error, "Please log in first (/login <email> <password>)");
            return Flow::Continue;
        }

        match command {
            DashboardCommand::Send(text) => {
                self.conversation.submit_user_message(&text).await;
            }
            DashboardCommand::SendInput => {
                if self.conversation.input().trim().is_empty() {
                    self.conversation
                        .notify(NoticeLevel::Info, "Nothing to send, record something first");
                } else {
                    self.conversation.submit_input().await;
                }
            }
            DashboardCommand::StartRecording => self.start_recording(),
            DashboardCommand::StopRecording => self.stop_recording().await,
            DashboardCommand::Speak(n) => self.speak(n),
            DashboardCommand::StopSpeech => {
                if self.playback.stop() {
                    self.conversation.notify(NoticeLevel::Info, "Audio stopped");
                }
            }
            DashboardCommand::Upload(path) => {
                self.conversation.upload_document(&path).await;
            }
            DashboardCommand::LoadWebsite(url) => {
                self.conversation.load_website(&url).await;
            }
            DashboardCommand::ClearSources(scope) => {
                if self.conversation.clear_sources(scope).await && self.transcript_was_reset() {
                    self.playback.stop();
                }
            }
            DashboardCommand::ClearHistory => {
                self.playback.stop();
                self.conversation.clear_history();
                self.conversation.notify(NoticeLevel::Success, "Chat history cleared");
            }
            DashboardCommand::Status => {
                let text = match self.conversation.refresh_status().await {
                    Some(status) => status.to_string(),
                    None => "Status unavailable".to_string(),
                };
                self.conversation.notify(NoticeLevel::Info, text);
            }
            DashboardCommand::Login { email, password } => {
                match self.auth.login(&email, &password).await {
                    Ok(user) => {
                        self.was_authenticated = true;
                        self.conversation
                            .notify(NoticeLevel::Success, format!("Welcome back, {}!", user.name));
                        self.conversation.refresh_status().await;
                    }
                    Err(e) => self.conversation.notify(NoticeLevel::Error, e.reason()),
                }
            }
            DashboardCommand::Signup {
                name,
                email,
                password,
            } => match self.auth.signup(&name, &email, &password).await {
                Ok(user) => {
                    self.was_authenticated = true;
                    self.conversation.notify(
                        NoticeLevel::Success,
                        format!("Account created. Welcome, {}!", user.name),
                    );
                    self.conversation.refresh_status().await;
                }
                Err(e) => self.conversation.notify(NoticeLevel::Error, e.reason()),
            },
            DashboardCommand::Logout => {
                self.auth.logout().await;
                self.end_session();
                self.conversation.notify(NoticeLevel::Info, "Logged out");
            }
            DashboardCommand::Help => self.conversation.notify(NoticeLevel::Info, HELP),
            DashboardCommand::Quit => {
                self.end_session();
                return Flow::Quit;
            }
        }

        self.sync_auth_state();
        Flow::Continue
    }

    /// Drain playback events and watch for a session that expired mid-call
    pub fn poll(&mut self) {
        for error in self.playback.poll_events() {
            self.conversation.notify(NoticeLevel::Error, error.user_message());
        }
        self.sync_auth_state();
    }

    /// New transcript lines and notices since the last call
    pub fn take_updates(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let transcript = self.conversation.transcript();

        if transcript.len() < self.rendered {
            lines.push("-- conversation cleared --".to_string());
            self.rendered = 0;
        }

        let speaking = self.playback.active_message();
        for (offset, message) in transcript.since(self.rendered).iter().enumerate() {
            let index = self.rendered + offset + 1;
            lines.push(format_message(index, message, speaking == Some(message.id)));
        }
        self.rendered = transcript.len();

        lines.extend(
            self.conversation
                .drain_notices()
                .into_iter()
                .map(|notice| notice.to_string()),
        );
        lines
    }

    fn start_recording(&mut self) {
        let Some(recorder) = self.recorder.as_mut() else {
            self.conversation
                .notify(NoticeLevel::Error, "Voice input is not available in this build");
            return;
        };

        match recorder.start_recording() {
            Ok(_) => self
                .conversation
                .notify(NoticeLevel::Success, "🎤 Recording started - speak clearly!"),
            Err(e) => self.conversation.notify(
                NoticeLevel::Error,
                format!("Failed to start recording: {}", e.reason()),
            ),
        }
    }

    async fn stop_recording(&mut self) {
        let Some(outcome) = self.recorder.as_mut().and_then(|r| r.stop_recording()) else {
            self.conversation.notify(NoticeLevel::Info, "Not recording");
            return;
        };

        match outcome {
            Ok(job) => {
                self.conversation
                    .notify(NoticeLevel::Info, "Recording stopped, processing...");
                let text = job.run(self.gateway.as_ref()).await;
                self.conversation.apply_transcription(text);
            }
            Err(e) => self.conversation.apply_transcription(Err(e)),
        }
    }

    fn speak(&mut self, n: usize) {
        let entry = n.checked_sub(1).and_then(|i| self.conversation.transcript().get(i));
        let Some(message) = entry else {
            self.conversation
                .notify(NoticeLevel::Error, format!("No message #{}", n));
            return;
        };

        if !message.is_speakable() {
            self.conversation
                .notify(NoticeLevel::Error, "Only assistant replies can be read aloud");
            return;
        }

        match self.playback.speak(&message.content, message.id) {
            Ok(()) => self.conversation.notify(NoticeLevel::Info, "Playing audio..."),
            Err(e @ ChatError::UnsupportedPlatform) => {
                self.conversation.notify(NoticeLevel::Error, e.reason())
            }
            Err(e) => self.conversation.notify(NoticeLevel::Error, e.user_message()),
        }
    }

    fn transcript_was_reset(&self) -> bool {
        self.conversation.transcript().is_empty()
    }

    /// Tear down everything scoped to the logged-in view
    fn end_session(&mut self) {
        self.playback.stop();
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.cancel_recording();
        }
        self.conversation.clear_history();
        self.was_authenticated = false;
        self.auth_rx.mark_unchanged();
    }

    fn sync_auth_state(&mut self) {
        if !self.auth_rx.has_changed().unwrap_or(false) {
            return;
        }

        let authenticated = self.auth_rx.borrow_and_update().is_authenticated();
        if self.was_authenticated && !authenticated {
            info!("Session ended by the backend");
            self.end_session();
            self.conversation
                .notify(NoticeLevel::Error, "Your session has expired. Please log in again.");
        }
        self.was_authenticated = authenticated;
    }
}

/// Render a message for the terminal, marking the one being read aloud
pub fn format_message(index: usize, message: &ChatMessage, speaking: bool) -> String {
    let marker = if speaking { " 🔊" } else { "" };
    format!("#{} {}{}", index, message, marker)
}
