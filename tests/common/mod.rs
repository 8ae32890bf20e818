//! In-process fakes for the backend and the microphone

#![allow(dead_code)]

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use wolfchat::gateway::{
    Acknowledgement, AuthApi, AuthResponse, ChatApi, ChatReply, PdfDocument, PdfLoaded,
    SourceFlags, SourceScope, SourceStatus, SpeechApi, SpeechSynthesis, Transcription, User,
    WebsiteLoaded,
};
use wolfchat::recording::{
    AudioBlob, AudioChunk, CaptureConstraints, CaptureDevice, CaptureFormat, CaptureStream,
    ChunkSink,
};
use wolfchat::{ChatError, Result};

pub fn user() -> User {
    User {
        name: "Ada".into(),
        email: "ada@example.com".into(),
    }
}

pub fn reply(text: &str) -> ChatReply {
    ChatReply {
        success: true,
        response: text.into(),
        timestamp: Some("2024-05-01T12:00:00.123456".into()),
        loaded_sources: vec!["PDF Catalog".into()],
    }
}

pub fn running_status(pdf: bool) -> SourceStatus {
    SourceStatus {
        status: "running".into(),
        uptime: "Active".into(),
        conversations: 1,
        sources: SourceFlags {
            pdf,
            website: false,
        },
        total_sources_loaded: pdf as u32,
    }
}

/// Scripted backend that records every call it receives
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<String>>,
    pub chat_replies: Mutex<VecDeque<Result<ChatReply>>>,
    pub transcriptions: Mutex<VecDeque<Result<Transcription>>>,
    pub status: Mutex<Option<SourceStatus>>,
    pub clear_fails: Mutex<Option<ChatError>>,
    pub logout_fails: Mutex<Option<ChatError>>,
    pub login_fails: Mutex<Option<ChatError>>,
    pub uploads: Mutex<Vec<PdfDocument>>,
    pub audio: Mutex<Vec<AudioBlob>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(Some(running_status(false))),
            ..Default::default()
        })
    }

    pub fn queue_reply(&self, reply: Result<ChatReply>) {
        self.chat_replies.lock().push_back(reply);
    }

    pub fn queue_transcription(&self, result: Result<Transcription>) {
        self.transcriptions.lock().push_back(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(call)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl AuthApi for FakeBackend {
    fn login<'a>(&'a self, email: &'a str, _password: &'a str) -> BoxFuture<'a, Result<AuthResponse>> {
        async move {
            self.record(format!("login:{}", email));
            if let Some(e) = self.login_fails.lock().clone() {
                return Err(e);
            }
            Ok(AuthResponse {
                user: user(),
                token: "token-123".into(),
                message: Some("Login successful".into()),
            })
        }
        .boxed()
    }

    fn signup<'a>(
        &'a self,
        name: &'a str,
        email: &'a str,
        _password: &'a str,
    ) -> BoxFuture<'a, Result<AuthResponse>> {
        async move {
            self.record(format!("signup:{}", email));
            Ok(AuthResponse {
                user: User {
                    name: name.into(),
                    email: email.into(),
                },
                token: "token-456".into(),
                message: None,
            })
        }
        .boxed()
    }

    fn logout(&self) -> BoxFuture<'_, Result<Acknowledgement>> {
        async move {
            self.record("logout");
            if let Some(e) = self.logout_fails.lock().clone() {
                return Err(e);
            }
            Ok(Acknowledgement {
                success: true,
                message: Some("Logout successful".into()),
            })
        }
        .boxed()
    }
}

impl ChatApi for FakeBackend {
    fn send_message<'a>(
        &'a self,
        message: &'a str,
        _session_id: &'a str,
    ) -> BoxFuture<'a, Result<ChatReply>> {
        async move {
            self.record(format!("chat:{}", message));
            self.chat_replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(reply("ok")))
        }
        .boxed()
    }

    fn get_status(&self) -> BoxFuture<'_, Result<SourceStatus>> {
        async move {
            self.record("status");
            self.status
                .lock()
                .clone()
                .ok_or_else(|| ChatError::TransportFailure("Failed to load status".into()))
        }
        .boxed()
    }

    fn clear_source(&self, scope: SourceScope) -> BoxFuture<'_, Result<Acknowledgement>> {
        async move {
            self.record(format!("clear:{}", scope.as_str()));
            if let Some(e) = self.clear_fails.lock().clone() {
                return Err(e);
            }
            Ok(Acknowledgement {
                success: true,
                message: Some(format!("Cleared {} sources", scope.as_str())),
            })
        }
        .boxed()
    }

    fn upload_pdf(&self, document: PdfDocument) -> BoxFuture<'_, Result<PdfLoaded>> {
        async move {
            self.record(format!("upload:{}", document.file_name));
            let loaded = PdfLoaded {
                success: true,
                filename: document.file_name.clone(),
                word_count: 42,
                message: None,
            };
            self.uploads.lock().push(document);
            Ok(loaded)
        }
        .boxed()
    }

    fn load_website<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<WebsiteLoaded>> {
        async move {
            self.record(format!("website:{}", url));
            Ok(WebsiteLoaded {
                success: true,
                url: url.into(),
                word_count: 7,
                message: None,
            })
        }
        .boxed()
    }
}

impl SpeechApi for FakeBackend {
    fn speech_to_text(&self, audio: AudioBlob) -> BoxFuture<'_, Result<Transcription>> {
        async move {
            self.record("stt");
            self.audio.lock().push(audio);
            self.transcriptions.lock().pop_front().unwrap_or_else(|| {
                Ok(Transcription {
                    success: true,
                    text: "hello from the mic".into(),
                    error: None,
                })
            })
        }
        .boxed()
    }

    fn text_to_speech<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<SpeechSynthesis>> {
        async move {
            self.record("tts");
            Ok(SpeechSynthesis {
                success: true,
                message: Some("Use browser speech synthesis".into()),
                text: text.into(),
            })
        }
        .boxed()
    }
}

/// Shared view of what the fake microphone was asked to do
#[derive(Default)]
pub struct MicLog {
    pub acquired: usize,
    pub released: usize,
    pub sinks: Vec<ChunkSink>,
}

/// Microphone whose chunks are pushed by the test through the recorded sinks
#[derive(Clone, Default)]
pub struct FakeMic {
    pub log: Arc<Mutex<MicLog>>,
    pub unavailable: bool,
    pub fail_start: bool,
}

impl FakeMic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Deliver a chunk as if from the `n`-th stream ever started
    pub fn push(&self, stream: usize, chunk: AudioChunk) -> bool {
        self.log.lock().sinks[stream].send(chunk).is_ok()
    }

    pub fn acquired(&self) -> usize {
        self.log.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.log.lock().released
    }
}

impl CaptureDevice for FakeMic {
    fn acquire(&self, _constraints: &CaptureConstraints) -> Result<Box<dyn CaptureStream>> {
        if self.unavailable {
            return Err(ChatError::DeviceUnavailable("Permission denied".into()));
        }
        self.log.lock().acquired += 1;
        Ok(Box::new(FakeStream {
            log: Arc::clone(&self.log),
            format: CaptureFormat::pcm16(16000, 1),
            fail_start: self.fail_start,
            released: false,
        }))
    }
}

struct FakeStream {
    log: Arc<Mutex<MicLog>>,
    format: CaptureFormat,
    fail_start: bool,
    released: bool,
}

impl CaptureStream for FakeStream {
    fn format(&self) -> &CaptureFormat {
        &self.format
    }

    fn start(&mut self, _timeslice: Duration, sink: ChunkSink) -> Result<()> {
        if self.fail_start {
            return Err(ChatError::DeviceUnavailable("Device busy".into()));
        }
        self.log.lock().sinks.push(sink);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.lock().released += 1;
        }
    }
}

/// Little-endian PCM16 bytes
pub fn pcm(samples: &[i16]) -> AudioChunk {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
