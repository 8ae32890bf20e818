use super::blob::AudioBlob;
use super::capture::{CaptureConstraints, CaptureDevice};
use super::session::{RecordingSession, RecordingState};
use crate::config::RecordingConfig;
use crate::gateway::SpeechApi;
use crate::Result;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Drives recording sessions against a capture device
pub struct RecordingManager {
    device: Box<dyn CaptureDevice>,
    constraints: CaptureConstraints,
    timeslice: Duration,
    active: Option<RecordingSession>,
}

impl RecordingManager {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            constraints: CaptureConstraints::default(),
            timeslice: Duration::from_millis(100),
            active: None,
        }
    }

    pub fn from_config(device: Box<dyn CaptureDevice>, config: &RecordingConfig) -> Self {
        Self::new(device)
            .with_constraints(CaptureConstraints::from(config))
            .with_timeslice(config.timeslice())
    }

    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_timeslice(mut self, timeslice: Duration) -> Self {
        self.timeslice = timeslice;
        self
    }

    pub fn state(&self) -> RecordingState {
        self.active
            .as_ref()
            .map(RecordingSession::state)
            .unwrap_or(RecordingState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecordingState::Recording
    }

    /// Bytes captured by the active session
    pub fn captured_bytes(&mut self) -> usize {
        self.active
            .as_mut()
            .map(RecordingSession::captured_bytes)
            .unwrap_or(0)
    }

    /// Start a new session. Returns the id of the recording in progress.
    pub fn start_recording(&mut self) -> Result<Uuid> {
        if let Some(session) = self.active.as_ref() {
            warn!("Already recording");
            return Ok(session.id());
        }

        let mut session = RecordingSession::new();
        session.begin(self.device.as_ref(), &self.constraints, self.timeslice)?;

        let id = session.id();
        self.active = Some(session);
        info!("Started recording {}", id);
        Ok(id)
    }

    /// Stop the active session.
    ///
    /// `None` when nothing is recording. Otherwise the single terminal outcome
    /// of the capture: a job to transcribe, or why there is nothing to send.
    pub fn stop_recording(&mut self) -> Option<Result<TranscriptionJob>> {
        if !self.is_recording() {
            return None;
        }
        let mut session = self.active.take()?;

        let outcome = session.finish().map(|blob| {
            info!("Stopped recording {}, {} bytes", session.id(), blob.len());
            TranscriptionJob {
                session_id: session.id(),
                blob,
            }
        });

        if let Err(e) = &outcome {
            warn!("Recording {} produced no audio: {}", session.id(), e);
        }

        Some(outcome)
    }

    /// Stop, then transcribe right away
    pub async fn stop_and_transcribe<S: SpeechApi + ?Sized>(
        &mut self,
        api: &S,
    ) -> Option<Result<String>> {
        let job = match self.stop_recording()? {
            Ok(job) => job,
            Err(e) => return Some(Err(e)),
        };
        Some(job.run(api).await)
    }

    /// Throw away the active session without producing an outcome
    pub fn cancel_recording(&mut self) -> bool {
        match self.active.take() {
            Some(mut session) => {
                session.abort();
                info!("Recording {} cancelled", session.id());
                true
            }
            None => false,
        }
    }
}

impl Drop for RecordingManager {
    fn drop(&mut self) {
        self.cancel_recording();
    }
}

/// A finalized recording waiting for transcription.
///
/// Independent of the manager: stopping capture never cancels it, and a new
/// recording may start while it runs.
#[derive(Debug)]
pub struct TranscriptionJob {
    session_id: Uuid,
    blob: AudioBlob,
}

impl TranscriptionJob {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn blob(&self) -> &AudioBlob {
        &self.blob
    }

    pub async fn run<S: SpeechApi + ?Sized>(self, api: &S) -> Result<String> {
        api.speech_to_text(self.blob).await?.into_text()
    }
}
