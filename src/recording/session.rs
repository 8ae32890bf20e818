use super::blob::AudioBlob;
use super::capture::{AudioChunk, CaptureConstraints, CaptureDevice, CaptureFormat, CaptureStream};
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No capture in progress
    Idle,
    /// Microphone acquired, chunks arriving
    Recording,
    /// Stop requested, waiting for the device to flush
    Stopping,
    /// Chunks handed over, assembling the blob
    Finalizing,
}

/// One microphone capture, from acquisition to blob
///
/// The chunk channel belongs to this value alone. Anything the device sends
/// after the session is gone is dropped with the receiver.
pub struct RecordingSession {
    id: Uuid,
    state: RecordingState,
    chunks: Vec<AudioChunk>,
    chunk_tx: Sender<AudioChunk>,
    chunk_rx: Receiver<AudioChunk>,
    stream: Option<Box<dyn CaptureStream>>,
    format: Option<CaptureFormat>,
}

impl RecordingSession {
    pub fn new() -> Self {
        let (chunk_tx, chunk_rx) = unbounded();
        Self {
            id: Uuid::new_v4(),
            state: RecordingState::Idle,
            chunks: Vec::new(),
            chunk_tx,
            chunk_rx,
            stream: None,
            format: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn format(&self) -> Option<&CaptureFormat> {
        self.format.as_ref()
    }

    pub fn captured_bytes(&mut self) -> usize {
        self.collect();
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Acquire the device and start capturing. Idle → Recording.
    pub(crate) fn begin(
        &mut self,
        device: &dyn CaptureDevice,
        constraints: &CaptureConstraints,
        timeslice: Duration,
    ) -> Result<()> {
        let mut stream = device.acquire(constraints)?;

        if let Err(e) = stream.start(timeslice, self.chunk_tx.clone()) {
            stream.release();
            return Err(e);
        }

        self.format = Some(stream.format().clone());
        self.stream = Some(stream);
        self.transition(RecordingState::Recording);
        Ok(())
    }

    /// Finalize the device and assemble the blob.
    ///
    /// Recording → Stopping → Finalizing → Idle. The device is released on
    /// every path.
    pub(crate) fn finish(&mut self) -> Result<AudioBlob> {
        self.transition(RecordingState::Stopping);

        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.finalize() {
                warn!("Capture device failed to finalize cleanly: {}", e);
            }
        }

        self.collect();
        self.transition(RecordingState::Finalizing);
        self.release();

        let result = match &self.format {
            Some(format) => AudioBlob::assemble(&self.chunks, format),
            None => Err(crate::ChatError::EmptyRecording),
        };

        self.chunks.clear();
        self.transition(RecordingState::Idle);
        result
    }

    /// Discard everything captured so far
    pub(crate) fn abort(&mut self) {
        self.release();
        self.chunks.clear();
        self.transition(RecordingState::Idle);
    }

    fn collect(&mut self) {
        self.chunks.extend(self.chunk_rx.try_iter().filter(|c| !c.is_empty()));
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            debug!("Released capture device for session {}", self.id);
        }
    }

    fn transition(&mut self, next: RecordingState) {
        debug!("Recording {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.release();
    }
}
