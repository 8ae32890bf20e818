use crate::config::RecordingConfig;
use crate::Result;
use crossbeam_channel::Sender;
use std::time::Duration;

/// Little-endian 16-bit PCM bytes for one timeslice
pub type AudioChunk = Vec<u8>;

/// Where a capture stream delivers its chunks
pub type ChunkSink = Sender<AudioChunk>;

/// Requested capture processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    /// Preferred sample rate; devices fall back to their default
    pub sample_rate: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            sample_rate: 44100,
        }
    }
}

impl From<&RecordingConfig> for CaptureConstraints {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            echo_cancellation: config.echo_cancellation,
            noise_suppression: config.noise_suppression,
            sample_rate: config.sample_rate,
        }
    }
}

/// Negotiated codec of a capture stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFormat {
    pub mime_type: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl CaptureFormat {
    /// 16-bit PCM, assembled into a WAV container
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            mime_type: "audio/wav".to_string(),
            sample_rate,
            channels,
        }
    }

    /// Bytes produced per `timeslice` of audio
    pub fn bytes_per_slice(&self, timeslice: Duration) -> usize {
        let frames = self.sample_rate as u128 * timeslice.as_millis() / 1000;
        (frames as usize * self.channels as usize * 2).max(2)
    }
}

/// An audio input that can be opened for capture
pub trait CaptureDevice {
    /// Open the device. Fails with `DeviceUnavailable` when there is no device
    /// or access is denied.
    fn acquire(&self, constraints: &CaptureConstraints) -> Result<Box<dyn CaptureStream>>;
}

/// An opened input
pub trait CaptureStream {
    fn format(&self) -> &CaptureFormat;

    /// Begin capturing, delivering one chunk per `timeslice` into `sink`
    fn start(&mut self, timeslice: Duration, sink: ChunkSink) -> Result<()>;

    /// Stop capturing and flush buffered audio into the sink.
    /// No chunk is delivered after this returns.
    fn finalize(&mut self) -> Result<()>;

    /// Stop all tracks and free the device. Idempotent.
    fn release(&mut self);
}
