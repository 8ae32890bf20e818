//! Recording Session Manager
//!
//! Owns the lifecycle of one microphone capture:
//! start → chunk collection → stop → blob assembly → transcription handoff.
//!
//! Each [`RecordingSession`] carries its own chunk channel, so a session started
//! right after a stop can never pick up chunks that belong to the previous one.

pub mod blob;
pub mod capture;
#[cfg(feature = "audio-io")]
pub mod input;
pub mod manager;
pub mod session;

pub use blob::AudioBlob;
pub use capture::{AudioChunk, CaptureConstraints, CaptureDevice, CaptureFormat, CaptureStream, ChunkSink};
#[cfg(feature = "audio-io")]
pub use input::CpalCapture;
pub use manager::{RecordingManager, TranscriptionJob};
pub use session::{RecordingSession, RecordingState};
