//! Speech Playback Controller
//!
//! At most one utterance speaks at a time. The controller is the only code
//! that touches the [`SpeechCapability`]; starting a new utterance cancels the
//! active one first.

pub mod capability;
pub mod controller;
pub mod system;

pub use capability::{SpeechCapability, Utterance, UtteranceEvent, UtteranceId};
pub use controller::{PlaybackController, PlaybackState, PITCH, RATE, VOLUME};
pub use system::SystemSpeech;
