use crate::Result;
use crossbeam_channel::Sender;
use uuid::Uuid;

pub type UtteranceId = u64;

/// Text to be read aloud, with voice settings
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    /// Transcript entry being read
    pub message_id: Uuid,
    pub text: String,
    /// 1.0 is the engine's normal speed
    pub rate: f32,
    /// 1.0 is the engine's normal pitch
    pub pitch: f32,
    /// 0.0 to 1.0
    pub volume: f32,
}

/// Callback from the speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    Started { utterance_id: UtteranceId },
    Ended { utterance_id: UtteranceId },
    Failed { utterance_id: UtteranceId, error: String },
}

impl UtteranceEvent {
    pub fn utterance_id(&self) -> UtteranceId {
        match self {
            UtteranceEvent::Started { utterance_id }
            | UtteranceEvent::Ended { utterance_id }
            | UtteranceEvent::Failed { utterance_id, .. } => *utterance_id,
        }
    }
}

/// A host speech-synthesis engine
pub trait SpeechCapability: Send + Sync {
    /// Begin speaking. Progress is reported through `events`.
    fn speak(&self, utterance: Utterance, events: Sender<UtteranceEvent>) -> Result<()>;

    /// Stop whatever is being spoken. Synchronous.
    fn cancel(&self);
}
