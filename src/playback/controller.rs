use super::capability::{SpeechCapability, Utterance, UtteranceEvent, UtteranceId};
use crate::{ChatError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const RATE: f32 = 0.9;
pub const PITCH: f32 = 1.0;
pub const VOLUME: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveUtterance {
    id: UtteranceId,
    message_id: Uuid,
}

pub struct PlaybackController {
    capability: Option<Arc<dyn SpeechCapability>>,
    state: PlaybackState,
    active: Option<ActiveUtterance>,
    next_id: UtteranceId,
    event_tx: Sender<UtteranceEvent>,
    event_rx: Receiver<UtteranceEvent>,
}

impl PlaybackController {
    /// `None` when the host has no speech engine
    pub fn new(capability: Option<Arc<dyn SpeechCapability>>) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            capability,
            state: PlaybackState::Idle,
            active: None,
            next_id: 1,
            event_tx,
            event_rx,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.capability.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_speaking(&self) -> bool {
        self.state == PlaybackState::Speaking
    }

    /// Message currently being read aloud
    pub fn active_message(&self) -> Option<Uuid> {
        self.active.map(|a| a.message_id)
    }

    /// Read `text` aloud, cancelling anything already speaking
    pub fn speak(&mut self, text: &str, message_id: Uuid) -> Result<()> {
        let capability = self
            .capability
            .clone()
            .ok_or(ChatError::UnsupportedPlatform)?;

        if self.is_speaking() {
            self.cancel_active(capability.as_ref());
        }

        let utterance = Utterance {
            id: self.next_id,
            message_id,
            text: text.to_string(),
            rate: RATE,
            pitch: PITCH,
            volume: VOLUME,
        };
        self.next_id += 1;

        let id = utterance.id;
        if let Err(e) = capability.speak(utterance, self.event_tx.clone()) {
            warn!("Speech engine rejected utterance: {}", e);
            self.finish();
            return Err(ChatError::PlaybackFailed(e.reason()));
        }

        self.active = Some(ActiveUtterance { id, message_id });
        self.state = PlaybackState::Speaking;
        info!("Speaking message {}", message_id);
        Ok(())
    }

    /// Cancel the active utterance. Returns false when already idle.
    pub fn stop(&mut self) -> bool {
        if !self.is_speaking() {
            return false;
        }

        match self.capability.clone() {
            Some(capability) => self.cancel_active(capability.as_ref()),
            None => self.finish(),
        }
        info!("Audio stopped");
        true
    }

    /// Apply queued engine callbacks; returns playback failures
    pub fn poll_events(&mut self) -> Vec<ChatError> {
        let mut failures = Vec::new();

        while let Ok(event) = self.event_rx.try_recv() {
            if self.active.map(|a| a.id) != Some(event.utterance_id()) {
                debug!("Ignoring stale speech event {:?}", event);
                continue;
            }

            match event {
                UtteranceEvent::Started { .. } => {
                    self.state = PlaybackState::Speaking;
                }
                UtteranceEvent::Ended { .. } => {
                    debug!("Utterance finished");
                    self.finish();
                }
                UtteranceEvent::Failed { error, .. } => {
                    warn!("Speech playback failed: {}", error);
                    self.finish();
                    failures.push(ChatError::PlaybackFailed(error));
                }
            }
        }

        failures
    }

    fn cancel_active(&mut self, capability: &dyn SpeechCapability) {
        capability.cancel();
        debug!("Cancelled utterance {:?}", self.active.map(|a| a.id));
        self.finish();
    }

    fn finish(&mut self) {
        self.state = PlaybackState::Idle;
        self.active = None;
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}
