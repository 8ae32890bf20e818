//! Speech through the host's command-line synthesizer

use super::capability::{SpeechCapability, Utterance, UtteranceEvent, UtteranceId};
use crate::{ChatError, Result};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Words per minute treated as rate 1.0
const BASE_WPM: f32 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEngine {
    EspeakNg,
    Espeak,
    /// macOS `say`
    Say,
}

impl SpeechEngine {
    fn program(&self) -> &'static str {
        match self {
            SpeechEngine::EspeakNg => "espeak-ng",
            SpeechEngine::Espeak => "espeak",
            SpeechEngine::Say => "say",
        }
    }

    /// Arguments for an utterance; the text itself is written to stdin
    pub fn args(&self, utterance: &Utterance) -> Vec<String> {
        let wpm = (BASE_WPM * utterance.rate).round() as u32;
        match self {
            SpeechEngine::EspeakNg | SpeechEngine::Espeak => vec![
                "-s".to_string(),
                wpm.to_string(),
                // 0-99, 50 is normal
                "-p".to_string(),
                ((50.0 * utterance.pitch).round() as u32).min(99).to_string(),
                // 0-200, 100 is normal
                "-a".to_string(),
                ((100.0 * utterance.volume).round() as u32).min(200).to_string(),
                "--stdin".to_string(),
            ],
            // `say` has no pitch or volume flags
            SpeechEngine::Say => vec!["-r".to_string(), wpm.to_string(), "-f".to_string(), "-".to_string()],
        }
    }
}

/// Speech engine driven through a child process per utterance.
///
/// Cancelling kills the child. At most one child runs at a time.
pub struct SystemSpeech {
    engine: SpeechEngine,
    program: PathBuf,
    current: Arc<Mutex<Option<(UtteranceId, Child)>>>,
}

impl SystemSpeech {
    /// Find a synthesizer on `PATH`
    pub fn detect() -> Option<Self> {
        Self::detect_with(|program| which::which(program).ok())
    }

    fn detect_with(locate: impl Fn(&str) -> Option<PathBuf>) -> Option<Self> {
        let candidates = if cfg!(target_os = "macos") {
            vec![SpeechEngine::Say, SpeechEngine::EspeakNg, SpeechEngine::Espeak]
        } else {
            vec![SpeechEngine::EspeakNg, SpeechEngine::Espeak]
        };

        let found = candidates
            .into_iter()
            .find_map(|engine| locate(engine.program()).map(|path| (engine, path)));

        match found {
            Some((engine, program)) => {
                info!("Using speech engine {}", program.display());
                Some(Self::with_program(engine, program))
            }
            None => {
                warn!("No speech engine found on PATH, text-to-speech disabled");
                None
            }
        }
    }

    pub fn with_program(engine: SpeechEngine, program: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            program: program.into(),
            current: Arc::new(Mutex::new(None)),
        }
    }

    fn spawn(&self, utterance: &Utterance) -> Result<Child> {
        Command::new(&self.program)
            .args(self.engine.args(utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ChatError::PlaybackFailed(format!("Failed to start {}: {}", self.program.display(), e)))
    }
}

impl SpeechCapability for SystemSpeech {
    fn speak(&self, utterance: Utterance, events: Sender<UtteranceEvent>) -> Result<()> {
        self.cancel();

        let mut child = self.spawn(&utterance)?;
        let stdin = child.stdin.take();
        let utterance_id = utterance.id;
        *self.current.lock() = Some((utterance_id, child));
        let _ = events.send(UtteranceEvent::Started { utterance_id });

        let current = Arc::clone(&self.current);
        let text = utterance.text;
        thread::spawn(move || {
            if let Some(stdin) = stdin {
                feed_text(stdin, &text);
            }
            watch_child(current, utterance_id, events)
        });
        Ok(())
    }

    fn cancel(&self) {
        if let Some((id, mut child)) = self.current.lock().take() {
            let _ = child.kill();
            let _ = child.wait();
            debug!("Killed speech process for utterance {}", id);
        }
    }
}

impl Drop for SystemSpeech {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Write the text and close stdin so the engine starts speaking.
///
/// A failed write leaves the child to exit on its own; `watch_child` reports it.
fn feed_text(mut stdin: ChildStdin, text: &str) {
    if let Err(e) = stdin.write_all(text.as_bytes()) {
        debug!("Failed to send text to speech engine: {}", e);
    }
}

/// Report how the child for `utterance_id` ended, unless it was cancelled
fn watch_child(
    current: Arc<Mutex<Option<(UtteranceId, Child)>>>,
    utterance_id: UtteranceId,
    events: Sender<UtteranceEvent>,
) {
    loop {
        let event = {
            let mut slot = current.lock();
            let child = match slot.as_mut() {
                Some((id, child)) if *id == utterance_id => child,
                // Cancelled or replaced
                _ => return,
            };

            match child.try_wait() {
                Ok(None) => None,
                Ok(Some(status)) if status.success() => {
                    *slot = None;
                    Some(UtteranceEvent::Ended { utterance_id })
                }
                Ok(Some(status)) => {
                    *slot = None;
                    Some(UtteranceEvent::Failed {
                        utterance_id,
                        error: format!("speech engine exited with {}", status),
                    })
                }
                Err(e) => {
                    *slot = None;
                    Some(UtteranceEvent::Failed {
                        utterance_id,
                        error: e.to_string(),
                    })
                }
            }
        };

        if let Some(event) = event {
            let _ = events.send(event);
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn utterance() -> Utterance {
        Utterance {
            id: 7,
            message_id: Uuid::new_v4(),
            text: "hello".into(),
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
        }
    }

    #[test]
    fn test_espeak_args() {
        let args = SpeechEngine::EspeakNg.args(&utterance());
        assert_eq!(args, vec!["-s", "144", "-p", "50", "-a", "80", "--stdin"]);
    }

    #[test]
    fn test_say_args() {
        let args = SpeechEngine::Say.args(&utterance());
        assert_eq!(args, vec!["-r", "144", "-f", "-"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_child_exit_reports_end() {
        let Ok(program) = which::which("true") else { return };
        let speech = SystemSpeech::with_program(SpeechEngine::Espeak, &program);

        let (tx, rx) = crossbeam_channel::unbounded();
        let child = Command::new(&program).spawn().unwrap();
        *speech.current.lock() = Some((7, child));
        watch_child(Arc::clone(&speech.current), 7, tx);

        assert_eq!(rx.recv().unwrap(), UtteranceEvent::Ended { utterance_id: 7 });
        assert!(speech.current.lock().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_cancelled_child_is_silent() {
        let Ok(sleep) = which::which("sleep") else { return };
        let speech = SystemSpeech::with_program(SpeechEngine::Espeak, &sleep);

        let (tx, rx) = crossbeam_channel::unbounded();
        let child = Command::new(&sleep).arg("5").spawn().unwrap();
        *speech.current.lock() = Some((3, child));

        speech.cancel();
        watch_child(Arc::clone(&speech.current), 3, tx);
        assert!(rx.try_recv().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_skips_non_executable_engines() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for name in ["espeak-ng", "espeak", "say"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        }
        let locate = |program: &str| which::which_in(program, Some(dir.path()), dir.path()).ok();

        assert!(SystemSpeech::detect_with(locate).is_none());

        let espeak = dir.path().join("espeak");
        std::fs::set_permissions(&espeak, std::fs::Permissions::from_mode(0o755)).unwrap();

        let speech = SystemSpeech::detect_with(locate).unwrap();
        assert_eq!(speech.engine, SpeechEngine::Espeak);
        assert_eq!(speech.program.file_name(), espeak.file_name());
    }

    #[cfg(unix)]
    #[test]
    fn test_speak_does_not_wait_for_stdin() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        // An engine that never reads its input
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("mute-engine");
        std::fs::write(&program, "#!/bin/sh\nexec sleep 5\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let speech = SystemSpeech::with_program(SpeechEngine::Espeak, &program);
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut long = utterance();
        long.text = "word ".repeat(256 * 1024);

        let started = Instant::now();
        speech.speak(long, tx).unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(rx.recv().unwrap(), UtteranceEvent::Started { utterance_id: 7 });
        speech.cancel();
    }
}
