//! Recording sessions — capability detection, the two session kinds, and the
//! controller that owns them.
//!
//! # Architecture
//!
//! ```text
//! VoicePadApp ──start/stop──▶ SessionController
//!                                │  capability (detected once, cached)
//!                                ├─▶ NativeSession    (recognizer + endpointer)
//!                                └─▶ FallbackSession  (raw capture → clip)
//!                                        │
//!                    SessionEvent channel (mpsc, drained every UI frame)
//!                                        ▼
//!        Final / Interim / Level / Error / ClipCaptured / Ended
//! ```
//!
//! The controller normalizes both session kinds into one event stream and
//! owns the restart policy: a native session that ends on its own — which
//! recognition backends do periodically, even mid-speech — is transparently
//! restarted with the same configuration, but only after consulting the
//! *live* stop flag and the widget's live recording state, so a session the
//! user stopped is never resurrected.

pub mod detect;
pub mod fallback;
pub mod native;

use std::sync::{mpsc, Arc};

use thiserror::Error;

use crate::audio::CaptureError;
use crate::config::AppConfig;
use crate::stt::SpeechRecognizer;

pub use detect::CapabilityMode;
pub use fallback::{CapturedClip, FallbackSession, ServiceError, TranscriptionService};
pub use native::NativeSession;

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Normalized callbacks from whichever session kind is active.
///
/// `Ended` is always the last event a session sends.
#[derive(Debug)]
pub enum SessionEvent {
    /// A finalized transcript for one utterance (native sessions).
    Final(String),
    /// A provisional hypothesis for the utterance still in progress.
    /// Display-only; a later `Final` supersedes it.
    Interim(String),
    /// RMS input level of the latest chunk, for the recording indicator.
    Level(f32),
    /// The session failed; `message` carries the underlying error. The
    /// session ends after this.
    Error { message: String },
    /// The finalized audio of a fallback session.
    ClipCaptured(CapturedClip),
    /// The session is gone — stopped, failed, or died on its own.
    Ended,
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Failures starting a session. Stop never fails: it is best-effort by
/// construction.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Neither capability exists. Recording stays disabled; editing,
    /// clearing and copying keep working.
    #[error(
        "no speech capability is available on this system — connect a microphone to \
         record, and install a recognition model for live transcription"
    )]
    Unsupported,

    /// Microphone access failed: no device, or the OS rejected the stream.
    #[error("could not access the microphone: {0}")]
    Microphone(#[from] CaptureError),

    /// The session worker thread could not be spawned.
    #[error("could not start the session worker: {0}")]
    Worker(String),
}

// ---------------------------------------------------------------------------
// SessionEndAction
// ---------------------------------------------------------------------------

/// What the controller did about an `Ended` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndAction {
    /// A replacement session is running; the widget stays in Recording.
    Restarted,
    /// The session is gone for good; the widget reconciles to Idle.
    Stopped,
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

enum ActiveSession {
    Native(NativeSession),
    Fallback(FallbackSession),
}

impl ActiveSession {
    fn stop(&mut self) {
        match self {
            ActiveSession::Native(s) => s.stop(),
            ActiveSession::Fallback(s) => s.stop(),
        }
    }
}

/// Owns capability detection, the active session, and the event channel the
/// widget polls.
pub struct SessionController {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    config: AppConfig,
    /// Detection result, cached for the widget's lifetime after first use.
    capability: Option<CapabilityMode>,
    active: Option<ActiveSession>,
    /// Live flag consulted when `Ended` arrives: true only between a user
    /// stop and the next start.
    stop_requested: bool,
    event_tx: mpsc::Sender<SessionEvent>,
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl SessionController {
    /// A controller for the given (possibly absent) recognizer. No hardware
    /// is touched until the first [`start`](Self::start).
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, config: AppConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            recognizer,
            config,
            capability: None,
            active: None,
            stop_requested: false,
            event_tx,
            event_rx,
        }
    }

    /// The detected capability, probing on first call and cached after.
    pub fn capability(&mut self) -> CapabilityMode {
        if let Some(mode) = self.capability {
            return mode;
        }
        let mode = detect::detect(self.recognizer.is_some());
        self.capability = Some(mode);
        mode
    }

    /// The cached capability, if detection has run. Render code uses this so
    /// painting never triggers a hardware probe.
    pub fn detected_capability(&self) -> Option<CapabilityMode> {
        self.capability
    }

    /// Whether a session is currently held.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a session for the detected capability.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unsupported`] when no capability exists (no session
    /// object is created), [`SessionError::Microphone`] when the device
    /// cannot be opened — microphone access denied, in effect.
    pub fn start(&mut self) -> Result<CapabilityMode, SessionError> {
        self.active = None; // any stale handle is defunct by now

        let mode = self.capability();
        let session = match mode {
            CapabilityMode::Unsupported => return Err(SessionError::Unsupported),
            CapabilityMode::NativeRecognition => {
                let Some(recognizer) = self.recognizer.as_ref() else {
                    // Can only happen if the cache was seeded inconsistently.
                    return Err(SessionError::Unsupported);
                };
                ActiveSession::Native(NativeSession::start(
                    Arc::clone(recognizer),
                    self.config.recognition.clone(),
                    self.config.audio.endpoint_config(),
                    self.event_tx.clone(),
                )?)
            }
            CapabilityMode::FallbackCapture => {
                ActiveSession::Fallback(FallbackSession::start(self.event_tx.clone())?)
            }
        };

        self.active = Some(session);
        self.stop_requested = false;
        Ok(mode)
    }

    /// Best-effort stop of the active session.
    ///
    /// Raises the worker's stop flag and drops the session, which releases
    /// the microphone stream. Never fails; a defunct session is simply
    /// dropped.
    pub fn stop(&mut self) {
        self.stop_requested = true;
        if let Some(mut session) = self.active.take() {
            session.stop();
        }
    }

    /// Next pending session event, if any. Non-blocking; the widget drains
    /// this every frame.
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Decide what an `Ended` event means, given the widget's live recording
    /// state.
    ///
    /// An end is unsolicited when no stop was requested and the widget still
    /// believes it is recording; for a continuous native session that means
    /// one transparent restart attempt with the same configuration. Restart
    /// failures are logged, never surfaced — the caller reconciles to Idle.
    /// Fallback sessions and non-continuous sessions always just stop.
    pub fn handle_ended(&mut self, still_recording: bool) -> SessionEndAction {
        self.active = None; // whoever sent Ended is gone

        let unsolicited = !self.stop_requested && still_recording;
        let restartable = self.config.recognition.continuous
            && self.capability == Some(CapabilityMode::NativeRecognition);

        if !unsolicited || !restartable {
            return SessionEndAction::Stopped;
        }

        log::warn!("recognition session ended on its own; restarting");
        match self.start() {
            Ok(_) => SessionEndAction::Restarted,
            Err(e) => {
                log::warn!("could not restart recognition session: {e}");
                SessionEndAction::Stopped
            }
        }
    }

    // ── Test hooks ───────────────────────────────────────────────────────

    /// Seed the capability cache, bypassing the hardware probe.
    #[cfg(test)]
    pub(crate) fn force_capability(&mut self, mode: CapabilityMode) {
        self.capability = Some(mode);
    }

    /// Push a synthetic event, as a session worker would.
    #[cfg(test)]
    pub(crate) fn inject_event(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> SessionController {
        SessionController::new(None, AppConfig::default())
    }

    #[test]
    fn unsupported_start_creates_no_session() {
        let mut c = controller();
        c.force_capability(CapabilityMode::Unsupported);

        let err = c.start().expect_err("must refuse to start");
        assert!(matches!(err, SessionError::Unsupported));
        assert!(!c.is_active());
    }

    #[test]
    fn unsupported_message_names_the_remedy() {
        assert!(SessionError::Unsupported.to_string().contains("microphone"));
    }

    #[test]
    fn microphone_error_carries_the_denial_reason() {
        let err = SessionError::from(CaptureError::NoDevice);
        let msg = err.to_string();
        assert!(msg.contains("microphone"));
        assert!(msg.contains("no audio input device"));
    }

    #[test]
    fn capability_is_cached_once_seeded() {
        let mut c = controller();
        c.force_capability(CapabilityMode::FallbackCapture);
        assert_eq!(c.capability(), CapabilityMode::FallbackCapture);
        assert_eq!(c.detected_capability(), Some(CapabilityMode::FallbackCapture));
    }

    #[test]
    fn ended_after_user_stop_is_stopped() {
        let mut c = controller();
        c.force_capability(CapabilityMode::NativeRecognition);
        c.stop(); // user asked; no active session is fine

        assert_eq!(c.handle_ended(true), SessionEndAction::Stopped);
    }

    #[test]
    fn ended_while_widget_idle_is_stopped() {
        let mut c = controller();
        c.force_capability(CapabilityMode::NativeRecognition);

        assert_eq!(c.handle_ended(false), SessionEndAction::Stopped);
    }

    #[test]
    fn ended_fallback_session_is_never_restarted() {
        let mut c = controller();
        c.force_capability(CapabilityMode::FallbackCapture);

        assert_eq!(c.handle_ended(true), SessionEndAction::Stopped);
    }

    #[test]
    fn ended_non_continuous_session_is_stopped() {
        let mut config = AppConfig::default();
        config.recognition.continuous = false;
        let mut c = SessionController::new(None, config);
        c.force_capability(CapabilityMode::NativeRecognition);

        assert_eq!(c.handle_ended(true), SessionEndAction::Stopped);
    }

    #[test]
    fn unsolicited_end_attempts_restart_and_fails_quietly() {
        // Native capability seeded but no recognizer: the restart attempt
        // inside handle_ended fails, which must be swallowed into Stopped.
        let mut c = controller();
        c.force_capability(CapabilityMode::NativeRecognition);

        assert_eq!(c.handle_ended(true), SessionEndAction::Stopped);
        assert!(!c.is_active());
    }

    #[test]
    fn events_are_delivered_in_order() {
        let mut c = controller();
        c.inject_event(SessionEvent::Final("first".into()));
        c.inject_event(SessionEvent::Ended);

        assert!(matches!(c.poll_event(), Some(SessionEvent::Final(t)) if t == "first"));
        assert!(matches!(c.poll_event(), Some(SessionEvent::Ended)));
        assert!(c.poll_event().is_none());
    }
}
