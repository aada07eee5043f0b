//! Native recognition session — continuous live speech-to-text.
//!
//! A session couples three pieces:
//!
//! 1. the cpal stream (owned here, on the UI thread, because it is not
//!    `Send`; dropping the session releases the microphone),
//! 2. a worker thread that downmixes/resamples chunks, runs the
//!    [`UtteranceEndpointer`], and recognizes each completed utterance,
//! 3. the controller's event channel, over which the worker reports
//!    `Final` / `Interim` / `Level` / `Error` and a trailing `Ended`.
//!
//! The worker keeps listening across pauses: one session yields one final
//! per utterance until it is stopped (or, when `continuous` is off, ends
//! itself after the first final). Stopping is cooperative — the stop flag is
//! raised, the worker flushes any open utterance so short trailing speech is
//! still recognized, and `Ended` is the last event sent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::{
    chunk_rms, resample_to_16k, stereo_to_mono, AudioCapture, AudioChunk, EndpointConfig,
    StreamHandle, UtteranceEndpointer,
};
use crate::config::RecognitionConfig;
use crate::stt::{RecognizerError, SpeechRecognizer};

use super::{SessionError, SessionEvent};

/// Worker wake-up interval for flag checks, and how many consecutive silent
/// wake-ups mean the audio feed is dead (the stream stopped delivering
/// buffers without the channel closing).
const RECV_TICK: Duration = Duration::from_millis(100);
const DEAD_FEED_TICKS: u32 = 20;

// ---------------------------------------------------------------------------
// NativeSession
// ---------------------------------------------------------------------------

/// An active live-recognition session.
pub struct NativeSession {
    /// Dropping this stops the hardware stream and releases the microphone.
    _handle: StreamHandle,
    stop_flag: Arc<AtomicBool>,
}

impl NativeSession {
    /// Open the microphone and spawn the recognition worker.
    ///
    /// # Errors
    ///
    /// [`SessionError::Microphone`] when the input device or stream cannot
    /// be opened, [`SessionError::Worker`] when the worker thread cannot be
    /// spawned. No session exists on error.
    pub fn start(
        recognizer: Arc<dyn SpeechRecognizer>,
        recognition: RecognitionConfig,
        endpoint: EndpointConfig,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self, SessionError> {
        let capture = AudioCapture::open()?;

        let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>();
        let handle = capture.start(chunk_tx)?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop_flag);

        thread::Builder::new()
            .name("native-recognition".into())
            .spawn(move || recognize_loop(chunk_rx, recognizer, recognition, endpoint, events, flag))
            .map_err(|e| SessionError::Worker(e.to_string()))?;

        log::info!(
            "native recognition started ({} Hz source)",
            capture.sample_rate()
        );

        Ok(Self {
            _handle: handle,
            stop_flag,
        })
    }

    /// Best-effort stop: raise the flag; the worker flushes and ends on its
    /// next wake-up. Callers drop the session right after, which releases
    /// the stream.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl Drop for NativeSession {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// The recognition loop: chunks → canonical 16 kHz mono → endpointer →
/// recognizer → events.
fn recognize_loop(
    chunk_rx: mpsc::Receiver<AudioChunk>,
    recognizer: Arc<dyn SpeechRecognizer>,
    recognition: RecognitionConfig,
    endpoint: EndpointConfig,
    events: mpsc::Sender<SessionEvent>,
    stop_flag: Arc<AtomicBool>,
) {
    let mut endpointer = UtteranceEndpointer::new(endpoint);
    let interim_interval = Duration::from_millis(recognition.interim_interval_ms);
    let mut last_interim = Instant::now();
    let mut idle_ticks = 0u32;

    // Queued chunks are always drained before a stop is honored, so speech
    // captured just before the stop request is never lost.
    loop {
        match chunk_rx.recv_timeout(RECV_TICK) {
            Ok(chunk) => {
                idle_ticks = 0;
                let mono = stereo_to_mono(&chunk.samples, chunk.channels);
                let audio = resample_to_16k(&mono, chunk.sample_rate);
                let _ = events.send(SessionEvent::Level(chunk_rms(&audio)));

                if let Some(utterance) = endpointer.push(&audio) {
                    if !emit_final(&*recognizer, &utterance, &events) {
                        break;
                    }
                    if !recognition.continuous {
                        // Single-utterance mode: the session ends itself.
                        break;
                    }
                } else if recognition.interim_results
                    && endpointer.in_speech()
                    && last_interim.elapsed() >= interim_interval
                {
                    emit_interim(&*recognizer, endpointer.speech_so_far(), &events);
                    last_interim = Instant::now();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if stop_flag.load(Ordering::Relaxed) {
                    if let Some(utterance) = endpointer.flush() {
                        emit_final(&*recognizer, &utterance, &events);
                    }
                    break;
                }
                idle_ticks += 1;
                if idle_ticks >= DEAD_FEED_TICKS {
                    log::warn!("audio feed went quiet; ending recognition session");
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                if stop_flag.load(Ordering::Relaxed) {
                    // Normal teardown: the owner dropped the stream handle.
                    if let Some(utterance) = endpointer.flush() {
                        emit_final(&*recognizer, &utterance, &events);
                    }
                } else {
                    log::warn!("audio feed closed unexpectedly");
                }
                break;
            }
        }
    }

    let _ = events.send(SessionEvent::Ended);
}

/// Recognize one completed utterance and report it.
///
/// Returns `false` when the session must end because recognition itself
/// failed. Empty transcripts (silence, breath noise) and too-short
/// utterances are dropped without an event.
fn emit_final(
    recognizer: &dyn SpeechRecognizer,
    utterance: &[f32],
    events: &mpsc::Sender<SessionEvent>,
) -> bool {
    match recognizer.recognize(utterance) {
        Ok(text) if text.is_empty() => true,
        Ok(text) => {
            let _ = events.send(SessionEvent::Final(text));
            true
        }
        Err(RecognizerError::AudioTooShort) => true,
        Err(e) => {
            let _ = events.send(SessionEvent::Error {
                message: e.to_string(),
            });
            false
        }
    }
}

/// Best-effort interim pass over the open utterance. Failures are silent —
/// an interim is a bonus, never an error.
fn emit_interim(
    recognizer: &dyn SpeechRecognizer,
    speech_so_far: &[f32],
    events: &mpsc::Sender<SessionEvent>,
) {
    if let Ok(text) = recognizer.recognize(speech_so_far) {
        if !text.is_empty() {
            let _ = events.send(SessionEvent::Interim(text));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::MockRecognizer;

    fn run_loop_over(
        chunks: Vec<AudioChunk>,
        recognizer: MockRecognizer,
        recognition: RecognitionConfig,
    ) -> Vec<SessionEvent> {
        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        for chunk in chunks {
            chunk_tx.send(chunk).unwrap();
        }
        drop(chunk_tx); // feed ends; no stop requested

        recognize_loop(
            chunk_rx,
            Arc::new(recognizer),
            recognition,
            EndpointConfig {
                min_utterance_samples: 8_000,
                endpoint_silence_frames: 2,
                ..EndpointConfig::default()
            },
            event_tx,
            Arc::new(AtomicBool::new(false)),
        );

        let mut events = Vec::new();
        while let Ok(ev) = event_rx.try_recv() {
            events.push(ev);
        }
        events
    }

    fn speech_chunk(frames: usize) -> AudioChunk {
        AudioChunk {
            samples: vec![0.5; frames * 480],
            sample_rate: 16_000,
            channels: 1,
        }
    }

    fn silence_chunk(frames: usize) -> AudioChunk {
        AudioChunk {
            samples: vec![0.0; frames * 480],
            sample_rate: 16_000,
            channels: 1,
        }
    }

    #[test]
    fn utterance_bracketed_by_silence_yields_final() {
        // 20 voiced frames (9 600 samples ≥ the 8 000 minimum), then enough
        // silence to hit the endpoint.
        let events = run_loop_over(
            vec![speech_chunk(20), silence_chunk(4)],
            MockRecognizer::ok("hello world"),
            RecognitionConfig::default(),
        );

        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Final(t) if t == "hello world")));
        assert!(matches!(events.last(), Some(SessionEvent::Ended)));
    }

    #[test]
    fn open_utterance_is_flushed_when_feed_ends_under_stop() {
        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        chunk_tx.send(speech_chunk(20)).unwrap();
        drop(chunk_tx);

        recognize_loop(
            chunk_rx,
            Arc::new(MockRecognizer::ok("tail")),
            RecognitionConfig::default(),
            EndpointConfig::default(),
            event_tx,
            Arc::new(AtomicBool::new(true)), // stop already requested
        );

        let events: Vec<SessionEvent> = event_rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Final(t) if t == "tail")));
        assert!(matches!(events.last(), Some(SessionEvent::Ended)));
    }

    #[test]
    fn recognition_error_surfaces_then_session_ends() {
        let events = run_loop_over(
            vec![speech_chunk(20), silence_chunk(4)],
            MockRecognizer::err(RecognizerError::Recognition("inference failed".into())),
            RecognitionConfig::default(),
        );

        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Error { message } if message.contains("inference failed"))));
        assert!(matches!(events.last(), Some(SessionEvent::Ended)));
    }

    #[test]
    fn non_continuous_session_ends_after_first_final() {
        let cfg = RecognitionConfig {
            continuous: false,
            ..RecognitionConfig::default()
        };
        // Two utterances in the feed; only the first is recognized.
        let events = run_loop_over(
            vec![
                speech_chunk(20),
                silence_chunk(4),
                speech_chunk(20),
                silence_chunk(4),
            ],
            MockRecognizer::ok("one"),
            cfg,
        );

        let finals = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Final(_)))
            .count();
        assert_eq!(finals, 1);
        assert!(matches!(events.last(), Some(SessionEvent::Ended)));
    }

    #[test]
    fn silence_only_feed_emits_no_final() {
        let events = run_loop_over(
            vec![silence_chunk(40)],
            MockRecognizer::ok("should never appear"),
            RecognitionConfig::default(),
        );

        assert!(!events.iter().any(|e| matches!(e, SessionEvent::Final(_))));
        assert!(matches!(events.last(), Some(SessionEvent::Ended)));
    }

    #[test]
    fn levels_are_reported_for_every_chunk() {
        let events = run_loop_over(
            vec![silence_chunk(2), speech_chunk(2)],
            MockRecognizer::ok(""),
            RecognitionConfig::default(),
        );

        let levels = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Level(_)))
            .count();
        assert_eq!(levels, 2);
    }
}
