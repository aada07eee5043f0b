//! Fallback capture session — degraded mode without a recognizer.
//!
//! When no recognition model is loaded, recording still works: a worker
//! accumulates 16 kHz mono samples for the whole session, and stopping
//! finalizes them into one [`CapturedClip`]. A deployment would hand the
//! clip to a [`TranscriptionService`] and append the returned text exactly
//! like a native final result; this repo deliberately wires no such service,
//! so the widget appends a fixed capture note instead.
//!
//! The cpal stream handle stays on the thread that created the session (it
//! is not `Send`); stopping or dropping the session releases it immediately,
//! which is what turns the OS microphone indicator off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::audio::{
    chunk_rms, resample_to_16k, stereo_to_mono, AudioCapture, AudioChunk, StreamHandle, TARGET_RATE,
};

use super::{SessionError, SessionEvent};

// ---------------------------------------------------------------------------
// CapturedClip
// ---------------------------------------------------------------------------

/// The finalized audio of one fallback session: 16 kHz mono f32, ready for
/// upload to a transcription service.
#[derive(Debug, Clone)]
pub struct CapturedClip {
    /// Mono PCM samples at [`sample_rate`](Self::sample_rate).
    pub samples: Vec<f32>,
    /// Always 16 000 — the canonical rate of the audio layer.
    pub sample_rate: u32,
}

impl CapturedClip {
    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// TranscriptionService
// ---------------------------------------------------------------------------

/// External collaborator that turns a captured clip into text.
///
/// Nothing in this crate implements it outside of tests; the seam exists so
/// a deployment can install one and have fallback captures transcribed and
/// appended like native finals.
pub trait TranscriptionService: Send + Sync {
    fn transcribe_clip(&self, clip: &CapturedClip) -> Result<String, ServiceError>;
}

/// Failures a [`TranscriptionService`] can report.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transcription service unreachable: {0}")]
    Unreachable(String),

    #[error("transcription service rejected the clip: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// FallbackSession
// ---------------------------------------------------------------------------

/// How long the accumulator waits between chunks before checking flags, and
/// how many consecutive empty waits mean the feed is dead.
const RECV_TICK: Duration = Duration::from_millis(100);
const DEAD_FEED_TICKS: u32 = 20;

/// An active raw-capture session.
pub struct FallbackSession {
    /// Dropping this stops the hardware stream and releases the microphone.
    _handle: StreamHandle,
    stop_flag: Arc<AtomicBool>,
}

impl FallbackSession {
    /// Request microphone access and begin capturing.
    ///
    /// Opening the input stream *is* the access grant at this layer; a
    /// failure carries the denial reason and no session is created.
    pub fn start(events: mpsc::Sender<SessionEvent>) -> Result<Self, SessionError> {
        let capture = AudioCapture::open()?;

        let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>();
        let handle = capture.start(chunk_tx)?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop_flag);

        thread::Builder::new()
            .name("fallback-capture".into())
            .spawn(move || accumulate(chunk_rx, events, flag))
            .map_err(|e| SessionError::Worker(e.to_string()))?;

        log::info!("fallback capture started ({} Hz source)", capture.sample_rate());

        Ok(Self {
            _handle: handle,
            stop_flag,
        })
    }

    /// Best-effort stop: raise the flag for the worker. The stream handle is
    /// released when the session value is dropped, which callers do right
    /// after calling this.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl Drop for FallbackSession {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

/// Worker: drain chunks into one growing sample buffer, then finalize.
///
/// Exits when the stop flag is raised (the remaining queued chunks are
/// drained first — the stream handle is dropped by the owner, closing the
/// channel) or when the feed dies. Whatever was accumulated is emitted as a
/// [`CapturedClip`] before `Ended`.
fn accumulate(
    chunk_rx: mpsc::Receiver<AudioChunk>,
    events: mpsc::Sender<SessionEvent>,
    stop_flag: Arc<AtomicBool>,
) {
    let mut samples: Vec<f32> = Vec::new();
    let mut idle_ticks = 0u32;

    loop {
        match chunk_rx.recv_timeout(RECV_TICK) {
            Ok(chunk) => {
                idle_ticks = 0;
                let mono = stereo_to_mono(&chunk.samples, chunk.channels);
                let audio = resample_to_16k(&mono, chunk.sample_rate);
                let _ = events.send(SessionEvent::Level(chunk_rms(&audio)));
                samples.extend_from_slice(&audio);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if stop_flag.load(Ordering::Relaxed) {
                    break;
                }
                idle_ticks += 1;
                if idle_ticks >= DEAD_FEED_TICKS {
                    log::warn!("capture feed went quiet; ending fallback session");
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                if !stop_flag.load(Ordering::Relaxed) {
                    log::warn!("capture feed closed unexpectedly");
                }
                break;
            }
        }
    }

    if !samples.is_empty() {
        let clip = CapturedClip {
            samples,
            sample_rate: TARGET_RATE,
        };
        log::info!("fallback capture finalized: {:.1} s", clip.duration_secs());
        let _ = events.send(SessionEvent::ClipCaptured(clip));
    }
    let _ = events.send(SessionEvent::Ended);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_duration_from_sample_count() {
        let clip = CapturedClip {
            samples: vec![0.0; 24_000],
            sample_rate: 16_000,
        };
        assert!((clip.duration_secs() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn zero_rate_clip_has_zero_duration() {
        let clip = CapturedClip {
            samples: vec![0.0; 100],
            sample_rate: 0,
        };
        assert_eq!(clip.duration_secs(), 0.0);
    }

    #[test]
    fn accumulator_emits_clip_then_ended_when_feed_closes() {
        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let flag = Arc::new(AtomicBool::new(false));

        chunk_tx
            .send(AudioChunk {
                samples: vec![0.25; 1_600],
                sample_rate: 16_000,
                channels: 1,
            })
            .unwrap();
        drop(chunk_tx);

        accumulate(chunk_rx, event_tx, flag);

        let mut saw_level = false;
        let mut clip: Option<CapturedClip> = None;
        loop {
            match event_rx.try_recv().expect("events end with Ended") {
                SessionEvent::Level(_) => saw_level = true,
                SessionEvent::ClipCaptured(c) => clip = Some(c),
                SessionEvent::Ended => break,
                other => panic!("unexpected event: {other:?}"),
            }
        }

        assert!(saw_level);
        let clip = clip.expect("clip emitted");
        assert_eq!(clip.sample_rate, 16_000);
        assert_eq!(clip.samples.len(), 1_600);
    }

    #[test]
    fn accumulator_with_no_audio_emits_only_ended() {
        let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>();
        let (event_tx, event_rx) = mpsc::channel();
        drop(chunk_tx);

        accumulate(chunk_rx, event_tx, Arc::new(AtomicBool::new(true)));

        assert!(matches!(event_rx.try_recv(), Ok(SessionEvent::Ended)));
        assert!(event_rx.try_recv().is_err());
    }

    #[test]
    fn stereo_input_is_downmixed_before_accumulation() {
        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        chunk_tx
            .send(AudioChunk {
                samples: vec![0.5; 3_200], // 1 600 stereo frames
                sample_rate: 16_000,
                channels: 2,
            })
            .unwrap();
        drop(chunk_tx);

        accumulate(chunk_rx, event_tx, Arc::new(AtomicBool::new(false)));

        let clip = loop {
            match event_rx.try_recv().unwrap() {
                SessionEvent::ClipCaptured(c) => break c,
                SessionEvent::Ended => panic!("ended without a clip"),
                _ => continue,
            }
        };
        assert_eq!(clip.samples.len(), 1_600);
    }
}
