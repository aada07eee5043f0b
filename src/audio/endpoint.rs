//! Energy-based utterance endpointing for continuous recognition.
//!
//! The native session feeds 16 kHz mono samples into an
//! [`UtteranceEndpointer`], which classifies 30 ms frames as voice or silence
//! by RMS amplitude and cuts an utterance when enough trailing silence has
//! accumulated. Leading silence is never buffered and trailing silence is
//! trimmed from the returned utterance, so the recognizer only ever sees
//! speech — silence makes Whisper slower and prone to hallucinating text.
//!
//! ```text
//! chunks ──▶ frames ──▶ [silence…] speech speech [silence ≥ endpoint] ──▶ utterance
//! ```

// ---------------------------------------------------------------------------
// EndpointConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for the endpointer, all in terms of 16 kHz samples.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Frame RMS above this value counts as voice. `0.01` suits a quiet
    /// room; raise towards `0.05` for noisy environments.
    pub rms_threshold: f32,
    /// Classification frame size in samples. 480 samples = 30 ms.
    pub frame_size: usize,
    /// Consecutive silent frames that close an utterance.
    pub endpoint_silence_frames: usize,
    /// Utterances shorter than this are discarded as noise blips.
    pub min_utterance_samples: usize,
    /// An utterance reaching this length is cut immediately.
    pub max_utterance_samples: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            rms_threshold: 0.01,
            frame_size: 480,
            endpoint_silence_frames: 27, // ~810 ms of silence
            min_utterance_samples: 8_000, // 0.5 s
            max_utterance_samples: 480_000, // 30 s
        }
    }
}

// ---------------------------------------------------------------------------
// UtteranceEndpointer
// ---------------------------------------------------------------------------

/// Streaming segmenter: push chunks in, get completed utterances out.
///
/// # Example
///
/// ```rust
/// use voicepad::audio::{EndpointConfig, UtteranceEndpointer};
///
/// let mut ep = UtteranceEndpointer::new(EndpointConfig {
///     min_utterance_samples: 480,
///     endpoint_silence_frames: 2,
///     ..EndpointConfig::default()
/// });
///
/// assert!(ep.push(&vec![0.0_f32; 960]).is_none()); // leading silence
/// assert!(ep.push(&vec![0.5_f32; 960]).is_none()); // speech, still open
/// let utt = ep.push(&vec![0.0_f32; 960]).expect("endpoint reached");
/// assert_eq!(utt.len(), 960); // trailing silence trimmed
/// ```
pub struct UtteranceEndpointer {
    cfg: EndpointConfig,
    /// Samples waiting to fill a complete classification frame.
    pending: Vec<f32>,
    /// The open utterance, including trailing silence collected so far.
    utterance: Vec<f32>,
    /// Utterance length up to and including the last voiced frame.
    voiced_len: usize,
    in_speech: bool,
    silent_frames: usize,
}

impl UtteranceEndpointer {
    pub fn new(cfg: EndpointConfig) -> Self {
        assert!(cfg.frame_size > 0, "frame_size must be > 0");
        Self {
            cfg,
            pending: Vec::new(),
            utterance: Vec::new(),
            voiced_len: 0,
            in_speech: false,
            silent_frames: 0,
        }
    }

    /// Whether an utterance is currently open.
    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// The speech accumulated for the open utterance, trailing silence
    /// excluded. Used for interim recognition passes.
    pub fn speech_so_far(&self) -> &[f32] {
        &self.utterance[..self.voiced_len]
    }

    /// Feed a chunk of 16 kHz mono samples.
    ///
    /// Returns a completed utterance when this chunk closed one. Any samples
    /// past the endpoint stay buffered for the next call, so nothing is lost
    /// when speech resumes inside the same chunk.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        let frame = self.cfg.frame_size;
        while self.pending.len() >= frame {
            let frame_samples: Vec<f32> = self.pending.drain(..frame).collect();
            if let Some(utt) = self.consume_frame(&frame_samples) {
                return Some(utt);
            }
        }
        None
    }

    /// Close and return the open utterance, if any.
    ///
    /// Called when the session stops so speech that never reached the silence
    /// endpoint is still recognized. A sub-frame remainder is discarded.
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        self.pending.clear();
        if self.utterance.is_empty() {
            return None;
        }
        self.close_utterance()
    }

    fn consume_frame(&mut self, frame: &[f32]) -> Option<Vec<f32>> {
        if rms(frame) > self.cfg.rms_threshold {
            self.in_speech = true;
            self.silent_frames = 0;
            self.utterance.extend_from_slice(frame);
            self.voiced_len = self.utterance.len();
            if self.utterance.len() >= self.cfg.max_utterance_samples {
                return self.close_utterance();
            }
        } else if self.in_speech {
            self.silent_frames += 1;
            self.utterance.extend_from_slice(frame);
            if self.silent_frames >= self.cfg.endpoint_silence_frames {
                return self.close_utterance();
            }
        }
        // Leading silence outside any utterance is dropped.
        None
    }

    fn close_utterance(&mut self) -> Option<Vec<f32>> {
        let mut utt = std::mem::take(&mut self.utterance);
        utt.truncate(self.voiced_len);

        self.in_speech = false;
        self.silent_frames = 0;
        self.voiced_len = 0;

        if utt.len() >= self.cfg.min_utterance_samples {
            Some(utt)
        } else {
            None
        }
    }
}

/// RMS amplitude of one frame.
fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_sq: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Small config: 30 ms frames, endpoint after 2 silent frames, minimum
    /// one frame of speech.
    fn test_config() -> EndpointConfig {
        EndpointConfig {
            rms_threshold: 0.01,
            frame_size: 480,
            endpoint_silence_frames: 2,
            min_utterance_samples: 480,
            max_utterance_samples: 48_000,
        }
    }

    fn silence(frames: usize) -> Vec<f32> {
        vec![0.0; frames * 480]
    }

    fn speech(frames: usize) -> Vec<f32> {
        vec![0.5; frames * 480]
    }

    #[test]
    fn voiced_region_between_silence_yields_one_utterance() {
        let mut ep = UtteranceEndpointer::new(test_config());
        assert!(ep.push(&silence(3)).is_none());
        assert!(ep.push(&speech(4)).is_none());
        let utt = ep.push(&silence(3)).expect("utterance");
        // Leading silence dropped, trailing silence trimmed.
        assert_eq!(utt.len(), 4 * 480);
    }

    #[test]
    fn all_silence_yields_nothing() {
        let mut ep = UtteranceEndpointer::new(test_config());
        assert!(ep.push(&silence(20)).is_none());
        assert!(ep.flush().is_none());
    }

    #[test]
    fn flush_returns_open_utterance() {
        let mut ep = UtteranceEndpointer::new(test_config());
        assert!(ep.push(&speech(3)).is_none());
        let utt = ep.flush().expect("pending speech");
        assert_eq!(utt.len(), 3 * 480);
        assert!(!ep.in_speech());
    }

    #[test]
    fn blip_below_minimum_is_dropped() {
        let mut ep = UtteranceEndpointer::new(EndpointConfig {
            min_utterance_samples: 4 * 480,
            ..test_config()
        });
        assert!(ep.push(&speech(1)).is_none());
        assert!(ep.push(&silence(3)).is_none()); // endpoint hit, utterance too short
        assert!(!ep.in_speech());
        assert!(ep.flush().is_none());
    }

    #[test]
    fn max_length_forces_endpoint_mid_speech() {
        let mut ep = UtteranceEndpointer::new(EndpointConfig {
            max_utterance_samples: 2 * 480,
            ..test_config()
        });
        let utt = ep.push(&speech(5)).expect("forced cut");
        assert_eq!(utt.len(), 2 * 480);
    }

    #[test]
    fn speech_so_far_excludes_trailing_silence() {
        let mut ep = UtteranceEndpointer::new(test_config());
        ep.push(&speech(2));
        ep.push(&silence(1)); // one silent frame, endpoint not reached
        assert!(ep.in_speech());
        assert_eq!(ep.speech_so_far().len(), 2 * 480);
    }

    #[test]
    fn sub_frame_chunks_accumulate() {
        let mut ep = UtteranceEndpointer::new(test_config());
        // 480-sample frames delivered as 120-sample chunks.
        for _ in 0..8 {
            assert!(ep.push(&vec![0.5_f32; 120]).is_none());
        }
        let utt = ep.flush().expect("two frames of speech");
        assert_eq!(utt.len(), 2 * 480);
    }

    #[test]
    #[should_panic(expected = "frame_size must be > 0")]
    fn zero_frame_size_panics() {
        UtteranceEndpointer::new(EndpointConfig {
            frame_size: 0,
            ..EndpointConfig::default()
        });
    }
}
