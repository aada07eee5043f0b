//! Recognizer trait and the Whisper-backed implementation.
//!
//! [`SpeechRecognizer`] is object-safe and `Send + Sync`, so a session worker
//! can hold it behind an `Arc<dyn SpeechRecognizer>` and run inference off
//! the UI thread.
//!
//! [`WhisperRecognizer`] wraps a `whisper_rs::WhisperContext`; construct it
//! with [`WhisperRecognizer::load`]. A load failure at startup is not fatal —
//! the widget degrades to fallback-capture mode.
//!
//! [`MockRecognizer`] (`#[cfg(test)]`) returns canned responses so the
//! session and transcript logic can be tested without a GGML model file.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::stt::params::RecognizeParams;

// ---------------------------------------------------------------------------
// RecognizerError
// ---------------------------------------------------------------------------

/// Everything the recognition capability can report.
#[derive(Debug, Clone, Error)]
pub enum RecognizerError {
    /// The GGML model file was not found at the given path.
    #[error("recognition model not found: {0}")]
    ModelNotFound(String),

    /// `whisper_rs` failed to initialise its context or state.
    #[error("recognition engine failed to initialise: {0}")]
    EngineInit(String),

    /// The inference pass itself failed.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The utterance is shorter than the 0.5 s minimum Whisper needs.
    #[error("utterance too short (minimum 0.5 s)")]
    AudioTooShort,

    /// The utterance exceeds the 60 s maximum for one pass.
    #[error("utterance too long (maximum 60 s)")]
    AudioTooLong,
}

// ---------------------------------------------------------------------------
// SpeechRecognizer trait
// ---------------------------------------------------------------------------

/// Minimum utterance length: 0.5 s × 16 000 Hz.
const MIN_AUDIO_SAMPLES: usize = 8_000;
/// Maximum utterance length: 60 s × 16 000 Hz.
const MAX_AUDIO_SAMPLES: usize = 960_000;

/// Object-safe, thread-safe speech recognition seam.
///
/// # Contract
///
/// - `audio` is **16 kHz mono f32** PCM.
/// - `Err(RecognizerError::AudioTooShort)` when `audio.len() < 8_000`.
/// - `Err(RecognizerError::AudioTooLong)` when `audio.len() > 960_000`.
/// - The returned text is trimmed; it may be empty when the audio carried
///   no recognizable speech.
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize `audio` and return the transcript text.
    fn recognize(&self, audio: &[f32]) -> Result<String, RecognizerError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechRecognizer>) {}
};

// ---------------------------------------------------------------------------
// WhisperRecognizer
// ---------------------------------------------------------------------------

/// Production recognizer over a `whisper_rs::WhisperContext`.
///
/// A fresh `WhisperState` is created per [`recognize`] call, so the value can
/// be shared across threads without locking.
///
/// [`recognize`]: SpeechRecognizer::recognize
pub struct WhisperRecognizer {
    ctx: WhisperContext,
    params: RecognizeParams,
}

impl std::fmt::Debug for WhisperRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRecognizer")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// `WhisperContext` declares Send+Sync in whisper-rs; the weights are
// read-only after load and `RecognizeParams` is plainly owned.
// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs.
unsafe impl Send for WhisperRecognizer {}
unsafe impl Sync for WhisperRecognizer {}

impl WhisperRecognizer {
    /// Load a GGML model from `model_path`.
    ///
    /// # Errors
    ///
    /// - [`RecognizerError::ModelNotFound`] — no file at `model_path`.
    /// - [`RecognizerError::EngineInit`] — whisper-rs rejected the file.
    pub fn load(
        model_path: impl AsRef<Path>,
        params: RecognizeParams,
    ) -> Result<Self, RecognizerError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(RecognizerError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            RecognizerError::ModelNotFound(format!(
                "model path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| RecognizerError::EngineInit(e.to_string()))?;

        Ok(Self { ctx, params })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn recognize(&self, audio: &[f32]) -> Result<String, RecognizerError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(RecognizerError::AudioTooShort);
        }
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(RecognizerError::AudioTooLong);
        }

        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // set_language borrows from params; both outlive state.full() below.
        let lang: Option<&str> = if self.params.language == "auto" {
            None
        } else {
            Some(self.params.language.as_str())
        };
        fp.set_language(lang);
        fp.set_n_threads(self.params.n_threads);

        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| RecognizerError::EngineInit(e.to_string()))?;

        state
            .full(fp, audio)
            .map_err(|e| RecognizerError::Recognition(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| RecognizerError::Recognition(e.to_string()))?;

        let mut text = String::new();
        for i in 0..n_segments {
            let seg = state
                .full_get_segment_text(i)
                .map_err(|e| RecognizerError::Recognition(format!("segment {i}: {e}")))?;
            text.push_str(&seg);
        }

        Ok(text.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer  (test-only)
// ---------------------------------------------------------------------------

/// Test double returning a pre-configured response.
///
/// The audio-length contract is enforced even here so callers are tested
/// against it.
#[cfg(test)]
pub struct MockRecognizer {
    response: Result<String, RecognizerError>,
}

#[cfg(test)]
impl MockRecognizer {
    /// Always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
        }
    }

    /// Always returns `Err(error)`.
    pub fn err(error: RecognizerError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

#[cfg(test)]
impl SpeechRecognizer for MockRecognizer {
    fn recognize(&self, audio: &[f32]) -> Result<String, RecognizerError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(RecognizerError::AudioTooShort);
        }
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(RecognizerError::AudioTooLong);
        }
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_text() {
        let engine = MockRecognizer::ok("hello world");
        let audio = vec![0.0f32; MIN_AUDIO_SAMPLES];
        assert_eq!(engine.recognize(&audio).unwrap(), "hello world");
    }

    #[test]
    fn mock_returns_configured_error() {
        let engine = MockRecognizer::err(RecognizerError::Recognition("boom".into()));
        let audio = vec![0.0f32; MIN_AUDIO_SAMPLES];
        assert!(matches!(
            engine.recognize(&audio).unwrap_err(),
            RecognizerError::Recognition(_)
        ));
    }

    #[test]
    fn short_audio_is_rejected() {
        let engine = MockRecognizer::ok("text");
        let short = vec![0.0f32; MIN_AUDIO_SAMPLES - 1];
        assert!(matches!(
            engine.recognize(&short).unwrap_err(),
            RecognizerError::AudioTooShort
        ));
    }

    #[test]
    fn long_audio_is_rejected() {
        let engine = MockRecognizer::ok("text");
        let long = vec![0.0f32; MAX_AUDIO_SAMPLES + 1];
        assert!(matches!(
            engine.recognize(&long).unwrap_err(),
            RecognizerError::AudioTooLong
        ));
    }

    #[test]
    fn exactly_min_audio_is_accepted() {
        let engine = MockRecognizer::ok("ok");
        assert!(engine.recognize(&vec![0.0f32; MIN_AUDIO_SAMPLES]).is_ok());
    }

    #[test]
    fn load_missing_model_is_model_not_found() {
        let result = WhisperRecognizer::load("/nonexistent/model.bin", RecognizeParams::default());
        assert!(
            matches!(result, Err(RecognizerError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn trait_object_compiles() {
        let engine: Box<dyn SpeechRecognizer> = Box::new(MockRecognizer::ok("ok"));
        let _ = engine.recognize(&vec![0.0f32; MIN_AUDIO_SAMPLES]);
    }

    #[test]
    fn error_display_carries_path() {
        let e = RecognizerError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));
    }
}
