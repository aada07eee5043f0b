//! Parameters for a recognition pass.

/// Settings applied to every [`recognize`] call of a
/// [`WhisperRecognizer`](crate::stt::WhisperRecognizer).
///
/// ```
/// use voicepad::stt::RecognizeParams;
///
/// let params = RecognizeParams {
///     language: "de".into(),
///     ..RecognizeParams::default()
/// };
/// ```
///
/// [`recognize`]: crate::stt::SpeechRecognizer::recognize
#[derive(Debug, Clone)]
pub struct RecognizeParams {
    /// ISO-639-1 language code (e.g. `"en"`), or `"auto"` for Whisper's
    /// built-in language detection.
    pub language: String,

    /// CPU threads handed to Whisper. Defaults to [`optimal_threads`],
    /// capped at 8.
    pub n_threads: i32,

    /// Silence Whisper's progress chatter on stderr.
    pub suppress_progress: bool,
}

impl Default for RecognizeParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            n_threads: optimal_threads(),
            suppress_progress: true,
        }
    }
}

/// Physical threads available for inference, capped at 8 — Whisper sees
/// diminishing returns past that.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}
