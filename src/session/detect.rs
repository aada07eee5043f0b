//! Capability detection for the recording feature.
//!
//! Decides, once per widget lifetime, which of the two host capabilities a
//! recording session will use: live recognition (a loaded model plus a
//! working input device), raw capture only (device but no model), or neither
//! — in which case recording stays disabled and the widget is a plain text
//! editor.

use crate::audio::AudioCapture;

// ---------------------------------------------------------------------------
// CapabilityMode
// ---------------------------------------------------------------------------

/// What the host can do for us, probed at the first recording attempt and
/// fixed from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityMode {
    /// A recognizer is loaded and a microphone is present: speech is
    /// transcribed live.
    NativeRecognition,
    /// No recognizer, but a microphone is present: raw audio is captured for
    /// an external transcription service.
    FallbackCapture,
    /// No microphone. Recording is permanently disabled for this run.
    Unsupported,
}

/// Probe the host and classify.
///
/// The microphone check is [`AudioCapture::open`] — the same call a session
/// would make, so a positive probe means a session can actually be built.
pub fn detect(recognizer_loaded: bool) -> CapabilityMode {
    let microphone_present = match AudioCapture::open() {
        Ok(_) => true,
        Err(e) => {
            log::warn!("no usable audio input: {e}");
            false
        }
    };

    let mode = classify(recognizer_loaded, microphone_present);
    log::info!("recording capability: {mode:?}");
    mode
}

/// Pure classification ladder: recognition first, capture second.
pub(crate) fn classify(recognizer_loaded: bool, microphone_present: bool) -> CapabilityMode {
    match (recognizer_loaded, microphone_present) {
        (true, true) => CapabilityMode::NativeRecognition,
        (false, true) => CapabilityMode::FallbackCapture,
        (_, false) => CapabilityMode::Unsupported,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_and_microphone_is_native() {
        assert_eq!(classify(true, true), CapabilityMode::NativeRecognition);
    }

    #[test]
    fn microphone_without_recognizer_is_fallback() {
        assert_eq!(classify(false, true), CapabilityMode::FallbackCapture);
    }

    #[test]
    fn no_microphone_is_unsupported_even_with_recognizer() {
        assert_eq!(classify(true, false), CapabilityMode::Unsupported);
        assert_eq!(classify(false, false), CapabilityMode::Unsupported);
    }
}
