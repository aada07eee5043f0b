//! The speech recognizer — the black-box recognition capability behind the
//! native session.
//!
//! [`SpeechRecognizer`] is the seam: the session layer only ever sees
//! `recognize(16 kHz mono f32) -> text`. [`WhisperRecognizer`] is the
//! production implementation over `whisper_rs`; whether it loads at startup
//! decides whether the widget runs in native-recognition or fallback-capture
//! mode.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voicepad::stt::{RecognizeParams, SpeechRecognizer, WhisperRecognizer};
//!
//! let params = RecognizeParams::default(); // language = "en"
//! let engine = WhisperRecognizer::load("models/ggml-base.en.bin", params)
//!     .expect("model present");
//!
//! let audio = vec![0.0_f32; 16_000]; // 1 s @ 16 kHz mono
//! let text = engine.recognize(&audio).unwrap();
//! println!("{text}");
//! ```

pub mod engine;
pub mod params;

pub use engine::{RecognizerError, SpeechRecognizer, WhisperRecognizer};
pub use params::RecognizeParams;

#[cfg(test)]
pub use engine::MockRecognizer;
