//! Audio layer — microphone capture → downmix/resample → endpointing → level.
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → stereo_to_mono
//!           → resample_to_16k → UtteranceEndpointer → recognizer
//!                             → chunk_rms → LevelMeter (UI indicator)
//! ```
//!
//! Everything downstream of [`capture`] works in the canonical 16 kHz mono
//! `f32` format the recognizer expects.

pub mod capture;
pub mod endpoint;
pub mod level;
pub mod resample;

pub use capture::{AudioCapture, AudioChunk, CaptureError, StreamHandle};
pub use endpoint::{EndpointConfig, UtteranceEndpointer};
pub use level::{chunk_rms, LevelMeter};
pub use resample::{resample_to_16k, stereo_to_mono, TARGET_RATE};
