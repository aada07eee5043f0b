//! VoicePad — a desktop voice-to-text widget.
//!
//! Press Record, speak, and watch recognized text accumulate in an editable
//! buffer you can clear or copy. The recording feature adapts to what the
//! host offers:
//!
//! * **Native recognition** — a local Whisper model transcribes speech live,
//!   one utterance at a time.
//! * **Fallback capture** — no model loaded: raw audio is captured and a
//!   note explains that a deployment would send it to a transcription
//!   service.
//! * **Unsupported** — no microphone: recording is disabled, the text editor
//!   keeps working.
//!
//! Module map: [`audio`] (capture, resampling, endpointing, level metering)
//! → [`stt`] (the recognizer seam and Whisper implementation) → [`session`]
//! (capability detection, session workers, the controller) → [`transcript`]
//! / [`clipboard`] → [`app`] (the egui widget) — wired together by `main`.

pub mod app;
pub mod audio;
pub mod clipboard;
pub mod config;
pub mod session;
pub mod stt;
pub mod transcript;
