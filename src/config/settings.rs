//! Application settings structs, defaults and TOML persistence.
//!
//! Everything implements `Serialize`, `Deserialize`, `Default` and `Clone`
//! so the whole tree round-trips through `settings.toml` and clones cheaply
//! into session workers.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::audio::EndpointConfig;

use super::AppPaths;

// ---------------------------------------------------------------------------
// RecognitionConfig
// ---------------------------------------------------------------------------

/// Settings for the recognition capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// GGML model file stem looked up in the models directory
    /// (e.g. `"ggml-base.en"`).
    pub model: String,
    /// ISO-639-1 language code, or `"auto"` for built-in detection.
    pub language: String,
    /// Keep listening across pauses instead of stopping after one
    /// utterance. When false, the session ends itself after its first final
    /// result and is not restarted.
    pub continuous: bool,
    /// Emit provisional hypotheses for the in-progress utterance. They are
    /// shown as a transient line in the recording indicator and never
    /// appended to the transcript. Costs an extra inference pass per
    /// interval, so off by default.
    pub interim_results: bool,
    /// Minimum milliseconds between interim passes.
    pub interim_interval_ms: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            model: "ggml-base.en".into(),
            language: "en".into(),
            continuous: true,
            interim_results: false,
            interim_interval_ms: 1_200,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for capture and utterance endpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Frame RMS above this value counts as voice (0.0 – 1.0).
    pub rms_threshold: f32,
    /// Milliseconds of continuous silence that finalize an utterance.
    pub endpoint_silence_ms: u64,
    /// Minimum utterance length in seconds; shorter detections are dropped.
    pub min_utterance_secs: f32,
    /// Maximum utterance length in seconds; longer speech is cut and
    /// recognized immediately.
    pub max_utterance_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            rms_threshold: 0.01,
            endpoint_silence_ms: 810,
            min_utterance_secs: 0.5,
            max_utterance_secs: 30.0,
        }
    }
}

impl AudioConfig {
    /// 30 ms classification frames at 16 kHz.
    const FRAME_SIZE: usize = 480;
    const FRAME_MS: u64 = 30;

    /// Translate these settings into the endpointer's sample-space knobs.
    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            rms_threshold: self.rms_threshold,
            frame_size: Self::FRAME_SIZE,
            endpoint_silence_frames: (self.endpoint_silence_ms / Self::FRAME_MS).max(1) as usize,
            min_utterance_samples: (self.min_utterance_secs * 16_000.0) as usize,
            max_utterance_samples: (self.max_utterance_secs * 16_000.0) as usize,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Widget window appearance and behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels; `None` lets the
    /// window manager pick one on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the widget above other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voicepad::config::AppConfig;
///
/// // Returns Default when the file is missing (first run).
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Recognition capability settings.
    pub recognition: RecognitionConfig,
    /// Capture / endpointing settings.
    pub audio: AudioConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load from the platform `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet,
    /// so callers never special-case a first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (used by tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to the platform `settings.toml`, creating directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (used by tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.recognition.model, loaded.recognition.model);
        assert_eq!(original.recognition.language, loaded.recognition.language);
        assert_eq!(
            original.recognition.continuous,
            loaded.recognition.continuous
        );
        assert_eq!(
            original.recognition.interim_results,
            loaded.recognition.interim_results
        );
        assert_eq!(original.audio.rms_threshold, loaded.audio.rms_threshold);
        assert_eq!(
            original.audio.endpoint_silence_ms,
            loaded.audio.endpoint_silence_ms
        );
        assert_eq!(original.ui.always_on_top, loaded.ui.always_on_top);
        assert_eq!(original.ui.window_position, loaded.ui.window_position);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.recognition.model, "ggml-base.en");
        assert_eq!(config.recognition.language, "en");
        assert!(config.recognition.continuous);
    }

    #[test]
    fn defaults_match_shipping_configuration() {
        let cfg = AppConfig::default();
        assert!(cfg.recognition.continuous);
        assert!(!cfg.recognition.interim_results);
        assert_eq!(cfg.recognition.language, "en");
        assert_eq!(cfg.audio.endpoint_silence_ms, 810);
        assert!((cfg.audio.min_utterance_secs - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn modified_values_survive_round_trip() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.recognition.model = "ggml-small".into();
        cfg.recognition.language = "de".into();
        cfg.recognition.interim_results = true;
        cfg.audio.endpoint_silence_ms = 500;
        cfg.ui.window_position = Some((120.0, 240.0));
        cfg.ui.always_on_top = true;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.recognition.model, "ggml-small");
        assert_eq!(loaded.recognition.language, "de");
        assert!(loaded.recognition.interim_results);
        assert_eq!(loaded.audio.endpoint_silence_ms, 500);
        assert_eq!(loaded.ui.window_position, Some((120.0, 240.0)));
        assert!(loaded.ui.always_on_top);
    }

    #[test]
    fn endpoint_config_translation() {
        let audio = AudioConfig::default();
        let ep = audio.endpoint_config();
        assert_eq!(ep.frame_size, 480);
        assert_eq!(ep.endpoint_silence_frames, 27); // 810 ms / 30 ms
        assert_eq!(ep.min_utterance_samples, 8_000);
        assert_eq!(ep.max_utterance_samples, 480_000);
    }
}
