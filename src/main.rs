//! Application entry point — VoicePad.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Try to load the Whisper recognizer — failure is not fatal, the widget
//!    degrades to fallback-capture mode.
//! 4. Build the [`SessionController`] around whatever loaded.
//! 5. Run [`eframe::run_native`] — blocks until the window closes.

use std::sync::Arc;

use eframe::egui;
use voicepad::{
    app::VoicePadApp,
    config::{AppConfig, AppPaths},
    session::SessionController,
    stt::{RecognizeParams, SpeechRecognizer, WhisperRecognizer},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([380.0, 480.0])
        .with_min_inner_size([320.0, 380.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("VoicePad starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Recognizer — the widget's native-recognition capability. A missing
    //    or broken model demotes the widget to fallback capture.
    let model_path = AppPaths::new()
        .models_dir
        .join(format!("{}.bin", config.recognition.model));

    let params = RecognizeParams {
        language: config.recognition.language.clone(),
        ..RecognizeParams::default()
    };

    let recognizer: Option<Arc<dyn SpeechRecognizer>> =
        match WhisperRecognizer::load(&model_path, params) {
            Ok(engine) => {
                log::info!("recognition model loaded: {}", model_path.display());
                Some(Arc::new(engine))
            }
            Err(e) => {
                log::warn!(
                    "recognition model unavailable ({e}); falling back to raw audio capture"
                );
                None
            }
        };

    // 4. Controller + widget
    let controller = SessionController::new(recognizer, config.clone());
    let app = VoicePadApp::new(controller, config.clone());

    // 5. Run
    eframe::run_native(
        "VoicePad",
        native_options(&config),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
