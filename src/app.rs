//! The VoicePad widget — egui/eframe application.
//!
//! # Architecture
//!
//! [`VoicePadApp`] is the top-level [`eframe::App`]. It owns every piece of
//! widget state — the [`TranscriptBuffer`], the [`RecordingState`], the
//! error message, the level meter — plus the [`SessionController`] whose
//! event channel it drains at the top of every frame. Rendering below that
//! is a pure function of the state: header, banners, record toggle,
//! recording indicator, text area, actions.
//!
//! # States
//!
//! | State | Visual |
//! |-------|--------|
//! | Idle, empty buffer | hint text in the editor, Record button |
//! | Idle, text present | editable text + Clear / Copy row |
//! | Recording | red Stop button, pulse dot, level bars, read-only text |
//! | Error | orange banner above the controls, Idle otherwise |

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::audio::LevelMeter;
use crate::clipboard;
use crate::config::AppConfig;
use crate::session::{
    CapabilityMode, CapturedClip, SessionController, SessionEndAction, SessionEvent,
    TranscriptionService,
};
use crate::transcript::TranscriptBuffer;

/// How long the "Copied!" confirmation stays visible.
const COPIED_FLASH: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// RecordingState
// ---------------------------------------------------------------------------

/// Whether a recording session is (believed to be) running.
///
/// Recording holds exactly while an active session exists; every path that
/// loses the session — user stop, session error, failed restart — reconciles
/// back to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

// ---------------------------------------------------------------------------
// VoicePadApp
// ---------------------------------------------------------------------------

/// The voice-to-text card widget.
pub struct VoicePadApp {
    // ── Widget state ─────────────────────────────────────────────────────
    transcript: TranscriptBuffer,
    recording: RecordingState,
    /// Most recent user-facing failure; cleared on every toggle.
    error_message: Option<String>,
    /// Latest provisional hypothesis, shown under the indicator only.
    interim_text: Option<String>,
    /// Live input level history for the indicator bars.
    level: LevelMeter,

    // ── Timing ───────────────────────────────────────────────────────────
    recording_start: Option<Instant>,
    copied_at: Option<Instant>,

    // ── Collaborators ────────────────────────────────────────────────────
    controller: SessionController,
    /// Optional external transcription backend for fallback clips. Never
    /// installed in this build; the seam exists for deployments and tests.
    transcription_service: Option<Arc<dyn TranscriptionService>>,
    config: AppConfig,
}

impl VoicePadApp {
    pub fn new(controller: SessionController, config: AppConfig) -> Self {
        Self {
            transcript: TranscriptBuffer::new(),
            recording: RecordingState::Idle,
            error_message: None,
            interim_text: None,
            level: LevelMeter::new(24),
            recording_start: None,
            copied_at: None,
            controller,
            transcription_service: None,
            config,
        }
    }

    /// Install a transcription backend for fallback clips.
    pub fn with_transcription_service(mut self, service: Arc<dyn TranscriptionService>) -> Self {
        self.transcription_service = Some(service);
        self
    }

    // ── Recording control ────────────────────────────────────────────────

    /// The Record / Stop button action.
    ///
    /// Every toggle wipes the previous error before anything else, so a new
    /// attempt always starts with a clean slate.
    pub fn toggle_recording(&mut self) {
        self.error_message = None;

        match self.recording {
            RecordingState::Recording => {
                self.controller.stop();
                self.finish_recording();
                log::info!("recording stopped by user");
            }
            RecordingState::Idle => self.start_recording(),
        }
    }

    fn start_recording(&mut self) {
        self.transcript.begin_session();
        self.level.reset();

        match self.controller.start() {
            Ok(mode) => {
                log::info!("recording started ({mode:?})");
                self.recording = RecordingState::Recording;
                self.transcript.set_read_only(true);
                self.recording_start = Some(Instant::now());
            }
            Err(e) => {
                log::warn!("could not start recording: {e}");
                self.error_message = Some(e.to_string());
            }
        }
    }

    /// Reconcile to Idle and lift the edit lock.
    fn finish_recording(&mut self) {
        self.recording = RecordingState::Idle;
        self.transcript.set_read_only(false);
        self.interim_text = None;
        self.recording_start = None;
    }

    // ── Session events ───────────────────────────────────────────────────

    /// Drain everything the active session produced since the last frame.
    fn poll_session_events(&mut self) {
        while let Some(event) = self.controller.poll_event() {
            self.apply_session_event(event);
        }
    }

    fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Level(rms) => self.level.push(rms),

            SessionEvent::Interim(text) => self.interim_text = Some(text),

            SessionEvent::Final(text) => {
                self.interim_text = None;
                self.transcript.append_final(&text);
            }

            SessionEvent::ClipCaptured(clip) => self.handle_clip(clip),

            SessionEvent::Error { message } => {
                self.error_message = Some(format!(
                    "Recognition error: {message}. Press Record to try again."
                ));
                self.finish_recording();
            }

            SessionEvent::Ended => {
                let still_recording = self.recording == RecordingState::Recording;
                match self.controller.handle_ended(still_recording) {
                    SessionEndAction::Restarted => {} // stays Recording, transparently
                    SessionEndAction::Stopped => {
                        if still_recording {
                            self.finish_recording();
                        }
                    }
                }
            }
        }
    }

    /// A fallback capture finished. With a transcription service installed
    /// its text is appended exactly like a native final; without one, the
    /// fixed capture note is.
    fn handle_clip(&mut self, clip: CapturedClip) {
        log::info!("fallback clip ready: {:.1} s", clip.duration_secs());

        match &self.transcription_service {
            Some(service) => match service.transcribe_clip(&clip) {
                Ok(text) => {
                    self.transcript.append_final(&text);
                }
                Err(e) => {
                    self.error_message = Some(format!("Transcription failed: {e}"));
                }
            },
            None => self.transcript.append_capture_note(),
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Copy the transcript to the system clipboard. Never mutates the
    /// buffer; failures are logged only, since there is nothing actionable
    /// for the user.
    fn copy_transcript(&mut self) {
        match clipboard::copy_text(self.transcript.text()) {
            Ok(()) => {
                self.copied_at = Some(Instant::now());
                log::info!("transcript copied to clipboard");
            }
            Err(e) => log::warn!("copy failed: {e}"),
        }
    }

    fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    // ── Render helpers ───────────────────────────────────────────────────

    fn draw_header(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("VoicePad")
                    .size(22.0)
                    .strong()
                    .color(egui::Color32::from_rgb(230, 230, 230)),
            );
            ui.label(
                egui::RichText::new("Speak and watch your words become text")
                    .size(12.0)
                    .color(egui::Color32::from_rgb(150, 150, 150)),
            );
        });
    }

    fn draw_banners(&self, ui: &mut egui::Ui) {
        if self.controller.detected_capability() == Some(CapabilityMode::FallbackCapture) {
            ui.label(
                egui::RichText::new(
                    "Compatibility mode: no recognition model loaded — audio is captured \
                     for an external transcription service",
                )
                .size(11.0)
                .color(egui::Color32::from_rgb(220, 190, 90)),
            );
            ui.add_space(2.0);
        }

        if let Some(ref msg) = self.error_message {
            ui.label(
                egui::RichText::new(msg.as_str())
                    .size(12.0)
                    .color(egui::Color32::from_rgb(255, 136, 68)),
            );
            ui.add_space(2.0);
        }
    }

    fn draw_record_controls(&mut self, ui: &mut egui::Ui) {
        let recording = self.recording == RecordingState::Recording;

        ui.horizontal(|ui| {
            let (label, fill) = if recording {
                ("■  Stop", egui::Color32::from_rgb(170, 40, 40))
            } else {
                ("●  Record", egui::Color32::from_rgb(60, 60, 70))
            };

            let button = egui::Button::new(
                egui::RichText::new(label)
                    .size(14.0)
                    .color(egui::Color32::WHITE),
            )
            .fill(fill)
            .min_size(egui::vec2(110.0, 30.0));

            if ui.add(button).clicked() {
                self.toggle_recording();
            }

            if recording {
                self.draw_recording_indicator(ui);
            }
        });

        if recording {
            if let Some(ref interim) = self.interim_text {
                ui.label(
                    egui::RichText::new(interim.as_str())
                        .size(11.0)
                        .italics()
                        .color(egui::Color32::from_rgb(130, 130, 130)),
                );
            }
        }
    }

    /// Pulse dot, elapsed time, and the live level bars.
    fn draw_recording_indicator(&self, ui: &mut egui::Ui) {
        let elapsed = self
            .recording_start
            .map(|t| t.elapsed().as_secs_f32())
            .unwrap_or(0.0);

        // Dot radius breathes with the input level.
        let radius = 4.0 + self.level.latest() * 5.0;
        let (dot_rect, _) =
            ui.allocate_exact_size(egui::vec2(18.0, 18.0), egui::Sense::hover());
        ui.painter().circle_filled(
            dot_rect.center(),
            radius,
            egui::Color32::from_rgb(255, 68, 68),
        );

        let mode_suffix =
            if self.controller.detected_capability() == Some(CapabilityMode::FallbackCapture) {
                " (compatibility mode)"
            } else {
                ""
            };
        ui.label(
            egui::RichText::new(format!("Recording{mode_suffix}  {elapsed:.0}s"))
                .size(12.0)
                .color(egui::Color32::from_rgb(255, 140, 140)),
        );

        self.draw_level_bars(ui);
    }

    fn draw_level_bars(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(
            egui::vec2(ui.available_width().max(40.0), 18.0),
            egui::Sense::hover(),
        );

        let painter = ui.painter();
        let num_bars = self.level.width().max(1);
        let bar_width = rect.width() / num_bars as f32;

        for (i, amplitude) in self.level.bars().enumerate() {
            let x = rect.left() + i as f32 * bar_width;
            let bar_height = (amplitude * rect.height()).max(1.5);
            painter.rect_filled(
                egui::Rect::from_center_size(
                    egui::pos2(x + bar_width / 2.0, rect.center().y),
                    egui::vec2((bar_width * 0.6).max(1.0), bar_height),
                ),
                1.0,
                egui::Color32::from_rgb(80, 200, 120),
            );
        }
    }

    fn draw_transcript_area(&mut self, ui: &mut egui::Ui) {
        ui.label(
            egui::RichText::new("Transcribed text")
                .size(11.0)
                .color(egui::Color32::from_rgb(150, 150, 150)),
        );

        let hint = if self.controller.detected_capability()
            == Some(CapabilityMode::FallbackCapture)
        {
            "Record audio to send to a transcription service…"
        } else if self.recording == RecordingState::Recording {
            "Speak now…"
        } else {
            "Press Record to start speaking…"
        };

        let editable = self.recording == RecordingState::Idle;
        let mut edit_text = self.transcript.text().to_owned();

        let response = ui.add_enabled(
            editable,
            egui::TextEdit::multiline(&mut edit_text)
                .desired_rows(8)
                .desired_width(f32::INFINITY)
                .hint_text(hint),
        );
        if response.changed() {
            self.transcript.apply_edit(&edit_text);
        }
    }

    fn draw_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add(egui::Button::new(egui::RichText::new("Clear").size(12.0)))
                .clicked()
            {
                self.clear_transcript();
            }
            if ui
                .add(egui::Button::new(egui::RichText::new("Copy").size(12.0)))
                .clicked()
            {
                self.copy_transcript();
            }
            if self.copied_at.is_some() {
                ui.label(
                    egui::RichText::new("Copied!")
                        .size(11.0)
                        .color(egui::Color32::from_rgb(80, 200, 120)),
                );
            }
        });
    }

    fn draw_footer(&self, ui: &mut egui::Ui) {
        let note = match self.controller.detected_capability() {
            Some(CapabilityMode::FallbackCapture) => {
                "No recognition model found — install one for live transcription."
            }
            Some(CapabilityMode::Unsupported) => {
                "Recording is unavailable on this system; the editor still works."
            }
            _ => "Recognition runs locally. Audio never leaves this machine.",
        };
        ui.label(
            egui::RichText::new(note)
                .size(10.0)
                .color(egui::Color32::from_rgb(110, 110, 110)),
        );
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for VoicePadApp {
    /// Per frame: drain session events, advance timers, render.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_session_events();

        if let Some(t) = self.copied_at {
            if t.elapsed() >= COPIED_FLASH {
                self.copied_at = None;
            }
        }

        if self.recording == RecordingState::Recording {
            // ~30 fps keeps the level bars and elapsed timer moving.
            ctx.request_repaint_after(Duration::from_millis(33));
        } else if self.copied_at.is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgb(26, 26, 30))
            .corner_radius(egui::CornerRadius::same(6))
            .inner_margin(egui::Margin::same(12));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            self.draw_header(ui);
            ui.separator();
            self.draw_banners(ui);
            self.draw_record_controls(ui);
            ui.add_space(6.0);
            self.draw_transcript_area(ui);

            if !self.transcript.is_empty() {
                ui.add_space(4.0);
                self.draw_actions(ui);
            }

            ui.add_space(6.0);
            self.draw_footer(ui);
        });
    }

    /// Release the microphone on the way out.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.stop();
        if let Err(e) = self.config.save() {
            log::warn!("could not save settings: {e}");
        }
        log::info!("VoicePad closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
