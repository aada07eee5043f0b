//! The editable transcript buffer.
//!
//! [`TranscriptBuffer`] is the single owner of the widget's text. Four things
//! mutate it: finalized recognition results ([`append_final`]), the fallback
//! capture note ([`append_capture_note`]), direct user edits
//! ([`apply_edit`]), and [`clear`]. While a recording is active the buffer is
//! marked read-only and the edit path becomes a no-op, so automatic
//! transcription never races a manual edit.
//!
//! Recognition backends can emit the same "final" result more than once for
//! a single utterance; [`append_final`] keeps the last accepted final of the
//! session and drops consecutive duplicates. Non-consecutive repeats are
//! legitimate speech ("yes … yes") and are kept.
//!
//! [`append_final`]: TranscriptBuffer::append_final
//! [`append_capture_note`]: TranscriptBuffer::append_capture_note
//! [`apply_edit`]: TranscriptBuffer::apply_edit
//! [`clear`]: TranscriptBuffer::clear

/// Fixed note appended after a fallback capture finishes without a
/// transcription service installed.
pub const CAPTURE_NOTE: &str = "[Recording captured. A deployment would send \
this audio to a transcription service and append the returned text here.]";

// ---------------------------------------------------------------------------
// TranscriptBuffer
// ---------------------------------------------------------------------------

/// Owned, editable transcript state.
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    text: String,
    /// Last final accepted this session — the consecutive-duplicate guard.
    last_final: Option<String>,
    /// Set while recording; gates [`TranscriptBuffer::apply_edit`] only.
    read_only: bool,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether direct edits are currently rejected.
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Gate or un-gate the manual edit path. Automatic appends are never
    /// gated.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Forget the duplicate guard. Called when the user starts a new
    /// recording — not on transparent session restarts, which continue the
    /// same logical dictation.
    pub fn begin_session(&mut self) {
        self.last_final = None;
    }

    /// Append a finalized recognition result.
    ///
    /// A final identical to the last accepted one is dropped silently and
    /// `false` is returned. Otherwise the text is appended — preceded by
    /// exactly one space when the buffer is non-empty and does not already
    /// end in whitespace — and remembered as the last accepted final.
    pub fn append_final(&mut self, transcript: &str) -> bool {
        if self.last_final.as_deref() == Some(transcript) {
            log::debug!("dropping duplicate final: {transcript:?}");
            return false;
        }

        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
        self.text.push_str(transcript);
        self.last_final = Some(transcript.to_string());
        true
    }

    /// Append the fixed fallback capture note on its own line.
    pub fn append_capture_note(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(CAPTURE_NOTE);
    }

    /// Replace the text with a user edit.
    ///
    /// A no-op returning `false` while the buffer is read-only; otherwise the
    /// edit applies exactly as given.
    pub fn apply_edit(&mut self, new_text: &str) -> bool {
        if self.read_only {
            return false;
        }
        if new_text != self.text {
            self.text = new_text.to_string();
        }
        true
    }

    /// Reset the text to empty. Works in any state.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
