//! System clipboard access for the Copy action, backed by `arboard`.
//!
//! A short-lived [`arboard::Clipboard`] handle is created per call rather
//! than shared, because the handle is not `Send` on all platforms and is
//! cheap to create.

use arboard::Clipboard;
use thiserror::Error;

/// Errors surfaced by the Copy action.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The OS clipboard could not be opened.
    #[error("cannot access clipboard: {0}")]
    Access(String),

    /// Writing text to the clipboard failed.
    #[error("cannot write to clipboard: {0}")]
    Write(String),
}

/// Write `text` to the system clipboard, replacing its previous content.
///
/// # Errors
///
/// [`ClipboardError::Access`] when the clipboard cannot be opened,
/// [`ClipboardError::Write`] when the write fails.
pub fn copy_text(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard = Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| ClipboardError::Write(e.to_string()))
}
