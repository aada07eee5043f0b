//! Microphone capture via `cpal`.
//!
//! [`AudioCapture::open`] probes the default input device and doubles as the
//! capability check for recording: if it fails there is no raw audio-capture
//! capability on this machine. [`AudioCapture::start`] begins streaming
//! [`AudioChunk`]s over an mpsc channel and returns a [`StreamHandle`] RAII
//! guard — dropping it stops the hardware stream and turns the OS microphone
//! indicator off, so a session worker releases the microphone simply by
//! letting its handle go out of scope.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;
use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One buffer of raw audio as delivered by the cpal callback.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]` at the device's native rate.
/// Session workers downmix with [`crate::audio::stereo_to_mono`] and convert
/// with [`crate::audio::resample_to_16k`] before recognition.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping it stops the underlying hardware stream. `cpal::Stream` is not
/// `Send` on every platform, so the handle must stay on the thread that
/// created it — session workers build the stream and hold the handle on
/// their own stack for exactly this reason.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors from opening or starting the audio capture.
///
/// There is no separate OS permission prompt at this layer: a denied or
/// missing microphone surfaces as one of these variants, and the widget
/// treats them as the access-denied reason it shows the user.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no audio input device found")]
    NoDevice,

    #[error("input device rejected its default configuration: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("could not build the input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("could not start the input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Default-input-device wrapper around the cpal host.
///
/// Opening queries the device's preferred configuration; starting attaches a
/// callback that forwards each hardware buffer as an [`AudioChunk`]. One
/// `AudioCapture` can start more than one stream over its lifetime, which is
/// how a native session restarts its feed after an unsolicited stream death.
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    /// Open the system default input device.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] when no input device exists,
    /// [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration. Either one means the raw audio-capture
    /// capability is absent.
    pub fn open() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;

        Ok(Self {
            device,
            config: supported.into(),
            sample_rate,
            channels,
        })
    }

    /// Start streaming and send every hardware buffer to `tx`.
    ///
    /// The callback runs on cpal's audio thread. Send errors are ignored so
    /// the audio thread never panics after the receiving worker has gone
    /// away; stream errors are logged and otherwise left to the worker to
    /// notice as a dead channel.
    ///
    /// # Errors
    ///
    /// [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`] when the
    /// platform rejects the stream.
    pub fn start(&self, tx: mpsc::Sender<AudioChunk>) -> Result<StreamHandle, CaptureError> {
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                });
            },
            |err: cpal::StreamError| {
                log::error!("input stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the device in Hz (commonly 44 100 or 48 000).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels per [`AudioChunk`].
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Chunks cross the worker-thread boundary.
    #[test]
    fn audio_chunk_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioChunk>();
    }

    #[test]
    fn capture_error_no_device_message() {
        let e = CaptureError::NoDevice;
        assert!(e.to_string().contains("input device"));
    }
}
