//! Pluggable audio backend abstraction.
//!
//! Measurements speak mono signed 16-bit PCM on both ends. The [`AudioBackend`]
//! trait hands out streams of exactly that shape so the measurement runner never
//! sees platform types:
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │        MeasurementRunner         │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │  list_devices / build_streams    │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ CpalBackend │  │ test doubles│
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Callbacks are boxed closures so the trait stays object-safe; stream handles are
//! type-erased and stop their stream on drop.

use crate::{AudioDevice, Result};

/// Configuration for building a mono 16-bit stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames, or `None` for the device default.
    pub buffer_size: Option<u32>,
    /// Device name, index or partial name (uses the system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: None,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops playback or
/// capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Output callback: fill the buffer with mono `i16` samples.
///
/// Runs on the audio thread; must not block.
pub type OutputCallback = Box<dyn FnMut(&mut [i16]) + Send>;

/// Input callback: receives captured mono `i16` samples.
pub type InputCallback = Box<dyn FnMut(&[i16]) + Send>;

/// Error callback with a human-readable message.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal", "loopback").
    fn name(&self) -> &str;

    /// List available devices with the probed rates each supports.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Build and start a mono `i16` output stream.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build and start a mono `i16` input stream.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;
}
