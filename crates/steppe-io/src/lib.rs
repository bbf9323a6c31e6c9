//! Device I/O layer for stepped frequency measurements.
//!
//! This crate provides:
//!
//! - **Play/record coordination**: [`Coordinator`] drives one measurement session from
//!   playback start through the [`SETTLE_DELAY`] tail to the decoded [`Recording`]
//! - **Capture**: [`CaptureBuffer`] accumulates raw PCM chunks from the input device
//! - **Blocking runs**: [`MeasurementRunner`] wires the coordinator to an [`AudioBackend`]
//!   and a [`ThreadTimer`] over a single event queue
//! - **Devices**: [`list_devices`] and [`find_device`] for mono 16-bit capable hardware
//! - **WAV files**: [`write_recording`], [`write_wav`] and [`read_wav`] for exporting
//!   recordings and probes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::atomic::AtomicBool;
//! use steppe_core::{Probe, SegmentParameters};
//! use steppe_io::{CpalBackend, MeasurementRunner, RunnerConfig};
//!
//! let probe = Probe::from_parameters(&[SegmentParameters::default()])?;
//! let mut runner = MeasurementRunner::new(Box::new(CpalBackend::new()), RunnerConfig::default());
//! let recording = runner.run(probe.composite(), &AtomicBool::new(false), |_| {})?;
//! println!("captured {} frames", recording.samples.len());
//! ```

pub mod backend;
mod capture;
mod coordinator;
pub mod cpal_backend;
mod runner;
mod stream;
mod timer;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, StreamHandle};
pub use capture::CaptureBuffer;
pub use coordinator::{
    Coordinator, CoordinatorState, DeviceEvent, DeviceIo, OutputState, Recording,
    SETTLE_DELAY, SessionId, SettleTimer,
};
pub use cpal_backend::CpalBackend;
pub use runner::{BackendDevices, MeasurementRunner, Progress, RunnerConfig};
pub use stream::{AudioDevice, DeviceKind, PROBE_SAMPLE_RATES, find_device, list_devices};
pub use timer::ThreadTimer;
pub use wav::{WavSpec, read_wav, write_recording, write_wav};

/// Error types for device I/O and measurement sessions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio device error: {0}")]
    Device(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The session did not finish within its deadline.
    #[error("Measurement timed out")]
    Timeout,

    /// The session was aborted before it finished.
    #[error("Measurement aborted")]
    Aborted,

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for device I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
