//! cpal-based audio backend implementation.
//!
//! [`CpalBackend`] opens mono signed 16-bit streams on the platform's default host
//! (ALSA on Linux, CoreAudio on macOS, WASAPI on Windows).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use steppe_io::cpal_backend::CpalBackend;
//! use steppe_io::backend::{AudioBackend, BackendStreamConfig};
//!
//! let backend = CpalBackend::new();
//! let stream = backend.build_output_stream(
//!     &BackendStreamConfig::default(),
//!     Box::new(|buffer: &mut [i16]| buffer.fill(0)),
//!     Box::new(|err| eprintln!("Audio error: {}", err)),
//! )?;
//! // Stream plays until `stream` is dropped.
//! ```

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::stream::{DeviceKind, open_device};
use crate::{AudioDevice, Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// cpal-based audio backend.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn stream_config(config: &BackendStreamConfig) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels: 1,
        sample_rate: config.sample_rate,
        buffer_size: config
            .buffer_size
            .map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        crate::stream::list_devices()
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = open_device(&self.host, DeviceKind::Output, config.device_name.as_deref())?;

        let stream = device
            .build_output_stream(
                &stream_config(config),
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Device(e.to_string()))?;

        stream.play().map_err(|e| Error::Device(e.to_string()))?;
        tracing::info!(
            sample_rate = config.sample_rate,
            device = config.device_name.as_deref().unwrap_or("default"),
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = open_device(&self.host, DeviceKind::Input, config.device_name.as_deref())?;

        let stream = device
            .build_input_stream(
                &stream_config(config),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Device(e.to_string()))?;

        stream.play().map_err(|e| Error::Device(e.to_string()))?;
        tracing::info!(
            sample_rate = config.sample_rate,
            device = config.device_name.as_deref().unwrap_or("default"),
            "input stream started"
        );

        Ok(StreamHandle::new(stream))
    }
}
