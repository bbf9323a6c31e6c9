//! Blocking measurement runs over a single event queue.
//!
//! Device callbacks and the settle timer only ever send [`DeviceEvent`]s into one
//! `mpsc` channel. The thread calling [`MeasurementRunner::run`] owns the
//! [`Coordinator`] and is the only reader, so capture appends and the final decode
//! are serialized without a lock.

use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::coordinator::{
    Coordinator, CoordinatorState, DeviceEvent, DeviceIo, OutputState, Recording, SETTLE_DELAY,
    SessionId,
};
use crate::timer::ThreadTimer;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use steppe_core::PcmSource;

/// How often the run loop wakes up to check the abort flag and deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Settings for a measurement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Sample rate for both devices.
    pub sample_rate: u32,
    /// Capture device (index, name or partial name); system default if `None`.
    pub input_device: Option<String>,
    /// Playback device (index, name or partial name); system default if `None`.
    pub output_device: Option<String>,
    /// Preferred device buffer size in frames.
    pub buffer_size: Option<u32>,
    /// Slack on top of playback length and settle delay before a run times out.
    pub timeout_margin: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            input_device: None,
            output_device: None,
            buffer_size: None,
            timeout_margin: Duration::from_secs(5),
        }
    }
}

impl RunnerConfig {
    fn stream_config(&self, device_name: Option<&String>) -> BackendStreamConfig {
        BackendStreamConfig {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            device_name: device_name.cloned(),
        }
    }

    /// Longest a run playing `frames` samples may take before it is abandoned.
    pub fn deadline(&self, frames: usize) -> Duration {
        let playback = Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate.max(1)));
        playback + SETTLE_DELAY + self.timeout_margin
    }
}

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Coordinator state.
    pub state: CoordinatorState,
    /// Whole frames captured so far.
    pub captured_frames: usize,
    /// Time since the session started.
    pub elapsed: Duration,
}

/// [`DeviceIo`] over an [`AudioBackend`], posting everything into an event queue.
pub struct BackendDevices<'a> {
    backend: &'a dyn AudioBackend,
    input_config: BackendStreamConfig,
    output_config: BackendStreamConfig,
    events: Sender<DeviceEvent>,
    input: Option<StreamHandle>,
    output: Option<StreamHandle>,
}

impl<'a> BackendDevices<'a> {
    /// Create a device controller for `backend` posting to `events`.
    pub fn new(backend: &'a dyn AudioBackend, config: &RunnerConfig, events: Sender<DeviceEvent>) -> Self {
        Self {
            backend,
            input_config: config.stream_config(config.input_device.as_ref()),
            output_config: config.stream_config(config.output_device.as_ref()),
            events,
            input: None,
            output: None,
        }
    }

    /// Check whether the capture stream is open.
    pub fn is_capturing(&self) -> bool {
        self.input.is_some()
    }

    /// Check whether the playback stream is open.
    pub fn is_playing(&self) -> bool {
        self.output.is_some()
    }
}

impl DeviceIo for BackendDevices<'_> {
    fn start_capture(&mut self, session: SessionId) -> Result<()> {
        self.stop_capture();

        let data_tx = self.events.clone();
        let error_tx = self.events.clone();
        let handle = self.backend.build_input_stream(
            &self.input_config,
            Box::new(move |data: &[i16]| {
                let bytes: Vec<u8> = data.iter().flat_map(|s| s.to_le_bytes()).collect();
                let _ = data_tx.send(DeviceEvent::InputData(session, bytes));
            }),
            Box::new(move |message: &str| {
                let _ = error_tx.send(DeviceEvent::InputError(session, message.to_string()));
            }),
        )?;

        self.input = Some(handle);
        Ok(())
    }

    fn stop_capture(&mut self) {
        if self.input.take().is_some() {
            tracing::info!(backend = self.backend.name(), "input stream stopped");
        }
    }

    fn start_playback(&mut self, session: SessionId, mut source: PcmSource) -> Result<()> {
        self.stop_playback();

        let state_tx = self.events.clone();
        let error_tx = self.events.clone();
        let mut started = false;
        let mut drained = false;
        let handle = self.backend.build_output_stream(
            &self.output_config,
            Box::new(move |out: &mut [i16]| {
                if !started {
                    started = true;
                    let _ = state_tx.send(DeviceEvent::OutputState(session, OutputState::Active));
                }
                let written = source.fill(out);
                if written < out.len() && !drained {
                    drained = true;
                    let _ = state_tx.send(DeviceEvent::OutputState(session, OutputState::Idle));
                }
            }),
            Box::new(move |message: &str| {
                let _ = error_tx.send(DeviceEvent::OutputError(session, message.to_string()));
            }),
        )?;

        self.output = Some(handle);
        Ok(())
    }

    fn stop_playback(&mut self) {
        if self.output.take().is_some() {
            tracing::info!(backend = self.backend.name(), "output stream stopped");
        }
    }
}

/// Runs one play/record session to completion on the calling thread.
pub struct MeasurementRunner {
    backend: Box<dyn AudioBackend>,
    config: RunnerConfig,
}

impl MeasurementRunner {
    /// Create a runner on `backend`.
    pub fn new(backend: Box<dyn AudioBackend>, config: RunnerConfig) -> Self {
        Self { backend, config }
    }

    /// Run settings.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// The backend streams are built on.
    pub fn backend(&self) -> &dyn AudioBackend {
        self.backend.as_ref()
    }

    /// Play `samples` while capturing, wait out the settle delay and return the
    /// decoded response.
    ///
    /// `progress` is called after every event and on each idle poll. Setting `abort`
    /// tears the session down at the next poll.
    ///
    /// # Errors
    ///
    /// - [`Error::Device`], [`Error::NoDevice`], [`Error::DeviceNotFound`] when a
    ///   stream cannot be opened
    /// - [`Error::Aborted`] when `abort` was set
    /// - [`Error::Timeout`] when the output never reported draining in time
    pub fn run<F>(&mut self, samples: &[f32], abort: &AtomicBool, mut progress: F) -> Result<Recording>
    where
        F: FnMut(&Progress),
    {
        let (tx, rx) = mpsc::channel();
        let devices = BackendDevices::new(self.backend.as_ref(), &self.config, tx.clone());
        let timer = ThreadTimer::new(tx);
        let mut coordinator = Coordinator::new(devices, timer, self.config.sample_rate);

        let deadline = self.config.deadline(samples.len());
        let started = Instant::now();
        coordinator.play_record(samples)?;

        loop {
            if abort.load(Ordering::SeqCst) {
                coordinator.abort();
                return Err(Error::Aborted);
            }

            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => {
                    if let Some(recording) = coordinator.handle_event(event) {
                        return Ok(recording);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    coordinator.abort();
                    return Err(Error::Device("device event queue closed".into()));
                }
            }

            let elapsed = started.elapsed();
            if elapsed > deadline {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    state = ?coordinator.state(),
                    "measurement timed out"
                );
                coordinator.abort();
                return Err(Error::Timeout);
            }

            progress(&Progress {
                state: coordinator.state(),
                captured_frames: coordinator.captured_bytes() / 2,
                elapsed,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_covers_playback_and_settle() {
        let config = RunnerConfig {
            sample_rate: 48000,
            timeout_margin: Duration::from_millis(250),
            ..RunnerConfig::default()
        };
        assert_eq!(config.deadline(96000), Duration::from_millis(2750));
        assert_eq!(config.deadline(0), Duration::from_millis(750));
    }

    #[test]
    fn test_stream_configs_pick_their_device() {
        let config = RunnerConfig {
            input_device: Some("mic".into()),
            output_device: Some("2".into()),
            buffer_size: Some(256),
            ..RunnerConfig::default()
        };
        let input = config.stream_config(config.input_device.as_ref());
        let output = config.stream_config(config.output_device.as_ref());
        assert_eq!(input.device_name.as_deref(), Some("mic"));
        assert_eq!(output.device_name.as_deref(), Some("2"));
        assert_eq!(output.buffer_size, Some(256));
        assert_eq!(output.sample_rate, 44100);
    }
}
