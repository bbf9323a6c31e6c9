//! Play/record coordination.
//!
//! A measurement session plays a signal on the output device while capturing the
//! input device, keeps capturing for [`SETTLE_DELAY`] after playback has drained,
//! then stops capture and decodes what arrived.
//!
//! ```text
//!            play_record()              output Idle/Stopped          settle elapsed
//!   Idle ───────────────────▶ Playing ─────────────────────▶ Settling ──────────────▶ Idle
//!    ▲                          │  ▲                            │                    (Recording)
//!    │        abort()           │  │ input chunks appended      │ input chunks appended
//!    └──────────────────────────┴──┴────────────────────────────┘
//! ```
//!
//! The [`Coordinator`] never blocks. Hardware and the timer report back through
//! [`DeviceEvent`]s, which the owner feeds to [`Coordinator::handle_event`] one at a
//! time; that single dispatch point is what keeps appends ordered and prevents
//! finalization from racing a late chunk. Every event carries the [`SessionId`] it
//! was produced for, so anything left over from an aborted session is ignored.

use crate::capture::CaptureBuffer;
use crate::Result;
use std::fmt;
use std::time::Duration;
use steppe_core::{PcmSource, Probe};

/// Extra capture time after playback ends, to record the trailing response.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Identifies one play/record session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(u64);

impl SessionId {
    /// The session after this one.
    pub(crate) fn next(self) -> Self {
        SessionId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the coordinator is in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// No session running.
    #[default]
    Idle,
    /// Playback and capture both running.
    Playing,
    /// Playback finished, capture still running until the settle delay elapses.
    Settling,
}

/// State reported by the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Pulling samples.
    Active,
    /// Source exhausted and drained.
    Idle,
    /// The stream went away without draining.
    Stopped,
}

/// Notification delivered to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The output device changed state.
    OutputState(SessionId, OutputState),
    /// The output device reported an error.
    OutputError(SessionId, String),
    /// The input device delivered a chunk of little-endian `i16` bytes.
    InputData(SessionId, Vec<u8>),
    /// The input device reported an error.
    InputError(SessionId, String),
    /// The settle timer fired.
    SettleElapsed(SessionId),
}

impl DeviceEvent {
    /// Session the event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            DeviceEvent::OutputState(session, _)
            | DeviceEvent::OutputError(session, _)
            | DeviceEvent::InputData(session, _)
            | DeviceEvent::InputError(session, _)
            | DeviceEvent::SettleElapsed(session) => *session,
        }
    }
}

/// Start/stop control over the output and input devices.
///
/// Implementations route everything the devices report back as [`DeviceEvent`]s
/// tagged with the session passed to the `start_*` call.
pub trait DeviceIo {
    /// Begin capturing from the input device.
    fn start_capture(&mut self, session: SessionId) -> Result<()>;

    /// Stop capturing. Must be a no-op when not capturing.
    fn stop_capture(&mut self);

    /// Begin streaming `source` to the output device.
    fn start_playback(&mut self, session: SessionId, source: PcmSource) -> Result<()>;

    /// Stop playback. Must be a no-op when not playing.
    fn stop_playback(&mut self);
}

/// One-shot timer that reports [`DeviceEvent::SettleElapsed`].
pub trait SettleTimer {
    /// Arrange for `SettleElapsed(session)` to be delivered after `delay`.
    fn schedule(&mut self, session: SessionId, delay: Duration);

    /// Cancel the pending timer for `session`, if any.
    fn cancel(&mut self, session: SessionId);
}

/// The decoded response of a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Session that produced the recording.
    pub session: SessionId,
    /// Decoded samples, one per captured 16-bit frame.
    pub samples: Vec<f32>,
    /// Sample rate of the capture.
    pub sample_rate: u32,
    /// Raw bytes delivered by the input device, before the odd-byte trim.
    pub captured_bytes: usize,
    /// Errors the devices reported during the session.
    pub device_errors: Vec<String>,
}

impl Recording {
    /// Length of the recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Play/record state machine.
pub struct Coordinator<D, T> {
    devices: D,
    timer: T,
    sample_rate: u32,
    state: CoordinatorState,
    session: SessionId,
    capture: CaptureBuffer,
    device_errors: Vec<String>,
}

impl<D: DeviceIo, T: SettleTimer> Coordinator<D, T> {
    /// Create an idle coordinator for devices running at `sample_rate`.
    pub fn new(devices: D, timer: T, sample_rate: u32) -> Self {
        Self {
            devices,
            timer,
            sample_rate,
            state: CoordinatorState::Idle,
            session: SessionId::default(),
            capture: CaptureBuffer::new(),
            device_errors: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Current (or most recent) session.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Sample rate recordings are tagged with.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes captured in the current session so far.
    pub fn captured_bytes(&self) -> usize {
        self.capture.len()
    }

    /// The device controller.
    pub fn devices(&self) -> &D {
        &self.devices
    }

    /// The settle timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Start a session playing `samples` while capturing.
    ///
    /// A session already in progress is torn down first. Returns as soon as both
    /// devices are started.
    ///
    /// # Errors
    ///
    /// Returns the device error if either device fails to start; the coordinator is
    /// left idle with both devices stopped.
    pub fn play_record(&mut self, samples: &[f32]) -> Result<SessionId> {
        if self.state != CoordinatorState::Idle {
            tracing::info!(session = %self.session, "restarting active session");
            self.teardown();
        }

        self.session = self.session.next();
        let session = self.session;
        self.capture.clear();
        self.device_errors.clear();

        self.devices.start_capture(session)?;
        if let Err(e) = self.devices.start_playback(session, PcmSource::new(samples)) {
            self.devices.stop_capture();
            return Err(e);
        }

        self.transition(CoordinatorState::Playing);
        tracing::info!(%session, frames = samples.len(), "session started");
        Ok(session)
    }

    /// Start a session playing the composite signal of `probe`.
    pub fn play_probe(&mut self, probe: &Probe) -> Result<SessionId> {
        self.play_record(probe.composite())
    }

    /// Tear down the current session without producing a recording.
    ///
    /// Returns `false` if nothing was running.
    pub fn abort(&mut self) -> bool {
        if self.state == CoordinatorState::Idle {
            return false;
        }
        tracing::info!(session = %self.session, "session aborted");
        self.teardown();
        true
    }

    /// Apply one event. Returns the recording when the event finishes the session.
    pub fn handle_event(&mut self, event: DeviceEvent) -> Option<Recording> {
        if event.session() != self.session || self.state == CoordinatorState::Idle {
            tracing::trace!(
                event_session = %event.session(),
                session = %self.session,
                "stale event ignored"
            );
            return None;
        }

        match event {
            DeviceEvent::OutputState(_, state) => {
                self.on_output_state(state);
                None
            }
            DeviceEvent::OutputError(_, message) => {
                tracing::warn!(session = %self.session, %message, "output device error");
                self.device_errors.push(format!("output: {message}"));
                None
            }
            DeviceEvent::InputData(_, chunk) => {
                self.capture.append(&chunk);
                None
            }
            DeviceEvent::InputError(_, message) => {
                tracing::warn!(session = %self.session, %message, "input device error");
                self.device_errors.push(format!("input: {message}"));
                None
            }
            DeviceEvent::SettleElapsed(_) => self.on_settle_elapsed(),
        }
    }

    fn on_output_state(&mut self, state: OutputState) {
        if self.state != CoordinatorState::Playing || state == OutputState::Active {
            return;
        }
        if state == OutputState::Stopped {
            tracing::warn!(session = %self.session, "output stopped before draining");
        }
        self.devices.stop_playback();
        self.timer.schedule(self.session, SETTLE_DELAY);
        self.transition(CoordinatorState::Settling);
    }

    fn on_settle_elapsed(&mut self) -> Option<Recording> {
        if self.state != CoordinatorState::Settling {
            return None;
        }

        self.devices.stop_capture();
        let samples = self.capture.finalize();
        let captured_bytes = self.capture.len();
        self.capture.clear();
        self.transition(CoordinatorState::Idle);

        tracing::info!(
            session = %self.session,
            frames = samples.len(),
            captured_bytes,
            errors = self.device_errors.len(),
            "session finished"
        );

        Some(Recording {
            session: self.session,
            samples,
            sample_rate: self.sample_rate,
            captured_bytes,
            device_errors: std::mem::take(&mut self.device_errors),
        })
    }

    fn teardown(&mut self) {
        self.timer.cancel(self.session);
        self.devices.stop_playback();
        self.devices.stop_capture();
        self.capture.clear();
        self.device_errors.clear();
        self.transition(CoordinatorState::Idle);
    }

    fn transition(&mut self, next: CoordinatorState) {
        tracing::debug!(session = %self.session, from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        StartCapture(SessionId),
        StopCapture,
        StartPlayback(SessionId, usize),
        StopPlayback,
    }

    #[derive(Default)]
    struct MockDevices {
        calls: Vec<Call>,
        fail_playback: bool,
    }

    impl DeviceIo for MockDevices {
        fn start_capture(&mut self, session: SessionId) -> Result<()> {
            self.calls.push(Call::StartCapture(session));
            Ok(())
        }

        fn stop_capture(&mut self) {
            self.calls.push(Call::StopCapture);
        }

        fn start_playback(&mut self, session: SessionId, source: PcmSource) -> Result<()> {
            if self.fail_playback {
                return Err(Error::Device("output busy".into()));
            }
            self.calls.push(Call::StartPlayback(session, source.len()));
            Ok(())
        }

        fn stop_playback(&mut self) {
            self.calls.push(Call::StopPlayback);
        }
    }

    #[derive(Default)]
    struct MockTimer {
        scheduled: Vec<(SessionId, Duration)>,
        cancelled: Vec<SessionId>,
    }

    impl SettleTimer for MockTimer {
        fn schedule(&mut self, session: SessionId, delay: Duration) {
            self.scheduled.push((session, delay));
        }

        fn cancel(&mut self, session: SessionId) {
            self.cancelled.push(session);
        }
    }

    fn coordinator() -> Coordinator<MockDevices, MockTimer> {
        Coordinator::new(MockDevices::default(), MockTimer::default(), 44100)
    }

    #[test]
    fn test_full_cycle() {
        let mut c = coordinator();
        let session = c.play_record(&[0.0; 100]).unwrap();
        assert_eq!(c.state(), CoordinatorState::Playing);
        assert_eq!(
            c.devices().calls,
            vec![Call::StartCapture(session), Call::StartPlayback(session, 200)]
        );

        assert!(c.handle_event(DeviceEvent::OutputState(session, OutputState::Active)).is_none());
        assert_eq!(c.state(), CoordinatorState::Playing);

        assert!(c.handle_event(DeviceEvent::OutputState(session, OutputState::Idle)).is_none());
        assert_eq!(c.state(), CoordinatorState::Settling);
        assert_eq!(c.timer().scheduled, vec![(session, SETTLE_DELAY)]);
        assert_eq!(c.devices().calls.last(), Some(&Call::StopPlayback));

        let recording = c.handle_event(DeviceEvent::SettleElapsed(session)).unwrap();
        assert_eq!(c.state(), CoordinatorState::Idle);
        assert_eq!(c.devices().calls.last(), Some(&Call::StopCapture));
        assert_eq!(recording.session, session);
        assert_eq!(recording.sample_rate, 44100);
        assert!(recording.samples.is_empty());
    }

    #[test]
    fn test_settle_delay_is_half_a_second() {
        assert_eq!(SETTLE_DELAY, Duration::from_millis(500));
    }

    #[test]
    fn test_chunks_during_playing_and_settling_are_kept() {
        let mut c = coordinator();
        let session = c.play_record(&[0.5; 10]).unwrap();

        let chunks: [&[u8]; 5] = [&[1, 0, 2], &[0], &[3, 0, 4, 0, 5], &[0, 6, 0], &[7]];
        let mut delivered = 0;
        for chunk in &chunks[..3] {
            c.handle_event(DeviceEvent::InputData(session, chunk.to_vec()));
            delivered += chunk.len();
        }
        c.handle_event(DeviceEvent::OutputState(session, OutputState::Idle));
        for chunk in &chunks[3..] {
            c.handle_event(DeviceEvent::InputData(session, chunk.to_vec()));
            delivered += chunk.len();
        }

        let recording = c.handle_event(DeviceEvent::SettleElapsed(session)).unwrap();
        assert_eq!(recording.captured_bytes, delivered);
        assert_eq!(recording.samples.len() * 2, delivered & !1);
        let values: Vec<i32> = recording
            .samples
            .iter()
            .map(|s| (s * 32767.0).round() as i32)
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_output_errors_do_not_stall_session() {
        let mut c = coordinator();
        let session = c.play_record(&[0.0; 4]).unwrap();

        c.handle_event(DeviceEvent::OutputError(session, "underrun".into()));
        assert_eq!(c.state(), CoordinatorState::Playing);
        c.handle_event(DeviceEvent::InputError(session, "overrun".into()));

        c.handle_event(DeviceEvent::OutputState(session, OutputState::Stopped));
        assert_eq!(c.state(), CoordinatorState::Settling);

        let recording = c.handle_event(DeviceEvent::SettleElapsed(session)).unwrap();
        assert_eq!(
            recording.device_errors,
            vec!["output: underrun".to_string(), "input: overrun".to_string()]
        );
    }

    #[test]
    fn test_second_request_restarts_cleanly() {
        let mut c = coordinator();
        let first = c.play_record(&[0.0; 4]).unwrap();
        c.handle_event(DeviceEvent::InputData(first, vec![9, 9]));
        c.handle_event(DeviceEvent::OutputState(first, OutputState::Idle));

        let second = c.play_record(&[0.0; 8]).unwrap();
        assert_ne!(first, second);
        assert_eq!(c.state(), CoordinatorState::Playing);
        assert_eq!(c.captured_bytes(), 0);
        assert_eq!(c.timer().cancelled, vec![first]);
        assert_eq!(
            &c.devices().calls[2..],
            &[
                Call::StopPlayback,
                Call::StopPlayback,
                Call::StopCapture,
                Call::StartCapture(second),
                Call::StartPlayback(second, 16),
            ]
        );

        // Leftovers from the first session never reach the second.
        assert!(c.handle_event(DeviceEvent::SettleElapsed(first)).is_none());
        c.handle_event(DeviceEvent::InputData(first, vec![1, 1]));
        assert_eq!(c.state(), CoordinatorState::Playing);
        assert_eq!(c.captured_bytes(), 0);
    }

    #[test]
    fn test_settle_before_output_idle_is_ignored() {
        let mut c = coordinator();
        let session = c.play_record(&[0.0; 4]).unwrap();
        assert!(c.handle_event(DeviceEvent::SettleElapsed(session)).is_none());
        assert_eq!(c.state(), CoordinatorState::Playing);
    }

    #[test]
    fn test_abort() {
        let mut c = coordinator();
        assert!(!c.abort());

        let session = c.play_record(&[0.0; 4]).unwrap();
        c.handle_event(DeviceEvent::InputData(session, vec![1, 0]));
        assert!(c.abort());
        assert_eq!(c.state(), CoordinatorState::Idle);
        assert_eq!(c.captured_bytes(), 0);
        assert_eq!(c.timer().cancelled, vec![session]);
        assert!(c.handle_event(DeviceEvent::SettleElapsed(session)).is_none());
    }

    #[test]
    fn test_failed_start_leaves_idle() {
        let mut c = Coordinator::new(
            MockDevices {
                fail_playback: true,
                ..MockDevices::default()
            },
            MockTimer::default(),
            48000,
        );
        let session = SessionId::default().next();

        assert!(matches!(c.play_record(&[0.0; 4]), Err(Error::Device(_))));
        assert_eq!(c.state(), CoordinatorState::Idle);
        assert_eq!(
            c.devices().calls,
            vec![Call::StartCapture(session), Call::StopCapture]
        );
    }

    #[test]
    fn test_play_probe_uses_composite() {
        let probe = Probe::from_parameters(&[steppe_core::SegmentParameters {
            sample_rate: 8000,
            duration_ms: 10,
            window_open_ms: 0,
            window_close_ms: 0,
            ..Default::default()
        }])
        .unwrap();

        let mut c = coordinator();
        let session = c.play_probe(&probe).unwrap();
        assert_eq!(
            c.devices().calls[1],
            Call::StartPlayback(session, probe.total_frames() * 2)
        );
    }
}
