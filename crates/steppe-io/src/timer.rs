//! Settle timer backed by a sleeping thread.

use crate::coordinator::{DeviceEvent, SessionId, SettleTimer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// One-shot timer that posts [`DeviceEvent::SettleElapsed`] into an event queue.
///
/// Each schedule spawns a short-lived thread. Cancelling flips a flag the thread
/// checks before sending; a send that slips past a cancel still carries its
/// session id and is dropped by the coordinator.
pub struct ThreadTimer {
    events: Sender<DeviceEvent>,
    pending: Option<(SessionId, Arc<AtomicBool>)>,
}

impl ThreadTimer {
    /// Create a timer posting to `events`.
    pub fn new(events: Sender<DeviceEvent>) -> Self {
        Self {
            events,
            pending: None,
        }
    }

    /// Session of the timer that is currently armed, if any.
    pub fn pending(&self) -> Option<SessionId> {
        self.pending
            .as_ref()
            .filter(|(_, cancelled)| !cancelled.load(Ordering::SeqCst))
            .map(|(session, _)| *session)
    }
}

impl SettleTimer for ThreadTimer {
    fn schedule(&mut self, session: SessionId, delay: Duration) {
        if let Some((_, cancelled)) = self.pending.take() {
            cancelled.store(true, Ordering::SeqCst);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let events = self.events.clone();
        thread::spawn(move || {
            thread::sleep(delay);
            if !flag.load(Ordering::SeqCst) {
                // Receiver gone means the session owner already left.
                let _ = events.send(DeviceEvent::SettleElapsed(session));
            }
        });

        tracing::debug!(%session, delay_ms = delay.as_millis() as u64, "settle timer armed");
        self.pending = Some((session, cancelled));
    }

    fn cancel(&mut self, session: SessionId) {
        if let Some((pending, cancelled)) = &self.pending
            && *pending == session
        {
            cancelled.store(true, Ordering::SeqCst);
            tracing::debug!(%session, "settle timer cancelled");
            self.pending = None;
        }
    }
}
