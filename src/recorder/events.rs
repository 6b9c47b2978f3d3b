//! Notifications from the capture thread to a single observer.
//!
//! The capture loop only ever enqueues; the observer drains on its own thread.
//! Start and stop travel through one FIFO so they can never be lost or
//! reordered. Loudness is coalesced: at most one loudness marker is queued at
//! a time and it always resolves to the newest value.

use crate::audio::LiveMeter;
use crate::log_debug;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// `stop()` or `cleanup()` was called.
    Manual,
    /// The silence detector fired.
    Silence { quiet_ms: u64 },
    /// The optional recording length cap was reached.
    MaxDuration,
    /// The capture source failed mid-recording.
    CaptureFailure { message: String },
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::Manual => "manual",
            StopReason::Silence { .. } => "silence",
            StopReason::MaxDuration => "max_duration",
            StopReason::CaptureFailure { .. } => "capture_failure",
        }
    }
}

/// Observer-facing event.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started { sample_rate: u32 },
    Loudness(f32),
    Stopped { duration: Duration, reason: StopReason },
}

/// Callbacks a front end implements. Normalizing loudness for display is up
/// to the implementation.
pub trait RecorderObserver {
    fn on_start(&mut self, sample_rate: u32);
    fn on_stop(&mut self, final_duration: Duration, reason: &StopReason);
    fn on_loudness(&mut self, value: f32);
}

enum QueuedEvent {
    Started { sample_rate: u32 },
    Loudness,
    Stopped { duration: Duration, reason: StopReason },
}

/// Capture-thread side. Never blocks.
#[derive(Clone)]
pub(crate) struct EventSender {
    tx: Sender<QueuedEvent>,
    latest: LiveMeter,
    loudness_queued: Arc<AtomicBool>,
    observer_gone: Arc<AtomicBool>,
}

impl EventSender {
    fn push(&self, event: QueuedEvent) {
        if self.tx.send(event).is_err() && !self.observer_gone.swap(true, Ordering::Relaxed) {
            log_debug("event receiver dropped; further recorder events are discarded");
        }
    }

    pub(crate) fn started(&self, sample_rate: u32) {
        self.push(QueuedEvent::Started { sample_rate });
    }

    pub(crate) fn loudness(&self, value: f32) {
        self.latest.set_level(value);
        if !self.loudness_queued.swap(true, Ordering::AcqRel) {
            self.push(QueuedEvent::Loudness);
        }
    }

    pub(crate) fn stopped(&self, duration: Duration, reason: StopReason) {
        self.push(QueuedEvent::Stopped { duration, reason });
    }
}

/// Observer side, drained from the observer's own thread.
pub struct EventReceiver {
    rx: Receiver<QueuedEvent>,
    latest: LiveMeter,
    loudness_queued: Arc<AtomicBool>,
}

impl EventReceiver {
    fn resolve(&self, event: QueuedEvent) -> RecorderEvent {
        match event {
            QueuedEvent::Started { sample_rate } => RecorderEvent::Started { sample_rate },
            QueuedEvent::Loudness => {
                // Clear first so a value stored after this read queues a new marker.
                self.loudness_queued.store(false, Ordering::Release);
                RecorderEvent::Loudness(self.latest.level())
            }
            QueuedEvent::Stopped { duration, reason } => RecorderEvent::Stopped { duration, reason },
        }
    }

    pub fn try_next(&self) -> Option<RecorderEvent> {
        self.rx.try_recv().ok().map(|event| self.resolve(event))
    }

    /// Wait up to `timeout` for the next event. `None` on timeout or when the
    /// recorder has been dropped.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RecorderEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(self.resolve(event)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Deliver everything queued so far to `observer`; returns how many
    /// events were delivered.
    pub fn drain_into(&self, observer: &mut dyn RecorderObserver) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.try_next() {
            dispatch(observer, &event);
            delivered += 1;
        }
        delivered
    }
}

/// Route one event to the matching observer callback.
pub fn dispatch(observer: &mut dyn RecorderObserver, event: &RecorderEvent) {
    match event {
        RecorderEvent::Started { sample_rate } => observer.on_start(*sample_rate),
        RecorderEvent::Loudness(value) => observer.on_loudness(*value),
        RecorderEvent::Stopped { duration, reason } => observer.on_stop(*duration, reason),
    }
}

pub(crate) fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = unbounded();
    let latest = LiveMeter::new();
    let loudness_queued = Arc::new(AtomicBool::new(false));
    (
        EventSender {
            tx,
            latest: latest.clone(),
            loudness_queued: loudness_queued.clone(),
            observer_gone: Arc::new(AtomicBool::new(false)),
        },
        EventReceiver {
            rx,
            latest,
            loudness_queued,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect(Vec<String>);

    impl RecorderObserver for Collect {
        fn on_start(&mut self, _sample_rate: u32) {
            self.0.push("start".into());
        }
        fn on_stop(&mut self, _final_duration: Duration, reason: &StopReason) {
            self.0.push(format!("stop:{}", reason.label()));
        }
        fn on_loudness(&mut self, value: f32) {
            self.0.push(format!("loud:{value}"));
        }
    }

    #[test]
    fn loudness_bursts_coalesce_to_latest_value() {
        let (tx, rx) = event_channel();
        tx.started(44_100);
        for value in [10.0, 20.0, 30.0] {
            tx.loudness(value);
        }
        tx.stopped(Duration::from_secs(1), StopReason::Manual);

        let mut seen = Collect::default();
        assert_eq!(rx.drain_into(&mut seen), 3);
        assert_eq!(seen.0, vec!["start", "loud:30", "stop:manual"]);
    }

    #[test]
    fn loudness_after_drain_queues_again() {
        let (tx, rx) = event_channel();
        tx.loudness(5.0);
        assert_eq!(rx.try_next(), Some(RecorderEvent::Loudness(5.0)));
        tx.loudness(6.0);
        assert_eq!(rx.try_next(), Some(RecorderEvent::Loudness(6.0)));
        assert_eq!(rx.try_next(), None);
    }

    #[test]
    fn start_and_stop_are_never_dropped() {
        let (tx, rx) = event_channel();
        for _ in 0..100 {
            tx.started(8_000);
            tx.loudness(1.0);
            tx.stopped(Duration::ZERO, StopReason::Manual);
        }
        let mut starts = 0;
        let mut stops = 0;
        while let Some(event) = rx.try_next() {
            match event {
                RecorderEvent::Started { .. } => starts += 1,
                RecorderEvent::Stopped { .. } => {
                    stops += 1;
                    assert_eq!(starts, stops);
                }
                RecorderEvent::Loudness(_) => {}
            }
        }
        assert_eq!((starts, stops), (100, 100));
    }

    #[test]
    fn sending_after_receiver_dropped_is_harmless() {
        let (tx, rx) = event_channel();
        drop(rx);
        tx.started(8_000);
        tx.loudness(1.0);
        tx.stopped(Duration::ZERO, StopReason::Manual);
    }

    #[test]
    fn stop_reason_serializes_with_tag() {
        let json = serde_json::to_string(&StopReason::Silence { quiet_ms: 2000 }).unwrap();
        assert_eq!(json, r#"{"reason":"silence","quiet_ms":2000}"#);
    }
}
