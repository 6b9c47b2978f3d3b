use std::time::{Duration, Instant};

/// Mutable record of one recording attempt.
///
/// Owned behind the engine's mutex: the capture thread appends whole frames
/// while `active`, callers read it for `duration()` and `save()`.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    samples: Vec<i16>,
    sample_rate: u32,
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    active: bool,
    frames: usize,
}

impl RecordingSession {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: sample_rate.max(1),
            started_at: None,
            stopped_at: None,
            active: false,
            frames: 0,
        }
    }

    /// Replace the previous session with a fresh, active one.
    pub(crate) fn begin(&mut self, sample_rate: u32, now: Instant) {
        *self = Self::new(sample_rate);
        self.started_at = Some(now);
        self.active = true;
    }

    /// Append one frame. Ignored once the session has ended.
    pub(crate) fn append_frame(&mut self, frame: &[i16]) -> bool {
        if !self.active {
            return false;
        }
        self.samples.extend_from_slice(frame);
        self.frames += 1;
        true
    }

    /// Mark the session finished. Returns false if it already was.
    pub(crate) fn finish(&mut self, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.stopped_at = Some(now);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames_captured(&self) -> usize {
        self.frames
    }

    /// Elapsed recording time as of `now`.
    pub fn duration_at(&self, now: Instant) -> Duration {
        match (self.started_at, self.stopped_at, self.active) {
            (Some(start), _, true) => now.saturating_duration_since(start),
            (Some(start), Some(stop), false) => stop.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    /// Length of the captured audio itself.
    pub fn audio_duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}
