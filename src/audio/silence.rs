//! Sustained-silence detection.
//!
//! Tracks the start of the current unbroken run of quiet frames and asks the
//! capture loop to stop once that run has lasted long enough.

use super::loudness::{sanitize_loudness, MAX_LOUDNESS};
use crate::error::RecorderError;
use crate::lock::{read_or_recover, write_or_recover};
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub const DEFAULT_SILENCE_THRESHOLD: f32 = 1000.0;
pub const DEFAULT_REQUIRED_SILENCE_SECS: f64 = 2.0;
pub const MAX_REQUIRED_SILENCE_SECS: f64 = 3600.0;

/// Silence detector settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceConfig {
    /// Frames with loudness at or below this are quiet.
    pub threshold: f32,
    /// How long a quiet run must last before auto-stop.
    pub required_silence: Duration,
}

impl SilenceConfig {
    /// Validate raw caller values.
    pub fn new(threshold: f32, required_silence_secs: f64) -> Result<Self, RecorderError> {
        if !threshold.is_finite() || !(0.0..=MAX_LOUDNESS).contains(&threshold) {
            return Err(RecorderError::InvalidSilenceConfig(format!(
                "threshold must be between 0 and {MAX_LOUDNESS}, got {threshold}"
            )));
        }
        if !required_silence_secs.is_finite()
            || required_silence_secs <= 0.0
            || required_silence_secs > MAX_REQUIRED_SILENCE_SECS
        {
            return Err(RecorderError::InvalidSilenceConfig(format!(
                "silence duration must be > 0 and <= {MAX_REQUIRED_SILENCE_SECS}s, got {required_silence_secs}"
            )));
        }
        Ok(Self {
            threshold,
            required_silence: Duration::from_secs_f64(required_silence_secs),
        })
    }

    pub fn required_silence_secs(&self) -> f64 {
        self.required_silence.as_secs_f64()
    }
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SILENCE_THRESHOLD,
            required_silence: Duration::from_secs_f64(DEFAULT_REQUIRED_SILENCE_SECS),
        }
    }
}

/// Configuration cell shared between the caller and the capture thread.
///
/// The capture loop reads a fresh copy for every frame, so updates apply to
/// the recording in progress.
#[derive(Debug, Clone, Default)]
pub struct SharedSilenceConfig {
    inner: Arc<RwLock<SilenceConfig>>,
}

impl SharedSilenceConfig {
    pub fn new(config: SilenceConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn get(&self) -> SilenceConfig {
        *read_or_recover(&self.inner, "silence config")
    }

    pub fn set(&self, config: SilenceConfig) {
        *write_or_recover(&self.inner, "silence config") = config;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum QuietRun {
    Inactive,
    Active { since: Duration },
}

/// Outcome of evaluating one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SilenceDecision {
    Continue,
    AutoStop { quiet_for: Duration },
}

/// Two-state machine over per-frame loudness.
///
/// Times are offsets from the start of the session. The run is anchored on
/// its first quiet frame; any loud frame cancels it outright.
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    run: QuietRun,
}

impl SilenceDetector {
    pub fn new() -> Self {
        Self {
            run: QuietRun::Inactive,
        }
    }

    pub fn evaluate(
        &mut self,
        loudness: f32,
        now: Duration,
        config: &SilenceConfig,
    ) -> SilenceDecision {
        let quiet = sanitize_loudness(loudness) <= config.threshold;
        match self.run {
            QuietRun::Inactive => {
                if quiet {
                    self.run = QuietRun::Active { since: now };
                }
                SilenceDecision::Continue
            }
            QuietRun::Active { since } => {
                if !quiet {
                    self.run = QuietRun::Inactive;
                    return SilenceDecision::Continue;
                }
                let quiet_for = now.saturating_sub(since);
                if quiet_for >= config.required_silence {
                    self.run = QuietRun::Inactive;
                    SilenceDecision::AutoStop { quiet_for }
                } else {
                    SilenceDecision::Continue
                }
            }
        }
    }

    /// Start of the current quiet run, if one is in progress.
    pub fn quiet_since(&self) -> Option<Duration> {
        match self.run {
            QuietRun::Inactive => None,
            QuietRun::Active { since } => Some(since),
        }
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new()
    }
}
