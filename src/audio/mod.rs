//! Audio capture building blocks.
//!
//! Hardware access sits behind the [`CaptureBackend`] / [`CaptureSource`]
//! traits so the recorder engine can be driven by cpal in production and by
//! scripted sources in tests. Loudness and silence detection are pure and
//! live here too.

/// Session sample rate used when the caller does not pick one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Samples per capture frame (about 23 ms at 44.1 kHz).
pub const DEFAULT_FRAME_SIZE: usize = 1024;

mod cpal_backend;
mod dispatch;
mod loudness;
mod resample;
mod silence;
mod source;
#[cfg(test)]
mod tests;

pub use cpal_backend::{CpalBackend, CpalSource};
pub use loudness::{frame_loudness, sanitize_loudness, LiveMeter, MAX_LOUDNESS, SILENT_LOUDNESS};
pub use silence::{
    SharedSilenceConfig, SilenceConfig, SilenceDecision, SilenceDetector,
    DEFAULT_REQUIRED_SILENCE_SECS, DEFAULT_SILENCE_THRESHOLD, MAX_REQUIRED_SILENCE_SECS,
};
pub use source::{CaptureBackend, CaptureFormat, CaptureSource, DeviceCatalog, InputDevice};
