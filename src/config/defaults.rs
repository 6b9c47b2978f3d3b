use chrono::Local;

pub const DEFAULT_THRESHOLD: f32 = crate::audio::DEFAULT_SILENCE_THRESHOLD;
pub const MAX_THRESHOLD: f32 = crate::audio::MAX_LOUDNESS;

pub const DEFAULT_SILENCE_SECONDS: f64 = crate::audio::DEFAULT_REQUIRED_SILENCE_SECS;
pub const MIN_SILENCE_SECONDS: f64 = 0.1;
pub const MAX_SILENCE_SECONDS: f64 = 600.0;

pub const DEFAULT_SAMPLE_RATE: u32 = crate::audio::DEFAULT_SAMPLE_RATE;
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;

pub const DEFAULT_FRAME_SIZE: usize = crate::audio::DEFAULT_FRAME_SIZE;
pub const MIN_FRAME_SIZE: usize = 64;
pub const MAX_FRAME_SIZE: usize = 16_384;

/// 0 disables the cap.
pub const DEFAULT_MAX_SECONDS: u64 = 0;
pub const MAX_MAX_SECONDS: u64 = 86_400;

pub(super) const OUTPUT_NAME_FORMAT: &str = "recording_%Y%m%d_%H%M%S.wav";

/// `recording_YYYYmmdd_HHMMSS.wav` in local time.
pub fn default_output_name() -> String {
    Local::now().format(OUTPUT_NAME_FORMAT).to_string()
}
