//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::SilenceConfig;
use crate::recorder::RecorderOptions;

pub use defaults::{
    default_output_name, DEFAULT_FRAME_SIZE, DEFAULT_MAX_SECONDS, DEFAULT_SAMPLE_RATE,
    DEFAULT_SILENCE_SECONDS, DEFAULT_THRESHOLD, MAX_FRAME_SIZE, MAX_MAX_SECONDS, MAX_SAMPLE_RATE,
    MAX_SILENCE_SECONDS, MAX_THRESHOLD, MIN_FRAME_SIZE, MIN_SAMPLE_RATE, MIN_SILENCE_SECONDS,
};

/// CLI options for the voxrec recorder.
#[derive(Debug, Parser, Clone)]
#[command(about = "Record from a microphone until it goes quiet", author, version)]
pub struct AppConfig {
    /// Preferred audio input device name
    #[arg(long, env = "VOXREC_INPUT_DEVICE")]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Loudness (raw RMS, 0-32768) at or below which a frame counts as quiet
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f32,

    /// Continuous quiet required before recording stops (seconds)
    #[arg(long = "silence-seconds", default_value_t = DEFAULT_SILENCE_SECONDS)]
    pub silence_seconds: f64,

    /// Session sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Samples per capture frame
    #[arg(long = "frame-size", default_value_t = DEFAULT_FRAME_SIZE)]
    pub frame_size: usize,

    /// Where to write the WAV file (default: recording_<timestamp>.wav)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Hard cap on recording length in seconds (0 = unlimited)
    #[arg(long = "max-seconds", default_value_t = DEFAULT_MAX_SECONDS)]
    pub max_seconds: u64,

    /// Print recorder events as JSON lines instead of the live meter
    #[arg(long = "json-events", default_value_t = false)]
    pub json_events: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "VOXREC_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "VOXREC_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    /// Detector settings from `--threshold` / `--silence-seconds`.
    pub fn silence_config(&self) -> Result<SilenceConfig, crate::RecorderError> {
        SilenceConfig::new(self.threshold, self.silence_seconds)
    }

    /// Engine settings derived from the validated CLI values.
    pub fn recorder_options(&self) -> Result<RecorderOptions, crate::RecorderError> {
        Ok(RecorderOptions {
            sample_rate: self.sample_rate,
            frame_size: self.frame_size,
            silence: self.silence_config()?,
            max_duration: (self.max_seconds > 0).then(|| Duration::from_secs(self.max_seconds)),
        })
    }

    /// File logging is on for `--logs` or `--log-timings`; `--no-logs` wins.
    pub fn file_logging_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }

    /// `--output`, or a timestamped name in the working directory.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_output_name()))
    }
}
