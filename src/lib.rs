//! Silence-terminated microphone recording.
//!
//! [`recorder::SilenceRecorder`] captures fixed-size frames from an input
//! device on a background thread, reports loudness to an observer, and stops
//! on its own once the input has stayed quiet for long enough. Finished
//! sessions are written out as 16-bit mono PCM WAV.

pub mod audio;
pub mod config;
mod error;
mod lock;
mod logging;
pub mod recorder;
mod telemetry;

pub use error::RecorderError;
pub use logging::{crash_log_path, init_logging, log_debug, log_file_path, log_panic};
pub use recorder::{
    EventReceiver, RecorderEvent, RecorderObserver, RecorderOptions, SilenceRecorder, StopReason,
};
pub use telemetry::{init_tracing, tracing_log_path};
