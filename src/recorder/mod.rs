//! Recording sessions: the capture loop, its events, and WAV output.

mod engine;
mod events;
mod session;
mod wav;

pub use engine::{RecorderOptions, SilenceRecorder};
pub use events::{dispatch, EventReceiver, RecorderEvent, RecorderObserver, StopReason};
pub use session::RecordingSession;
pub use wav::{read_pcm_wave, write_pcm_wave, PcmWave, WAV_BITS_PER_SAMPLE, WAV_CHANNELS};
