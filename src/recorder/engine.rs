//! The recording engine: owns the capture thread and the session it fills.
//!
//! Lifecycle calls (`start`, `stop`, `cleanup`) are serialized on the worker
//! slot mutex. The capture thread never touches that mutex, so `stop` can
//! hold it while joining without deadlocking. Every way a session ends runs
//! through the same termination sequence on the capture thread, so each
//! session emits exactly one stop event.

use super::events::{event_channel, EventReceiver, EventSender, StopReason};
use super::session::RecordingSession;
use super::wav::write_pcm_wave;
use crate::audio::{
    frame_loudness, sanitize_loudness, CaptureBackend, CaptureFormat, CaptureSource,
    SharedSilenceConfig, SilenceConfig, SilenceDecision, SilenceDetector, DEFAULT_FRAME_SIZE,
    DEFAULT_SAMPLE_RATE,
};
use crate::error::RecorderError;
use crate::lock::lock_or_recover;
use crate::log_debug;
use crate::logging::panic_payload_text;
use crossbeam_channel::bounded;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Fixed per-engine capture settings.
#[derive(Debug, Clone, Copy)]
pub struct RecorderOptions {
    pub sample_rate: u32,
    pub frame_size: usize,
    pub silence: SilenceConfig,
    /// Hard cap on session length; `None` records until silence or `stop`.
    pub max_duration: Option<Duration>,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
            silence: SilenceConfig::default(),
            max_duration: None,
        }
    }
}

struct Shared {
    session: Mutex<RecordingSession>,
    silence: SharedSilenceConfig,
    stop_requested: AtomicBool,
    last_stop: Mutex<Option<StopReason>>,
}

/// Records from one input device until silence, a stop request, or failure.
pub struct SilenceRecorder {
    backend: Arc<dyn CaptureBackend>,
    shared: Arc<Shared>,
    events: EventSender,
    format: CaptureFormat,
    max_duration: Option<Duration>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SilenceRecorder {
    /// Build an idle recorder plus the receiver its observer drains.
    pub fn new(backend: Arc<dyn CaptureBackend>, options: RecorderOptions) -> (Self, EventReceiver) {
        let format = CaptureFormat {
            sample_rate: options.sample_rate.max(1),
            frame_size: options.frame_size.max(1),
        };
        let (events, receiver) = event_channel();
        let recorder = Self {
            backend,
            shared: Arc::new(Shared {
                session: Mutex::new(RecordingSession::new(format.sample_rate)),
                silence: SharedSilenceConfig::new(options.silence),
                stop_requested: AtomicBool::new(false),
                last_stop: Mutex::new(None),
            }),
            events,
            format,
            max_duration: options.max_duration.filter(|d| !d.is_zero()),
            worker: Mutex::new(None),
        };
        (recorder, receiver)
    }

    /// Open `device_id` (or the default device) and start recording with
    /// `silence` as the detector settings.
    ///
    /// Returns once the device is open and the session is active; the start
    /// event has been queued by then.
    pub fn start(&self, device_id: Option<&str>, silence: SilenceConfig) -> Result<(), RecorderError> {
        let mut worker = lock_or_recover(&self.worker, "recorder worker");
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }
        // A session that ended on its own leaves a finished thread behind.
        self.join_worker(worker.take());

        self.shared.silence.set(silence);
        self.shared.stop_requested.store(false, Ordering::Release);

        let device_label = device_id.unwrap_or("default").to_string();
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);
        let capture = CaptureThread {
            backend: self.backend.clone(),
            shared: self.shared.clone(),
            events: self.events.clone(),
            format: self.format,
            max_duration: self.max_duration,
        };
        let device_owned = device_id.map(str::to_string);
        let handle = thread::Builder::new()
            .name("voxrec-capture".to_string())
            .spawn(move || capture.run(device_owned, ready_tx))
            .map_err(RecorderError::WorkerSpawn)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log_debug(&format!("recording started on '{device_label}'"));
                *worker = Some(handle);
                Ok(())
            }
            Ok(Err(reason)) => {
                let _ = handle.join();
                log_debug(&format!("failed to open '{device_label}': {reason}"));
                Err(RecorderError::DeviceUnavailable {
                    device: device_label,
                    reason,
                })
            }
            Err(_) => {
                self.join_worker(Some(handle));
                Err(RecorderError::DeviceUnavailable {
                    device: device_label,
                    reason: "capture thread exited before the device opened".to_string(),
                })
            }
        }
    }

    /// Stop the active recording and wait for the capture thread to release
    /// the device. Returns the final duration.
    pub fn stop(&self) -> Result<Duration, RecorderError> {
        let mut worker = lock_or_recover(&self.worker, "recorder worker");
        if !self.is_recording() {
            self.join_worker(worker.take());
            return Err(RecorderError::NotRecording);
        }
        self.shared.stop_requested.store(true, Ordering::Release);
        self.join_worker(worker.take());
        Ok(self.duration())
    }

    /// Validate and apply new detector settings; takes effect on the next
    /// frame of a recording in progress.
    pub fn configure_silence(&self, threshold: f32, required_silence_secs: f64) -> Result<(), RecorderError> {
        let config = SilenceConfig::new(threshold, required_silence_secs)?;
        self.shared.silence.set(config);
        log_debug(&format!(
            "silence settings: threshold={threshold} duration={required_silence_secs}s"
        ));
        Ok(())
    }

    pub fn silence_config(&self) -> SilenceConfig {
        self.shared.silence.get()
    }

    /// Elapsed time of the current session, or the final length of the last
    /// one. Zero before anything was recorded.
    pub fn duration(&self) -> Duration {
        self.session().duration_at(Instant::now())
    }

    pub fn is_recording(&self) -> bool {
        self.session().is_active()
    }

    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }

    /// Copy of the samples captured so far.
    pub fn samples(&self) -> Vec<i16> {
        self.session().samples().to_vec()
    }

    pub fn last_stop_reason(&self) -> Option<StopReason> {
        lock_or_recover(&self.shared.last_stop, "last stop reason").clone()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Write the last finished session to `path` as 16-bit mono PCM WAV.
    /// Returns the number of samples written.
    pub fn save(&self, path: &Path) -> Result<usize, RecorderError> {
        let session = self.session();
        if session.is_active() {
            return Err(RecorderError::AlreadyRecording);
        }
        if session.samples().is_empty() {
            return Err(RecorderError::NoSamples);
        }
        write_pcm_wave(path, session.samples(), session.sample_rate()).map_err(|source| {
            RecorderError::PersistenceFailure {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let written = session.samples().len();
        tracing::info!(
            target: "voxrec::session",
            path = %path.display(),
            samples = written,
            sample_rate = session.sample_rate(),
            "recording saved"
        );
        log_debug(&format!("saved {written} samples to {}", path.display()));
        Ok(written)
    }

    /// Stop any recording and reap the capture thread. Safe to call at any
    /// time, any number of times.
    pub fn cleanup(&self) {
        let mut worker = lock_or_recover(&self.worker, "recorder worker");
        self.shared.stop_requested.store(true, Ordering::Release);
        self.join_worker(worker.take());
    }

    fn session(&self) -> std::sync::MutexGuard<'_, RecordingSession> {
        lock_or_recover(&self.shared.session, "recording session")
    }

    /// Join a capture thread. Loop panics are handled on the thread itself;
    /// a panic outside the loop (in `open` or `close`) can still leave the
    /// session open, so end it here.
    fn join_worker(&self, handle: Option<JoinHandle<()>>) {
        let Some(handle) = handle else {
            return;
        };
        if handle.join().is_ok() {
            return;
        }
        log_debug("capture thread panicked");
        let duration = {
            let mut session = self.session();
            if !session.finish(Instant::now()) {
                return;
            }
            session.duration_at(Instant::now())
        };
        let reason = StopReason::CaptureFailure {
            message: "capture thread panicked".to_string(),
        };
        *lock_or_recover(&self.shared.last_stop, "last stop reason") = Some(reason.clone());
        self.events.stopped(duration, reason);
    }
}

impl Drop for SilenceRecorder {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Everything the capture thread needs, moved into it at spawn.
struct CaptureThread {
    backend: Arc<dyn CaptureBackend>,
    shared: Arc<Shared>,
    events: EventSender,
    format: CaptureFormat,
    max_duration: Option<Duration>,
}

impl CaptureThread {
    fn run(self, device_id: Option<String>, ready: crossbeam_channel::Sender<Result<(), String>>) {
        let mut source = match self.backend.open(device_id.as_deref(), self.format) {
            Ok(source) => source,
            Err(err) => {
                let _ = ready.send(Err(format!("{err:#}")));
                return;
            }
        };

        let started_at = Instant::now();
        lock_or_recover(&self.shared.session, "recording session")
            .begin(self.format.sample_rate, started_at);
        self.events.started(self.format.sample_rate);
        tracing::info!(
            target: "voxrec::session",
            device = device_id.as_deref().unwrap_or("default"),
            sample_rate = self.format.sample_rate,
            frame_size = self.format.frame_size,
            "recording started"
        );
        let _ = ready.send(Ok(()));

        let reason = panic::catch_unwind(AssertUnwindSafe(|| {
            self.capture_loop(source.as_mut(), started_at)
        }))
        .unwrap_or_else(|payload| {
            let message = format!(
                "capture loop panicked: {}",
                panic_payload_text(payload.as_ref())
            );
            log_debug(&message);
            StopReason::CaptureFailure { message }
        });
        source.close();
        drop(source);

        let (duration, audio, frames) = {
            let mut session = lock_or_recover(&self.shared.session, "recording session");
            session.finish(Instant::now());
            (
                session.duration_at(Instant::now()),
                session.audio_duration(),
                session.frames_captured(),
            )
        };
        *lock_or_recover(&self.shared.last_stop, "last stop reason") = Some(reason.clone());

        tracing::info!(
            target: "voxrec::session",
            reason = reason.label(),
            duration_ms = duration.as_millis() as u64,
            audio_ms = audio.as_millis() as u64,
            frames,
            "recording stopped"
        );
        log_debug(&format!(
            "recording stopped ({}) after {:.2}s, {:.2}s of audio",
            reason.label(),
            duration.as_secs_f64(),
            audio.as_secs_f64()
        ));
        self.events.stopped(duration, reason);
    }

    /// Pull frames until something ends the session. The only place in the
    /// recorder that blocks on hardware.
    fn capture_loop(&self, source: &mut dyn CaptureSource, started_at: Instant) -> StopReason {
        let mut detector = SilenceDetector::new();
        loop {
            if self.shared.stop_requested.load(Ordering::Acquire) {
                return StopReason::Manual;
            }

            let frame = match source.read_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log_debug(&format!("capture read failed: {err:#}"));
                    return StopReason::CaptureFailure {
                        message: format!("{err:#}"),
                    };
                }
            };
            let now = started_at.elapsed();
            let loudness = sanitize_loudness(frame_loudness(&frame));

            lock_or_recover(&self.shared.session, "recording session").append_frame(&frame);
            self.events.loudness(loudness);

            let config = self.shared.silence.get();
            if let SilenceDecision::AutoStop { quiet_for } = detector.evaluate(loudness, now, &config) {
                return StopReason::Silence {
                    quiet_ms: quiet_for.as_millis() as u64,
                };
            }
            if let Some(max) = self.max_duration {
                if now >= max {
                    return StopReason::MaxDuration;
                }
            }
        }
    }
}
