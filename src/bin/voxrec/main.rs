//! voxrec entrypoint: record from a microphone until it goes quiet, then save
//! a WAV file.
//!
//! # Threads
//!
//! - Capture thread (inside the recorder): reads frames, runs silence detection
//! - Stdin thread: pressing Enter requests a manual stop
//! - Main thread: drains recorder events into the active front end

mod cli_utils;
mod meter;
mod observer;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead};
use std::panic;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use voxrec::audio::CpalBackend;
use voxrec::config::AppConfig;
use voxrec::recorder::dispatch;
use voxrec::{
    init_logging, init_tracing, log_debug, log_file_path, log_panic, EventReceiver,
    RecorderError, RecorderEvent, SilenceRecorder, StopReason,
};

use crate::cli_utils::list_input_devices;
use crate::observer::{Frontend, JsonObserver, MeterObserver};

/// How long the main loop waits for an event before checking again.
const EVENT_POLL_MS: u64 = 100;

fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        log_debug(&format!("panic at {location}"));
        default_hook(info);
    }));
}

fn spawn_stop_on_enter(recorder: Arc<SilenceRecorder>) -> Result<()> {
    thread::Builder::new()
        .name("voxrec-stdin".to_string())
        .spawn(move || {
            let mut line = String::new();
            // EOF (stdin closed or redirected) leaves stopping to silence.
            if matches!(io::stdin().lock().read_line(&mut line), Ok(n) if n > 0) {
                match recorder.stop() {
                    Ok(_) | Err(RecorderError::NotRecording) => {}
                    Err(err) => log_debug(&format!("manual stop failed: {err}")),
                }
            }
        })
        .context("failed to spawn stdin thread")?;
    Ok(())
}

/// Deliver events until the session's stop event arrives.
fn run_until_stopped(events: &EventReceiver, frontend: &mut dyn Frontend) -> StopReason {
    loop {
        let Some(event) = events.recv_timeout(Duration::from_millis(EVENT_POLL_MS)) else {
            continue;
        };
        dispatch(frontend.observer(), &event);
        if let RecorderEvent::Stopped { reason, .. } = event {
            return reason;
        }
    }
}

fn main() -> Result<()> {
    let mut config = AppConfig::parse();
    if config.list_input_devices {
        list_input_devices()?;
        return Ok(());
    }

    config.validate()?;
    init_logging(config.file_logging_enabled());
    init_tracing(config.file_logging_enabled());
    install_panic_hook();
    log_debug("=== voxrec started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    let options = config.recorder_options()?;
    let output = config.output_path();
    let (recorder, events) = SilenceRecorder::new(Arc::new(CpalBackend::new()), options);
    let recorder = Arc::new(recorder);
    log_debug(&format!(
        "capture backend: {} rate={}Hz frame={} output={}",
        recorder.backend_name(),
        options.sample_rate,
        options.frame_size,
        output.display()
    ));

    let mut frontend: Box<dyn Frontend> = if config.json_events {
        Box::new(JsonObserver::new(io::stdout()))
    } else {
        Box::new(MeterObserver::new(io::stdout()))
    };

    recorder.start(config.input_device.as_deref(), options.silence)?;
    spawn_stop_on_enter(Arc::clone(&recorder))?;

    let reason = run_until_stopped(&events, frontend.as_mut());
    if config.log_timings {
        log_debug(&format!(
            "timing|session={:.3}s|reason={}",
            recorder.duration().as_secs_f64(),
            reason.label()
        ));
    }
    if let StopReason::CaptureFailure { message } = &reason {
        let err = RecorderError::CaptureFailure(message.clone());
        log_debug(&format!("{}: {err}", err.label()));
        eprintln!("Warning: {err}; saving what was captured");
    }

    let save_started = Instant::now();
    match recorder.save(&output) {
        Ok(samples) => {
            frontend.saved(&output, samples, recorder.sample_rate());
            if config.log_timings {
                log_debug(&format!(
                    "timing|save_ms={:.1}|samples={samples}",
                    save_started.elapsed().as_secs_f64() * 1000.0
                ));
            }
        }
        Err(RecorderError::NoSamples) => bail!("nothing was recorded; no file written"),
        Err(err) => return Err(err.into()),
    }

    recorder.cleanup();
    log_debug("=== voxrec exited ===");
    Ok(())
}
