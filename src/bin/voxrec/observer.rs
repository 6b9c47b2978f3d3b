//! Front-end observers: a redrawing terminal meter and a JSON-lines stream.

use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use voxrec::{RecorderObserver, StopReason};

use crate::meter::{format_elapsed, format_status_line, loudness_percent};

pub(crate) fn describe_stop(reason: &StopReason) -> String {
    match reason {
        StopReason::Manual => "stopped by user".to_string(),
        StopReason::Silence { quiet_ms } => {
            format!("{:.1}s of silence", *quiet_ms as f64 / 1000.0)
        }
        StopReason::MaxDuration => "length limit reached".to_string(),
        StopReason::CaptureFailure { message } => format!("capture failed: {message}"),
    }
}

/// A recorder observer that can also report the saved file.
pub(crate) trait Frontend {
    fn observer(&mut self) -> &mut dyn RecorderObserver;
    fn saved(&mut self, path: &Path, samples: usize, sample_rate: u32);
}

/// One-line meter redrawn in place on a terminal.
pub(crate) struct MeterObserver<W: Write> {
    out: W,
    started_at: Option<Instant>,
}

impl<W: Write> MeterObserver<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            started_at: None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }
}

impl<W: Write> RecorderObserver for MeterObserver<W> {
    fn on_start(&mut self, sample_rate: u32) {
        self.started_at = Some(Instant::now());
        let _ = writeln!(
            self.out,
            "Recording at {sample_rate} Hz. Press Enter to stop."
        );
        let _ = self.out.flush();
    }

    fn on_stop(&mut self, final_duration: Duration, reason: &StopReason) {
        let _ = writeln!(
            self.out,
            "\r\x1b[2KStopped after {} ({})",
            format_elapsed(final_duration),
            describe_stop(reason)
        );
        let _ = self.out.flush();
    }

    fn on_loudness(&mut self, value: f32) {
        let line = format_status_line(self.elapsed(), value);
        let _ = write!(self.out, "\r{line}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Frontend for MeterObserver<W> {
    fn observer(&mut self) -> &mut dyn RecorderObserver {
        self
    }

    fn saved(&mut self, path: &Path, samples: usize, sample_rate: u32) {
        let secs = samples as f64 / sample_rate.max(1) as f64;
        let _ = writeln!(self.out, "Saved {:.1}s of audio to {}", secs, path.display());
    }
}

/// Machine-readable events, one JSON object per line.
pub(crate) struct JsonObserver<W: Write> {
    out: W,
}

impl<W: Write> JsonObserver<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, value: Value) {
        let _ = writeln!(self.out, "{value}");
        let _ = self.out.flush();
    }
}

impl<W: Write> RecorderObserver for JsonObserver<W> {
    fn on_start(&mut self, sample_rate: u32) {
        self.emit(json!({ "event": "started", "sample_rate": sample_rate }));
    }

    fn on_stop(&mut self, final_duration: Duration, reason: &StopReason) {
        let mut event = json!({
            "event": "stopped",
            "duration_ms": final_duration.as_millis() as u64,
        });
        if let (Value::Object(fields), Ok(Value::Object(detail))) =
            (&mut event, serde_json::to_value(reason))
        {
            fields.extend(detail);
        }
        self.emit(event);
    }

    fn on_loudness(&mut self, value: f32) {
        self.emit(json!({
            "event": "loudness",
            "value": value,
            "percent": loudness_percent(value),
        }));
    }
}

impl<W: Write> Frontend for JsonObserver<W> {
    fn observer(&mut self) -> &mut dyn RecorderObserver {
        self
    }

    fn saved(&mut self, path: &Path, samples: usize, sample_rate: u32) {
        self.emit(json!({
            "event": "saved",
            "path": path.display().to_string(),
            "samples": samples,
            "sample_rate": sample_rate,
        }));
    }
}
