//! Opt-in debug log and crash log, both kept in the temp dir so the live meter
//! on the terminal is never interleaved with diagnostics.

use chrono::Local;
use std::any::Any;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

const DEBUG_LOG_CAP: u64 = 5 * 1024 * 1024;
const CRASH_LOG_CAP: u64 = 256 * 1024;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: Mutex<Option<SizedLog>> = Mutex::new(None);

/// Debug log location; `VOXREC_LOG_FILE` overrides the temp-dir default.
pub fn log_file_path() -> PathBuf {
    env::var_os("VOXREC_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("voxrec.log"))
}

pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("voxrec_crash.log")
}

/// Append-only file that starts over once it would pass `cap` bytes.
struct SizedLog {
    file: File,
    path: PathBuf,
    len: u64,
    cap: u64,
}

impl SizedLog {
    fn open(path: &Path, cap: u64) -> Option<Self> {
        let existing = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .truncate(false)
            .open(path)
            .ok()?;
        let mut log = Self {
            file,
            path: path.to_path_buf(),
            len: existing,
            cap,
        };
        if existing > cap {
            log.restart();
        }
        Some(log)
    }

    fn restart(&mut self) {
        if let Ok(file) = File::create(&self.path) {
            self.file = file;
            self.len = 0;
        }
    }

    fn append(&mut self, line: &str) {
        let size = line.len() as u64;
        if self.len + size > self.cap {
            self.restart();
        }
        if self.file.write_all(line.as_bytes()).is_ok() {
            self.len += size;
        }
    }
}

fn debug_log() -> std::sync::MutexGuard<'static, Option<SizedLog>> {
    DEBUG_LOG
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Open or close the debug log. Also gates the crash log.
pub fn init_logging(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
    *debug_log() = if enabled {
        SizedLog::open(&log_file_path(), DEBUG_LOG_CAP)
    } else {
        None
    };
}

pub fn log_debug(msg: &str) {
    if !ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let line = format!("{} {msg}\n", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"));
    if let Some(log) = debug_log().as_mut() {
        log.append(&line);
    }
}

/// Text carried by a panic, if it has any.
pub(crate) fn panic_payload_text(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

/// Record a panic in the crash log. Meant to be called from a panic hook.
pub fn log_panic(info: &PanicHookInfo<'_>) {
    if !ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let line = format!(
        "{} voxrec {} panicked at {location}: {}\n",
        Local::now().to_rfc3339(),
        env!("CARGO_PKG_VERSION"),
        panic_payload_text(info.payload())
    );
    if let Some(mut log) = SizedLog::open(&crash_log_path(), CRASH_LOG_CAP) {
        log.append(&line);
    }
}
