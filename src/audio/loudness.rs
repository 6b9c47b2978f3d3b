use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Loudness reported for empty or all-zero frames.
pub const SILENT_LOUDNESS: f32 = 0.0;

/// Largest value `frame_loudness` can return (RMS of a full-scale i16 square wave).
pub const MAX_LOUDNESS: f32 = 32_768.0;

/// Root-mean-square amplitude of a frame of 16-bit samples, in raw sample units.
///
/// Never fails: an empty frame yields [`SILENT_LOUDNESS`] and the result is
/// always finite and within `0.0..=MAX_LOUDNESS`.
pub fn frame_loudness(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return SILENT_LOUDNESS;
    }
    // Accumulate in f64 so long frames of full-scale audio cannot overflow.
    let energy: f64 = samples
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum::<f64>()
        / samples.len() as f64;
    sanitize_loudness(energy.sqrt() as f32)
}

/// Clamp a loudness value into the range the silence detector accepts.
pub fn sanitize_loudness(value: f32) -> f32 {
    if !value.is_finite() || value < 0.0 {
        return SILENT_LOUDNESS;
    }
    value.min(MAX_LOUDNESS)
}

/// Lock-free slot holding the most recent loudness value.
///
/// Writers overwrite, readers see only the latest value; this is what lets the
/// event path coalesce loudness updates when the observer falls behind.
#[derive(Clone, Debug)]
pub struct LiveMeter {
    level_bits: Arc<AtomicU32>,
}

impl LiveMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(SILENT_LOUDNESS.to_bits())),
        }
    }

    pub fn set_level(&self, level: f32) {
        self.level_bits
            .store(sanitize_loudness(level).to_bits(), Ordering::Relaxed);
    }

    pub fn level(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }
}

impl Default for LiveMeter {
    fn default() -> Self {
        Self::new()
    }
}
