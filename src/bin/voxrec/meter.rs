//! Live level bar and elapsed-time display.

use std::time::Duration;

/// Raw loudness shown as a full bar. Speech rarely exceeds this.
pub(crate) const DISPLAY_FULL_SCALE: f32 = 3000.0;
pub(crate) const BAR_WIDTH: usize = 30;

const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Map raw loudness onto 0..=100 for display.
#[must_use]
pub(crate) fn loudness_percent(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    (value / DISPLAY_FULL_SCALE * 100.0).clamp(0.0, 100.0)
}

/// `MM:SS`; minutes keep growing past 59.
#[must_use]
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[must_use]
pub(crate) fn format_level_bar(percent: f32, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    let filled = filled.min(width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat(BAR_FULL).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(width - filled));
    bar
}

#[must_use]
pub(crate) fn format_status_line(elapsed: Duration, loudness: f32) -> String {
    let percent = loudness_percent(loudness);
    format!(
        "● REC {} [{}] {:>3.0}%",
        format_elapsed(elapsed),
        format_level_bar(percent, BAR_WIDTH),
        percent
    )
}
