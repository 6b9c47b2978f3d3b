use super::defaults::{
    MAX_FRAME_SIZE, MAX_MAX_SECONDS, MAX_SAMPLE_RATE, MAX_SILENCE_SECONDS, MAX_THRESHOLD,
    MIN_FRAME_SIZE, MIN_SAMPLE_RATE, MIN_SILENCE_SECONDS,
};
use super::AppConfig;
use anyhow::{bail, Result};

impl AppConfig {
    /// Check CLI values and normalize the device name and output path.
    pub fn validate(&mut self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=MAX_THRESHOLD).contains(&self.threshold) {
            bail!(
                "--threshold must be between 0 and {MAX_THRESHOLD}, got {}",
                self.threshold
            );
        }
        if !self.silence_seconds.is_finite()
            || !(MIN_SILENCE_SECONDS..=MAX_SILENCE_SECONDS).contains(&self.silence_seconds)
        {
            bail!(
                "--silence-seconds must be between {MIN_SILENCE_SECONDS} and {MAX_SILENCE_SECONDS}, got {}",
                self.silence_seconds
            );
        }
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between {MIN_SAMPLE_RATE} and {MAX_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            );
        }
        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&self.frame_size) {
            bail!(
                "--frame-size must be between {MIN_FRAME_SIZE} and {MAX_FRAME_SIZE}, got {}",
                self.frame_size
            );
        }
        if self.max_seconds > MAX_MAX_SECONDS {
            bail!(
                "--max-seconds must be at most {MAX_MAX_SECONDS} (0 disables the cap), got {}",
                self.max_seconds
            );
        }

        if let Some(device) = self.input_device.as_mut() {
            let trimmed = device.trim();
            if trimmed.is_empty() {
                bail!("--input-device must not be empty");
            }
            if trimmed.chars().any(char::is_control) {
                bail!("--input-device must not contain control characters");
            }
            *device = trimmed.to_string();
        }

        if let Some(output) = &self.output {
            if output.as_os_str().is_empty() {
                bail!("--output must not be empty");
            }
            if output.is_dir() {
                bail!("--output '{}' is a directory", output.display());
            }
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    bail!(
                        "--output directory '{}' does not exist",
                        parent.display()
                    );
                }
            }
        }

        Ok(())
    }
}
