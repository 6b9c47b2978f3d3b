//! System microphone capture via CPAL.
//!
//! Opens the chosen input device, downmixes to mono, converts to the session
//! sample rate and hands out fixed-size i16 frames to the capture loop.

use super::dispatch::{f32_to_i16, CallbackChunker, I16_SCALE};
use super::resample::{ratio_supported, StreamResampler};
use super::source::{CaptureBackend, CaptureFormat, CaptureSource, DeviceCatalog, InputDevice};
use crate::lock::lock_or_recover;
use crate::log_debug;
use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Driver chunks buffered between the callback and the capture loop.
const CHUNK_CHANNEL_CAPACITY: usize = 256;
/// Driver chunk length in milliseconds.
const CHUNK_MS: u32 = 10;
/// A device that delivers nothing for this long is treated as gone.
const READ_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Host audio devices exposed through cpal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    fn find_device(device_id: Option<&str>) -> Result<cpal::Device> {
        let host = cpal::default_host();
        match device_id {
            Some(id) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == id).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{id}' not found"))
            }
            None => host
                .default_input_device()
                .context("no default input device available"),
        }
    }
}

impl DeviceCatalog for CpalBackend {
    fn list_devices(&self) -> Result<Vec<InputDevice>> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());
        let devices = host.input_devices().context("no input devices available")?;
        let mut listed = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                listed.push(InputDevice {
                    is_default: default_name.as_deref() == Some(name.as_str()),
                    display_name: name.clone(),
                    id: name,
                });
            }
        }
        Ok(listed)
    }
}

impl CaptureBackend for CpalBackend {
    fn open(
        &self,
        device_id: Option<&str>,
        format: CaptureFormat,
    ) -> Result<Box<dyn CaptureSource>> {
        let device = Self::find_device(device_id)?;
        let source = CpalSource::open(device, format)?;
        Ok(Box::new(source))
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

/// Prefer a config that runs natively at the session rate with the fewest
/// channels; otherwise fall back to the device default and resample.
fn choose_stream_config(device: &cpal::Device, sample_rate: u32) -> Result<SupportedStreamConfig> {
    let native = device
        .supported_input_configs()
        .map(|configs| {
            configs
                .filter(|range| {
                    matches!(
                        range.sample_format(),
                        SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
                    )
                })
                .filter(|range| {
                    range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
                })
                .min_by_key(|range| (range.channels(), range.sample_format() != SampleFormat::I16))
                .map(|range| range.with_sample_rate(SampleRate(sample_rate)))
        })
        .ok()
        .flatten();
    match native {
        Some(config) => Ok(config),
        None => device
            .default_input_config()
            .context("input device has no usable configuration"),
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}

/// A running cpal input stream.
pub struct CpalSource {
    device_name: String,
    stream: Option<cpal::Stream>,
    receiver: Receiver<Vec<f32>>,
    resampler: StreamResampler,
    pending: Vec<f32>,
    frame_size: usize,
    dropped: Arc<AtomicUsize>,
    stream_error: Arc<Mutex<Option<String>>>,
}

impl CpalSource {
    fn open(device: cpal::Device, format: CaptureFormat) -> Result<Self> {
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string());
        let supported = choose_stream_config(&device, format.sample_rate)?;
        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();
        let device_rate = stream_config.sample_rate.0;
        let channels = usize::from(stream_config.channels.max(1));

        if device_rate != format.sample_rate && !ratio_supported(device_rate, format.sample_rate) {
            bail!(
                "device rate {device_rate}Hz cannot be converted to {}Hz",
                format.sample_rate
            );
        }

        log_debug(&format!(
            "Capture config for '{device_name}': format={sample_format:?} device_rate={device_rate}Hz channels={channels} target_rate={}Hz frame={}",
            format.sample_rate, format.frame_size
        ));

        let chunk_samples = ((device_rate * CHUNK_MS) / 1000).max(1) as usize;
        let (sender, receiver) = bounded::<Vec<f32>>(CHUNK_CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));
        let chunker = Arc::new(Mutex::new(CallbackChunker::new(
            chunk_samples,
            sender,
            dropped.clone(),
        )));
        let stream_error = Arc::new(Mutex::new(None::<String>));

        let err_fn = {
            let stream_error = stream_error.clone();
            move |err: cpal::StreamError| {
                log_debug(&format!("audio_stream_error: {err}"));
                *lock_or_recover(&stream_error, "stream error slot") = Some(err.to_string());
            }
        };

        // The callback must never wait on the capture loop; if the chunker is
        // busy the block is counted as dropped.
        let stream = match sample_format {
            SampleFormat::F32 => {
                let chunker = chunker.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _| match chunker.try_lock() {
                        Ok(mut chunker) => chunker.push(data, channels, |s| s),
                        Err(_) => {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::I16 => {
                let chunker = chunker.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _| match chunker.try_lock() {
                        Ok(mut chunker) => chunker.push(data, channels, |s| f32::from(s) / I16_SCALE),
                        Err(_) => {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let chunker = chunker.clone();
                let dropped = dropped.clone();
                device.build_input_stream(
                    &stream_config,
                    move |data: &[u16], _| match chunker.try_lock() {
                        Ok(mut chunker) => {
                            chunker.push(data, channels, |s| (f32::from(s) - I16_SCALE) / I16_SCALE)
                        }
                        Err(_) => {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            other => bail!("unsupported sample format: {other:?}"),
        }
        .with_context(|| format!("failed to open '{device_name}'. {}", mic_permission_hint()))?;

        stream
            .play()
            .with_context(|| format!("failed to start '{device_name}'"))?;

        Ok(Self {
            device_name,
            stream: Some(stream),
            receiver,
            resampler: StreamResampler::new(device_rate, format.sample_rate),
            pending: Vec::with_capacity(format.frame_size * 2),
            frame_size: format.frame_size.max(1),
            dropped,
            stream_error,
        })
    }

    fn take_stream_error(&self) -> Option<String> {
        lock_or_recover(&self.stream_error, "stream error slot").take()
    }
}

impl CaptureSource for CpalSource {
    fn read_frame(&mut self) -> Result<Vec<i16>> {
        loop {
            if self.pending.len() >= self.frame_size {
                return Ok(self
                    .pending
                    .drain(..self.frame_size)
                    .map(f32_to_i16)
                    .collect());
            }
            if let Some(err) = self.take_stream_error() {
                bail!("'{}' reported an error: {err}", self.device_name);
            }
            match self.receiver.recv_timeout(READ_STALL_TIMEOUT) {
                Ok(chunk) => self.resampler.process(&chunk, &mut self.pending),
                Err(RecvTimeoutError::Timeout) => bail!(
                    "no audio from '{}' for {}ms; the device may have been disconnected",
                    self.device_name,
                    READ_STALL_TIMEOUT.as_millis()
                ),
                Err(RecvTimeoutError::Disconnected) => {
                    bail!("audio stream from '{}' disconnected", self.device_name)
                }
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log_debug(&format!("failed to pause audio stream: {err}"));
            }
            drop(stream);
        }
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            log_debug(&format!(
                "'{}' dropped {dropped} driver chunks during capture",
                self.device_name
            ));
        }
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.close();
    }
}
