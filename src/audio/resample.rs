//! Streaming sample-rate conversion for devices that cannot run at the
//! session rate. State is carried across chunks so frame boundaries do not
//! click.

use crate::log_debug;
#[cfg(feature = "high-quality-audio")]
use rubato::{InterpolationParameters, InterpolationType, Resampler, SincFixedIn, WindowFunction};
use std::f32::consts::PI;

pub(super) const MIN_RESAMPLE_RATIO: f64 = 0.01;
pub(super) const MAX_RESAMPLE_RATIO: f64 = 8.0;
const MAX_DOWNSAMPLING_TAPS: usize = 129;
#[cfg(feature = "high-quality-audio")]
const SINC_CHUNK: usize = 256;

pub(super) fn ratio_supported(device_rate: u32, target_rate: u32) -> bool {
    if device_rate == 0 || target_rate == 0 {
        return false;
    }
    let ratio = f64::from(target_rate) / f64::from(device_rate);
    (MIN_RESAMPLE_RATIO..=MAX_RESAMPLE_RATIO).contains(&ratio)
}

/// Converts a continuous mono stream from `device_rate` to `target_rate`.
pub(super) enum StreamResampler {
    Passthrough,
    Basic(BasicResampler),
    #[cfg(feature = "high-quality-audio")]
    Sinc(SincStream),
}

impl StreamResampler {
    pub(super) fn new(device_rate: u32, target_rate: u32) -> Self {
        if device_rate == target_rate || !ratio_supported(device_rate, target_rate) {
            return StreamResampler::Passthrough;
        }

        #[cfg(feature = "high-quality-audio")]
        {
            match SincStream::new(device_rate, target_rate) {
                Ok(sinc) => return StreamResampler::Sinc(sinc),
                Err(err) => log_debug(&format!(
                    "sinc resampler unavailable ({err}); using linear resampling"
                )),
            }
        }

        StreamResampler::Basic(BasicResampler::new(device_rate, target_rate))
    }

    pub(super) fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        match self {
            StreamResampler::Passthrough => out.extend_from_slice(input),
            StreamResampler::Basic(basic) => basic.process(input, out),
            #[cfg(feature = "high-quality-audio")]
            StreamResampler::Sinc(sinc) => {
                if let Err(err) = sinc.process(input, out) {
                    log_debug(&format!(
                        "sinc resampler failed ({err}); switching to linear resampling"
                    ));
                    let mut basic = BasicResampler::new(sinc.device_rate, sinc.target_rate);
                    basic.process(input, out);
                    *self = StreamResampler::Basic(basic);
                }
            }
        }
    }
}

/// FIR low-pass (when decimating) followed by linear interpolation.
pub(super) struct BasicResampler {
    low_pass: Option<StreamingFir>,
    linear: LinearStream,
}

impl BasicResampler {
    pub(super) fn new(device_rate: u32, target_rate: u32) -> Self {
        let low_pass = (device_rate > target_rate).then(|| {
            let taps = downsampling_tap_count(device_rate, target_rate);
            let cutoff = (target_rate as f32 * 0.5 / device_rate as f32).min(0.499);
            StreamingFir::new(design_low_pass(cutoff, taps))
        });
        Self {
            low_pass,
            linear: LinearStream::new(device_rate, target_rate),
        }
    }

    pub(super) fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        match self.low_pass.as_mut() {
            Some(fir) => {
                let filtered = fir.process(input);
                self.linear.process(&filtered, out);
            }
            None => self.linear.process(input, out),
        }
    }
}

/// Linear interpolation that keeps its read position between chunks.
pub(super) struct LinearStream {
    step: f64,
    position: f64,
    carry: Vec<f32>,
}

impl LinearStream {
    pub(super) fn new(device_rate: u32, target_rate: u32) -> Self {
        Self {
            step: f64::from(device_rate) / f64::from(target_rate.max(1)),
            position: 0.0,
            carry: Vec::new(),
        }
    }

    pub(super) fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(input);
        if buf.len() < 2 {
            self.carry = buf;
            return;
        }

        while self.position + 1.0 < buf.len() as f64 {
            let idx = self.position.floor() as usize;
            let frac = (self.position - idx as f64) as f32;
            out.push(buf[idx] * (1.0 - frac) + buf[idx + 1] * frac);
            self.position += self.step;
        }

        let consumed = (self.position.floor() as usize).min(buf.len() - 1);
        self.position -= consumed as f64;
        self.carry = buf.split_off(consumed);
    }
}

/// Low-pass filter that remembers the tail of the previous chunk.
pub(super) struct StreamingFir {
    coeffs: Vec<f32>,
    history: Vec<f32>,
}

impl StreamingFir {
    pub(super) fn new(coeffs: Vec<f32>) -> Self {
        let history = vec![0.0; coeffs.len().saturating_sub(1)];
        Self { coeffs, history }
    }

    pub(super) fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let taps = self.coeffs.len();
        if taps <= 1 {
            return input.to_vec();
        }
        let mut window = std::mem::take(&mut self.history);
        window.extend_from_slice(input);

        let mut output = Vec::with_capacity(input.len());
        for n in 0..input.len() {
            let acc: f32 = self
                .coeffs
                .iter()
                .zip(&window[n..n + taps])
                .map(|(c, s)| c * s)
                .sum();
            output.push(acc);
        }

        self.history = window.split_off(window.len() - (taps - 1));
        output
    }
}

/// Short filters for near-equal rates, longer ones when collapsing 48 kHz
/// into 8 kHz.
pub(super) fn downsampling_tap_count(device_rate: u32, target_rate: u32) -> usize {
    let decimation_ratio = device_rate as f32 / target_rate.max(1) as f32;
    let mut taps = (decimation_ratio * 4.0).ceil().max(11.0) as usize;
    if taps % 2 == 0 {
        taps += 1;
    }
    taps.min(MAX_DOWNSAMPLING_TAPS)
}

/// Hamming-windowed sinc taps, normalized to unity DC gain.
pub(super) fn design_low_pass(normalized_cutoff: f32, taps: usize) -> Vec<f32> {
    if taps <= 1 {
        return vec![1.0];
    }
    let m = (taps - 1) as f32;
    let mut coeffs: Vec<f32> = (0..taps)
        .map(|n| {
            let centered = n as f32 - m / 2.0;
            let sinc = if centered == 0.0 {
                2.0 * normalized_cutoff
            } else {
                (2.0 * PI * normalized_cutoff * centered).sin() / (PI * centered)
            };
            let window = 0.54 - 0.46 * ((2.0 * PI * n as f32) / m).cos();
            sinc * window
        })
        .collect();

    let sum: f32 = coeffs.iter().sum();
    if sum != 0.0 {
        for coeff in coeffs.iter_mut() {
            *coeff /= sum;
        }
    }
    coeffs
}

#[cfg(feature = "high-quality-audio")]
pub(super) struct SincStream {
    device_rate: u32,
    target_rate: u32,
    resampler: SincFixedIn<f32>,
    pending: Vec<f32>,
}

#[cfg(feature = "high-quality-audio")]
impl SincStream {
    pub(super) fn new(device_rate: u32, target_rate: u32) -> anyhow::Result<Self> {
        let ratio = f64::from(target_rate) / f64::from(device_rate);
        let params = InterpolationParameters {
            sinc_len: 64,
            f_cutoff: 0.90,
            interpolation: InterpolationType::Cubic,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, SINC_CHUNK, 1)
            .map_err(|e| anyhow::anyhow!("failed to construct sinc resampler: {e:?}"))?;
        Ok(Self {
            device_rate,
            target_rate,
            resampler,
            pending: Vec::with_capacity(SINC_CHUNK * 2),
        })
    }

    pub(super) fn process(&mut self, input: &[f32], out: &mut Vec<f32>) -> anyhow::Result<()> {
        self.pending.extend_from_slice(input);
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending.len() < needed {
                return Ok(());
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            let produced = self
                .resampler
                .process(std::slice::from_ref(&chunk), None)
                .map_err(|e| anyhow::anyhow!("resampler process failed: {e:?}"))?;
            if let Some(channel) = produced.first() {
                out.extend_from_slice(channel);
            }
        }
    }
}
