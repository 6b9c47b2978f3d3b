//! 16-bit mono PCM WAV files.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

pub const WAV_CHANNELS: u16 = 1;
pub const WAV_BITS_PER_SAMPLE: u16 = 16;

fn pcm_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: WAV_CHANNELS,
        sample_rate,
        bits_per_sample: WAV_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Write `samples` as a single-channel 16-bit PCM WAV file.
///
/// The header's data length is fixed up by `finalize`, so a file is only
/// complete once this returns `Ok`.
pub fn write_pcm_wave(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, pcm_spec(sample_rate))?;
    {
        let mut pcm = writer.get_i16_writer(samples.len() as u32);
        for &sample in samples {
            pcm.write_sample(sample);
        }
        pcm.flush()?;
    }
    writer.finalize()
}

/// Decoded contents of a PCM WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmWave {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

/// Read back a 16-bit integer WAV file.
pub fn read_pcm_wave(path: &Path) -> Result<PcmWave, hound::Error> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != WAV_BITS_PER_SAMPLE {
        return Err(hound::Error::Unsupported);
    }
    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    Ok(PcmWave {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_wav(tag: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("voxrec_{tag}_{}_{nanos}.wav", std::process::id()))
    }

    #[test]
    fn round_trip_preserves_samples_and_rate() {
        let path = temp_wav("roundtrip");
        let samples: Vec<i16> = (0..2048)
            .map(|i| ((i as f32 * 0.05).sin() * 12_000.0) as i16)
            .chain([i16::MIN, i16::MAX, 0])
            .collect();
        write_pcm_wave(&path, &samples, 22_050).expect("write wav");
        let wave = read_pcm_wave(&path).expect("read wav");
        assert_eq!(wave.sample_rate, 22_050);
        assert_eq!(wave.channels, 1);
        assert_eq!(wave.samples, samples);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn header_declares_data_length() {
        let path = temp_wav("header");
        write_pcm_wave(&path, &[1, 2, 3, 4, 5], 8_000).expect("write wav");
        let bytes = fs::read(&path).expect("read bytes");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        let data_at = bytes
            .windows(4)
            .position(|w| w == b"data")
            .expect("data chunk");
        let len_bytes = &bytes[data_at + 4..data_at + 8];
        let data_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]);
        assert_eq!(data_len, 10);
        assert_eq!(bytes.len(), data_at + 8 + 10);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("voxrec_missing_dir_for_tests")
            .join("nested")
            .join("out.wav");
        assert!(write_pcm_wave(&path, &[0; 4], 8_000).is_err());
    }
}
