//! WAV decoding and encoding on top of hound.
//!
//! Clips are handled as mono `f32` in [-1, 1]. The original `WavSpec` travels
//! alongside so the merged clip can be written back in the same sample format
//! and bit depth as the first recording.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use super::util::downmix_to_mono;
use crate::error::{Result, VoiceError};

/// A decoded mono clip with the spec of the file it came from.
#[derive(Debug, Clone)]
pub struct Clip {
    pub samples: Vec<f32>,
    pub spec: WavSpec,
}

impl Clip {
    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.spec.sample_rate as f64
    }
}

/// Spec for the 16-bit mono PCM files written by the recorder.
pub fn pcm16_mono(sample_rate: u32) -> WavSpec {
    WavSpec { channels: 1, sample_rate, bits_per_sample: 16, sample_format: SampleFormat::Int }
}

/// Decode a WAV file into a mono clip.
///
/// Integer PCM of any depth up to 32 bits and 32-bit float are accepted.
/// Multi-channel files are averaged down to mono.
pub fn read_clip(path: &Path) -> Result<Clip> {
    let reader = WavReader::open(path).map_err(|e| VoiceError::wav(path, e))?;
    let spec = reader.spec();

    let interleaved = decode_samples(reader, spec).map_err(|e| VoiceError::wav(path, e))?;
    let samples = downmix_to_mono(&interleaved, spec.channels as usize);

    debug!(
        "Decoded {} ({} Hz, {} bit {:?}, {} ch, {} samples)",
        path.display(),
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format,
        spec.channels,
        samples.len()
    );

    Ok(Clip { samples, spec })
}

fn decode_samples(reader: WavReader<BufReader<fs::File>>, spec: WavSpec) -> hound::Result<Vec<f32>> {
    match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            reader.into_samples::<i32>().map(|s| s.map(|v| v as f32 / scale)).collect()
        }
    }
}

/// Encode mono samples as a WAV file using `spec`'s rate, depth and format.
///
/// The file is written next to `path` first and renamed into place, so a
/// failed write never replaces an existing file with a truncated one.
pub fn write_clip(path: &Path, samples: &[f32], spec: WavSpec) -> Result<()> {
    let spec = WavSpec { channels: 1, ..spec };
    let tmp_path = temp_sibling(path);

    if let Err(e) = write_samples(&tmp_path, samples, spec) {
        let _ = fs::remove_file(&tmp_path);
        return Err(VoiceError::wav(path, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn write_samples(path: &Path, samples: &[f32], spec: WavSpec) -> hound::Result<()> {
    let mut writer = WavWriter::create(path, spec)?;

    match spec.sample_format {
        SampleFormat::Float => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        }
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            let (min, max) = (-scale, scale - 1.0);
            for &sample in samples {
                writer.write_sample((sample * scale).round().clamp(min, max) as i32)?;
            }
        }
    }

    writer.finalize()
}

/// Full-scale magnitude of a signed integer sample of the given depth.
fn int_scale(bits_per_sample: u16) -> f32 {
    (1u64 << (bits_per_sample.clamp(1, 32) - 1)) as f32
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pcm16_survives_decode_encode() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("tone.wav");
        let original: Vec<i16> = (0..2205).map(|i| ((i as f32 * 0.1).sin() * 12000.0) as i16).collect();

        let mut writer = WavWriter::create(&path, pcm16_mono(22050))?;
        for &s in &original {
            writer.write_sample(s)?;
        }
        writer.finalize()?;

        let clip = read_clip(&path)?;
        assert_eq!(clip.sample_rate(), 22050);
        assert_eq!(clip.samples.len(), original.len());

        let out = temp_dir.path().join("copy.wav");
        write_clip(&out, &clip.samples, clip.spec)?;

        let copied: Vec<i16> = WavReader::open(&out)?.into_samples::<i16>().collect::<hound::Result<_>>()?;
        assert_eq!(copied, original);
        assert!(!temp_sibling(&out).exists());
        Ok(())
    }

    #[test]
    fn test_stereo_is_downmixed() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("stereo.wav");
        let spec = WavSpec { channels: 2, sample_rate: 16000, bits_per_sample: 32, sample_format: SampleFormat::Float };

        let mut writer = WavWriter::create(&path, spec)?;
        for _ in 0..100 {
            writer.write_sample(0.5f32)?;
            writer.write_sample(-0.25f32)?;
        }
        writer.finalize()?;

        let clip = read_clip(&path)?;
        assert_eq!(clip.samples.len(), 100);
        assert!(clip.samples.iter().all(|&s| (s - 0.125).abs() < 1e-6));
        assert!((clip.duration_seconds() - 100.0 / 16000.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_int_samples_are_clamped() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("loud.wav");
        write_clip(&path, &[2.0, -2.0, 0.0], pcm16_mono(22050))?;

        let samples: Vec<i16> = WavReader::open(&path)?.into_samples::<i16>().collect::<hound::Result<_>>()?;
        assert_eq!(samples, vec![i16::MAX, i16::MIN, 0]);
        Ok(())
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        // A non-empty directory where the clip should go cannot be replaced
        let path = temp_dir.path().join("combined.wav");
        fs::create_dir(&path)?;
        fs::write(path.join("keep"), b"x")?;

        let result = write_clip(&path, &[0.1, 0.2], pcm16_mono(22050));
        assert!(matches!(result, Err(VoiceError::Io(_))));
        assert!(!temp_sibling(&path).exists());
        assert!(path.join("keep").is_file());
        Ok(())
    }

    #[test]
    fn test_corrupt_file_reports_path() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("broken.wav");
        fs::write(&path, b"definitely not a wav file")?;

        let err = read_clip(&path).unwrap_err();
        assert!(matches!(err, VoiceError::Wav { .. }));
        assert!(err.to_string().contains("broken.wav"));
        Ok(())
    }
}
