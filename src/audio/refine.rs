//! Reference clip refinement: trim silence from each raw recording, join the
//! clips with short pauses and encode the result as one WAV.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::resampler::resample;
use super::util::{peak_magnitude, samples_for_duration};
use super::wav::{self, Clip};
use crate::error::{Result, VoiceError};

/// Tuning knobs for the refiner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineOptions {
    /// Fraction of a clip's own peak above which a sample counts as speech.
    pub relative_threshold: f32,
    /// Clips whose peak stays below this absolute level are kept untrimmed.
    pub silence_floor: f32,
    /// Samples kept on each side of the detected speech (~90 ms at 22.05 kHz).
    pub padding_samples: usize,
    /// Pause inserted after every clip, in seconds.
    pub gap_seconds: f32,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self { relative_threshold: 0.01, silence_floor: 1e-3, padding_samples: 2000, gap_seconds: 0.2 }
    }
}

/// Outcome of a successful refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineReport {
    pub path: PathBuf,
    pub clips: usize,
    pub samples: usize,
    pub sample_rate: u32,
}

impl RefineReport {
    pub fn duration_seconds(&self) -> f64 {
        self.samples as f64 / self.sample_rate as f64
    }
}

/// Slice `samples` down to the detected speech plus padding.
///
/// The window is `[first - padding, last + padding)`, clamped to the clip.
/// A clip whose peak is below `silence_floor` is pure silence and comes back
/// whole rather than empty.
pub fn trim_silence<'a>(samples: &'a [f32], options: &RefineOptions) -> &'a [f32] {
    let peak = peak_magnitude(samples);
    if peak < options.silence_floor {
        return samples;
    }

    let threshold = peak * options.relative_threshold;
    let is_speech = |s: &f32| s.abs() > threshold;

    // peak >= silence_floor > 0 guarantees at least one speech sample
    let (Some(first), Some(last)) = (samples.iter().position(is_speech), samples.iter().rposition(is_speech)) else {
        return samples;
    };

    let start = first.saturating_sub(options.padding_samples);
    let end = (last + options.padding_samples).min(samples.len());
    &samples[start..end]
}

/// Decode, trim and concatenate `first` then `rest`, each followed by a gap.
///
/// `first` decides the output rate and format; later files at another rate
/// are resampled onto it. Any unreadable file aborts the whole merge.
pub fn merge_recordings(first_path: &Path, rest: &[PathBuf], options: &RefineOptions) -> Result<Clip> {
    let first = wav::read_clip(first_path)?;
    let spec = first.spec;
    debug!("Output format from {}: {} Hz, {} bit, first take {:.2}s", first_path.display(), spec.sample_rate, spec.bits_per_sample, first.duration_seconds());
    let gap = samples_for_duration(options.gap_seconds, spec.sample_rate);

    let mut merged = Vec::new();
    let mut push_clip = |path: &Path, clip: Clip| -> Result<()> {
        let samples = if clip.sample_rate() != spec.sample_rate {
            warn!("{} is {} Hz, resampling to {} Hz", path.display(), clip.sample_rate(), spec.sample_rate);
            resample(&clip.samples, clip.sample_rate(), spec.sample_rate).map_err(|e| VoiceError::Resample(format!("{}: {:#}", path.display(), e)))?
        } else {
            clip.samples
        };

        let trimmed = trim_silence(&samples, options);
        debug!("{}: kept {} of {} samples", path.display(), trimmed.len(), samples.len());

        merged.extend_from_slice(trimmed);
        merged.resize(merged.len() + gap, 0.0);
        Ok(())
    };

    push_clip(first_path, first)?;
    for path in rest {
        push_clip(path.as_path(), wav::read_clip(path)?)?;
    }

    Ok(Clip { samples: merged, spec })
}

/// Merge the recordings and write the result to `output`, replacing any prior clip.
pub fn refine_recordings(first: &Path, rest: &[PathBuf], output: &Path, options: &RefineOptions) -> Result<RefineReport> {
    let merged = merge_recordings(first, rest, options)?;
    wav::write_clip(output, &merged.samples, merged.spec)?;

    let report = RefineReport {
        path: output.to_path_buf(),
        clips: rest.len() + 1,
        samples: merged.samples.len(),
        sample_rate: merged.sample_rate(),
    };
    info!("✓ Refinement complete: merged {} recordings into {} ({:.2}s)", report.clips, report.path.display(), report.duration_seconds());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::pcm16_mono;
    use tempfile::TempDir;

    /// Silence with a burst of tone over `[start, end]` (inclusive).
    fn tone_clip(len: usize, start: usize, end: usize) -> Vec<f32> {
        (0..len).map(|i| if (start..=end).contains(&i) { 0.5 * ((i as f32) * 0.3).sin().signum() } else { 0.0 }).collect()
    }

    fn write_fixture(path: &Path, samples: &[f32], sample_rate: u32) {
        wav::write_clip(path, samples, pcm16_mono(sample_rate)).unwrap();
    }

    #[test]
    fn test_trim_pure_silence_is_unchanged() {
        let silence = vec![0.0f32; 5000];
        let options = RefineOptions::default();
        assert_eq!(trim_silence(&silence, &options).len(), silence.len());

        let hiss: Vec<f32> = (0..5000).map(|i| if i % 2 == 0 { 0.0005 } else { -0.0005 }).collect();
        assert_eq!(trim_silence(&hiss, &options), &hiss[..]);
    }

    #[test]
    fn test_trim_keeps_speech_window_with_padding() {
        let options = RefineOptions::default();
        let samples = tone_clip(20000, 5000, 12000);

        let trimmed = trim_silence(&samples, &options);
        // [5000 - 2000, 12000 + 2000)
        assert_eq!(trimmed.len(), 11000);
        assert_eq!(trimmed, &samples[3000..14000]);
    }

    #[test]
    fn test_trim_padding_is_clamped_to_bounds() {
        let options = RefineOptions::default();
        let samples = tone_clip(6000, 500, 5500);
        assert_eq!(trim_silence(&samples, &options).len(), samples.len());
    }

    #[test]
    fn test_trim_threshold_is_relative_to_peak() {
        let options = RefineOptions { padding_samples: 0, ..RefineOptions::default() };
        // Quiet lead-in at 0.5% of peak is silence, 2% of peak is speech.
        let mut samples = vec![0.0f32; 100];
        samples[10] = 0.005;
        samples[20] = 0.02;
        samples[50] = 1.0;

        // End is exclusive, so with no padding the last speech sample is cut
        let trimmed = trim_silence(&samples, &options);
        assert_eq!(trimmed.len(), 30);
        assert_eq!(trimmed[0], 0.02);
        assert_eq!(trimmed[29], 0.0);
    }

    #[test]
    fn test_merge_duration_includes_gap_after_every_clip() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let options = RefineOptions::default();

        let a = tone_clip(22050 * 3, 10000, 30000);
        let b = tone_clip(22050 * 3, 20000, 50000);
        let paths = vec![temp_dir.path().join("recording_1.wav"), temp_dir.path().join("recording_2.wav")];
        write_fixture(&paths[0], &a, 22050);
        write_fixture(&paths[1], &b, 22050);

        let merged = merge_recordings(&paths[0], &paths[1..], &options)?;
        let gap = 4410;
        let expected = (30000 + 2000 - (10000 - 2000)) + (50000 + 2000 - (20000 - 2000)) + 2 * gap;
        assert_eq!(merged.samples.len(), expected);
        assert_eq!(merged.sample_rate(), 22050);
        assert!(merged.samples[merged.samples.len() - gap..].iter().all(|&s| s == 0.0));
        Ok(())
    }

    #[test]
    fn test_merge_resamples_mismatched_rates() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let options = RefineOptions::default();

        let paths = vec![temp_dir.path().join("recording_1.wav"), temp_dir.path().join("recording_2.wav")];
        let tone: Vec<f32> = (0..44100).map(|i| 0.5 * (2.0 * std::f32::consts::PI * 441.0 * i as f32 / 44100.0).sin()).collect();
        write_fixture(&paths[0], &vec![0.0; 22050], 22050);
        write_fixture(&paths[1], &tone, 44100);

        // Silence is kept whole, the tone spans its whole clip: 1s + 1s + two gaps.
        let merged = merge_recordings(&paths[0], &paths[1..], &options)?;
        assert_eq!(merged.samples.len(), 22050 + 22050 + 2 * 4410);

        // The resampled tone starts right after the first gap and fills its second
        let second = &merged.samples[22050 + 4410..2 * 22050 + 4410];
        let loudest = |s: &[f32]| s.iter().fold(0.0f32, |m, x| m.max(x.abs()));
        assert!(loudest(&second[..50]) > 0.3);
        assert!(loudest(&second[22000..]) > 0.3);
        Ok(())
    }

    #[test]
    fn test_refine_aborts_on_corrupt_file_without_output() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let good = temp_dir.path().join("recording_1.wav");
        let bad = temp_dir.path().join("recording_2.wav");
        write_fixture(&good, &tone_clip(10000, 1000, 2000), 22050);
        std::fs::write(&bad, b"RIFF garbage")?;

        let output = temp_dir.path().join("combined.wav");
        let result = refine_recordings(&good, &[bad], &output, &RefineOptions::default());
        assert!(matches!(result, Err(VoiceError::Wav { .. })));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_refine_overwrites_previous_clip() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let options = RefineOptions::default();
        let output = temp_dir.path().join("combined.wav");
        let first = temp_dir.path().join("recording_1.wav");
        write_fixture(&first, &vec![0.0; 1000], 22050);

        let report = refine_recordings(&first, &[], &output, &options)?;
        assert_eq!(report.samples, 1000 + 4410);

        let second = temp_dir.path().join("recording_2.wav");
        write_fixture(&second, &vec![0.0; 2000], 22050);
        let report = refine_recordings(&first, &[second], &output, &options)?;
        assert_eq!(report.clips, 2);
        assert_eq!(wav::read_clip(&output)?.samples.len(), 1000 + 2000 + 2 * 4410);
        Ok(())
    }
}
