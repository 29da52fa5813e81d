//! Batch audio resampling using the rubato FFT-based resampler.
//!
//! Used to bring recordings captured at a different rate onto the rate of a
//! voice's reference clip, and to convert microphone captures to 22.05 kHz.

use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Chunk size for FFT-based resampling (provides good quality and performance).
const CHUNK_SIZE: usize = 1024;

/// Number of sub-chunks for FFT processing (higher = better quality but more CPU).
const SUB_CHUNKS: usize = 2;

/// Resample mono audio from one sample rate to another.
///
/// Processes the whole buffer at once. The resampler's output delay is
/// removed, so the result is time-aligned with the input and exactly
/// `len * to_rate / from_rate` samples long.
///
/// # Arguments
/// * `samples` - Input audio samples (mono)
/// * `from_rate` - Input sample rate (e.g., 48000 for a microphone)
/// * `to_rate` - Output sample rate (e.g., 22050 for reference audio)
///
/// # Returns
/// Resampled audio samples at the target rate
///
/// # Example
/// ```no_run
/// let mic_audio = vec![0.0; 48000]; // 1 second at 48kHz
/// let reference = resample(&mic_audio, 48000, 22050).unwrap();
/// assert_eq!(reference.len(), 22050);
/// ```
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    // No resampling needed if rates match
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let expected_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1, // mono
        FixedSync::Input,
    )
    .context("Failed to create resampler")?;

    // Output lags input by `delay` frames; skip them and flush the tail with silence
    let delay = resampler.output_delay();
    let output_frames_max = resampler.output_frames_max();
    let mut output_buffer = vec![0.0f32; output_frames_max];
    let mut output = Vec::with_capacity(delay + expected_len + output_frames_max);

    let silence = [0.0f32; CHUNK_SIZE];
    let mut chunks = samples.chunks(CHUNK_SIZE);
    while output.len() < delay + expected_len {
        let chunk = chunks.next().unwrap_or(&silence[..]);

        // Pad the last chunk if needed
        let input_chunk: Vec<f32> = if chunk.len() < CHUNK_SIZE {
            let mut padded = chunk.to_vec();
            padded.resize(CHUNK_SIZE, 0.0);
            padded
        } else {
            chunk.to_vec()
        };

        let input_adapter = InterleavedSlice::new(&input_chunk, 1, CHUNK_SIZE).context("Failed to create input adapter")?;
        let mut output_adapter = InterleavedSlice::new_mut(&mut output_buffer, 1, output_frames_max).context("Failed to create output adapter")?;

        let (_, frames_written) = resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| anyhow::anyhow!("Resampling error: {}", e))?;
        output.extend_from_slice(&output_buffer[..frames_written]);
    }

    Ok(output[delay..delay + expected_len].to_vec())
}
