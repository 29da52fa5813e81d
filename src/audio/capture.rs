//! Fixed-duration microphone recording using cpal.
//!
//! Captures from the default input device into a lock-free ring buffer, then
//! resamples to the reference rate and writes a 16-bit mono WAV.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing::{debug, info, warn};

use super::resampler::resample;
use super::util::{downmix_to_mono, find_best_config, get_device_name};
use super::wav::{self, pcm16_mono};

/// Sample rate of recordings written by the recorder.
pub const RECORDING_SAMPLE_RATE: u32 = 22050;

/// Something that can leave a WAV recording of a given length on disk.
pub trait Recorder {
    /// Record for `duration` and write the result to `output`.
    fn record(&mut self, duration: Duration, output: &Path) -> Result<()>;
}

/// Records from the system's default input device.
pub struct MicrophoneRecorder {
    sample_rate: u32, // Output sample rate
}

impl MicrophoneRecorder {
    pub fn new() -> Self {
        Self { sample_rate: RECORDING_SAMPLE_RATE }
    }
}

impl Default for MicrophoneRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for MicrophoneRecorder {
    /// Blocks for the whole duration, printing a dot per elapsed second.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No input device is available
    /// - Failed to get supported input configurations
    /// - Failed to build or start the input stream
    /// - The WAV file cannot be written
    fn record(&mut self, duration: Duration, output: &Path) -> Result<()> {
        let host = cpal::default_host();
        let device = host.default_input_device().context("No input device available")?;

        info!("Using input device: {}", get_device_name(&device));

        let supported_configs = device.supported_input_configs().context("Failed to get supported input configs")?;
        let config = find_best_config(supported_configs, self.sample_rate)?;
        let device_sample_rate = config.sample_rate();
        let channels = config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            info!("Device sample rate {} Hz differs from target {} Hz - resampling will be applied", device_sample_rate, self.sample_rate);
        }
        debug!("Audio capture config: {} Hz, {} channels, {:?}", device_sample_rate, config.channels(), config.sample_format());

        // Room for the whole take plus one second of slack
        let capacity = (duration.as_secs_f64() + 1.0) * device_sample_rate as f64;
        let ring = HeapRb::<f32>::new(capacity.ceil() as usize);
        let (mut producer, mut consumer) = ring.split();

        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_clone = dropped.clone();

        let stream_config: StreamConfig = config.config();
        let err_fn = |err| {
            tracing::error!("Audio capture error: {}", err);
        };

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let samples = downmix_to_mono(data, channels);
                let written = producer.push_slice(&samples);
                if written < samples.len() {
                    dropped_clone.fetch_add((samples.len() - written) as u64, Ordering::Relaxed);
                }
            },
            err_fn,
            None,
        )?;

        println!("\n🎙️  Recording for {} seconds...", duration.as_secs());
        println!("   (Speak clearly and normally)");

        stream.play().context("Failed to start audio stream")?;
        wait_with_progress(duration);
        stream.pause().context("Failed to stop audio stream")?;
        drop(stream);

        let dropped = dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            warn!("Ring buffer full, dropped {} samples", dropped);
        }

        let mut captured = vec![0.0f32; consumer.occupied_len()];
        let read = consumer.pop_slice(&mut captured);
        captured.truncate(read);

        let mut samples = resample(&captured, device_sample_rate, self.sample_rate)?;
        // Streams start late and stop late; pin the take to the requested length
        samples.resize((duration.as_secs_f64() * self.sample_rate as f64).round() as usize, 0.0);

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        wav::write_clip(output, &samples, pcm16_mono(self.sample_rate))?;

        info!("✓ Saved recording to: {}", output.display());
        Ok(())
    }
}

fn wait_with_progress(duration: Duration) {
    let whole_seconds = duration.as_secs();
    for _ in 0..whole_seconds {
        std::thread::sleep(Duration::from_secs(1));
        print!(".");
        let _ = std::io::stdout().flush();
    }
    std::thread::sleep(duration - Duration::from_secs(whole_seconds));
    println!("\n");
}

/// Print the available input devices, marking the default one.
pub fn list_input_devices() -> Result<()> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().map(|d| get_device_name(&d));

    println!("\nAvailable Audio Input Devices:");
    println!("{:<4} {:<40} {}", "", "NAME", "DEFAULT CONFIG");
    println!("{}", "-".repeat(70));

    for (index, device) in host.input_devices().context("Failed to enumerate input devices")?.enumerate() {
        let name = get_device_name(&device);
        let marker = if Some(&name) == default_name.as_ref() { "*" } else { "" };
        let config = match device.default_input_config() {
            Ok(config) => format!("{} Hz, {} ch, {:?}", config.sample_rate(), config.channels(), config.sample_format()),
            Err(e) => format!("unavailable ({})", e),
        };
        println!("{:<4} {:<40} {}", format!("{}{}", index, marker), name, config);
    }

    println!("{}", "-".repeat(70));
    Ok(())
}
