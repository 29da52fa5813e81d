//! Command-line interface and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::tts::{DEFAULT_MODEL, SynthesisSettings};

/// Torch device the synthesis model runs on.
/// Auto-detected based on platform if not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ComputeDevice {
    /// CPU inference (default fallback, always available)
    #[default]
    Cpu,
    /// NVIDIA CUDA acceleration (requires a CUDA-enabled torch build)
    Cuda,
    /// Apple Metal Performance Shaders (Apple Silicon)
    Mps,
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_torch_device())
    }
}

impl ComputeDevice {
    /// Device string understood by `torch.device`.
    pub fn as_torch_device(&self) -> &'static str {
        match self {
            ComputeDevice::Cpu => "cpu",
            ComputeDevice::Cuda => "cuda",
            ComputeDevice::Mps => "mps",
        }
    }
}

/// Voice cloning management tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "voice-clone")]
#[command(author, version, about = "Voice Cloning Management System", long_about = None)]
pub struct Cli {
    /// Directory holding the voice profiles
    #[arg(long, global = true, env = "VOICES_DIR", default_value = "voices")]
    pub voices_dir: PathBuf,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a new voice profile
    New {
        /// Name of the voice
        name: String,

        /// Description
        #[arg(long, default_value = "")]
        desc: String,
    },

    /// Record an audio sample from the microphone, then refine the voice
    Record {
        /// Name of the voice
        voice: String,

        /// Duration in seconds
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
        duration: u64,
    },

    /// Process recordings into a master reference clip
    Refine {
        /// Name of the voice
        voice: String,
    },

    /// List all voice profiles
    List,

    /// Generate speech in a cloned voice
    Speak {
        /// Name of the voice to use
        voice: String,

        /// Text to speak
        text: String,

        /// Language code (en, es, fr, etc.)
        #[arg(long, default_value = "en")]
        lang: String,

        /// Output filename
        #[arg(long, default_value = "output.wav")]
        out: PathBuf,

        #[command(flatten)]
        synthesis: SynthesisConfig,
    },

    /// List audio input devices
    Devices,

    /// List languages supported by the default model
    Languages,
}

/// Model and sampling options for `speak`.
#[derive(Args, Debug, Clone)]
pub struct SynthesisConfig {
    /// Coqui TTS model id
    #[arg(long, env = "TTS_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Python interpreter with the `TTS` package installed
    #[arg(long, env = "TTS_PYTHON", default_value = "python3")]
    pub python: PathBuf,

    /// Device to run the model on (auto-detected if not specified)
    #[arg(long, value_enum)]
    pub device: Option<ComputeDevice>,

    /// Sampling temperature (0.0-2.0). Lower is more stable, higher more expressive
    #[arg(long, default_value = "0.7", value_parser = parse_temperature)]
    pub temperature: f32,

    /// Repetition penalty; higher values avoid looping
    #[arg(long, default_value = "1.2")]
    pub repetition_penalty: f32,

    /// Speech speed multiplier (1.0 is the model's natural pace)
    #[arg(long, default_value = "0.9")]
    pub speed: f32,

    /// Use greedy decoding instead of sampling
    #[arg(long)]
    pub no_sample: bool,
}

impl SynthesisConfig {
    /// Sampling parameters to hand to the model.
    pub fn settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            temperature: self.temperature,
            repetition_penalty: self.repetition_penalty,
            speed: self.speed,
            do_sample: !self.no_sample,
        }
    }

    /// Get the effective compute device.
    pub fn effective_device(&self) -> ComputeDevice {
        self.device.unwrap_or_else(detect_device)
    }

    /// Log the synthesis configuration.
    pub fn log_config(&self) {
        info!("Synthesis configuration:");
        info!("  Model: {}", self.model);
        info!("  Python: {}", self.python.display());
        info!("  Temperature: {}", self.temperature);
        info!("  Repetition penalty: {}", self.repetition_penalty);
        info!("  Speed: {}", self.speed);
        info!("  Sampling: {}", !self.no_sample);
    }
}

/// Auto-detect the best device for the model.
fn detect_device() -> ComputeDevice {
    #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
    {
        info!("✓ Detected Apple Silicon, using MPS acceleration");
        ComputeDevice::Mps
    }

    #[cfg(target_os = "linux")]
    {
        if has_nvidia_gpu() {
            info!("Detected NVIDIA GPU, using CUDA");
            ComputeDevice::Cuda
        } else {
            info!("No GPU detected, using CPU");
            ComputeDevice::Cpu
        }
    }

    #[cfg(not(any(all(target_os = "macos", target_arch = "aarch64"), target_os = "linux")))]
    {
        info!("Using CPU");
        ComputeDevice::Cpu
    }
}

/// Check if an NVIDIA GPU is available (Linux only).
#[cfg(target_os = "linux")]
fn has_nvidia_gpu() -> bool {
    use std::path::Path;

    // Desktop driver device files, then Jetson (Tegra) markers
    let nvidia_paths = ["/dev/nvidia0", "/dev/nvidiactl", "/dev/nvhost-ctrl-gpu", "/etc/nv_tegra_release"];

    nvidia_paths.iter().any(|path| Path::new(path).exists())
}

/// Parse and validate temperature value (0.0-2.0).
fn parse_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be between 0.0 and 2.0, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speak_defaults() {
        let cli = Cli::try_parse_from(["voice-clone", "speak", "alice", "hello there"]).unwrap();
        assert_eq!(cli.voices_dir, PathBuf::from("voices"));
        match cli.command {
            Command::Speak { voice, text, lang, out, synthesis } => {
                assert_eq!(voice, "alice");
                assert_eq!(text, "hello there");
                assert_eq!(lang, "en");
                assert_eq!(out, PathBuf::from("output.wav"));
                assert_eq!(synthesis.model, DEFAULT_MODEL);
                assert_eq!(synthesis.settings(), SynthesisSettings::default());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_record_duration_default_and_range() {
        let cli = Cli::try_parse_from(["voice-clone", "record", "alice"]).unwrap();
        assert!(matches!(cli.command, Command::Record { duration: 5, .. }));
        assert!(Cli::try_parse_from(["voice-clone", "record", "alice", "--duration=0"]).is_err());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["voice-clone", "new", "Alice", "--desc", "warm", "--voices-dir", "/tmp/v", "-v"]).unwrap();
        assert_eq!(cli.voices_dir, PathBuf::from("/tmp/v"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::New { ref name, ref desc } if name == "Alice" && desc == "warm"));
    }

    #[test]
    fn test_temperature_is_validated() {
        assert!(Cli::try_parse_from(["voice-clone", "speak", "a", "b", "--temperature", "3"]).is_err());
        assert!(parse_temperature("abc").is_err());
        assert_eq!(parse_temperature("0.3"), Ok(0.3));
    }

    #[test]
    fn test_explicit_device_wins() {
        let cli = Cli::try_parse_from(["voice-clone", "speak", "a", "b", "--device", "mps", "--no-sample"]).unwrap();
        let Command::Speak { synthesis, .. } = cli.command else { panic!("expected speak") };
        assert_eq!(synthesis.effective_device(), ComputeDevice::Mps);
        assert!(!synthesis.settings().do_sample);
    }
}
