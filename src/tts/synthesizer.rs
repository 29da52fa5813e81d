//! Voice-cloning synthesizer backed by the Coqui TTS library.
//!
//! The model lives in a Python worker process that is started on the first
//! request and reused for later ones. Requests and replies are JSON lines on
//! the worker's stdin/stdout; its own logging goes to stderr.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::settings::SynthesisSettings;
use crate::config::{ComputeDevice, SynthesisConfig, get_language};
use crate::error::{Result, VoiceError};

/// Coqui model id of XTTS v2.
pub const DEFAULT_MODEL: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

const WORKER_SCRIPT: &str = include_str!("xtts_worker.py");

/// One utterance to synthesize.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
    /// Audio of the target voice; `None` lets the model pick its default speaker.
    pub reference: Option<&'a Path>,
    pub output: &'a Path,
}

/// Anything that turns text into a waveform file.
pub trait SpeechSynthesizer {
    /// Synthesize `request.text` into `request.output` and return the written path.
    fn synthesize(&mut self, request: &SynthesisRequest<'_>) -> Result<PathBuf>;
}

/// XTTS synthesizer with a lazily started model worker.
pub struct XttsSynthesizer {
    model: String,              // Coqui model id
    python: PathBuf,            // Interpreter with the TTS package installed
    device: ComputeDevice,      // Torch device the model is moved to
    settings: SynthesisSettings, // Sampling parameters for cloned speech
    worker: Option<Worker>,     // Started on first use
}

impl XttsSynthesizer {
    /// Create a synthesizer; the model is not loaded until the first request.
    ///
    /// # Errors
    /// Returns `Config` if the sampling settings are out of range.
    pub fn new(config: &SynthesisConfig) -> Result<Self> {
        let settings = config.settings();
        settings.validate()?;

        Ok(Self {
            model: config.model.clone(),
            python: config.python.clone(),
            device: config.effective_device(),
            settings,
            worker: None,
        })
    }

    /// Start the model worker if it is not running yet.
    fn load_model(&mut self) -> Result<&mut Worker> {
        if self.worker.is_none() {
            info!("⏳ Loading TTS model: {} ({})", self.model, self.device);
            let worker = Worker::spawn(&self.python, &self.model, self.device)?;
            self.worker = Some(worker);
        }
        self.worker.as_mut().ok_or_else(|| VoiceError::Synthesis("model worker is not running".to_string()))
    }

    fn check_request(&self, request: &SynthesisRequest<'_>) -> Result<()> {
        if request.text.trim().is_empty() {
            return Err(VoiceError::Synthesis("nothing to say: text is empty".to_string()));
        }
        if self.model == DEFAULT_MODEL && get_language(request.language).is_none() {
            return Err(VoiceError::Synthesis(format!(
                "language '{}' is not supported by {} (run 'languages' to list the supported codes)",
                request.language, self.model
            )));
        }
        Ok(())
    }
}

impl SpeechSynthesizer for XttsSynthesizer {
    fn synthesize(&mut self, request: &SynthesisRequest<'_>) -> Result<PathBuf> {
        self.check_request(request)?;

        match request.reference {
            Some(reference) => info!("🗣️ Synthesizing with reference: {}", reference.file_name().unwrap_or_default().to_string_lossy()),
            None => info!("ℹ️ No reference audio provided, using the model's default speaker"),
        }

        let message = WorkerRequest {
            text: request.text,
            language: request.language,
            reference: request.reference,
            output: request.output,
            settings: self.settings,
        };

        let worker = self.load_model()?;
        worker.send(&message)?;
        let reply = worker.receive()?;

        if reply.ok {
            Ok(request.output.to_path_buf())
        } else {
            Err(VoiceError::Synthesis(reply.error.unwrap_or_else(|| "model reported an unknown error".to_string())))
        }
    }
}

#[derive(Serialize)]
struct WorkerRequest<'a> {
    text: &'a str,
    language: &'a str,
    reference: Option<&'a Path>,
    output: &'a Path,
    settings: SynthesisSettings,
}

#[derive(Debug, Default, Deserialize)]
struct WorkerReply {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: bool,
    error: Option<String>,
}

/// Handle on the running Python worker.
struct Worker {
    child: Child,
    stdin: Option<ChildStdin>, // Dropped first to let the worker exit its read loop
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    fn spawn(python: &Path, model: &str, device: ComputeDevice) -> Result<Self> {
        let mut child = Command::new(python)
            .args(["-u", "-c", WORKER_SCRIPT, model, device.as_torch_device()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| VoiceError::Synthesis(format!("failed to start {}: {}", python.display(), e)))?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| VoiceError::Synthesis("worker stdout unavailable".to_string()))?;
        let mut worker = Self { child, stdin, stdout: BufReader::new(stdout) };

        let reply = worker.receive()?;
        if !reply.ready {
            return Err(VoiceError::Synthesis(reply.error.unwrap_or_else(|| format!("could not load {}", model))));
        }

        debug!("TTS worker ready (pid {})", worker.child.id());
        Ok(worker)
    }

    fn send(&mut self, request: &WorkerRequest<'_>) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| VoiceError::Synthesis("worker input is closed".to_string()))?;
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        stdin
            .write_all(&line)
            .and_then(|_| stdin.flush())
            .map_err(|e| VoiceError::Synthesis(format!("worker stopped accepting requests: {}", e)))
    }

    fn receive(&mut self) -> Result<WorkerReply> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line)?;
        if read == 0 {
            let status = self.child.try_wait().ok().flatten();
            return Err(VoiceError::Synthesis(match status {
                Some(status) => format!("TTS worker exited ({})", status),
                None => "TTS worker closed its output".to_string(),
            }));
        }
        serde_json::from_str(line.trim()).map_err(|e| VoiceError::Synthesis(format!("unexpected worker output {:?}: {}", line.trim(), e)))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Err(e) = self.child.wait() {
            warn!("Failed to wait for TTS worker: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        synthesis: SynthesisConfig,
    }

    fn config(args: &[&str]) -> SynthesisConfig {
        let argv = std::iter::once("test").chain(args.iter().copied());
        TestCli::parse_from(argv).synthesis
    }

    fn request<'a>(text: &'a str, language: &'a str) -> SynthesisRequest<'a> {
        SynthesisRequest { text, language, reference: None, output: Path::new("out.wav") }
    }

    #[test]
    fn test_rejects_empty_text_before_loading() {
        let mut synth = XttsSynthesizer::new(&config(&["--python", "/nonexistent/python"])).unwrap();
        let err = synth.synthesize(&request("   ", "en")).unwrap_err();
        assert!(err.to_string().contains("text is empty"));
        assert!(synth.worker.is_none());
    }

    #[test]
    fn test_rejects_unsupported_language() {
        let mut synth = XttsSynthesizer::new(&config(&["--python", "/nonexistent/python"])).unwrap();
        let err = synth.synthesize(&request("hello", "xx")).unwrap_err();
        assert!(matches!(err, VoiceError::Synthesis(ref msg) if msg.contains("'xx'")));
    }

    #[test]
    fn test_missing_interpreter_is_a_synthesis_failure() {
        let mut synth = XttsSynthesizer::new(&config(&["--python", "/nonexistent/python", "--device", "cpu"])).unwrap();
        let err = synth.synthesize(&request("hello", "en")).unwrap_err();
        assert!(matches!(err, VoiceError::Synthesis(ref msg) if msg.contains("failed to start")));
    }

    #[test]
    fn test_invalid_settings_are_rejected_up_front() {
        assert!(XttsSynthesizer::new(&config(&["--speed", "0"])).is_err());
    }

    #[test]
    fn test_request_serialization() -> anyhow::Result<()> {
        let message = WorkerRequest {
            text: "hi",
            language: "en",
            reference: Some(Path::new("voices/alice/processed/combined.wav")),
            output: Path::new("output.wav"),
            settings: SynthesisSettings::default(),
        };
        let json: serde_json::Value = serde_json::to_value(&message)?;
        assert_eq!(json["reference"], "voices/alice/processed/combined.wav");
        assert_eq!(json["settings"]["do_sample"], true);
        assert!((json["settings"]["repetition_penalty"].as_f64().unwrap() - 1.2).abs() < 1e-6);
        Ok(())
    }
}
