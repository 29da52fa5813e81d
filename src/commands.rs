//! One function per CLI command.
//!
//! Every command works on an explicit `VoiceStore` and reports failures as a
//! `VoiceError`; rendering them for the user is left to `main`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::audio::capture::list_input_devices;
use crate::audio::{MicrophoneRecorder, Recorder, RefineOptions, RefineReport};
use crate::config::{Cli, Command, print_languages};
use crate::error::{Result, VoiceError};
use crate::tts::{SpeechSynthesizer, SynthesisRequest, XttsSynthesizer};
use crate::voices::{VoiceProfile, VoiceStore};

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let store = VoiceStore::new(&cli.voices_dir);
    let refine_options = RefineOptions::default();
    debug!("Using voice store at {}", store.root().display());

    match &cli.command {
        Command::New { name, desc } => {
            new_voice(&store, name, desc)?;
        }
        Command::Record { voice, duration } => {
            let mut recorder = MicrophoneRecorder::new();
            record(&store, voice, Duration::from_secs(*duration), &mut recorder, &refine_options)?;
        }
        Command::Refine { voice } => {
            refine(&store, voice, &refine_options)?;
        }
        Command::List => {
            list(&store)?;
        }
        Command::Speak { voice, text, lang, out, synthesis } => {
            if cli.verbose {
                synthesis.log_config();
            }
            let mut synthesizer = XttsSynthesizer::new(synthesis)?;
            speak(&store, voice, text, lang, out, &mut synthesizer)?;
        }
        Command::Devices => {
            list_input_devices().map_err(|e| VoiceError::Capture(format!("{:#}", e)))?;
        }
        Command::Languages => print_languages(),
    }

    Ok(())
}

/// `new <name> [--desc]`
pub fn new_voice(store: &VoiceStore, name: &str, description: &str) -> Result<VoiceProfile> {
    store.create(name, description)
}

/// `record <voice> [--duration]`: capture a new raw recording, then refine.
pub fn record(store: &VoiceStore, voice: &str, duration: Duration, recorder: &mut dyn Recorder, options: &RefineOptions) -> Result<RefineReport> {
    let output = store.next_recording_path(voice)?;

    recorder.record(duration, &output).map_err(|e| VoiceError::Capture(format!("{:#}", e)))?;

    store.refine(voice, options)
}

/// `refine <voice>`
pub fn refine(store: &VoiceStore, voice: &str, options: &RefineOptions) -> Result<RefineReport> {
    store.refine(voice, options)
}

/// `list`: print the profiles as a table and return them.
pub fn list(store: &VoiceStore) -> Result<Vec<VoiceProfile>> {
    let voices = store.list()?;

    if voices.is_empty() {
        println!("No voices found. Create one with 'new <name>'");
    } else {
        println!("\nAvailable Voices:");
        println!("{:<20} {:<20} {}", "Name", "ID", "Description");
        println!("{}", "-".repeat(60));
        for voice in &voices {
            println!("{:<20} {:<20} {}", voice.name, voice.id, voice.description);
        }
        println!("{}", "-".repeat(60));
    }

    Ok(voices)
}

/// `speak <voice> <text> [--lang] [--out]`: synthesize with the voice's best reference.
///
/// # Errors
/// - `NotFound` for an unknown voice
/// - `NoReference` when the voice has neither a refined clip nor recordings
/// - `Synthesis` for anything the model rejects
pub fn speak(store: &VoiceStore, voice: &str, text: &str, language: &str, output: &Path, synthesizer: &mut dyn SpeechSynthesizer) -> Result<PathBuf> {
    store.resolve(voice)?;
    let reference = store.best_reference_audio(voice).ok_or_else(|| VoiceError::NoReference(voice.to_string()))?;

    let request = SynthesisRequest { text, language, reference: Some(&reference), output };
    let written = synthesizer.synthesize(&request)?;

    info!("✓ Generated audio: {}", written.display());
    Ok(written)
}
