//! Voice Clone - manage voice profiles and speak with cloned voices.
//!
//! Keeps named voice profiles on disk, records reference audio from the
//! microphone, refines the recordings into one clean reference clip
//! (silence-trimmed and joined with short pauses), and synthesizes speech
//! in the cloned voice with XTTS v2.

mod audio;
mod commands;
mod config;
mod error;
mod tts;
mod voices;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use config::Cli;
use error::VoiceError;
use voices::sanitize;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if cli.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    debug!("Voice Clone v{} (voices in {})", env!("CARGO_PKG_VERSION"), cli.voices_dir.display());

    if let Err(e) = commands::run(&cli) {
        error!("❌ {}", e);
        if let Some(hint) = hint(&e, &cli) {
            error!("   {}", hint);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Follow-up advice for errors the user can fix directly.
fn hint(err: &VoiceError, cli: &Cli) -> Option<String> {
    match err {
        VoiceError::NotFound(_) => Some("Create it first with 'new <name>', or run 'list' to see existing voices.".to_string()),
        VoiceError::Empty(voice) | VoiceError::NoReference(voice) => Some(format!(
            "Record audio with 'record {}', or add .wav files to {}",
            voice,
            cli.voices_dir.join(sanitize(voice)).join("audio").display()
        )),
        VoiceError::Capture(_) => Some("Run 'devices' to check the available input devices.".to_string()),
        _ => None,
    }
}
