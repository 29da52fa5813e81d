//! Filesystem-backed store of voice profiles.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<id>/metadata.json
//! <root>/<id>/audio/recording_<n>.wav
//! <root>/<id>/processed/combined.wav
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::profile::{VoiceProfile, sanitize};
use crate::audio::refine::{self, RefineOptions, RefineReport};
use crate::error::{Result, VoiceError};

const METADATA_FILE: &str = "metadata.json";
const AUDIO_DIR: &str = "audio";
const PROCESSED_DIR: &str = "processed";
const COMBINED_FILE: &str = "combined.wav";

/// Voice profiles rooted at a single directory.
#[derive(Debug, Clone)]
pub struct VoiceStore {
    root: PathBuf,
}

impl VoiceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new profile with empty audio directories.
    ///
    /// # Errors
    /// - `InvalidName` if the name sanitizes to nothing
    /// - `AlreadyExists` if a profile with the same id exists, even when the
    ///   display names differ
    pub fn create(&self, name: &str, description: &str) -> Result<VoiceProfile> {
        let profile = VoiceProfile::new(name, description);
        if profile.id.is_empty() {
            return Err(VoiceError::InvalidName(name.to_string()));
        }

        let voice_dir = self.root.join(&profile.id);
        if voice_dir.exists() {
            return Err(VoiceError::AlreadyExists { name: name.to_string(), id: profile.id });
        }

        fs::create_dir_all(voice_dir.join(AUDIO_DIR))?;
        fs::create_dir_all(voice_dir.join(PROCESSED_DIR))?;
        write_metadata(&voice_dir.join(METADATA_FILE), &profile)?;

        info!("✓ Voice profile '{}' created at {}", name, voice_dir.display());
        Ok(profile)
    }

    /// Resolve a display name or id to its profile directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let id = sanitize(name);
        let path = self.root.join(&id);
        if id.is_empty() || !path.is_dir() {
            return Err(VoiceError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Path for the next raw recording: `audio/recording_{count + 1}.wav`.
    ///
    /// `count` is the number of WAV files present right now, so deleting a
    /// recording can make the next name reuse an existing number.
    pub fn next_recording_path(&self, name: &str) -> Result<PathBuf> {
        let audio_dir = self.resolve(name)?.join(AUDIO_DIR);
        let count = wav_files(&audio_dir)?.len();
        Ok(audio_dir.join(format!("recording_{}.wav", count + 1)))
    }

    /// Raw recordings of a profile sorted by file name.
    ///
    /// The sort is plain string order, so `recording_10.wav` comes before
    /// `recording_2.wav`.
    pub fn raw_recordings(&self, name: &str) -> Result<Vec<PathBuf>> {
        let audio_dir = self.resolve(name)?.join(AUDIO_DIR);
        let mut files = wav_files(&audio_dir)?;
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Where the refined reference clip of a profile lives.
    pub fn combined_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.resolve(name)?.join(PROCESSED_DIR).join(COMBINED_FILE))
    }

    /// Best audio to condition synthesis on: the refined clip, else the first
    /// raw recording by file name, else nothing.
    pub fn best_reference_audio(&self, name: &str) -> Option<PathBuf> {
        let combined = self.combined_path(name).ok()?;
        if combined.is_file() {
            return Some(combined);
        }

        match self.raw_recordings(name) {
            Ok(recordings) => recordings.into_iter().next(),
            Err(e) => {
                warn!("Could not list recordings for '{}': {}", name, e);
                None
            }
        }
    }

    /// All readable profiles, sorted by id.
    ///
    /// Directories without metadata are ignored; unreadable metadata is
    /// logged and skipped.
    pub fn list(&self) -> Result<Vec<VoiceProfile>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut voices = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let voice_dir = entry?.path();
            let metadata_path = voice_dir.join(METADATA_FILE);
            if !voice_dir.is_dir() || !metadata_path.is_file() {
                continue;
            }

            match read_metadata(&metadata_path) {
                Ok(profile) => voices.push(profile),
                Err(e) => warn!("Could not read metadata for {}: {}", voice_dir.display(), e),
            }
        }

        voices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(voices)
    }

    /// Merge a profile's raw recordings into `processed/combined.wav`.
    ///
    /// # Errors
    /// - `NotFound` for an unknown voice
    /// - `Empty` when there is nothing to merge
    /// - `Wav`/`Io`/`Resample` from decoding or writing; no output is left behind
    pub fn refine(&self, name: &str, options: &RefineOptions) -> Result<RefineReport> {
        let recordings = self.raw_recordings(name)?;
        let Some((first, rest)) = recordings.split_first() else {
            return Err(VoiceError::Empty(name.to_string()));
        };

        let output = self.combined_path(name)?;
        if let Some(processed_dir) = output.parent() {
            fs::create_dir_all(processed_dir)?;
        }

        debug!("Refining {} recordings for '{}'", recordings.len(), name);
        refine::refine_recordings(first, rest, &output, options)
    }
}

/// `*.wav` files directly inside `dir`; a missing directory has none.
fn wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "wav") {
            files.push(path);
        }
    }
    Ok(files)
}

fn read_metadata(path: &Path) -> Result<VoiceProfile> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write metadata as 4-space indented JSON.
fn write_metadata(path: &Path, profile: &VoiceProfile) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    profile.serialize(&mut serializer)?;
    fs::write(path, buf)?;
    Ok(())
}
