//! Text-to-speech through an external voice-cloning model.
//!
//! Provides the `SpeechSynthesizer` seam and its XTTS v2 backend.

mod settings;
mod synthesizer;

pub use settings::SynthesisSettings;
pub use synthesizer::{DEFAULT_MODEL, SpeechSynthesizer, SynthesisRequest, XttsSynthesizer};
