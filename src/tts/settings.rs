//! Generation parameters passed to the voice-cloning model.

use serde::Serialize;

use crate::error::{Result, VoiceError};

/// Sampling parameters for cloned speech.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SynthesisSettings {
    /// Lower is more stable, higher is more expressive (0.0-2.0).
    pub temperature: f32,
    /// Values above 1.0 discourage the model from looping.
    pub repetition_penalty: f32,
    /// Speaking rate multiplier; 1.0 is the model's natural pace.
    pub speed: f32,
    pub do_sample: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self { temperature: 0.7, repetition_penalty: 1.2, speed: 0.9, do_sample: true }
    }
}

impl SynthesisSettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(VoiceError::Config(format!("temperature must be between 0.0 and 2.0, got {}", self.temperature)));
        }
        if !(self.repetition_penalty > 0.0) {
            return Err(VoiceError::Config(format!("repetition penalty must be positive, got {}", self.repetition_penalty)));
        }
        if !(self.speed > 0.0) {
            return Err(VoiceError::Config(format!("speed must be positive, got {}", self.speed)));
        }
        Ok(())
    }
}
