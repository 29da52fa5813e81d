//! Audio handling: WAV I/O, resampling, reference refinement and microphone capture.
//!
//! Capture uses cpal, resampling uses rubato, and WAV files go through hound.

pub mod capture;
pub mod refine;
pub mod resampler;
pub mod util;
pub mod wav;

pub use capture::{MicrophoneRecorder, Recorder};
pub use refine::{RefineOptions, RefineReport};
