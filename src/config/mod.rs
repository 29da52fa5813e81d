//! Configuration module for the voice cloning tool.
//!
//! Provides CLI argument parsing and the supported-language table.

#[allow(clippy::module_inception)]
mod config;
mod languages;

pub use config::{Cli, Command, ComputeDevice, SynthesisConfig};
pub use languages::{get_language, print_languages};
