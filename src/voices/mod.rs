//! Voice profiles: metadata, name sanitization and the on-disk store.

mod profile;
mod store;

pub use profile::{VoiceProfile, sanitize};
pub use store::VoiceStore;
