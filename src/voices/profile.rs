//! Voice profile metadata and name sanitization.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use unicode_general_category::{GeneralCategory, get_general_category};

/// Target model tag written into every new profile.
pub const BASE_MODEL: &str = "xtts_v2";

/// Contents of `<voices>/<id>/metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub name: String,
    pub id: String,
    pub description: String,
    pub created_at: String,
    pub base_model: String,
}

impl VoiceProfile {
    /// Build the metadata for a freshly created profile.
    pub fn new(name: &str, description: &str) -> Self {
        let created_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

        Self {
            name: name.to_string(),
            id: sanitize(name),
            description: description.to_string(),
            created_at,
            base_model: BASE_MODEL.to_string(),
        }
    }
}

/// Convert a display name into a filesystem-safe id.
///
/// Lower-cases the name and keeps only letters, numerics, `_` and `-`.
/// Everything else, spaces and combining marks included, is dropped.
pub fn sanitize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|&c| is_id_char(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Letters are the `L*` categories only; `char::is_alphabetic` would also
/// keep marks such as Devanagari vowel signs, changing existing ids.
fn is_id_char(c: char) -> bool {
    if c == '_' || c == '-' || c.is_numeric() {
        return true;
    }

    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
    )
}
