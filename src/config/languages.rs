//! Languages understood by the XTTS v2 model.

/// A language XTTS v2 can speak.
#[derive(Debug, Clone, Copy)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Sorted by code for binary search.
const LANGUAGES: &[Language] = &[
    Language { code: "ar", name: "Arabic" },
    Language { code: "cs", name: "Czech" },
    Language { code: "de", name: "German" },
    Language { code: "en", name: "English" },
    Language { code: "es", name: "Spanish" },
    Language { code: "fr", name: "French" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "hu", name: "Hungarian" },
    Language { code: "it", name: "Italian" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "nl", name: "Dutch" },
    Language { code: "pl", name: "Polish" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "ru", name: "Russian" },
    Language { code: "tr", name: "Turkish" },
    Language { code: "zh-cn", name: "Chinese (Mandarin)" },
];

/// Look up a language by its code.
pub fn get_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.binary_search_by_key(&code, |l| l.code).ok().map(|idx| &LANGUAGES[idx])
}

/// Print all supported languages.
pub fn print_languages() {
    println!("\nXTTS v2 languages:");
    println!("{:<8} {}", "CODE", "LANGUAGE");
    println!("{}", "-".repeat(30));
    for language in LANGUAGES {
        println!("{:<8} {}", language.code, language.name);
    }
    println!("{}", "-".repeat(30));
    println!("Usage: voice-clone speak <voice> \"Hola\" --lang es");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(LANGUAGES.windows(2).all(|w| w[0].code < w[1].code));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(get_language("en").map(|l| l.name), Some("English"));
        assert_eq!(get_language("zh-cn").map(|l| l.name), Some("Chinese (Mandarin)"));
        assert!(get_language("xx").is_none());
        assert!(get_language("EN").is_none());
    }
}
