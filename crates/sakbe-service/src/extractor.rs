//! Cultural and phonetic tag extraction.
//!
//! The service stores whatever tags the configured extractor finds and later
//! boosts search hits whose tags overlap the query's. Extractors must be pure
//! functions of their inputs: the same text always yields the same tags, so
//! stored tags and query tags stay comparable across restarts.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Extracts cultural and phonetic tags from text.
///
/// Implementations must be deterministic and side-effect free.
pub trait TagExtractor: Send + Sync {
    /// Cultural tags for a text in the given language.
    fn cultural_tags(&self, text: &str, language: &str) -> BTreeSet<String>;

    /// Phonetic tags for a text, independent of language.
    fn phonetic_tags(&self, text: &str) -> BTreeSet<String>;

    /// Identifier for logs and stats.
    fn name(&self) -> &str;
}

// ============================================================================
// Mesoamerican extractor
// ============================================================================

/// Ceremonial vocabulary per language code.
const CEREMONIAL_TERMS: &[(&str, &[&str])] = &[
    ("yua", &["k'inich", "itzamna", "kukulkan", "chaac"]),
    ("quc", &["q'ij", "winal", "ajaw", "nawal"]),
    ("qu", &["inti", "pachamama", "apu", "ayni"]),
    ("nah", &["teotl", "tonalli", "tlamatiliztli", "nepantla"]),
];

static CALENDAR_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(k'in|q'ij|inti|tonalli|winal|tun)\b").expect("calendar pattern")
});

static SACRED_NUMBERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(4|9|13|20|52|260|365)\b").expect("sacred number pattern"));

static GLOTTAL_STOPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ʔ']").expect("glottal pattern"));

static EJECTIVES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[kptscx]'").expect("ejective pattern"));

static LONG_VOWELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[aeiouáéíóúàèìòù]{2,}").expect("long vowel pattern"));

static NASALIZATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ãĩũỹñ]").expect("nasalization pattern"));

/// Default extractor for Mesoamerican and Andean language corpora.
///
/// Cultural tags: each ceremonial term found in the text (lowercased, per
/// the document's language), `calendar_term` when a calendar word appears,
/// and `sacred_number` when a culturally significant number appears.
///
/// Phonetic tags are language-independent markers of the text's sound
/// structure: `glottal_stops`, `ejectives`, `long_vowels`, `nasalization`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MesoamericanTagExtractor;

impl MesoamericanTagExtractor {
    /// Create the extractor.
    pub fn new() -> Self {
        Self
    }
}

impl TagExtractor for MesoamericanTagExtractor {
    fn cultural_tags(&self, text: &str, language: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase();
        let language = language.trim().to_lowercase();
        let mut tags = BTreeSet::new();

        if let Some((_, terms)) = CEREMONIAL_TERMS.iter().find(|(code, _)| *code == language) {
            for term in *terms {
                if lowered.contains(term) {
                    tags.insert((*term).to_string());
                }
            }
        }

        if CALENDAR_TERMS.is_match(&lowered) {
            tags.insert("calendar_term".to_string());
        }
        if SACRED_NUMBERS.is_match(&lowered) {
            tags.insert("sacred_number".to_string());
        }

        tags
    }

    fn phonetic_tags(&self, text: &str) -> BTreeSet<String> {
        let lowered = text.to_lowercase();
        let mut tags = BTreeSet::new();

        if GLOTTAL_STOPS.is_match(&lowered) {
            tags.insert("glottal_stops".to_string());
        }
        if EJECTIVES.is_match(&lowered) {
            tags.insert("ejectives".to_string());
        }
        if LONG_VOWELS.is_match(&lowered) {
            tags.insert("long_vowels".to_string());
        }
        if NASALIZATION.is_match(&lowered) {
            tags.insert("nasalization".to_string());
        }

        tags
    }

    fn name(&self) -> &str {
        "mesoamerican"
    }
}

// ============================================================================
// Null extractor
// ============================================================================

/// An extractor that never produces tags.
///
/// Useful for corpora where cultural boosting is unwanted and for tests that
/// need ranking driven purely by similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTagExtractor;

impl NullTagExtractor {
    /// Create the extractor.
    pub fn new() -> Self {
        Self
    }
}

impl TagExtractor for NullTagExtractor {
    fn cultural_tags(&self, _text: &str, _language: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn phonetic_tags(&self, _text: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn name(&self) -> &str {
        "null"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    // ------------------------------------------------------------------------
    // Ceremonial term tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_ceremonial_terms_yucatec() {
        let extractor = MesoamericanTagExtractor::new();
        let found = extractor.cultural_tags("Chaac brings the rain", "yua");
        assert_eq!(tags(&found), vec!["chaac"]);
    }

    #[test]
    fn test_ceremonial_terms_are_language_scoped() {
        let extractor = MesoamericanTagExtractor::new();
        // "chaac" is a Yucatec term; in a Quechua text it is not tagged.
        let found = extractor.cultural_tags("chaac", "qu");
        assert!(found.is_empty());
    }

    #[test]
    fn test_ceremonial_terms_per_language() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(
            extractor
                .cultural_tags("nawal ceremony", "quc")
                .contains("nawal")
        );
        assert!(
            extractor
                .cultural_tags("Pachamama is honored", "qu")
                .contains("pachamama")
        );
        assert!(
            extractor
                .cultural_tags("teotl and tonalli", "nah")
                .contains("teotl")
        );
    }

    #[test]
    fn test_ceremonial_matching_is_case_insensitive() {
        let extractor = MesoamericanTagExtractor::new();
        let found = extractor.cultural_tags("KUKULKAN", "YUA");
        assert!(found.contains("kukulkan"));
    }

    #[test]
    fn test_multiple_ceremonial_terms() {
        let extractor = MesoamericanTagExtractor::new();
        let found = extractor.cultural_tags("itzamna and kukulkan and chaac", "yua");
        assert!(found.contains("itzamna"));
        assert!(found.contains("kukulkan"));
        assert!(found.contains("chaac"));
    }

    // ------------------------------------------------------------------------
    // Calendar and number tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_calendar_term_tag() {
        let extractor = MesoamericanTagExtractor::new();
        let found = extractor.cultural_tags("the k'in cycle begins", "yua");
        assert!(found.contains("calendar_term"));
    }

    #[test]
    fn test_calendar_term_any_language() {
        let extractor = MesoamericanTagExtractor::new();
        // Calendar vocabulary is tagged regardless of the document language.
        let found = extractor.cultural_tags("counting in tun units", "en");
        assert!(found.contains("calendar_term"));
    }

    #[test]
    fn test_calendar_term_respects_word_boundaries() {
        let extractor = MesoamericanTagExtractor::new();
        // "tuna" contains "tun" but is not a calendar word.
        let found = extractor.cultural_tags("eating tuna", "en");
        assert!(!found.contains("calendar_term"));
    }

    #[test]
    fn test_sacred_number_tag() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(
            extractor
                .cultural_tags("the 260 day count", "en")
                .contains("sacred_number")
        );
        assert!(
            extractor
                .cultural_tags("13 levels", "en")
                .contains("sacred_number")
        );
    }

    #[test]
    fn test_sacred_number_requires_exact_match() {
        let extractor = MesoamericanTagExtractor::new();
        // 130 and 2600 contain sacred digits but are not sacred numbers.
        assert!(extractor.cultural_tags("130 items", "en").is_empty());
        assert!(extractor.cultural_tags("2600 years", "en").is_empty());
    }

    #[test]
    fn test_plain_text_has_no_cultural_tags() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(extractor.cultural_tags("hello world", "en").is_empty());
    }

    // ------------------------------------------------------------------------
    // Phonetic tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_glottal_stops() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(extractor.phonetic_tags("ha'").contains("glottal_stops"));
        assert!(extractor.phonetic_tags("haʔ").contains("glottal_stops"));
    }

    #[test]
    fn test_ejectives() {
        let extractor = MesoamericanTagExtractor::new();
        let found = extractor.phonetic_tags("k'iche'");
        assert!(found.contains("ejectives"));
    }

    #[test]
    fn test_long_vowels() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(extractor.phonetic_tags("miil").contains("long_vowels"));
        assert!(extractor.phonetic_tags("náa").contains("long_vowels"));
        assert!(!extractor.phonetic_tags("mil").contains("long_vowels"));
    }

    #[test]
    fn test_nasalization() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(extractor.phonetic_tags("año").contains("nasalization"));
        assert!(extractor.phonetic_tags("pão").contains("nasalization"));
    }

    #[test]
    fn test_plain_text_has_no_phonetic_tags() {
        let extractor = MesoamericanTagExtractor::new();
        assert!(extractor.phonetic_tags("water").is_empty());
    }

    // ------------------------------------------------------------------------
    // Purity and trait tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = MesoamericanTagExtractor::new();
        let text = "chaac brings rain on the 13th k'in";
        assert_eq!(
            extractor.cultural_tags(text, "yua"),
            extractor.cultural_tags(text, "yua")
        );
        assert_eq!(extractor.phonetic_tags(text), extractor.phonetic_tags(text));
    }

    #[test]
    fn test_null_extractor_produces_nothing() {
        let extractor = NullTagExtractor::new();
        assert!(extractor.cultural_tags("chaac k'in 260", "yua").is_empty());
        assert!(extractor.phonetic_tags("ha' k'iche' ño").is_empty());
        assert_eq!(extractor.name(), "null");
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn TagExtractor) {}
        let _: Box<dyn TagExtractor> = Box::new(MesoamericanTagExtractor::new());
        let _: Box<dyn TagExtractor> = Box::new(NullTagExtractor::new());
    }
}
