//! Text normalization and identifier helpers.
//!
//! Embedding cache keys and document identifiers both hash normalized text,
//! so the normalization rules live here in one place: identical inputs must
//! always produce identical keys, regardless of which crate computed them.

/// Normalize text for hashing: trim surrounding whitespace and lowercase.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Normalize a language code: trim surrounding whitespace and lowercase.
///
/// Language codes are matched case-insensitively everywhere (registry
/// lookups, cache keys, document IDs), so `"EN"`, `" en "`, and `"en"` all
/// refer to the same language.
pub fn normalize_language(language: &str) -> String {
    language.trim().to_lowercase()
}

/// First 12 hex characters of the BLAKE3 hash of `input`.
pub fn short_hash(input: &str) -> String {
    let hash = blake3::hash(input.as_bytes());
    hash.to_hex()[..12].to_string()
}

/// Deterministic document identifier: `doc_{language}_{hash12}`.
///
/// The hash covers the normalized text, so re-ingesting the same text in
/// the same language yields the same identifier and replaces the earlier
/// document instead of duplicating it.
///
/// # Example
///
/// ```
/// use sakbe_core::util::ids::document_id;
///
/// let id = document_id("Water", "en");
/// assert!(id.starts_with("doc_en_"));
/// assert_eq!(id, document_id("  water  ", "EN"));
/// ```
pub fn document_id(text: &str, language: &str) -> String {
    format!(
        "doc_{}_{}",
        normalize_language(language),
        short_hash(&normalize_text(text))
    )
}
