//! String helpers shared across the pipeline.
//!
//! Question normalization and fingerprinting live here because every
//! component that touches the cache must agree on them exactly.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse internal whitespace runs to single spaces and trim the ends.
///
/// Idempotent: `normalize_question(normalize_question(x)) == normalize_question(x)`.
pub fn normalize_question(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_string()
}

/// Stable cache fingerprint of a question.
///
/// Hashes the full lowercased normalized text, so long questions that
/// differ only near the end still get distinct keys.
pub fn fingerprint(text: &str) -> String {
    let mut h = DefaultHasher::new();
    normalize_question(text).to_lowercase().hash(&mut h);
    format!("{:x}", h.finish())
}

/// String cleanup extension trait
pub trait StringExt {
    /// Trim and return None when the result is empty
    fn clean(&self) -> Option<String>;

    /// Trim leading and trailing whitespace
    fn trimmed(&self) -> String;
}

impl StringExt for str {
    #[inline]
    fn clean(&self) -> Option<String> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    #[inline]
    fn trimmed(&self) -> String {
        self.trim().to_string()
    }
}

impl StringExt for String {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_str().clean()
    }

    #[inline]
    fn trimmed(&self) -> String {
        self.as_str().trimmed()
    }
}

impl<T: AsRef<str>> StringExt for Option<T> {
    #[inline]
    fn clean(&self) -> Option<String> {
        self.as_ref().and_then(|s| s.as_ref().clean())
    }

    #[inline]
    fn trimmed(&self) -> String {
        self.as_ref()
            .map(|s| s.as_ref().trim().to_string())
            .unwrap_or_default()
    }
}
