//! Search query model.

use serde::{Deserialize, Serialize};

/// A validated, normalized subject query
///
/// The catalog addresses subjects by lower-case names with underscores in
/// place of spaces, so `"  Science Fiction  "` becomes `science_fiction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Input as typed, trimmed
    pub raw: String,

    /// Lower-cased, whitespace runs collapsed to `_`
    pub normalized: String,
}

impl SearchQuery {
    /// Validate and normalize user input
    ///
    /// Returns `None` when the input is empty or whitespace only.
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return None;
        }

        let normalized = raw
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");

        Some(Self {
            raw: raw.to_string(),
            normalized,
        })
    }

    /// The normalized subject, percent-encoded for use as a path segment
    pub fn path_segment(&self) -> String {
        urlencoding::encode(&self.normalized).into_owned()
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
