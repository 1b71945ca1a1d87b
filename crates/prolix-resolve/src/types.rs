//! Resolver types.

use serde::Serialize;

pub use prolix_store::Resolution;

/// A prefix completion candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub word: String,
    pub frequency: i64,
    /// 1.0 for the prefix itself, otherwise the candidate's share of the
    /// total frequency across all candidates.
    pub score: f64,
}

/// Result of a lookup, as rendered by front ends.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub query: String,
    pub definitions: Vec<Resolution>,
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
