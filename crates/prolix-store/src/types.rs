//! Data types for definitions, index entries, and lookup results.

use serde::{Deserialize, Serialize};

/// A definitions row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub id: i64,
    /// The word this definition was authored under.
    pub headword: String,
    pub text: String,
}

/// A word_index row: one queryable word form pointing at one definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub word: String,
    pub definition_id: i64,
    pub frequency: i64,
}

/// One resolved sense for a looked-up word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The stored word form that matched the query.
    pub matched_word: String,
    pub definition_id: i64,
    pub headword: String,
    pub text: String,
    pub frequency: i64,
}

/// A distinct word form with its highest index frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub frequency: i64,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub definitions: i64,
    pub index_entries: i64,
    pub distinct_words: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    pub db_size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<String>,
}
