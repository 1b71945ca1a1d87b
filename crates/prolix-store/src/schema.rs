//! Database schema SQL for published dictionary files.
//!
//! Logical names map onto the physical columns as:
//! Definition(id, headword, text) = definitions(definition_id, word, definition),
//! IndexEntry(word, definition_id, frequency) = word_index(word, definition_id, frequency).

/// Definitions and the many-to-many word index.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS definitions (
    definition_id INTEGER PRIMARY KEY,
    word TEXT NOT NULL,
    definition TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS word_index (
    word TEXT NOT NULL,
    definition_id INTEGER NOT NULL,
    frequency INTEGER NOT NULL,
    PRIMARY KEY (word, definition_id),
    FOREIGN KEY (definition_id) REFERENCES definitions(definition_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_word ON definitions(word);
"#;

/// Dataset metadata (title, source, load time).
pub const META_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Tables and columns a data file must have to be queried.
pub const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("definitions", &["definition_id", "word", "definition"]),
    ("word_index", &["word", "definition_id", "frequency"]),
];

/// Well-known `meta` keys.
pub mod meta_keys {
    pub const TITLE: &str = "title";
    pub const SOURCE: &str = "source";
    pub const LOADED_AT: &str = "loaded_at";
}
