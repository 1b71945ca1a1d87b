//! SQLite-backed dictionary store.
//!
//! One connection per process, guarded by a mutex so the store can be shared
//! by reference. Query-time handles are opened read-only; writable handles
//! exist for the bulk loader and for tests.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use crate::schema::{meta_keys, META_SCHEMA_SQL, SCHEMA_SQL};
use crate::types::*;
use crate::validate::{schema_problems, table_exists};
use prolix_core::{word_problem, Error, Result};

/// SQLite store holding definitions and the word index.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open an existing data file for querying.
    ///
    /// Fails with `StorageUnavailable` when the file is missing, is not a
    /// SQLite database, or lacks the required tables and columns.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::StorageUnavailable(format!(
                "Data file not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            Error::StorageUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(storage)?;

        let problems = schema_problems(&conn).map_err(storage)?;
        if !problems.is_empty() {
            return Err(Error::StorageUnavailable(format!(
                "Schema mismatch in {}: {}",
                path.display(),
                problems.join("; ")
            )));
        }
        if !table_exists(&conn, "meta").map_err(storage)? {
            warn!("{} has no meta table; title and load time unknown", path.display());
        }

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.log_opened("read-only")?;
        Ok(store)
    }

    /// Open or create a writable data file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::StorageUnavailable(format!("Cannot create {}: {}", dir.display(), e))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            Error::StorageUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::configure_writable(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.log_opened("writable")?;
        Ok(store)
    }

    /// Writable store that lives only as long as the handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Self::configure_writable(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn configure_writable(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(storage)?;
        let full_schema = format!("{}\n{}", SCHEMA_SQL, META_SCHEMA_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::StorageUnavailable(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    fn log_opened(&self, mode: &str) -> Result<()> {
        let definitions = self.count_definitions()?;
        let entries = self.count_index_rows()?;
        info!(
            "Dictionary opened ({}): {} definitions, {} index entries, path={}",
            mode,
            definitions,
            entries,
            self.db_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".into())
        );
        Ok(())
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Run `f` inside one transaction. Any error rolls everything back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&StoreTx<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(storage)?;
        let out = f(&StoreTx { conn: &tx })?;
        tx.commit().map_err(storage)?;
        Ok(out)
    }

    /// Insert a definition with a storage-assigned id.
    pub fn add_definition(&self, headword: &str, text: &str) -> Result<i64> {
        self.transaction(|tx| tx.add_definition(headword, text))
    }

    /// Insert a definition under a caller-chosen id.
    pub fn add_definition_with_id(&self, id: i64, headword: &str, text: &str) -> Result<i64> {
        self.transaction(|tx| tx.add_definition_with_id(id, headword, text))
    }

    /// Map a word form to a definition.
    pub fn add_index_entry(&self, word: &str, definition_id: i64, frequency: i64) -> Result<()> {
        self.transaction(|tx| tx.add_index_entry(word, definition_id, frequency))
    }

    /// Set a metadata value.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.transaction(|tx| tx.set_meta(key, value))
    }

    /// Delete a definition. Its index entries go with it (cascade).
    pub fn delete_definition(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "DELETE FROM definitions WHERE definition_id = ?1",
                params![id],
            )
            .map_err(storage)?;
        if count > 0 {
            debug!("Deleted definition {}", id);
        }
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Get a definition by id.
    pub fn get_definition(&self, id: i64) -> Result<Option<Definition>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT definition_id, word, definition FROM definitions WHERE definition_id = ?1",
            )
            .map_err(storage)?
            .query_row(params![id], |row| {
                Ok(Definition {
                    id: row.get(0)?,
                    headword: row.get(1)?,
                    text: row.get(2)?,
                })
            })
            .optional()
            .map_err(storage)?;
        Ok(row)
    }

    /// All senses reachable from any of `forms`, most frequent first.
    ///
    /// Ties on frequency are broken by definition id, then by word form, so
    /// the order is fully determined by the stored rows.
    pub fn lookup_words(&self, forms: &[String]) -> Result<Vec<Resolution>> {
        if forms.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (1..=forms.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT w.word, w.definition_id, w.frequency, d.word, d.definition \
             FROM word_index w \
             JOIN definitions d ON d.definition_id = w.definition_id \
             WHERE w.word IN ({}) \
             ORDER BY w.frequency DESC, w.definition_id ASC, w.word ASC",
            placeholders.join(", ")
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql).map_err(storage)?;
        let rows = stmt
            .query_map(params_from_iter(forms.iter()), |row| {
                Ok(Resolution {
                    matched_word: row.get(0)?,
                    definition_id: row.get(1)?,
                    frequency: row.get(2)?,
                    headword: row.get(3)?,
                    text: row.get(4)?,
                })
            })
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }

    /// Distinct word forms starting with `prefix`, by highest frequency.
    ///
    /// `folded` makes the comparison ASCII case-insensitive.
    pub fn match_prefix(
        &self,
        prefix: &str,
        folded: bool,
        limit: usize,
    ) -> Result<Vec<WordFrequency>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let (sql, pattern) = if folded {
            (
                r"SELECT word, MAX(frequency) AS top_frequency FROM word_index
                  WHERE word LIKE ?1 ESCAPE '\'
                  GROUP BY word ORDER BY top_frequency DESC, word ASC LIMIT ?2",
                like_prefix(prefix),
            )
        } else {
            (
                "SELECT word, MAX(frequency) AS top_frequency FROM word_index
                  WHERE word GLOB ?1
                  GROUP BY word ORDER BY top_frequency DESC, word ASC LIMIT ?2",
                glob_prefix(prefix),
            )
        };

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql).map_err(storage)?;
        let rows = stmt
            .query_map(params![pattern, limit as i64], |row| {
                Ok(WordFrequency {
                    word: row.get(0)?,
                    frequency: row.get(1)?,
                })
            })
            .map_err(storage)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(storage)
    }

    /// Number of index entries stored for exactly `word`.
    pub fn count_index_entries(&self, word: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM word_index WHERE word = ?1",
            params![word],
            |row| row.get(0),
        )
        .map_err(storage)
    }

    /// Count definitions.
    pub fn count_definitions(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM definitions", [], |row| row.get(0))
            .map_err(storage)
    }

    /// Count word_index rows.
    pub fn count_index_rows(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM word_index", [], |row| row.get(0))
            .map_err(storage)
    }

    /// Get a metadata value. Files without a meta table have none.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        if !table_exists(&conn, "meta").map_err(storage)? {
            return Ok(None);
        }
        let value = conn
            .prepare_cached("SELECT value FROM meta WHERE key = ?1")
            .map_err(storage)?
            .query_row(params![key], |row| row.get(0))
            .optional()
            .map_err(storage)?;
        Ok(value)
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let definitions = self.count_definitions()?;
        let index_entries = self.count_index_rows()?;
        let distinct_words: i64 = {
            let conn = self.conn.lock();
            conn.query_row("SELECT COUNT(DISTINCT word) FROM word_index", [], |row| {
                row.get(0)
            })
            .map_err(storage)?
        };

        let db_size = self
            .db_path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            definitions,
            index_entries,
            distinct_words,
            db_path: self
                .db_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
            title: self.get_meta(meta_keys::TITLE)?,
            loaded_at: self.get_meta(meta_keys::LOADED_AT)?,
        })
    }
}

/// Write access inside a [`SqliteStore::transaction`].
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

impl StoreTx<'_> {
    /// Insert a definition with a storage-assigned id.
    pub fn add_definition(&self, headword: &str, text: &str) -> Result<i64> {
        insert_definition(self.conn, None, headword, text)
    }

    /// Insert a definition under a caller-chosen id.
    pub fn add_definition_with_id(&self, id: i64, headword: &str, text: &str) -> Result<i64> {
        insert_definition(self.conn, Some(id), headword, text)
    }

    /// Map a word form to an existing definition.
    pub fn add_index_entry(&self, word: &str, definition_id: i64, frequency: i64) -> Result<()> {
        if let Some(problem) = word_problem(word) {
            return Err(Error::Import(format!(
                "word {:?} for definition {} {}",
                word, definition_id, problem
            )));
        }
        if frequency < 0 {
            return Err(Error::Import(format!(
                "negative frequency {} for '{}'",
                frequency, word
            )));
        }
        self.conn
            .prepare_cached(
                "INSERT INTO word_index (word, definition_id, frequency) VALUES (?1, ?2, ?3)",
            )
            .map_err(storage)?
            .execute(params![word, definition_id, frequency])
            .map_err(|e| {
                write_error(e, || {
                    format!("index entry ('{}', {})", word, definition_id)
                })
            })?;
        Ok(())
    }

    /// Set a metadata value, replacing any previous one.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)")
            .map_err(storage)?
            .execute(params![key, value])
            .map_err(storage)?;
        Ok(())
    }
}

fn insert_definition(
    conn: &Connection,
    id: Option<i64>,
    headword: &str,
    text: &str,
) -> Result<i64> {
    if text.trim().is_empty() {
        return Err(Error::Import(format!(
            "definition for '{}' has empty text",
            headword
        )));
    }
    conn.prepare_cached(
        "INSERT INTO definitions (definition_id, word, definition) VALUES (?1, ?2, ?3)",
    )
    .map_err(storage)?
    .insert(params![id, headword, text])
    .map_err(|e| write_error(e, || format!("definition '{}'", headword)))
}

fn storage(e: rusqlite::Error) -> Error {
    Error::StorageUnavailable(e.to_string())
}

/// Constraint violations are bad input, everything else is storage.
fn write_error(e: rusqlite::Error, what: impl FnOnce() -> String) -> Error {
    let msg = e.to_string();
    if msg.contains("constraint failed") {
        Error::Import(format!("{} rejected: {}", what(), msg))
    } else {
        storage(e)
    }
}

fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn glob_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[') {
            pattern.push('[');
            pattern.push(c);
            pattern.push(']');
        } else {
            pattern.push(c);
        }
    }
    pattern.push('*');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("dict.db")).unwrap();
        (store, dir)
    }

    fn seed_bank(store: &SqliteStore) {
        store
            .add_definition_with_id(2, "Bank", "A mound, pile, or ridge of earth.")
            .unwrap();
        store
            .add_definition_with_id(3, "Bank", "An establishment for the custody of money.")
            .unwrap();
        store.add_index_entry("bank", 2, 7).unwrap();
        store.add_index_entry("bank", 3, 12).unwrap();
        store.add_index_entry("banker", 3, 4).unwrap();
    }

    #[test]
    fn test_add_and_get_definition() {
        let (store, _dir) = test_store();

        let id = store
            .add_definition("Cat", "A small domesticated feline.")
            .unwrap();

        let def = store.get_definition(id).unwrap().unwrap();
        assert_eq!(def.headword, "Cat");
        assert_eq!(def.text, "A small domesticated feline.");
        assert!(store.get_definition(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_lookup_orders_by_frequency_then_id() {
        let (store, _dir) = test_store();
        seed_bank(&store);

        let hits = store.lookup_words(&["bank".to_string()]).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.definition_id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(hits[0].matched_word, "bank");
        assert_eq!(hits[0].headword, "Bank");
    }

    #[test]
    fn test_lookup_tie_breaks_on_definition_id() {
        let (store, _dir) = test_store();
        store.add_definition_with_id(9, "Set", "To put.").unwrap();
        store.add_definition_with_id(4, "Set", "A group.").unwrap();
        store.add_index_entry("set", 9, 5).unwrap();
        store.add_index_entry("set", 4, 5).unwrap();

        let hits = store.lookup_words(&["set".to_string()]).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.definition_id).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn test_lookup_unknown_word_is_empty() {
        let (store, _dir) = test_store();
        seed_bank(&store);
        assert!(store.lookup_words(&["river".to_string()]).unwrap().is_empty());
        assert!(store.lookup_words(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_index_entry_rejected() {
        let (store, _dir) = test_store();
        seed_bank(&store);

        let result = store.add_index_entry("bank", 2, 1);
        assert!(matches!(result, Err(Error::Import(_))));
        assert_eq!(store.count_index_entries("bank").unwrap(), 2);
    }

    #[test]
    fn test_dangling_index_entry_rejected() {
        let (store, _dir) = test_store();
        let result = store.add_index_entry("ghost", 404, 1);
        assert!(matches!(result, Err(Error::Import(_))));
    }

    #[test]
    fn test_invalid_rows_rejected() {
        let (store, _dir) = test_store();
        assert!(matches!(
            store.add_definition("Void", "   "),
            Err(Error::Import(_))
        ));
        let id = store.add_definition("Cat", "A feline.").unwrap();
        assert!(matches!(
            store.add_index_entry("cat", id, -1),
            Err(Error::Import(_))
        ));
        assert!(matches!(
            store.add_index_entry("", id, 1),
            Err(Error::Import(_))
        ));
    }

    #[test]
    fn test_unreachable_words_rejected() {
        let (store, _dir) = test_store();
        let id = store.add_definition("Cat", "A feline.").unwrap();

        let long = "a".repeat(300);
        for word in [long.as_str(), " cat", "cat ", "ca\u{7}t", "cat\n"] {
            let result = store.add_index_entry(word, id, 1);
            assert!(
                matches!(result, Err(Error::Import(_))),
                "{:?} was accepted",
                word
            );
            assert_eq!(store.count_index_entries(word).unwrap(), 0);
        }

        let longest = "a".repeat(255);
        store.add_index_entry(&longest, id, 1).unwrap();
        store.add_index_entry("savings bank", id, 1).unwrap();
        assert_eq!(store.count_index_rows().unwrap(), 2);
    }

    #[test]
    fn test_delete_definition_cascades() {
        let (store, _dir) = test_store();
        seed_bank(&store);

        assert!(store.delete_definition(3).unwrap());
        assert!(store.get_definition(3).unwrap().is_none());
        assert_eq!(store.count_index_entries("banker").unwrap(), 0);
        assert_eq!(store.count_index_entries("bank").unwrap(), 1);
        assert!(!store.delete_definition(3).unwrap());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (store, _dir) = test_store();

        let result = store.transaction(|tx| {
            tx.add_definition_with_id(1, "Cat", "A feline.")?;
            tx.add_index_entry("cat", 1, 10)?;
            tx.add_index_entry("cat", 99, 1)
        });
        assert!(result.is_err());
        assert_eq!(store.count_definitions().unwrap(), 0);
        assert_eq!(store.count_index_rows().unwrap(), 0);
    }

    #[test]
    fn test_match_prefix() {
        let (store, _dir) = test_store();
        seed_bank(&store);
        store.add_definition_with_id(5, "Banquet", "A feast.").unwrap();
        store.add_index_entry("Banquet", 5, 20).unwrap();

        let exact = store.match_prefix("ban", false, 10).unwrap();
        let words: Vec<&str> = exact.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["bank", "banker"]);
        assert_eq!(exact[0].frequency, 12);

        let folded = store.match_prefix("BAN", true, 10).unwrap();
        let words: Vec<&str> = folded.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["Banquet", "bank", "banker"]);

        assert_eq!(store.match_prefix("ban", true, 1).unwrap().len(), 1);
        assert!(store.match_prefix("ban", true, 0).unwrap().is_empty());
    }

    #[test]
    fn test_match_prefix_escapes_wildcards() {
        let (store, _dir) = test_store();
        let id = store.add_definition("Percent", "Per hundred.").unwrap();
        store.add_index_entry("100%", id, 1).unwrap();
        store.add_index_entry("100x", id, 1).unwrap();
        store.add_index_entry("a*b", id, 1).unwrap();
        store.add_index_entry("axb", id, 1).unwrap();

        let folded = store.match_prefix("100%", true, 10).unwrap();
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].word, "100%");

        let exact = store.match_prefix("a*", false, 10).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].word, "a*b");
    }

    #[test]
    fn test_read_only_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dict.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            seed_bank(&store);
            store.set_meta(meta_keys::TITLE, "Test Dictionary").unwrap();
        }

        let store = SqliteStore::open_read_only(&path).unwrap();
        assert_eq!(store.lookup_words(&["bank".to_string()]).unwrap().len(), 2);
        assert!(matches!(
            store.add_definition("Cat", "A feline."),
            Err(Error::StorageUnavailable(_))
        ));

        let stats = store.stats().unwrap();
        assert_eq!(stats.definitions, 2);
        assert_eq!(stats.index_entries, 3);
        assert_eq!(stats.distinct_words, 2);
        assert_eq!(stats.title.as_deref(), Some("Test Dictionary"));
    }

    #[test]
    fn test_read_only_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = SqliteStore::open_read_only(dir.path().join("absent.db"));
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
    }

    #[test]
    fn test_read_only_rejects_garbage_and_wrong_schema() {
        let dir = TempDir::new().unwrap();

        let garbage = dir.path().join("garbage.db");
        std::fs::write(&garbage, b"this is definitely not sqlite, just some text").unwrap();
        assert!(matches!(
            SqliteStore::open_read_only(&garbage),
            Err(Error::StorageUnavailable(_))
        ));

        let other = dir.path().join("other.db");
        {
            let conn = Connection::open(&other).unwrap();
            conn.execute_batch("CREATE TABLE documents (id INTEGER PRIMARY KEY, text TEXT);")
                .unwrap();
        }
        match SqliteStore::open_read_only(&other) {
            Err(Error::StorageUnavailable(msg)) => assert!(msg.contains("definitions")),
            other => panic!("expected schema mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_meta_missing_table_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA_SQL).unwrap();
        }
        let store = SqliteStore::open_read_only(&path).unwrap();
        assert!(store.get_meta(meta_keys::TITLE).unwrap().is_none());
    }
}
