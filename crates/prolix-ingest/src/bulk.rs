//! Bulk load: two delimited record streams → definitions + word index.
//!
//! Definitions carry a header `id,headword,text`; the word index carries
//! `word,definition_id,frequency`. The whole load runs in one transaction,
//! so a bad row leaves the store exactly as it was.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use prolix_core::{Error, Result};
use prolix_store::schema::meta_keys;
use prolix_store::{IndexEntry, SqliteStore};

#[derive(Debug, Deserialize)]
struct DefinitionRecord {
    id: i64,
    headword: String,
    text: String,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub definitions: usize,
    pub index_entries: usize,
    pub source: String,
    pub elapsed_ms: u128,
}

/// Loads delimited definition and index records into a writable store.
pub struct BulkLoader<'a> {
    store: &'a SqliteStore,
    delimiter: Option<u8>,
    title: Option<String>,
}

impl<'a> BulkLoader<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self {
            store,
            delimiter: None,
            title: None,
        }
    }

    /// Force a field delimiter. By default `.tsv` files use tabs, everything
    /// else commas.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Record a dataset title in the store's metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Load both tables from files.
    pub fn load_csv(&self, definitions: &Path, index: &Path) -> Result<LoadReport> {
        let defs_file = open_input(definitions)?;
        let index_file = open_input(index)?;
        let source = format!("{} + {}", definitions.display(), index.display());
        self.load(
            defs_file,
            self.delimiter_for(definitions),
            index_file,
            self.delimiter_for(index),
            &source,
        )
    }

    /// Load both tables from in-memory or streamed sources.
    pub fn load_readers<D: Read, I: Read>(
        &self,
        definitions: D,
        index: I,
        source: &str,
    ) -> Result<LoadReport> {
        let delimiter = self.delimiter.unwrap_or(b',');
        self.load(definitions, delimiter, index, delimiter, source)
    }

    fn load<D: Read, I: Read>(
        &self,
        definitions: D,
        defs_delimiter: u8,
        index: I,
        index_delimiter: u8,
        source: &str,
    ) -> Result<LoadReport> {
        let started = Instant::now();
        let mut defs_reader = reader(definitions, defs_delimiter);
        let mut index_reader = reader(index, index_delimiter);

        let (definitions, index_entries) = self.store.transaction(|tx| {
            let mut definitions = 0usize;
            for (i, record) in defs_reader.deserialize::<DefinitionRecord>().enumerate() {
                let row = i + 1;
                let record = record
                    .map_err(|e| Error::Import(format!("definitions row {}: {}", row, e)))?;
                tx.add_definition_with_id(record.id, &record.headword, &record.text)
                    .map_err(|e| at_row("definitions", row, e))?;
                definitions += 1;
            }
            debug!("Inserted {} definitions", definitions);

            let mut index_entries = 0usize;
            for (i, record) in index_reader.deserialize::<IndexEntry>().enumerate() {
                let row = i + 1;
                let record =
                    record.map_err(|e| Error::Import(format!("index row {}: {}", row, e)))?;
                tx.add_index_entry(&record.word, record.definition_id, record.frequency)
                    .map_err(|e| at_row("index", row, e))?;
                index_entries += 1;
            }
            debug!("Inserted {} index entries", index_entries);

            tx.set_meta(meta_keys::SOURCE, source)?;
            tx.set_meta(meta_keys::LOADED_AT, &chrono::Utc::now().to_rfc3339())?;
            if let Some(title) = &self.title {
                tx.set_meta(meta_keys::TITLE, title)?;
            }
            Ok((definitions, index_entries))
        })?;

        let report = LoadReport {
            definitions,
            index_entries,
            source: source.to_string(),
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            "Loaded {} definitions and {} index entries from {} in {}ms",
            report.definitions, report.index_entries, report.source, report.elapsed_ms
        );
        Ok(report)
    }

    fn delimiter_for(&self, path: &Path) -> u8 {
        if let Some(d) = self.delimiter {
            return d;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        }
    }
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path)
        .map_err(|e| Error::Import(format!("cannot open {}: {}", path.display(), e)))
}

fn reader<R: Read>(input: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .from_reader(input)
}

fn at_row(table: &str, row: usize, e: Error) -> Error {
    match e {
        Error::Import(msg) => Error::Import(format!("{} row {}: {}", table, row, msg)),
        other => other,
    }
}
