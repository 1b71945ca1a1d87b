//! Data file validation, run before a dictionary file is served.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::{error, info};

use crate::schema::REQUIRED_COLUMNS;

/// Result of checking a data file.
#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub db_valid: bool,
    pub definitions: i64,
    pub index_entries: i64,
    pub distinct_words: i64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate that `db_path` holds a queryable dictionary.
pub fn validate(db_path: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !db_path.is_file() {
        report
            .errors
            .push(format!("Data file not found: {}", db_path.display()));
        return report;
    }

    let conn = match Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Failed to open data file: {}", e));
            return report;
        }
    };

    match schema_problems(&conn) {
        Ok(problems) => report.errors.extend(problems),
        Err(e) => report.errors.push(format!("Failed to read schema: {}", e)),
    }
    if !report.errors.is_empty() {
        error!(
            "Validation failed for {}: {} errors",
            db_path.display(),
            report.errors.len()
        );
        return report;
    }

    report.db_valid = true;
    report.definitions = count(&conn, "SELECT COUNT(*) FROM definitions").unwrap_or(0);
    report.index_entries = count(&conn, "SELECT COUNT(*) FROM word_index").unwrap_or(0);
    report.distinct_words =
        count(&conn, "SELECT COUNT(DISTINCT word) FROM word_index").unwrap_or(0);

    if !table_exists(&conn, "meta").unwrap_or(false) {
        report
            .warnings
            .push("No meta table (title and load time unknown)".to_string());
    }
    if !index_exists(&conn, "idx_word").unwrap_or(false) {
        report
            .warnings
            .push("Missing index idx_word on definitions(word)".to_string());
    }

    let dangling = count(
        &conn,
        "SELECT COUNT(*) FROM word_index w \
         LEFT JOIN definitions d ON d.definition_id = w.definition_id \
         WHERE d.definition_id IS NULL",
    )
    .unwrap_or(0);
    if dangling > 0 {
        report.warnings.push(format!(
            "{} index entries reference missing definitions",
            dangling
        ));
    }

    let negative = count(&conn, "SELECT COUNT(*) FROM word_index WHERE frequency < 0").unwrap_or(0);
    if negative > 0 {
        report
            .warnings
            .push(format!("{} index entries have negative frequency", negative));
    }

    let empty = count(
        &conn,
        "SELECT COUNT(*) FROM definitions WHERE trim(definition) = ''",
    )
    .unwrap_or(0);
    if empty > 0 {
        report
            .warnings
            .push(format!("{} definitions have empty text", empty));
    }

    if report.index_entries == 0 {
        report
            .warnings
            .push("Word index is empty; every lookup will come back empty".to_string());
    }

    info!(
        "Validated {}: {} definitions, {} index entries",
        db_path.display(),
        report.definitions,
        report.index_entries
    );
    report
}

/// Missing tables or columns, one message each.
pub(crate) fn schema_problems(conn: &Connection) -> Result<Vec<String>, rusqlite::Error> {
    let mut problems = Vec::new();
    for (table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            problems.push(format!("Missing required table: {}", table));
            continue;
        }
        let present = column_names(conn, table)?;
        for col in columns.iter() {
            if !present.iter().any(|c| c == col) {
                problems.push(format!("{} table missing column: {}", table, col));
            }
        }
    }
    Ok(problems)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn index_exists(conn: &Connection, index: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?1",
        [index],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn count(conn: &Connection, sql: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(sql, [], |row| row.get(0))
}
