//! Prolix Store — SQLite definitions table plus the word index.

pub mod schema;
pub mod sqlite;
pub mod types;
pub mod validate;

pub use sqlite::{SqliteStore, StoreTx};
pub use types::*;
pub use validate::{validate, ValidationReport};
