//! Prolix Ingest — one-shot bulk load of a dictionary data file.

pub mod bulk;

pub use bulk::{BulkLoader, LoadReport};
