//! Prolix Core — error taxonomy, configuration, query normalization.

pub mod config;
pub mod error;
pub mod normalize;

pub use config::{CasePolicy, DictConfig};
pub use error::{Error, Result};
pub use normalize::{capitalize, normalize_query, word_problem, QueryForms, MAX_WORD_BYTES};
