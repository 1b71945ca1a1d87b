//! Resolution service — turns a typed word into its ranked definitions.
//!
//! The resolver owns the opened store; callers hold a `Resolver` rather than
//! reaching for a process-wide handle.

pub mod resolver;
pub mod types;
pub mod xref;

pub use resolver::Resolver;
pub use types::*;
pub use xref::{cross_references, word_at};
