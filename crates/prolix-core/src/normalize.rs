//! Query validation and word-form expansion.
//!
//! Every query is trimmed, then checked against the word constraints of the
//! source dictionary format. The case policy decides which stored forms a
//! query may match.

use crate::config::CasePolicy;
use crate::error::{Error, Result};

/// Stored words are shorter than 256 bytes.
pub const MAX_WORD_BYTES: usize = 255;

/// A validated query and the stored word forms it should match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryForms {
    /// The query after trimming.
    pub query: String,
    /// Distinct forms to match, in probe order.
    pub forms: Vec<String>,
}

/// Why `word` can never be looked up, or `None` if a query can reach it.
///
/// Queries are trimmed before this check, so only stored words can fail on
/// surrounding whitespace.
pub fn word_problem(word: &str) -> Option<String> {
    if word.is_empty() {
        return Some("is empty".into());
    }
    if word.len() > MAX_WORD_BYTES {
        return Some(format!("is {} bytes, longer than {}", word.len(), MAX_WORD_BYTES));
    }
    if let Some(c) = word.chars().find(|c| c.is_control()) {
        return Some(format!("contains control character U+{:04X}", c as u32));
    }
    if word.trim() != word {
        return Some("has leading or trailing whitespace".into());
    }
    None
}

/// Validate a raw query and expand it into the forms to look up.
pub fn normalize_query(raw: &str, policy: CasePolicy) -> Result<QueryForms> {
    let query = raw.trim();
    if let Some(problem) = word_problem(query) {
        return Err(Error::InvalidQuery(format!("query {}", problem)));
    }

    let mut forms = vec![];
    match policy {
        CasePolicy::Exact => forms.push(query.to_string()),
        CasePolicy::Folded => {
            for form in [capitalize(query), query.to_lowercase()] {
                if !forms.contains(&form) {
                    forms.push(form);
                }
            }
        }
    }

    Ok(QueryForms {
        query: query.to_string(),
        forms,
    })
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
