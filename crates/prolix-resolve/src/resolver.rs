//! Exact word lookup and prefix suggestions over the word index.

use tracing::debug;

use crate::types::*;
use prolix_core::{normalize_query, CasePolicy, Result};
use prolix_store::SqliteStore;

/// Resolves query words against an owned dictionary store.
pub struct Resolver {
    store: SqliteStore,
    policy: CasePolicy,
}

impl Resolver {
    pub fn new(store: SqliteStore, policy: CasePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> CasePolicy {
        self.policy
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Every known definition for `query`, most frequent sense first.
    ///
    /// A word with no index entries yields an empty list, not an error.
    /// Empty or malformed input fails with `InvalidQuery`.
    pub fn lookup(&self, query: &str) -> Result<Vec<Resolution>> {
        let forms = normalize_query(query, self.policy)?;
        let hits = self.store.lookup_words(&forms.forms)?;
        debug!(
            "lookup '{}' ({} forms, policy={}): {} definitions",
            forms.query,
            forms.forms.len(),
            self.policy,
            hits.len()
        );
        Ok(hits)
    }

    /// [`lookup`](Self::lookup), keeping the trimmed query alongside.
    pub fn lookup_result(&self, query: &str) -> Result<LookupResult> {
        let definitions = self.lookup(query)?;
        Ok(LookupResult {
            query: query.trim().to_string(),
            definitions,
        })
    }

    /// Up to `limit` words starting with `prefix`, best candidates first.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let forms = normalize_query(prefix, self.policy)?;
        let prefix = forms.query;
        let folded = self.policy == CasePolicy::Folded;

        let candidates = self.store.match_prefix(&prefix, folded, limit)?;
        let total: i64 = candidates.iter().map(|c| c.frequency).sum();
        let prefix_lower = prefix.to_lowercase();

        let mut suggestions: Vec<Suggestion> = candidates
            .into_iter()
            .map(|c| {
                let score = if c.word.to_lowercase() == prefix_lower {
                    1.0
                } else if total > 0 {
                    c.frequency as f64 / total as f64
                } else {
                    0.0
                };
                Suggestion {
                    word: c.word,
                    frequency: c.frequency,
                    score,
                }
            })
            .collect();

        // Stable, so equal scores keep the store's frequency order.
        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!("suggest '{}': {} candidates", prefix, suggestions.len());
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prolix_core::Error;

    fn resolver(policy: CasePolicy) -> Resolver {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .add_definition_with_id(1, "Cat", "A small domesticated feline.")
            .unwrap();
        store
            .add_definition_with_id(2, "Cat", "A strong tackle used to hoist an anchor.")
            .unwrap();
        store.add_index_entry("Cat", 1, 10).unwrap();
        store.add_index_entry("cat", 2, 1).unwrap();
        store.add_index_entry("kitty", 1, 3).unwrap();
        store.add_index_entry("catalog", 2, 6).unwrap();
        store.add_index_entry("cattle", 2, 2).unwrap();
        Resolver::new(store, policy)
    }

    #[test]
    fn test_exact_policy_is_case_sensitive() {
        let r = resolver(CasePolicy::Exact);
        let hits = r.lookup("Cat").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].definition_id, 1);
        assert_eq!(hits[0].matched_word, "Cat");

        assert!(r.lookup("CAT").unwrap().is_empty());
    }

    #[test]
    fn test_folded_policy_merges_capitalized_and_lowercase() {
        let r = resolver(CasePolicy::Folded);
        let hits = r.lookup("CAT").unwrap();
        let words: Vec<(&str, i64)> = hits
            .iter()
            .map(|h| (h.matched_word.as_str(), h.definition_id))
            .collect();
        assert_eq!(words, vec![("Cat", 1), ("cat", 2)]);
    }

    #[test]
    fn test_lookup_trims_query() {
        let r = resolver(CasePolicy::Exact);
        let result = r.lookup_result("  kitty\n").unwrap();
        assert_eq!(result.query, "kitty");
        assert_eq!(result.definitions.len(), 1);
        assert_eq!(result.definitions[0].text, "A small domesticated feline.");
        assert!(!result.is_empty());
    }

    #[test]
    fn test_unknown_word_is_empty_result() {
        let r = resolver(CasePolicy::Folded);
        assert_eq!(r.policy(), CasePolicy::Folded);
        let result = r.lookup_result("dog").unwrap();
        assert_eq!(result.query, "dog");
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_queries() {
        let r = resolver(CasePolicy::Exact);
        assert!(matches!(r.lookup(""), Err(Error::InvalidQuery(_))));
        assert!(matches!(r.lookup("   "), Err(Error::InvalidQuery(_))));
        assert!(matches!(r.suggest("", 5), Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_suggest_scores_exact_word_first() {
        let r = resolver(CasePolicy::Exact);
        let suggestions = r.suggest("cat", 10).unwrap();
        let words: Vec<&str> = suggestions.iter().map(|s| s.word.as_str()).collect();
        assert_eq!(words, vec!["cat", "catalog", "cattle"]);
        assert_eq!(suggestions[0].score, 1.0);
        assert!((suggestions[1].score - 6.0 / 9.0).abs() < 1e-9);
        assert!((suggestions[2].score - 2.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_suggest_folded_and_limited() {
        let r = resolver(CasePolicy::Folded);
        let suggestions = r.suggest("CA", 2).unwrap();
        let words: Vec<&str> = suggestions.iter().map(|s| s.word.as_str()).collect();
        assert_eq!(words, vec!["Cat", "catalog"]);
    }

    #[test]
    fn test_suggest_zero_frequency_scores_zero() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.add_definition("Zymurgy", "The chemistry of fermentation.").unwrap();
        store.add_index_entry("zymurgy", id, 0).unwrap();
        let r = Resolver::new(store, CasePolicy::Exact);

        let suggestions = r.suggest("zy", 5).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].score, 0.0);
    }
}
