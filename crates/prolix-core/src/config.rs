//! Configuration and data file location.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default data file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "dict/web1913.db";

/// Default number of prefix suggestions.
pub const DEFAULT_SUGGEST_LIMIT: usize = 10;

/// How query words are compared against stored word forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    /// Case-sensitive exact match.
    #[default]
    Exact,
    /// Match the lowercase and the capitalized form of the query.
    Folded,
}

impl std::fmt::Display for CasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Folded => write!(f, "folded"),
        }
    }
}

impl FromStr for CasePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "folded" | "fold" => Ok(Self::Folded),
            other => Err(Error::Config(format!(
                "unknown case policy '{}' (expected 'exact' or 'folded')",
                other
            ))),
        }
    }
}

/// Top-level Prolix configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictConfig {
    /// SQLite data file holding definitions and the word index.
    pub db_path: PathBuf,
    /// Word comparison policy for lookups and suggestions.
    pub case_policy: CasePolicy,
    /// Maximum number of prefix suggestions returned.
    pub suggest_limit: usize,
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            case_policy: CasePolicy::default(),
            suggest_limit: DEFAULT_SUGGEST_LIMIT,
        }
    }
}

impl DictConfig {
    /// Create configuration from environment and defaults.
    ///
    /// Reads `PROLIX_DB`, `PROLIX_CASE` and `PROLIX_SUGGEST_LIMIT`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Set-but-empty variables fall back to defaults.
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty("PROLIX_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let case_policy = match non_empty("PROLIX_CASE") {
            Some(v) => v.parse()?,
            None => defaults.case_policy,
        };

        let suggest_limit = match non_empty("PROLIX_SUGGEST_LIMIT") {
            Some(v) => v.trim().parse::<usize>().map_err(|_| {
                Error::Config(format!("PROLIX_SUGGEST_LIMIT must be a number, got '{}'", v))
            })?,
            None => defaults.suggest_limit,
        };

        Ok(Self {
            db_path,
            case_policy,
            suggest_limit,
        })
    }

    /// Override the data file path.
    pub fn with_db_path(mut self, path: impl AsRef<Path>) -> Self {
        self.db_path = path.as_ref().to_path_buf();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DictConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.case_policy, CasePolicy::Exact);
        assert_eq!(config.suggest_limit, 10);
    }

    #[test]
    fn test_overrides() {
        let config = DictConfig::from_vars(vars(&[
            ("PROLIX_DB", "/tmp/words.db"),
            ("PROLIX_CASE", "Folded"),
            ("PROLIX_SUGGEST_LIMIT", "25"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/words.db"));
        assert_eq!(config.case_policy, CasePolicy::Folded);
        assert_eq!(config.suggest_limit, 25);
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let result = DictConfig::from_vars(vars(&[("PROLIX_CASE", "shouty")]));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = DictConfig::from_vars(vars(&[("PROLIX_SUGGEST_LIMIT", "lots")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = DictConfig::from_vars(vars(&[
            ("PROLIX_DB", ""),
            ("PROLIX_CASE", ""),
            ("PROLIX_SUGGEST_LIMIT", "  "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.case_policy, CasePolicy::Exact);
        assert_eq!(config.suggest_limit, DEFAULT_SUGGEST_LIMIT);
    }

    #[test]
    fn test_with_db_path() {
        let config = DictConfig::default().with_db_path("other.db");
        assert_eq!(config.db_path, PathBuf::from("other.db"));
    }
}
