//! Transaction and compiler configuration (spec §4.2 "Parameter binding"
//! options, ambient configuration layer). Mirrors the teacher's layered
//! config struct with serde defaults, merged caller-overrides-over-defaults.

use serde::{Deserialize, Serialize};

/// Per-transaction overrides a caller can supply alongside a batch of
/// queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionOptions {
    /// Bind values inline instead of as `?N` placeholders (spec §9
    /// "Inline vs parameterised"). Off by default: parameterised statements
    /// let the driver cache prepared statements across calls.
    pub inline: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self { inline: false }
    }
}

impl From<TransactionOptions> for crate::params::BindOptions {
    fn from(opts: TransactionOptions) -> Self {
        crate::params::BindOptions { inline: opts.inline }
    }
}

/// Crate-wide compiler defaults, overridable per call via
/// [`TransactionOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub default_page_size: u32,
    pub transaction: TransactionOptions,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_page_size: crate::instructions::limited_to::DEFAULT_PAGE_SIZE,
            transaction: TransactionOptions::default(),
        }
    }
}

impl CompilerConfig {
    /// Layer a caller-supplied override on top of the crate defaults; any
    /// field the caller didn't set keeps the default (spec ambient
    /// configuration note: "caller overrides merge over defaults, never
    /// replace them wholesale").
    pub fn merge(&self, overrides: Option<TransactionOptions>) -> TransactionOptions {
        overrides.unwrap_or(self.transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_parameterised() {
        let config = CompilerConfig::default();
        assert!(!config.transaction.inline);
        assert_eq!(config.default_page_size, 100);
    }

    #[test]
    fn merge_prefers_explicit_override() {
        let config = CompilerConfig::default();
        let merged = config.merge(Some(TransactionOptions { inline: true }));
        assert!(merged.inline);
    }

    #[test]
    fn merge_falls_back_to_default() {
        let config = CompilerConfig::default();
        let merged = config.merge(None);
        assert!(!merged.inline);
    }
}
