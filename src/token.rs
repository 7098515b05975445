//! Identifier cleaning, validation and the raw-text scan.
//!
//! The scan is a single stateless pass returning every non-overlapping
//! match with its position; nothing here mutates the document.

use crate::config::VariableConfig;
use regex::Regex;

/// One raw span recognized by the detection pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch<'t> {
    /// Byte offset of the match start within the scanned text.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
    /// The matched raw span, delimiters included.
    pub raw: &'t str,
}

/// Strip a value down to its identifier: every character outside
/// `[A-Za-z0-9._]` is removed.
///
/// `"{{a.b_1!!}}"` cleans to `"a.b_1"`.
pub fn clean_variable(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '.' || *ch == '_')
        .collect()
}

/// All non-overlapping matches of the detection pattern, in one pass.
pub fn scan_tokens<'t>(pattern: &Regex, text: &'t str) -> Vec<TokenMatch<'t>> {
    pattern
        .find_iter(text)
        .map(|m| TokenMatch {
            start: m.start(),
            end: m.end(),
            raw: m.as_str(),
        })
        .collect()
}

/// A raw span resolved against the config: cleaned, validated and mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableToken {
    /// The original value the token was created from.
    pub raw: String,
    /// The stripped identifier.
    pub clean: String,
    /// The mapped display label.
    pub display: String,
}

impl VariableToken {
    /// Resolve a value against the config. Returns `None` when the
    /// allow-list rejects the cleaned identifier; the caller leaves the
    /// literal text alone in that case.
    pub fn resolve(value: &str, config: &VariableConfig) -> Option<Self> {
        let clean = clean_variable(value);
        if !config.is_valid(&clean) {
            return None;
        }
        let display = config.mapped_value(&clean);
        Some(Self {
            raw: value.to_string(),
            clean,
            display,
        })
    }

    /// Canonical delimited form, reconstructed from the cleaned identifier.
    /// This is what rendered chips carry as recoverable metadata.
    pub fn delimited(&self, config: &VariableConfig) -> String {
        format!("{}{}{}", config.prefix, self.clean, config.suffix)
    }
}
