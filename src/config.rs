//! Plugin configuration.
//!
//! Two layers: serializable option structs with per-field defaults (what a
//! host hands over, possibly as JSON), and the immutable runtime
//! [`VariableConfig`] built from them once per editor instance and threaded
//! explicitly through every component. Partial option structs with a
//! [`Merge`] impl let callers overlay a sparse override set onto the
//! defaults.

use anyhow::Context;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

/// Top-level plugin options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VariableOptions {
    /// Maps a cleaned identifier to its display label. Identifiers without
    /// an entry display as themselves.
    #[serde(default)]
    pub mapping: HashMap<String, String>,

    /// Allow-list of identifiers eligible for conversion. Absent or empty
    /// means every identifier converts.
    #[serde(default)]
    pub valid: Option<Vec<String>>,

    /// Class attribute placed on rendered chips.
    #[serde(default = "default_class_name")]
    pub class_name: String,

    /// Opening delimiter marking a variable start.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Closing delimiter marking a variable end.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Autocomplete session options.
    #[serde(default)]
    pub autocomplete: AutocompleteOptions,
}

/// Autocomplete session options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AutocompleteOptions {
    /// Debounce interval between the last keystroke and the candidate
    /// fetch, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Candidate field compared against the query.
    #[serde(default = "default_query_by")]
    pub query_by: String,

    /// Candidate field used to build the committed raw value. Defaults to
    /// `query_by`.
    #[serde(default)]
    pub insert_from: Option<String>,

    /// Maximum number of candidates shown. Negative disables truncation.
    #[serde(default = "default_max_items")]
    pub max_items: i64,

    /// Label shown in the anchor marker and passed to dynamic sources.
    /// Defaults to the opening delimiter.
    #[serde(default)]
    pub delimiter: Option<String>,
}

fn default_class_name() -> String {
    "variable".to_string()
}

fn default_prefix() -> String {
    "{{".to_string()
}

fn default_suffix() -> String {
    "}}".to_string()
}

fn default_delay_ms() -> u64 {
    500
}

fn default_query_by() -> String {
    "name".to_string()
}

fn default_max_items() -> i64 {
    10
}

impl Default for VariableOptions {
    fn default() -> Self {
        Self {
            mapping: HashMap::new(),
            valid: None,
            class_name: default_class_name(),
            prefix: default_prefix(),
            suffix: default_suffix(),
            autocomplete: AutocompleteOptions::default(),
        }
    }
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            query_by: default_query_by(),
            insert_from: None,
            max_items: default_max_items(),
            delimiter: None,
        }
    }
}

impl VariableOptions {
    /// Parse options from a JSON value, filling defaults for absent fields.
    pub fn from_json_value(value: serde_json::Value) -> anyhow::Result<Self> {
        serde_json::from_value(value).context("invalid variable plugin options")
    }
}

/// Trait for merging option layers. Values already set in `self` take
/// precedence over values in `other`.
pub trait Merge {
    fn merge_from(&mut self, other: &Self);
}

impl<T: Clone> Merge for Option<T> {
    fn merge_from(&mut self, other: &Self) {
        if self.is_none() {
            *self = other.clone();
        }
    }
}

/// Sparse top-level options, for layering caller overrides over defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PartialVariableOptions {
    pub mapping: Option<HashMap<String, String>>,
    pub valid: Option<Vec<String>>,
    pub class_name: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub autocomplete: Option<PartialAutocompleteOptions>,
}

/// Sparse autocomplete options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PartialAutocompleteOptions {
    pub delay_ms: Option<u64>,
    pub query_by: Option<String>,
    pub insert_from: Option<String>,
    pub max_items: Option<i64>,
    pub delimiter: Option<String>,
}

impl Merge for PartialAutocompleteOptions {
    fn merge_from(&mut self, other: &Self) {
        self.delay_ms.merge_from(&other.delay_ms);
        self.query_by.merge_from(&other.query_by);
        self.insert_from.merge_from(&other.insert_from);
        self.max_items.merge_from(&other.max_items);
        self.delimiter.merge_from(&other.delimiter);
    }
}

impl Merge for PartialVariableOptions {
    fn merge_from(&mut self, other: &Self) {
        self.mapping.merge_from(&other.mapping);
        self.valid.merge_from(&other.valid);
        self.class_name.merge_from(&other.class_name);
        self.prefix.merge_from(&other.prefix);
        self.suffix.merge_from(&other.suffix);
        match (&mut self.autocomplete, &other.autocomplete) {
            (Some(mine), Some(theirs)) => mine.merge_from(theirs),
            (mine @ None, Some(theirs)) => *mine = Some(theirs.clone()),
            _ => {}
        }
    }
}

impl PartialVariableOptions {
    /// Fill every unset field with its default, producing full options.
    pub fn resolve(self) -> VariableOptions {
        let autocomplete = self.autocomplete.unwrap_or_default();
        VariableOptions {
            mapping: self.mapping.unwrap_or_default(),
            valid: self.valid,
            class_name: self.class_name.unwrap_or_else(default_class_name),
            prefix: self.prefix.unwrap_or_else(default_prefix),
            suffix: self.suffix.unwrap_or_else(default_suffix),
            autocomplete: AutocompleteOptions {
                delay_ms: autocomplete.delay_ms.unwrap_or_else(default_delay_ms),
                query_by: autocomplete.query_by.unwrap_or_else(default_query_by),
                insert_from: autocomplete.insert_from,
                max_items: autocomplete.max_items.unwrap_or_else(default_max_items),
                delimiter: autocomplete.delimiter,
            },
        }
    }
}

/// Converts a cleaned identifier into its display label.
pub enum Mapper {
    /// Lookup table; identity for missing keys.
    Table(HashMap<String, String>),
    /// Arbitrary mapping function.
    Func(Box<dyn Fn(&str) -> String>),
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapper::Table(table) => f.debug_tuple("Table").field(&table.len()).finish(),
            Mapper::Func(_) => f.write_str("Func"),
        }
    }
}

/// Resolved autocomplete settings.
#[derive(Debug, Clone)]
pub struct AutocompleteConfig {
    pub delay: Duration,
    pub query_by: String,
    pub insert_from: String,
    pub max_items: i64,
    pub delimiter: String,
}

/// Immutable runtime configuration, built once per editor instance.
#[derive(Debug)]
pub struct VariableConfig {
    pub prefix: String,
    pub suffix: String,
    pub class_name: String,
    valid: Option<HashSet<String>>,
    mapper: Mapper,
    pattern: Regex,
    pub autocomplete: AutocompleteConfig,
}

impl VariableConfig {
    /// Build a runtime config with the table mapper from the options.
    pub fn new(options: VariableOptions) -> Self {
        let mapper = Mapper::Table(options.mapping.clone());
        Self::with_mapper(options, mapper)
    }

    /// Build a runtime config with an explicit mapper (e.g. a function).
    pub fn with_mapper(options: VariableOptions, mapper: Mapper) -> Self {
        // Delimiters are regex-escaped, so the pattern always compiles.
        let pattern = Regex::new(&format!(
            "{}[a-zA-Z_]+{}",
            regex::escape(&options.prefix),
            regex::escape(&options.suffix)
        ))
        .expect("escaped delimiters form a valid pattern");

        let valid = options.valid.and_then(|list| {
            if list.is_empty() {
                None
            } else {
                Some(list.into_iter().collect::<HashSet<String>>())
            }
        });

        let query_by = options.autocomplete.query_by.clone();
        let autocomplete = AutocompleteConfig {
            delay: Duration::from_millis(options.autocomplete.delay_ms),
            insert_from: options
                .autocomplete
                .insert_from
                .unwrap_or_else(|| query_by.clone()),
            query_by,
            max_items: options.autocomplete.max_items,
            delimiter: options
                .autocomplete
                .delimiter
                .unwrap_or_else(|| options.prefix.clone()),
        };

        Self {
            prefix: options.prefix,
            suffix: options.suffix,
            class_name: options.class_name,
            valid,
            mapper,
            pattern,
            autocomplete,
        }
    }

    /// The compiled raw-detection pattern (`prefix[a-zA-Z_]+suffix`).
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Whether a cleaned identifier is eligible for conversion. Without an
    /// allow-list everything is valid.
    pub fn is_valid(&self, clean_value: &str) -> bool {
        match &self.valid {
            Some(valid) => valid.contains(clean_value),
            None => true,
        }
    }

    /// Display label for a cleaned identifier; identity when unmapped.
    pub fn mapped_value(&self, clean_value: &str) -> String {
        match &self.mapper {
            Mapper::Table(table) => table
                .get(clean_value)
                .cloned()
                .unwrap_or_else(|| clean_value.to_string()),
            Mapper::Func(func) => func(clean_value),
        }
    }
}
