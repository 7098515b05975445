//! Candidate records, the candidate source, and the strategy hooks.
//!
//! A candidate is a bag of named fields so hosts can carry whatever
//! metadata they like through the session; the committed chip is built
//! from a configured field. The five hooks (match, sort, highlight,
//! render, insert) each have a documented default; callers override any
//! subset by implementing [`CandidateHooks`] and leaning on the trait
//! defaults for the rest.

use crate::config::VariableConfig;
use crate::dropdown::{ListItem, TextSpan};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A searchable record with arbitrary named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(Map<String, Value>);

impl Candidate {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a candidate from a JSON object. `None` for non-objects.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.0
            .insert(name.to_string(), Value::String(value.to_string()));
        self
    }

    /// String value of a field, when present and a string.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// All fields, for hosts that attach extra metadata per candidate.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Where candidates come from.
///
/// A dynamic source is invoked with `(query, generation, delimiter)`. It
/// may answer synchronously by returning `Some(items)`, or return `None`
/// and deliver later through the plugin with the same generation; stale
/// generations are discarded at the delivery boundary.
pub enum CandidateSource {
    Static(Vec<Candidate>),
    Dynamic(Box<dyn FnMut(&str, u64, &str) -> Option<Vec<Candidate>>>),
}

impl fmt::Debug for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::Static(items) => {
                f.debug_tuple("Static").field(&items.len()).finish()
            }
            CandidateSource::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// The session's five replaceable strategies, with stock defaults.
pub trait CandidateHooks {
    /// Whether a candidate matches the query. Default: case-insensitive
    /// substring match against the configured field.
    fn matches(&self, candidate: &Candidate, query: &str, query_by: &str) -> bool {
        candidate
            .field(query_by)
            .map(|field| field.to_lowercase().contains(&query.to_lowercase()))
            .unwrap_or(false)
    }

    /// Rank matched candidates. Default: candidates whose field begins
    /// with the query first, then case-sensitive substring matches, then
    /// the rest; each bucket keeps its incoming order.
    fn sort(&self, candidates: Vec<Candidate>, query: &str, query_by: &str) -> Vec<Candidate> {
        let lower_query = query.to_lowercase();
        let mut begins_with = Vec::new();
        let mut case_sensitive = Vec::new();
        let mut case_insensitive = Vec::new();

        for candidate in candidates {
            let field = candidate.field(query_by).unwrap_or_default();
            if field.to_lowercase().starts_with(&lower_query) {
                begins_with.push(candidate);
            } else if field.contains(query) {
                case_sensitive.push(candidate);
            } else {
                case_insensitive.push(candidate);
            }
        }

        begins_with.extend(case_sensitive);
        begins_with.extend(case_insensitive);
        begins_with
    }

    /// Split a candidate's text into spans with every query occurrence
    /// emphasized. Default: case-insensitive, all occurrences.
    fn highlight(&self, text: &str, query: &str) -> Vec<TextSpan> {
        if query.is_empty() || text.is_empty() {
            return vec![TextSpan::plain(text)];
        }
        let pattern = match Regex::new(&format!("(?i){}", regex::escape(query))) {
            Ok(pattern) => pattern,
            Err(_) => return vec![TextSpan::plain(text)],
        };

        let mut spans = Vec::new();
        let mut cursor = 0;
        for found in pattern.find_iter(text) {
            if found.start() > cursor {
                spans.push(TextSpan::plain(&text[cursor..found.start()]));
            }
            spans.push(TextSpan::emphasized(found.as_str()));
            cursor = found.end();
        }
        if cursor < text.len() {
            spans.push(TextSpan::plain(&text[cursor..]));
        }
        spans
    }

    /// Render a candidate into a list item. Default: the matched field's
    /// text, highlighted, with the whole candidate attached as metadata.
    fn render(&self, candidate: &Candidate, _index: usize, query: &str, query_by: &str) -> ListItem {
        let text = candidate.field(query_by).unwrap_or_default();
        ListItem {
            spans: self.highlight(text, query),
            candidate: candidate.clone(),
        }
    }

    /// Raw string spliced into the document on commit. Default:
    /// `prefix + candidate[insert_from] + suffix`.
    fn insert(&self, candidate: &Candidate, config: &VariableConfig) -> String {
        format!(
            "{}{}{}",
            config.prefix,
            candidate
                .field(&config.autocomplete.insert_from)
                .unwrap_or_default(),
            config.suffix
        )
    }
}

/// The stock strategy set.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl CandidateHooks for DefaultHooks {}
