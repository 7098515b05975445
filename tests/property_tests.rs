// Property-based tests using proptest
// These tests generate random documents of interleaved literal text and
// delimited spans and verify the conversion engine's invariants.

use proptest::prelude::*;

use varchip::config::{VariableConfig, VariableOptions};
use varchip::convert::{raw_to_rendered, rendered_to_raw, ORIGINAL_VARIABLE_ATTR};
use varchip::dom::Dom;
use varchip::event::EventBus;
use varchip::token::clean_variable;

/// A building block of a generated document.
#[derive(Debug, Clone)]
enum Segment {
    /// Literal text, free of delimiter characters.
    Text(String),
    /// A well-formed delimited span around this identifier.
    Variable(String),
}

fn segment_strategy() -> impl Strategy<Value = Segment> {
    prop_oneof![
        2 => "[a-zA-Z0-9 .,!?_-]{0,12}".prop_map(Segment::Text),
        1 => "[a-zA-Z_]{1,8}".prop_map(Segment::Variable),
    ]
}

fn raw_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.clone(),
            Segment::Variable(name) => format!("{{{{{name}}}}}"),
        })
        .collect()
}

fn rendered_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.clone(),
            Segment::Variable(name) => name.clone(),
        })
        .collect()
}

fn doc(text: &str) -> Dom {
    let mut dom = Dom::new();
    let leaf = dom.create_text(text);
    let root = dom.root();
    dom.append_child(root, leaf);
    dom
}

fn chip_count(dom: &Dom) -> usize {
    dom.elements_with_attr(ORIGINAL_VARIABLE_ATTR).len()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Rendering then reverting restores the raw text byte-identically.
    #[test]
    fn prop_round_trip(segments in prop::collection::vec(segment_strategy(), 0..12)) {
        let config = VariableConfig::new(VariableOptions::default());
        let events = EventBus::new();
        let raw = raw_text(&segments);
        let mut dom = doc(&raw);

        raw_to_rendered(&mut dom, &config, &events);
        rendered_to_raw(&mut dom);

        prop_assert_eq!(dom.document_text(), raw);
        prop_assert_eq!(chip_count(&dom), 0);
    }

    /// Rendering twice changes nothing beyond the first pass.
    #[test]
    fn prop_idempotent(segments in prop::collection::vec(segment_strategy(), 0..12)) {
        let config = VariableConfig::new(VariableOptions::default());
        let events = EventBus::new();
        let mut dom = doc(&raw_text(&segments));

        raw_to_rendered(&mut dom, &config, &events);
        let text_once = dom.document_text();
        let chips_once = chip_count(&dom);

        raw_to_rendered(&mut dom, &config, &events);
        prop_assert_eq!(dom.document_text(), text_once);
        prop_assert_eq!(chip_count(&dom), chips_once);
    }

    /// Every variable segment becomes a chip; the rendered text shows the
    /// identifiers (identity mapping) with literal text untouched.
    #[test]
    fn prop_all_well_formed_spans_convert(segments in prop::collection::vec(segment_strategy(), 0..12)) {
        let config = VariableConfig::new(VariableOptions::default());
        let events = EventBus::new();
        let mut dom = doc(&raw_text(&segments));

        raw_to_rendered(&mut dom, &config, &events);

        let variables = segments
            .iter()
            .filter(|s| matches!(s, Segment::Variable(_)))
            .count();
        prop_assert_eq!(chip_count(&dom), variables);
        prop_assert_eq!(dom.document_text(), rendered_text(&segments));
    }

    /// With an allow-list, only listed identifiers convert; the rest stay
    /// literal and still round-trip.
    #[test]
    fn prop_allow_list_enforced(
        segments in prop::collection::vec(segment_strategy(), 0..12),
        allowed in prop::collection::hash_set("[a-zA-Z_]{1,8}", 0..4),
    ) {
        let config = VariableConfig::new(VariableOptions {
            valid: Some(allowed.iter().cloned().collect()),
            ..Default::default()
        });
        let events = EventBus::new();
        let raw = raw_text(&segments);
        let mut dom = doc(&raw);

        raw_to_rendered(&mut dom, &config, &events);

        let convertible = segments
            .iter()
            .filter(|s| matches!(s, Segment::Variable(name) if allowed.contains(name)))
            .count();
        // An empty allow-list means everything converts.
        let expected = if allowed.is_empty() {
            segments.iter().filter(|s| matches!(s, Segment::Variable(_))).count()
        } else {
            convertible
        };
        prop_assert_eq!(chip_count(&dom), expected);

        rendered_to_raw(&mut dom);
        prop_assert_eq!(dom.document_text(), raw);
    }

    /// Cleaning only ever keeps characters from the identifier class.
    #[test]
    fn prop_clean_variable_charset(value in "\\PC{0,24}") {
        let cleaned = clean_variable(&value);
        prop_assert!(cleaned
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '_'));
    }
}
