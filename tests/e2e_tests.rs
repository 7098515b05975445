// End-to-end scenarios: the plugin driven through a scripted host, from
// the delimiter keystroke to the committed chip.

mod common;

use common::harness::PluginTestHarness;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use varchip::candidates::{Candidate, CandidateSource};
use varchip::config::{VariableConfig, VariableOptions};
use varchip::convert::ORIGINAL_VARIABLE_ATTR;
use varchip::event::{EventArgs, VARIABLE_TO_HTML};
use varchip::keys::Key;
use varchip::plugin::{ContentView, VariablePlugin};
use varchip::SessionState;

const AFTER_DEBOUNCE: Duration = Duration::from_millis(600);

#[test]
fn test_type_search_commit() {
    let mut harness = PluginTestHarness::with_names(&["john", "joanna"]);

    harness.type_text("{{");
    assert_eq!(harness.plugin.session_state(), SessionState::Collecting);

    harness.type_text("jo");
    assert_eq!(harness.plugin.session().unwrap().query(), "jo");

    harness.advance(AFTER_DEBOUNCE);
    assert_eq!(harness.plugin.session_state(), SessionState::Listing);
    {
        let dropdown = harness.plugin.session().unwrap().dropdown().unwrap();
        let names: Vec<String> = dropdown.items().iter().map(|i| i.text()).collect();
        assert_eq!(names, vec!["john", "joanna"]);
        // Begins-with tie broken by input order; the first item starts
        // highlighted.
        assert_eq!(dropdown.active(), Some(0));
    }

    harness.press(Key::Enter);
    assert_eq!(harness.plugin.session_state(), SessionState::Closed);
    assert!(harness.plugin.session().is_none());

    let chips = harness.chips();
    assert_eq!(chips.len(), 1);
    let chip = chips[0];
    assert_eq!(harness.dom.tag(chip), Some("span"));
    assert_eq!(harness.dom.attr(chip, "class"), Some("variable"));
    assert_eq!(harness.dom.attr(chip, ORIGINAL_VARIABLE_ATTR), Some("{{john}}"));
    assert_eq!(harness.dom.subtree_text(chip), "john");
    assert!(harness.dom.element_by_id("autocomplete").is_none());
}

#[test]
fn test_escape_rolls_back_to_partial_literal() {
    let mut harness = PluginTestHarness::with_names(&["john"]);
    harness.type_text("{{jo");
    harness.press(Key::Escape);

    assert!(harness.plugin.session().is_none());
    assert_eq!(harness.document_text(), "{{jo}");
    assert!(harness.chips().is_empty());
}

#[test]
fn test_manual_delimiter_pair_renders_chip() {
    let mut harness = PluginTestHarness::with_names(&["name"]);
    harness.type_text("{{name}}");

    assert!(harness.plugin.session().is_none());
    let chips = harness.chips();
    assert_eq!(chips.len(), 1);
    assert_eq!(
        harness.dom.attr(chips[0], ORIGINAL_VARIABLE_ATTR),
        Some("{{name}}")
    );
    assert_eq!(harness.dom.subtree_text(chips[0]), "name");
}

#[test]
fn test_backspace_empties_then_cancels() {
    let mut harness = PluginTestHarness::with_names(&["john"]);
    harness.type_text("{{j");

    harness.press(Key::Backspace);
    assert!(harness.plugin.session().is_some());
    assert_eq!(harness.plugin.session().unwrap().query(), "");

    harness.press(Key::Backspace);
    assert!(harness.plugin.session().is_none());
}

#[test]
fn test_debounce_collapses_keystrokes_into_one_fetch() {
    let fetches: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&fetches);
    let source = CandidateSource::Dynamic(Box::new(move |query, _generation, _delimiter| {
        log.borrow_mut().push(query.to_string());
        Some(Vec::new())
    }));
    let plugin = VariablePlugin::new(VariableConfig::new(VariableOptions::default()), source);
    let mut harness = PluginTestHarness::with_plugin(plugin);

    harness.type_text("{{jones");
    harness.advance(Duration::from_millis(100));
    assert!(fetches.borrow().is_empty());

    harness.advance(Duration::from_millis(500));
    assert_eq!(*fetches.borrow(), vec!["jones".to_string()]);
}

#[test]
fn test_dynamic_source_delivers_later() {
    let generations: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&generations);
    let source = CandidateSource::Dynamic(Box::new(move |_query, generation, delimiter| {
        assert_eq!(delimiter, "{{");
        log.borrow_mut().push(generation);
        None
    }));
    let plugin = VariablePlugin::new(VariableConfig::new(VariableOptions::default()), source);
    let mut harness = PluginTestHarness::with_plugin(plugin);

    harness.type_text("{{an");
    harness.advance(AFTER_DEBOUNCE);
    let generation = *generations.borrow().last().unwrap();

    harness.deliver(
        generation,
        vec![
            Candidate::new().with_field("name", "anna"),
            Candidate::new().with_field("name", "banana"),
        ],
    );
    assert_eq!(harness.plugin.session_state(), SessionState::Listing);

    // Pointer activation of the second row.
    harness
        .plugin
        .click_candidate(&mut harness.dom, &harness.surface, 1);
    let chips = harness.chips();
    assert_eq!(chips.len(), 1);
    assert_eq!(
        harness.dom.attr(chips[0], ORIGINAL_VARIABLE_ATTR),
        Some("{{banana}}")
    );
}

#[test]
fn test_stale_delivery_after_cancel_is_discarded() {
    let source = CandidateSource::Dynamic(Box::new(|_query, _generation, _delimiter| None));
    let plugin = VariablePlugin::new(VariableConfig::new(VariableOptions::default()), source);
    let mut harness = PluginTestHarness::with_plugin(plugin);

    harness.type_text("{{a");
    harness.advance(AFTER_DEBOUNCE);
    harness.press(Key::Escape);

    // Start a fresh, unrelated session and let the stale response land.
    harness.type_text("{{b");
    harness.deliver(1, vec![Candidate::new().with_field("name", "stale")]);

    let session = harness.plugin.session().unwrap();
    assert!(session.dropdown().is_none());
    assert_eq!(session.query(), "b");
}

#[test]
fn test_unresolvable_anchor_keeps_panel_hidden() {
    let mut harness = PluginTestHarness::with_names(&["john"]);
    harness.surface.resolvable = false;

    harness.type_text("{{jo");
    harness.advance(AFTER_DEBOUNCE);

    // Session stays open but nothing is shown and nothing is highlighted,
    // so Enter cancels instead of committing.
    assert_eq!(harness.plugin.session_state(), SessionState::Collecting);
    harness.press(Key::Enter);
    assert!(harness.plugin.session().is_none());
    assert!(harness.chips().is_empty());
}

#[test]
fn test_scroll_cancels_open_session() {
    let mut harness = PluginTestHarness::with_names(&["john"]);
    harness.type_text("{{jo");
    harness
        .plugin
        .on_scroll(&mut harness.dom, &harness.surface);

    assert!(harness.plugin.session().is_none());
    assert_eq!(harness.document_text(), "{{jo}");
}

#[test]
fn test_arrow_navigation_wraps_in_panel() {
    let mut harness = PluginTestHarness::with_names(&["ab1", "ab2", "ab3"]);
    harness.type_text("{{ab");
    harness.advance(AFTER_DEBOUNCE);

    harness.press(Key::Up);
    assert_eq!(
        harness.plugin.session().unwrap().dropdown().unwrap().active(),
        Some(2)
    );
    harness.press(Key::Down);
    assert_eq!(
        harness.plugin.session().unwrap().dropdown().unwrap().active(),
        Some(0)
    );
}

#[test]
fn test_insert_variable_programmatically() {
    let events: Rc<RefCell<Vec<(String, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let mut harness = PluginTestHarness::with_names(&[]);
    harness.plugin.on(
        VARIABLE_TO_HTML,
        Box::new(move |args| {
            if let EventArgs::VariableToHtml { value, clean_value } = args {
                sink.borrow_mut().push((value.clone(), clean_value.clone()));
            }
        }),
    );

    harness.load_text("dear ");
    harness.plugin.insert_variable(&mut harness.dom, "user.name");

    let chips = harness.chips();
    assert_eq!(chips.len(), 1);
    assert_eq!(
        harness.dom.attr(chips[0], ORIGINAL_VARIABLE_ATTR),
        Some("{{user.name}}")
    );
    assert_eq!(
        *events.borrow(),
        vec![("user.name".to_string(), "user.name".to_string())]
    );
}

#[test]
fn test_view_toggle_round_trip_with_mapping() {
    let mut mapping = std::collections::HashMap::new();
    mapping.insert("first_name".to_string(), "First name".to_string());
    let config = VariableConfig::new(VariableOptions {
        mapping,
        ..Default::default()
    });
    let plugin = VariablePlugin::new(config, CandidateSource::Static(Vec::new()));
    let mut harness = PluginTestHarness::with_plugin(plugin);
    harness.load_text("Hello {{first_name}}!");

    harness
        .plugin
        .on_content_rerender(&mut harness.dom, ContentView::Raw);
    assert_eq!(harness.document_text(), "Hello First name!");
    assert_eq!(harness.chips().len(), 1);

    harness
        .plugin
        .on_content_rerender(&mut harness.dom, ContentView::Rendered);
    assert_eq!(harness.document_text(), "Hello {{first_name}}!");
    assert!(harness.chips().is_empty());
}

#[test]
fn test_commit_rescans_other_raw_spans() {
    let mut harness = PluginTestHarness::with_names(&["john"]);
    harness.load_text("{{other}} and ");
    harness.type_text("{{jo");
    harness.advance(AFTER_DEBOUNCE);
    harness.press(Key::Enter);

    // The document-wide re-scan after commit also renders the span that
    // was sitting elsewhere in the document.
    let chips = harness.chips();
    assert_eq!(chips.len(), 2);
    let raws: Vec<&str> = chips
        .iter()
        .filter_map(|&c| harness.dom.attr(c, ORIGINAL_VARIABLE_ATTR))
        .collect();
    assert!(raws.contains(&"{{other}}"));
    assert!(raws.contains(&"{{john}}"));
}
