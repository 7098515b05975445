//! Token Conversion Engine.
//!
//! Bidirectional, in-place transforms between raw delimited text and
//! rendered chip elements. Both directions favor silent degradation:
//! spans the allow-list rejects stay literal text, and a chip whose
//! metadata cannot be recovered is left untouched.

use crate::config::VariableConfig;
use crate::dom::{Dom, NodeId};
use crate::event::{EventArgs, EventBus, VARIABLE_TO_HTML};
use crate::token::{scan_tokens, VariableToken};

/// Attribute holding a chip's recoverable raw form. Its presence is what
/// makes a node a variable chip.
pub const ORIGINAL_VARIABLE_ATTR: &str = "data-original-variable";

/// Result of an explicit variable creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedVariable {
    /// A materialized chip element, detached and ready to insert.
    Node(NodeId),
    /// The identifier was not eligible; the original value is handed back
    /// unchanged. Not an error.
    Literal(String),
}

/// Whether a node is a rendered variable chip.
pub fn is_variable_node(dom: &Dom, id: NodeId) -> bool {
    dom.has_attr(id, ORIGINAL_VARIABLE_ATTR)
}

/// Materialize a chip element for a resolved token.
fn build_chip(dom: &mut Dom, token: &VariableToken, config: &VariableConfig) -> NodeId {
    let chip = dom.create_element("span");
    dom.set_attr(chip, "class", &config.class_name);
    dom.set_attr(chip, ORIGINAL_VARIABLE_ATTR, &token.delimited(config));
    dom.set_attr(chip, "contenteditable", "false");
    let label = dom.create_text(&token.display);
    dom.append_child(chip, label);
    chip
}

fn emit_to_html(events: &EventBus, token: &VariableToken) {
    events.emit(
        VARIABLE_TO_HTML,
        &EventArgs::VariableToHtml {
            value: token.raw.clone(),
            clean_value: token.clean.clone(),
        },
    );
}

/// Convert raw delimited spans in every text leaf into rendered chips.
///
/// Text surrounding matches is preserved verbatim as sibling leaves. The
/// caret is placed immediately after each inserted chip (the last
/// placement wins). Running this twice is a no-op: chips are elements,
/// not matching text leaves.
pub fn raw_to_rendered(dom: &mut Dom, config: &VariableConfig, events: &EventBus) {
    let leaves: Vec<NodeId> = dom
        .text_leaves()
        .into_iter()
        .filter(|&leaf| {
            dom.text(leaf)
                .map(|text| config.pattern().is_match(text))
                .unwrap_or(false)
        })
        .collect();

    for leaf in leaves {
        let text = match dom.text(leaf) {
            Some(t) => t.to_string(),
            None => continue,
        };
        let matches = scan_tokens(config.pattern(), &text);

        // Build the replacement run left to right, accumulating literal
        // text (surroundings and rejected spans) between chips.
        let mut replacement: Vec<NodeId> = Vec::new();
        let mut chips: Vec<NodeId> = Vec::new();
        let mut literal = String::new();
        let mut cursor = 0;

        for m in &matches {
            literal.push_str(&text[cursor..m.start]);
            cursor = m.end;

            match VariableToken::resolve(m.raw, config) {
                Some(token) => {
                    if !literal.is_empty() {
                        let run = dom.create_text(&literal);
                        replacement.push(run);
                        literal.clear();
                    }
                    emit_to_html(events, &token);
                    let chip = build_chip(dom, &token, config);
                    replacement.push(chip);
                    chips.push(chip);
                }
                None => {
                    tracing::debug!("skipping invalid variable '{}'", m.raw);
                    literal.push_str(m.raw);
                }
            }
        }
        if chips.is_empty() {
            continue;
        }
        literal.push_str(&text[cursor..]);
        if !literal.is_empty() {
            let run = dom.create_text(&literal);
            replacement.push(run);
        }

        dom.replace_with_nodes(leaf, &replacement);

        // Nodes splice back-to-front, so the caret ends up after the
        // leftmost chip of the last rewritten leaf.
        for &chip in chips.iter().rev() {
            dom.set_caret_after(chip);
        }
    }
}

/// Convert every rendered chip back into its stored raw text.
///
/// Exact inverse of [`raw_to_rendered`] for engine-created chips: the raw
/// string is restored byte-identically. A chip with empty metadata is left
/// untouched rather than corrupting the document.
pub fn rendered_to_raw(dom: &mut Dom) {
    for chip in dom.elements_with_attr(ORIGINAL_VARIABLE_ATTR) {
        let raw = dom
            .attr(chip, ORIGINAL_VARIABLE_ATTR)
            .unwrap_or_default()
            .to_string();
        if raw.is_empty() {
            tracing::warn!("chip metadata is empty, leaving element in place");
            continue;
        }
        let fragment = dom.parse_fragment(&raw);
        dom.replace_with_nodes(chip, &fragment);
    }
}

/// Explicitly materialize a chip for `value` (programmatic insertion).
///
/// Unlike the scan, the value may carry digits and dots; it is cleaned with
/// the wide identifier class. An ineligible identifier hands the original
/// value back as [`CreatedVariable::Literal`].
pub fn create_variable_node(
    dom: &mut Dom,
    value: &str,
    config: &VariableConfig,
    events: &EventBus,
) -> CreatedVariable {
    match VariableToken::resolve(value, config) {
        Some(token) => {
            emit_to_html(events, &token);
            CreatedVariable::Node(build_chip(dom, &token, config))
        }
        None => {
            tracing::debug!("not converting invalid variable '{}'", value);
            CreatedVariable::Literal(value.to_string())
        }
    }
}
