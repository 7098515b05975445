//! Variable placeholder chips for rich-text editors.
//!
//! This crate is the host-agnostic core of a "variable" token type: raw
//! text containing delimited placeholders like `{{name}}` is rendered as
//! styled, non-editable chips showing a mapped label, while the persisted
//! text keeps the original delimited string. Two subsystems do the work:
//!
//! - the **token conversion engine** ([`convert`]): pure, in-place
//!   transforms between raw delimited text and chip elements over an
//!   abstract document tree ([`dom`]), lossless in the rendered→raw
//!   direction via per-chip metadata;
//! - the **autocomplete session** ([`autocomplete`]): an interactive state
//!   machine opened by typing the opening delimiter, which captures a
//!   query, debounces candidate fetches from a static or dynamic source,
//!   ranks and lists candidates in a floating panel ([`dropdown`]) and
//!   commits the selection back through the conversion engine.
//!
//! [`plugin::VariablePlugin`] wires both to a hosting editor: the host
//! feeds it key, click, scroll and content-lifecycle notifications plus a
//! [`geometry::HostSurface`] for screen metrics, and receives the
//! `variableToHTML` / `variableClick` domain events in return.

pub mod autocomplete;
pub mod candidates;
pub mod config;
pub mod convert;
pub mod dom;
pub mod dropdown;
pub mod event;
pub mod geometry;
pub mod keys;
pub mod plugin;
pub mod token;

pub use autocomplete::{AutoComplete, SessionState};
pub use candidates::{Candidate, CandidateHooks, CandidateSource, DefaultHooks};
pub use config::{
    AutocompleteOptions, Mapper, PartialVariableOptions, VariableConfig, VariableOptions,
};
pub use convert::{
    create_variable_node, is_variable_node, raw_to_rendered, rendered_to_raw, CreatedVariable,
    ORIGINAL_VARIABLE_ATTR,
};
pub use dom::{Caret, Dom, NodeId};
pub use event::{EventArgs, EventBus, VARIABLE_CLICK, VARIABLE_TO_HTML};
pub use geometry::{HostSurface, Point};
pub use keys::{Key, KeyDisposition};
pub use plugin::{ContentView, VariablePlugin};
pub use token::clean_variable;
