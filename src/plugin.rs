//! Plugin wiring.
//!
//! [`VariablePlugin`] owns the configuration, the candidate source, the
//! strategy hooks, the event bus and the (at most one) live autocomplete
//! session, and routes host notifications to the right place: delimiter
//! detection on key-press, session key handling, chip click/drag
//! handling, content re-render dispatch, debounce polling and
//! asynchronous candidate delivery.

use std::time::Instant;

use crate::autocomplete::{AutoComplete, KeyOutcome, SessionCtx, SessionState, SEARCHTEXT_ID};
use crate::candidates::{CandidateHooks, CandidateSource, DefaultHooks};
use crate::config::VariableConfig;
use crate::convert::{
    create_variable_node, is_variable_node, raw_to_rendered, rendered_to_raw, CreatedVariable,
    ORIGINAL_VARIABLE_ATTR,
};
use crate::dom::{Dom, NodeId};
use crate::event::{EventArgs, EventBus, EventCallback, VARIABLE_CLICK};
use crate::geometry::HostSurface;
use crate::keys::{Key, KeyDisposition};
use crate::token::clean_variable;

/// Which representation the host is about to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentView {
    /// Raw text is current; delimited spans should become chips.
    Raw,
    /// Chips are current; they should become raw text (e.g. source view).
    Rendered,
}

/// The variable plugin core, one per editor instance.
pub struct VariablePlugin {
    config: VariableConfig,
    source: CandidateSource,
    hooks: Box<dyn CandidateHooks>,
    events: EventBus,
    session: Option<AutoComplete>,
    generations: u64,
}

impl VariablePlugin {
    pub fn new(config: VariableConfig, source: CandidateSource) -> Self {
        Self::with_hooks(config, source, Box::new(DefaultHooks))
    }

    /// Build with a custom strategy set; unoverridden hooks keep their
    /// defaults through the trait.
    pub fn with_hooks(
        config: VariableConfig,
        source: CandidateSource,
        hooks: Box<dyn CandidateHooks>,
    ) -> Self {
        Self {
            config,
            source,
            hooks,
            events: EventBus::new(),
            session: None,
            generations: 0,
        }
    }

    pub fn config(&self) -> &VariableConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to a domain event.
    pub fn on(&mut self, name: &str, callback: EventCallback) {
        self.events.on(name, callback);
    }

    pub fn session(&self) -> Option<&AutoComplete> {
        self.session.as_ref()
    }

    pub fn session_state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(AutoComplete::state)
            .unwrap_or(SessionState::Closed)
    }

    fn session_live(&self) -> bool {
        self.session
            .as_ref()
            .map(AutoComplete::has_focus)
            .unwrap_or(false)
    }

    /// Convert all raw spans in the document into chips.
    pub fn rescan(&mut self, dom: &mut Dom) {
        raw_to_rendered(dom, &self.config, &self.events);
    }

    /// Key-press routing, called before the host inserts the character.
    /// Returns `true` when the keystroke was consumed (the host must not
    /// insert it): completing the opening delimiter starts a session,
    /// completing the closing delimiter aborts one.
    pub fn on_key_press(&mut self, dom: &mut Dom, surface: &dyn HostSurface, ch: char) -> bool {
        let prev = match dom.char_before_caret() {
            Some(prev) => prev,
            None => return false,
        };

        if format!("{ch}{prev}") == self.config.prefix {
            if self.session_live() {
                return false;
            }
            // The first delimiter character is already in the document;
            // consume it together with the unapplied keystroke.
            dom.delete_char_before_caret();
            self.session = Some(AutoComplete::open(dom, &self.config));
            return true;
        }

        if format!("{prev}{ch}") == self.config.suffix && self.session_live() {
            dom.delete_char_before_caret();
            if let Some(mut session) = self.session.take() {
                let mut ctx = SessionCtx {
                    config: &self.config,
                    source: &mut self.source,
                    hooks: self.hooks.as_ref(),
                    events: &self.events,
                    surface,
                    generations: &mut self.generations,
                };
                session.cancel(dom, &mut ctx);
            }
            raw_to_rendered(dom, &self.config, &self.events);
            return true;
        }

        false
    }

    /// Key-down routing while a session is live.
    pub fn on_key_down(&mut self, key: Key) -> KeyDisposition {
        if !self.session_live() {
            return KeyDisposition::Ignored;
        }
        match self.session.as_mut() {
            Some(session) => session.on_key_down(key),
            None => KeyDisposition::Ignored,
        }
    }

    /// Key-up routing while a session is live.
    pub fn on_key_up(&mut self, dom: &mut Dom, surface: &dyn HostSurface, key: Key, now: Instant) {
        if !self.session_live() {
            return;
        }
        let outcome = match self.session.as_mut() {
            Some(session) => {
                let mut ctx = SessionCtx {
                    config: &self.config,
                    source: &mut self.source,
                    hooks: self.hooks.as_ref(),
                    events: &self.events,
                    surface,
                    generations: &mut self.generations,
                };
                session.on_key_up(dom, &mut ctx, key, now)
            }
            None => KeyOutcome::Open,
        };
        if outcome != KeyOutcome::Open {
            self.session = None;
        }
    }

    /// Debounce tick. Hosts call this from their event loop;
    /// [`VariablePlugin::next_deadline`] says when the next call matters.
    pub fn poll(&mut self, dom: &Dom, surface: &dyn HostSurface, now: Instant) {
        if let Some(session) = self.session.as_mut() {
            let mut ctx = SessionCtx {
                config: &self.config,
                source: &mut self.source,
                hooks: self.hooks.as_ref(),
                events: &self.events,
                surface,
                generations: &mut self.generations,
            };
            session.poll(dom, &mut ctx, now);
        }
    }

    /// When the pending debounced fetch is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.as_ref().and_then(AutoComplete::next_deadline)
    }

    /// Entry point for dynamic sources delivering results later. Stale
    /// generations and deliveries without a live session are discarded.
    pub fn deliver_results(
        &mut self,
        dom: &Dom,
        surface: &dyn HostSurface,
        generation: u64,
        items: Vec<crate::candidates::Candidate>,
    ) {
        match self.session.as_mut() {
            Some(session) => {
                let mut ctx = SessionCtx {
                    config: &self.config,
                    source: &mut self.source,
                    hooks: self.hooks.as_ref(),
                    events: &self.events,
                    surface,
                    generations: &mut self.generations,
                };
                session.process_results(dom, &mut ctx, generation, items);
            }
            None => {
                tracing::debug!(
                    "discarding delivery for generation {}: no live session",
                    generation
                );
            }
        }
    }

    /// Pointer activation of a panel row. A click that does not land on a
    /// rendered row is ignored.
    pub fn click_candidate(
        &mut self,
        dom: &mut Dom,
        surface: &dyn HostSurface,
        index: usize,
    ) {
        let row_exists = self
            .session
            .as_ref()
            .and_then(AutoComplete::dropdown)
            .map(|dropdown| dropdown.item(index).is_some())
            .unwrap_or(false);
        if !row_exists {
            return;
        }
        if let Some(mut session) = self.session.take() {
            let mut ctx = SessionCtx {
                config: &self.config,
                source: &mut self.source,
                hooks: self.hooks.as_ref(),
                events: &self.events,
                surface,
                generations: &mut self.generations,
            };
            session.commit_index(dom, &mut ctx, index);
        }
    }

    /// Click routing: a click outside the search span cancels a live
    /// session, and a click on a chip emits [`VARIABLE_CLICK`] with the
    /// cleaned identifier.
    pub fn on_click(&mut self, dom: &mut Dom, surface: &dyn HostSurface, target: NodeId) {
        if self.session_live() {
            let inside_search = dom
                .parent(target)
                .map(|parent| dom.attr(parent, "id") == Some(SEARCHTEXT_ID))
                .unwrap_or(false);
            if !inside_search {
                self.cancel_session(dom, surface);
            }
        }

        if is_variable_node(dom, target) {
            let raw = dom
                .attr(target, ORIGINAL_VARIABLE_ATTR)
                .unwrap_or_default()
                .to_string();
            self.events.emit(
                VARIABLE_CLICK,
                &EventArgs::VariableClick {
                    value: clean_variable(&raw),
                    target,
                },
            );
        }
    }

    /// Whether the host must suppress this mouse-down: chips are not
    /// draggable.
    pub fn on_mouse_down(&self, dom: &Dom, target: NodeId) -> bool {
        is_variable_node(dom, target)
    }

    /// Scrolling the surface cancels a live session.
    pub fn on_scroll(&mut self, dom: &mut Dom, surface: &dyn HostSurface) {
        if self.session_live() {
            self.cancel_session(dom, surface);
        }
    }

    /// Focus loss cancels a live session.
    pub fn on_blur(&mut self, dom: &mut Dom, surface: &dyn HostSurface) {
        if self.session_live() {
            self.cancel_session(dom, surface);
        }
    }

    fn cancel_session(&mut self, dom: &mut Dom, surface: &dyn HostSurface) {
        if let Some(mut session) = self.session.take() {
            let mut ctx = SessionCtx {
                config: &self.config,
                source: &mut self.source,
                hooks: self.hooks.as_ref(),
                events: &self.events,
                surface,
                generations: &mut self.generations,
            };
            session.cancel(dom, &mut ctx);
        }
    }

    /// Re-render dispatch when the host switches content views.
    pub fn on_content_rerender(&mut self, dom: &mut Dom, view: ContentView) {
        match view {
            ContentView::Raw => raw_to_rendered(dom, &self.config, &self.events),
            ContentView::Rendered => rendered_to_raw(dom),
        }
    }

    /// Programmatically insert a chip for `value` at the caret, following
    /// the same validation, mapping and event rules as the scan. An
    /// ineligible value is inserted as literal text instead.
    pub fn insert_variable(&mut self, dom: &mut Dom, value: &str) {
        match create_variable_node(dom, value, &self.config, &self.events) {
            CreatedVariable::Node(chip) => {
                dom.insert_nodes_at_caret(&[chip]);
                dom.set_caret_after(chip);
            }
            CreatedVariable::Literal(text) => {
                let leaf = dom.create_text(&text);
                dom.insert_nodes_at_caret(&[leaf]);
                dom.set_caret_after(leaf);
            }
        }
    }
}

impl std::fmt::Debug for VariablePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariablePlugin")
            .field("config", &self.config)
            .field("source", &self.source)
            .field("session", &self.session)
            .finish()
    }
}
