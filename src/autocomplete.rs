//! Autocomplete session state machine.
//!
//! A session is born when the user finishes typing the opening delimiter,
//! lives through `Collecting` (query capture) and `Listing` (panel shown)
//! and dies by commit or cancel. All work is driven cooperatively from
//! host notifications: key events, a `poll` tick for the debounce
//! deadline, and generation-tagged candidate deliveries for dynamic
//! sources. Results arriving for a dead or superseded generation are
//! discarded at this consumption boundary.

use std::time::Instant;

use crate::candidates::{CandidateHooks, CandidateSource};
use crate::config::VariableConfig;
use crate::convert::raw_to_rendered;
use crate::dom::{Dom, NodeId};
use crate::dropdown::{Dropdown, ListItem};
use crate::event::EventBus;
use crate::geometry::{dropdown_offset, selection_aligned_with_marker, HostSurface};
use crate::keys::{Key, KeyDisposition};

/// `id` attribute of the anchor marker element.
pub const MARKER_ID: &str = "autocomplete";
/// `id` attribute of the delimiter label span inside the marker.
pub const DELIMITER_ID: &str = "autocomplete-delimiter";
/// `id` attribute of the live search span inside the marker.
pub const SEARCHTEXT_ID: &str = "autocomplete-searchtext";

/// Zero-width placeholder keeping the search span selectable while empty.
pub const PLACEHOLDER: char = '\u{FEFF}';

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Query capture, panel not visible.
    Collecting,
    /// Candidate panel visible.
    Listing,
    /// Torn down (committed or cancelled).
    Closed,
}

/// What a key-up did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Session still open.
    Open,
    /// A candidate was committed; the session is closed.
    Committed,
    /// The session rolled back to literal text and closed.
    Cancelled,
}

/// Everything a session borrows from its owner for one call.
pub struct SessionCtx<'a> {
    pub config: &'a VariableConfig,
    pub source: &'a mut CandidateSource,
    pub hooks: &'a dyn CandidateHooks,
    pub events: &'a EventBus,
    pub surface: &'a dyn HostSurface,
    /// Monotone fetch-generation counter owned by the plugin, so
    /// generations are never reused across sessions.
    pub generations: &'a mut u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingFetch {
    due: Instant,
    generation: u64,
}

/// One live autocomplete interaction.
#[derive(Debug)]
pub struct AutoComplete {
    query: String,
    has_focus: bool,
    dropdown: Option<Dropdown>,
    pending_fetch: Option<PendingFetch>,
    current_generation: u64,
}

impl AutoComplete {
    /// Open a session: insert the anchor marker (delimiter label plus an
    /// empty search span) at the caret and move the caret into the search
    /// span.
    pub fn open(dom: &mut Dom, config: &VariableConfig) -> Self {
        let marker = dom.create_element("span");
        dom.set_attr(marker, "id", MARKER_ID);

        let delimiter = dom.create_element("span");
        dom.set_attr(delimiter, "id", DELIMITER_ID);
        let label = dom.create_text(&config.autocomplete.delimiter);
        dom.append_child(delimiter, label);

        let search = dom.create_element("span");
        dom.set_attr(search, "id", SEARCHTEXT_ID);
        let dummy = dom.create_element("span");
        dom.set_attr(dummy, "class", "dummy");
        let placeholder = dom.create_text(&PLACEHOLDER.to_string());
        dom.append_child(dummy, placeholder);
        dom.append_child(search, dummy);

        dom.append_child(marker, delimiter);
        dom.append_child(marker, search);

        dom.insert_nodes_at_caret(&[marker]);
        dom.set_caret_in(placeholder, 1);

        tracing::debug!("autocomplete session opened");
        Self {
            query: String::new(),
            has_focus: true,
            dropdown: None,
            pending_fetch: None,
            current_generation: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Liveness flag: false once the session is torn down. Checked before
    /// consuming any delivered results.
    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn dropdown(&self) -> Option<&Dropdown> {
        self.dropdown.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if !self.has_focus {
            SessionState::Closed
        } else if self
            .dropdown
            .as_ref()
            .map(Dropdown::is_visible)
            .unwrap_or(false)
        {
            SessionState::Listing
        } else {
            SessionState::Collecting
        }
    }

    /// When the pending debounced fetch is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_fetch.map(|p| p.due)
    }

    /// Key-down pass: consume the keys the session owns so the host can
    /// suppress its default handling, and navigate on arrows.
    pub fn on_key_down(&mut self, key: Key) -> KeyDisposition {
        match key {
            Key::Tab | Key::Enter | Key::Escape => KeyDisposition::Consumed,
            Key::Up => {
                if let Some(dropdown) = self.dropdown.as_mut() {
                    dropdown.select_prev();
                }
                KeyDisposition::Consumed
            }
            Key::Down => {
                if let Some(dropdown) = self.dropdown.as_mut() {
                    dropdown.select_next();
                }
                KeyDisposition::Consumed
            }
            _ => KeyDisposition::Ignored,
        }
    }

    /// Key-up pass: the state machine proper.
    pub fn on_key_up(
        &mut self,
        dom: &mut Dom,
        ctx: &mut SessionCtx<'_>,
        key: Key,
        now: Instant,
    ) -> KeyOutcome {
        match key {
            key if key.is_navigation() => KeyOutcome::Open,

            Key::Backspace => {
                if self.query.is_empty() {
                    self.cleanup(dom, ctx, true);
                    KeyOutcome::Cancelled
                } else {
                    self.lookup(dom, ctx, now)
                }
            }

            Key::Tab | Key::Enter => {
                let has_active = self
                    .dropdown
                    .as_ref()
                    .and_then(Dropdown::active_item)
                    .is_some();
                if has_active {
                    self.commit_active(dom, ctx);
                    KeyOutcome::Committed
                } else {
                    self.cleanup(dom, ctx, true);
                    KeyOutcome::Cancelled
                }
            }

            Key::Escape => {
                self.cleanup(dom, ctx, true);
                KeyOutcome::Cancelled
            }

            _ => self.lookup(dom, ctx, now),
        }
    }

    /// Re-read the query from the search span and schedule a debounced
    /// fetch. An empty query re-anchors the search span inside the marker;
    /// with no marker left the session cancels.
    pub fn lookup(
        &mut self,
        dom: &mut Dom,
        ctx: &mut SessionCtx<'_>,
        now: Instant,
    ) -> KeyOutcome {
        let search = dom.element_by_id(SEARCHTEXT_ID);
        let raw_query = search
            .map(|node| dom.subtree_text(node))
            .unwrap_or_default();
        self.query = raw_query.trim().replace(PLACEHOLDER, "");

        if self.query.is_empty() {
            match dom.element_by_id(MARKER_ID) {
                Some(marker) => {
                    if let Some(search) = search {
                        dom.append_child(marker, search);
                        self.focus_search_span(dom, search);
                    }
                }
                None => {
                    self.cleanup(dom, ctx, true);
                    return KeyOutcome::Cancelled;
                }
            }
        }

        self.schedule(ctx, now);
        KeyOutcome::Open
    }

    fn focus_search_span(&self, dom: &mut Dom, search: NodeId) {
        let dummy = match dom.children(search).first().copied() {
            Some(node) => node,
            None => return,
        };
        match dom.children(dummy).first().copied() {
            Some(text) if dom.is_text(text) => {
                let end = dom.text(text).map(|t| t.chars().count()).unwrap_or(0);
                dom.set_caret_in(text, end);
            }
            _ => dom.set_caret_in(dummy, 0),
        }
    }

    fn schedule(&mut self, ctx: &mut SessionCtx<'_>, now: Instant) {
        *ctx.generations += 1;
        self.current_generation = *ctx.generations;
        self.pending_fetch = Some(PendingFetch {
            due: now + ctx.config.autocomplete.delay,
            generation: self.current_generation,
        });
        tracing::trace!(
            "scheduled fetch generation {} for query '{}'",
            self.current_generation,
            self.query
        );
    }

    /// Debounce tick: fire the pending fetch once its deadline passes. A
    /// static source answers immediately; a dynamic one may return `None`
    /// and deliver later through [`AutoComplete::process_results`].
    pub fn poll(&mut self, dom: &Dom, ctx: &mut SessionCtx<'_>, now: Instant) {
        let fetch = match self.pending_fetch {
            Some(p) if now >= p.due => p,
            _ => return,
        };
        self.pending_fetch = None;

        let delimiter = ctx.config.autocomplete.delimiter.clone();
        let delivered = match &mut *ctx.source {
            CandidateSource::Static(items) => Some(items.clone()),
            CandidateSource::Dynamic(fetcher) => {
                fetcher(&self.query, fetch.generation, &delimiter)
            }
        };
        if let Some(items) = delivered {
            self.process_results(dom, ctx, fetch.generation, items);
        }
    }

    /// Consume a batch of candidates for `generation`. Filters, ranks,
    /// truncates and renders them, then shows the panel below the anchor
    /// with the first item highlighted, or hides it when nothing matched.
    pub fn process_results(
        &mut self,
        dom: &Dom,
        ctx: &mut SessionCtx<'_>,
        generation: u64,
        items: Vec<crate::candidates::Candidate>,
    ) {
        if !self.has_focus {
            tracing::debug!("discarding results delivered to a torn-down session");
            return;
        }
        if generation != self.current_generation {
            tracing::debug!(
                "discarding stale results: generation {} superseded by {}",
                generation,
                self.current_generation
            );
            return;
        }

        let ac = &ctx.config.autocomplete;
        let matched: Vec<_> = items
            .into_iter()
            .filter(|c| ctx.hooks.matches(c, &self.query, &ac.query_by))
            .collect();
        let mut ranked = ctx.hooks.sort(matched, &self.query, &ac.query_by);
        if ac.max_items >= 0 {
            ranked.truncate(ac.max_items as usize);
        }
        let rendered: Vec<ListItem> = ranked
            .iter()
            .enumerate()
            .map(|(i, c)| ctx.hooks.render(c, i, &self.query, &ac.query_by))
            .collect();

        let dropdown = self.dropdown.get_or_insert_with(Dropdown::new);
        if rendered.is_empty() {
            dropdown.set_items(Vec::new());
            dropdown.hide();
            return;
        }
        dropdown.set_items(rendered);

        let position = dom
            .element_by_id(MARKER_ID)
            .and_then(|marker| dropdown_offset(ctx.surface, marker));
        match position {
            Some(position) => {
                dropdown.show(position);
                dropdown.select_next();
            }
            None => {
                tracing::warn!("anchor position unresolvable, panel not shown");
                dropdown.hide();
            }
        }
    }

    /// Commit the highlighted candidate.
    pub fn commit_active(&mut self, dom: &mut Dom, ctx: &mut SessionCtx<'_>) {
        let item = self
            .dropdown
            .as_ref()
            .and_then(Dropdown::active_item)
            .cloned();
        if let Some(item) = item {
            self.commit_item(dom, ctx, &item);
        }
    }

    /// Commit the candidate at `index` (pointer activation).
    pub fn commit_index(&mut self, dom: &mut Dom, ctx: &mut SessionCtx<'_>, index: usize) {
        let item = self
            .dropdown
            .as_ref()
            .and_then(|dropdown| dropdown.item(index))
            .cloned();
        if let Some(item) = item {
            self.commit_item(dom, ctx, &item);
        }
    }

    fn commit_item(&mut self, dom: &mut Dom, ctx: &mut SessionCtx<'_>, item: &ListItem) {
        let raw = ctx.hooks.insert(&item.candidate, ctx.config);
        tracing::debug!("committing candidate as '{}'", raw);
        if let Some(marker) = dom.element_by_id(MARKER_ID) {
            let fragment = dom.parse_fragment(&raw);
            dom.replace_with_nodes(marker, &fragment);
        }
        // Reconcile the whole document so the committed text and any other
        // raw spans render consistently.
        raw_to_rendered(dom, ctx.config, ctx.events);
        self.cleanup(dom, ctx, false);
    }

    /// Cancel the session, rolling the marker back to literal text.
    pub fn cancel(&mut self, dom: &mut Dom, ctx: &mut SessionCtx<'_>) {
        self.cleanup(dom, ctx, true);
    }

    /// Tear down listeners, drop the panel and optionally roll the marker
    /// back to `prefix + query + <last suffix char>`. The partial suffix is
    /// deliberate: the user only ever typed one closing character.
    fn cleanup(&mut self, dom: &mut Dom, ctx: &mut SessionCtx<'_>, rollback: bool) {
        self.has_focus = false;
        self.pending_fetch = None;
        self.dropdown = None;

        if !rollback {
            tracing::debug!("autocomplete session closed");
            return;
        }

        let marker = match dom.element_by_id(MARKER_ID) {
            Some(marker) => marker,
            None => return,
        };

        let partial_suffix = ctx
            .config
            .suffix
            .chars()
            .last()
            .map(|c| c.to_string())
            .unwrap_or_default();
        let replacement = format!("{}{}{}", ctx.config.prefix, self.query, partial_suffix);

        let restore_caret = dom
            .caret()
            .map(|caret| selection_aligned_with_marker(ctx.surface, caret.node, marker))
            .unwrap_or(false);

        let text = dom.create_text(&replacement);
        dom.replace_with_nodes(marker, &[text]);
        if restore_caret {
            dom.set_caret_in(text, replacement.chars().count());
        }
        tracing::debug!("autocomplete session cancelled, rolled back to '{}'", replacement);
    }
}
