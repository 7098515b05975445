//! Candidate panel model.
//!
//! A pure model of the floating list: rendered items, the active
//! highlight, circular navigation, and the centered scroll offset. The
//! host renders it however it likes; nothing here knows about widgets.

use crate::candidates::Candidate;
use crate::geometry::Point;

/// One run of text in a rendered candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Emphasized runs mark where the query matched.
    pub emphasized: bool,
}

impl TextSpan {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            emphasized: false,
        }
    }

    pub fn emphasized(text: &str) -> Self {
        Self {
            text: text.to_string(),
            emphasized: true,
        }
    }
}

/// A rendered candidate row: display spans plus the full candidate so
/// every field stays addressable after commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub spans: Vec<TextSpan>,
    pub candidate: Candidate,
}

impl ListItem {
    /// The row's plain text, emphasis dropped.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// The floating candidate panel.
#[derive(Debug, Clone, Default)]
pub struct Dropdown {
    items: Vec<ListItem>,
    active: Option<usize>,
    position: Option<Point>,
    visible: bool,
}

impl Dropdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rendered items, clearing the highlight.
    pub fn set_items(&mut self, items: Vec<ListItem>) {
        self.items = items;
        self.active = None;
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Show the panel at a position below the anchor.
    pub fn show(&mut self, position: Point) {
        self.position = Some(position);
        self.visible = true;
    }

    /// Hide the panel and clear the highlight.
    pub fn hide(&mut self) {
        self.visible = false;
        self.active = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_item(&self) -> Option<&ListItem> {
        self.active.and_then(|index| self.items.get(index))
    }

    pub fn item(&self, index: usize) -> Option<&ListItem> {
        self.items.get(index)
    }

    /// Move the highlight down, wrapping from the last item to the first.
    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.active = Some(match self.active {
            Some(index) if index + 1 < self.items.len() => index + 1,
            Some(_) => 0,
            None => 0,
        });
    }

    /// Move the highlight up, wrapping from the first item to the last.
    pub fn select_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.active = Some(match self.active {
            Some(0) | None => self.items.len() - 1,
            Some(index) => index - 1,
        });
    }

    /// Scroll offset that centers the active item in the panel viewport
    /// (not merely clamps it into view). Rows are `row_height` tall and the
    /// viewport shows `panel_height` of them.
    pub fn centered_scroll(&self, row_height: f64, panel_height: f64) -> f64 {
        match self.active {
            Some(index) => (index as f64 * row_height - panel_height / 2.0).max(0.0),
            None => 0.0,
        }
    }
}
