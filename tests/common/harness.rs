// PluginTestHarness - scripted host environment for end-to-end tests
//
// Plays the role of the hosting editor: it owns the document tree and a
// manual clock, forwards keystrokes the way a real surface would
// (key-press before character insertion, key-up after), applies default
// editing behavior for keys the plugin does not consume, and answers
// screen-metric queries with scripted values.

use std::time::{Duration, Instant};

use varchip::candidates::{Candidate, CandidateSource};
use varchip::config::{VariableConfig, VariableOptions};
use varchip::dom::{Dom, NodeId};
use varchip::geometry::{HostSurface, Point};
use varchip::keys::{Key, KeyDisposition};
use varchip::plugin::VariablePlugin;

/// Host surface with scripted metrics. Set `resolvable` to false to
/// simulate an anchor without a screen position.
pub struct ScriptedSurface {
    pub inline: bool,
    pub resolvable: bool,
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self {
            inline: true,
            resolvable: true,
        }
    }
}

impl HostSurface for ScriptedSurface {
    fn is_inline(&self) -> bool {
        self.inline
    }
    fn container_offset(&self) -> Point {
        Point { x: 8.0, y: 40.0 }
    }
    fn content_area_position(&self) -> Point {
        Point { x: 2.0, y: 6.0 }
    }
    fn frame_position(&self) -> Point {
        Point { x: 1.0, y: 1.0 }
    }
    fn node_position(&self, _node: NodeId) -> Option<Point> {
        self.resolvable.then_some(Point { x: 30.0, y: 12.0 })
    }
    fn node_offset(&self, _node: NodeId) -> Option<Point> {
        self.resolvable.then_some(Point { x: 30.0, y: 12.0 })
    }
    fn caret_node_height(&self) -> f64 {
        18.0
    }
    fn scroll_top(&self) -> f64 {
        0.0
    }
    fn node_outer_height(&self, _node: NodeId) -> f64 {
        18.0
    }
    fn node_height(&self, _node: NodeId) -> f64 {
        18.0
    }
}

/// Virtual host environment driving a [`VariablePlugin`].
pub struct PluginTestHarness {
    pub dom: Dom,
    pub plugin: VariablePlugin,
    pub surface: ScriptedSurface,
    now: Instant,
}

impl PluginTestHarness {
    /// Harness over a plugin with default options and a static source of
    /// `name` candidates.
    pub fn with_names(names: &[&str]) -> Self {
        let source = CandidateSource::Static(
            names
                .iter()
                .map(|n| Candidate::new().with_field("name", n))
                .collect(),
        );
        Self::with_plugin(VariablePlugin::new(
            VariableConfig::new(VariableOptions::default()),
            source,
        ))
    }

    pub fn with_plugin(plugin: VariablePlugin) -> Self {
        let mut dom = Dom::new();
        let leaf = dom.create_text("");
        let root = dom.root();
        dom.append_child(root, leaf);
        dom.set_caret_in(leaf, 0);
        Self {
            dom,
            plugin,
            surface: ScriptedSurface::default(),
            now: Instant::now(),
        }
    }

    /// Replace the document content with a single text leaf, caret at the
    /// end.
    pub fn load_text(&mut self, text: &str) {
        let mut dom = Dom::new();
        let leaf = dom.create_text(text);
        let root = dom.root();
        dom.append_child(root, leaf);
        dom.set_caret_in(leaf, text.chars().count());
        self.dom = dom;
    }

    /// Type text character by character: key-press routing first (the
    /// plugin may consume the keystroke and suppress insertion), then
    /// key-up, which fires regardless, as it does on a real surface.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            let consumed = self.plugin.on_key_press(&mut self.dom, &self.surface, ch);
            if !consumed {
                self.dom.insert_char_at_caret(ch);
            }
            self.plugin
                .on_key_up(&mut self.dom, &self.surface, Key::Char(ch), self.now);
        }
    }

    /// Press a non-character key, applying the host's default behavior
    /// when the plugin does not consume it.
    pub fn press(&mut self, key: Key) {
        let disposition = self.plugin.on_key_down(key);
        if key == Key::Backspace && disposition == KeyDisposition::Ignored {
            self.dom.delete_char_before_caret();
        }
        self.plugin
            .on_key_up(&mut self.dom, &self.surface, key, self.now);
    }

    /// Advance the manual clock and run the debounce tick.
    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
        self.plugin.poll(&self.dom, &self.surface, self.now);
    }

    /// Deliver dynamic-source results for a generation.
    pub fn deliver(&mut self, generation: u64, items: Vec<Candidate>) {
        self.plugin
            .deliver_results(&self.dom, &self.surface, generation, items);
    }

    pub fn document_text(&self) -> String {
        self.dom.document_text()
    }

    /// All rendered chips, in document order.
    pub fn chips(&self) -> Vec<NodeId> {
        self.dom
            .elements_with_attr(varchip::convert::ORIGINAL_VARIABLE_ATTR)
    }
}
