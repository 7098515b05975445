//! Abstract document tree.
//!
//! The conversion engine and the autocomplete session never touch a concrete
//! rendering surface. They operate on this arena tree of typed nodes (text
//! leaves and elements with attributes), and a thin host adapter maps the
//! tree to and from the real one. The tree also owns the collapsed caret so
//! that cursor placement rules stay testable without a host.

use std::collections::BTreeMap;

/// Handle to a node in a [`Dom`]. Ids are never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node is either a text leaf or an element.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Text(String),
    Element(Element),
}

/// Element payload: tag name, ordered attributes, child list.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub tag: String,
    attrs: BTreeMap<String, String>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Collapsed caret position.
///
/// For a text node the offset counts characters; for an element it is a
/// child index. This mirrors how editing surfaces express selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

/// Arena document tree with an optional collapsed caret.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Option<NodeData>>,
    root: NodeId,
    caret: Option<Caret>,
}

impl Dom {
    /// Create a tree with an empty `body` root element.
    pub fn new() -> Self {
        let mut dom = Dom {
            nodes: Vec::new(),
            root: NodeId(0),
            caret: None,
        };
        let root = dom.create_element("body");
        dom.root = root;
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(NodeData { parent: None, kind }));
        id
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Create a detached text leaf.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element {
            tag: tag.to_string(),
            ..Element::default()
        }))
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text(_)))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element(_)))
    }

    /// Text content of a text leaf. `None` for elements and dead ids.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(NodeData {
            kind: NodeKind::Text(slot),
            ..
        }) = self.data_mut(id)
        {
            *slot = text.to_string();
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(&el.tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => el.attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData {
            kind: NodeKind::Element(el),
            ..
        }) = self.data_mut(id)
        {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|d| d.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => &el.children,
            _ => &[],
        }
    }

    /// Index of `id` in its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Detach a node from its current parent, if any.
    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(NodeData {
                kind: NodeKind::Element(el),
                ..
            }) = self.data_mut(parent)
            {
                el.children.retain(|&c| c != id);
            }
        }
        if let Some(data) = self.data_mut(id) {
            data.parent = None;
        }
    }

    /// Insert `node` into `parent`'s child list at `index` (clamped to the
    /// end). Reparents `node` if it is attached elsewhere.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) {
        if !self.is_element(parent) || !self.exists(node) {
            return;
        }
        self.detach(node);
        if let Some(NodeData {
            kind: NodeKind::Element(el),
            ..
        }) = self.data_mut(parent)
        {
            let index = index.min(el.children.len());
            el.children.insert(index, node);
        }
        if let Some(data) = self.data_mut(node) {
            data.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) {
        let end = self.children(parent).len();
        self.insert_at(parent, end, node);
    }

    /// Insert `node` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) =
            (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_at(parent, index + 1, node);
        }
    }

    /// Remove a node and its whole subtree. Clears the caret if it pointed
    /// into the removed subtree.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(caret) = self.caret {
            if self.subtree_contains(id, caret.node) {
                self.caret = None;
            }
        }
        self.detach(id);
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.free_subtree(child);
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Whether `descendant` is `ancestor` or lies under it.
    pub fn subtree_contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut cursor = Some(descendant);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Replace `target` with `nodes`, spliced in as siblings at its position.
    pub fn replace_with_nodes(&mut self, target: NodeId, nodes: &[NodeId]) {
        let (parent, index) = match (self.parent(target), self.index_in_parent(target)) {
            (Some(p), Some(i)) => (p, i),
            _ => return,
        };
        self.remove(target);
        for (offset, &node) in nodes.iter().enumerate() {
            self.insert_at(parent, index + offset, node);
        }
    }

    /// Depth-first preorder walk of the whole tree.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.walk_into(self.root, &mut order);
        order
    }

    fn walk_into(&self, id: NodeId, order: &mut Vec<NodeId>) {
        order.push(id);
        for &child in self.children(id) {
            self.walk_into(child, order);
        }
    }

    /// All text leaves in document order.
    pub fn text_leaves(&self) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.is_text(id))
            .collect()
    }

    /// Elements carrying the named attribute, in document order.
    pub fn elements_with_attr(&self, name: &str) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|&id| self.has_attr(id, name))
            .collect()
    }

    /// First element whose `id` attribute equals `value`.
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|&id| self.attr(id, "id") == Some(value))
    }

    /// Concatenated text of all text leaves under `id` (inclusive).
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element(_)) => {
                for child in self.children(id).to_vec() {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Concatenated text of the whole document.
    pub fn document_text(&self) -> String {
        self.subtree_text(self.root)
    }

    /// Parse a stored raw value into splice-ready sibling nodes.
    ///
    /// Raw variable values are plain delimited text; anything else in the
    /// metadata is preserved verbatim as literal text rather than
    /// interpreted, so a reverse conversion can never corrupt the document.
    pub fn parse_fragment(&mut self, raw: &str) -> Vec<NodeId> {
        if raw.is_empty() {
            return Vec::new();
        }
        vec![self.create_text(raw)]
    }

    // ===== Caret =====

    pub fn caret(&self) -> Option<Caret> {
        self.caret
    }

    pub fn set_caret(&mut self, caret: Caret) {
        if self.exists(caret.node) {
            self.caret = Some(caret);
        }
    }

    pub fn clear_caret(&mut self) {
        self.caret = None;
    }

    /// Place the caret immediately after `id`, collapsed.
    pub fn set_caret_after(&mut self, id: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) {
            self.caret = Some(Caret {
                node: parent,
                offset: index + 1,
            });
        }
    }

    /// Place the caret inside `id` at `offset`.
    pub fn set_caret_in(&mut self, id: NodeId, offset: usize) {
        if self.exists(id) {
            self.caret = Some(Caret { node: id, offset });
        }
    }

    /// The character immediately before the caret, when the caret sits in a
    /// text leaf past its first character.
    pub fn char_before_caret(&self) -> Option<char> {
        let caret = self.caret?;
        let text = self.text(caret.node)?;
        if caret.offset == 0 {
            return None;
        }
        text.chars().nth(caret.offset - 1)
    }

    /// Delete the character immediately before the caret, moving the caret
    /// back by one. No-op when there is nothing to delete.
    pub fn delete_char_before_caret(&mut self) {
        let caret = match self.caret {
            Some(c) => c,
            None => return,
        };
        let text = match self.text(caret.node) {
            Some(t) => t.to_string(),
            None => return,
        };
        if caret.offset == 0 || caret.offset > text.chars().count() {
            return;
        }
        let rebuilt: String = text
            .chars()
            .enumerate()
            .filter(|(i, _)| *i != caret.offset - 1)
            .map(|(_, ch)| ch)
            .collect();
        self.set_text(caret.node, &rebuilt);
        self.caret = Some(Caret {
            node: caret.node,
            offset: caret.offset - 1,
        });
    }

    /// Insert a character at the caret, advancing it. Text-leaf carets
    /// splice into the leaf; element carets get a fresh text leaf.
    pub fn insert_char_at_caret(&mut self, ch: char) {
        let caret = match self.caret {
            Some(c) => c,
            None => return,
        };
        if let Some(text) = self.text(caret.node).map(str::to_string) {
            let mut rebuilt = String::new();
            for (i, existing) in text.chars().enumerate() {
                if i == caret.offset {
                    rebuilt.push(ch);
                }
                rebuilt.push(existing);
            }
            if caret.offset >= text.chars().count() {
                rebuilt.push(ch);
            }
            self.set_text(caret.node, &rebuilt);
            self.caret = Some(Caret {
                node: caret.node,
                offset: caret.offset + 1,
            });
        } else if self.is_element(caret.node) {
            let leaf = self.create_text(&ch.to_string());
            self.insert_at(caret.node, caret.offset, leaf);
            self.caret = Some(Caret {
                node: leaf,
                offset: 1,
            });
        }
    }

    /// Insert detached nodes at the caret position, splitting a text leaf
    /// when the caret sits inside one. The caret itself is left for the
    /// caller to reposition.
    pub fn insert_nodes_at_caret(&mut self, nodes: &[NodeId]) {
        let caret = match self.caret {
            Some(c) => c,
            None => {
                let root = self.root;
                for &node in nodes {
                    self.append_child(root, node);
                }
                return;
            }
        };
        if self.is_element(caret.node) {
            for (offset, &node) in nodes.iter().enumerate() {
                self.insert_at(caret.node, caret.offset + offset, node);
            }
            return;
        }
        let text = match self.text(caret.node) {
            Some(t) => t.to_string(),
            None => return,
        };
        let split = caret.offset.min(text.chars().count());
        let left: String = text.chars().take(split).collect();
        let right: String = text.chars().skip(split).collect();

        self.set_text(caret.node, &left);
        let mut anchor = caret.node;
        for &node in nodes {
            self.insert_after(anchor, node);
            anchor = node;
        }
        if !right.is_empty() {
            let tail = self.create_text(&right);
            self.insert_after(anchor, tail);
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
