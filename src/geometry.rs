//! Host surface seam: the screen metrics the session needs, and the two
//! dropdown offset formulas.
//!
//! The crate never measures pixels itself. A host adapter implements
//! [`HostSurface`] against the real rendering surface; everything here is
//! pure arithmetic over what the adapter reports.

use crate::dom::NodeId;

/// A point in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Vertical gap between the anchor and the panel.
const PANEL_GAP: f64 = 5.0;

/// Screen metrics provided by the hosting editor surface.
pub trait HostSurface {
    /// Whether the editing surface is inline (no frame) as opposed to a
    /// boxed surface with its own frame and scroll viewport.
    fn is_inline(&self) -> bool;

    /// Absolute offset of the whole editor container.
    fn container_offset(&self) -> Point;

    /// Position of the content area relative to the container.
    fn content_area_position(&self) -> Point;

    /// Position of the editing frame, for boxed surfaces.
    fn frame_position(&self) -> Point;

    /// Position of a node within the editing surface, or `None` when the
    /// node has no resolvable position (e.g. scrolled out of the surface).
    fn node_position(&self, node: NodeId) -> Option<Point>;

    /// Absolute offset of a node, used by inline surfaces and the
    /// cancel-time caret heuristic. `None` when unresolvable.
    fn node_offset(&self, node: NodeId) -> Option<Point>;

    /// Rendered height of the node containing the caret (the line height
    /// the panel must clear).
    fn caret_node_height(&self) -> f64;

    /// Current scroll offset of the editing surface.
    fn scroll_top(&self) -> f64;

    /// Height of a node including its padding.
    fn node_outer_height(&self, node: NodeId) -> f64;

    /// Height of a node excluding its padding.
    fn node_height(&self, node: NodeId) -> f64;
}

/// Where to place the candidate panel, directly below the anchor.
///
/// Inline and boxed surfaces use distinct formulas; `None` means the
/// anchor has no resolvable position and the panel is simply not shown.
pub fn dropdown_offset(surface: &dyn HostSurface, anchor: NodeId) -> Option<Point> {
    if surface.is_inline() {
        offset_inline(surface, anchor)
    } else {
        offset_boxed(surface, anchor)
    }
}

fn offset_boxed(surface: &dyn HostSurface, anchor: NodeId) -> Option<Point> {
    let node = surface.node_position(anchor)?;
    let container = surface.container_offset();
    let content = surface.content_area_position();
    let frame = surface.frame_position();
    Some(Point {
        x: container.x + content.x + node.x + frame.x,
        y: container.y + content.y + node.y + surface.caret_node_height() - surface.scroll_top()
            + PANEL_GAP,
    })
}

fn offset_inline(surface: &dyn HostSurface, anchor: NodeId) -> Option<Point> {
    let node = surface.node_offset(anchor)?;
    Some(Point {
        x: node.x,
        y: node.y + surface.caret_node_height() + PANEL_GAP,
    })
}

/// Cancel-time caret heuristic: the rolled-back text only receives the
/// caret when the prior selection's vertical position coincides with the
/// marker's content line. Guards against cursor jumps after an
/// asynchronous teardown.
pub fn selection_aligned_with_marker(
    surface: &dyn HostSurface,
    selection_node: NodeId,
    marker: NodeId,
) -> bool {
    match (
        surface.node_offset(selection_node),
        surface.node_offset(marker),
    ) {
        (Some(selection), Some(marker_offset)) => {
            let padding =
                (surface.node_outer_height(marker) - surface.node_height(marker)) / 2.0;
            selection.y == marker_offset.y + padding
        }
        _ => false,
    }
}
