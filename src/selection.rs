//! The single current selection
//!
//! Selection only holds a node id. Every operation takes the tree and the
//! overlay it should keep in step, so the selection overlay and the scroll
//! chain it watches always follow the selected node.

use tracing::debug;

use crate::overlay::{GeometryProvider, OverlaySynchronizer};
use crate::tree::{Direction, NodeId, NodeTree};

/// Result of deleting the selected node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub removed: NodeId,
    /// Parent that took over the selection, if the node had one
    pub parent: Option<NodeId>,
    /// The canvas has no nodes left
    pub canvas_empty: bool,
}

#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selected == Some(node)
    }

    /// Select `node`; returns false when it is not in the tree
    pub fn select(&mut self, tree: &NodeTree, overlay: &mut OverlaySynchronizer, geometry: &dyn GeometryProvider, node: NodeId) -> bool {
        if !tree.contains(node) {
            return false;
        }
        // Tear down the previous node's scroll watchers before the new ones
        overlay.detach_scroll_chain();
        self.selected = Some(node);
        overlay.show_selection(tree, geometry, node);
        debug!(%node, "selected");
        true
    }

    /// Returns whether anything was selected
    pub fn clear(&mut self, overlay: &mut OverlaySynchronizer) -> bool {
        overlay.hide_selection();
        self.selected.take().is_some()
    }

    /// Select the nearest placed ancestor; no-op at root
    pub fn select_parent(&mut self, tree: &NodeTree, overlay: &mut OverlaySynchronizer, geometry: &dyn GeometryProvider) -> Option<NodeId> {
        let parent = tree.parent_node(self.selected?)?;
        self.select(tree, overlay, geometry, parent).then_some(parent)
    }

    /// Remove the selected subtree and select its parent.
    ///
    /// Locked nodes are kept; returns `None` when nothing was removed.
    pub fn delete_selected(&mut self, tree: &mut NodeTree, overlay: &mut OverlaySynchronizer, geometry: &dyn GeometryProvider) -> Option<Deletion> {
        let node = self.selected?;
        if tree.get(node)?.is_locked() {
            debug!(%node, "refusing to delete locked node");
            return None;
        }
        let parent = tree.parent_node(node);
        tree.remove(node)?;
        self.clear(overlay);
        if let Some(parent) = parent {
            self.select(tree, overlay, geometry, parent);
        }
        Some(Deletion {
            removed: node,
            parent,
            canvas_empty: tree.is_empty(),
        })
    }

    /// Reorder the selected node one step among its siblings
    pub fn move_selected(&mut self, tree: &mut NodeTree, direction: Direction) -> bool {
        match self.selected {
            Some(node) => tree.move_within_siblings(node, direction),
            None => false,
        }
    }

    /// Drop the selection if its node no longer exists
    pub fn forget_if_removed(&mut self, tree: &NodeTree, overlay: &mut OverlaySynchronizer) -> bool {
        match self.selected {
            Some(node) if !tree.contains(node) => self.clear(overlay),
            _ => false,
        }
    }
}
