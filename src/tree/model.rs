//! The canonical node tree
//!
//! Nodes live in an id-keyed arena. Every node stores a back-reference to
//! the slot that owns it, so ancestor walks are O(depth) and never scan the
//! tree. All mutation is synchronous: observers registered with
//! [`NodeTree::subscribe`] are called before the mutating method returns.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, error};

use crate::error::EditorError;

use super::attrs::{keys, AttrValue, LayoutMode};
use super::node::{Kind, Node, NodeId, SlotName, SlotRef, Variant};
use super::schema::{schema_for, MAX_GRID_COLUMNS};

/// Reorder direction among siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// A structural or attribute change, delivered synchronously to observers
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    Inserted {
        node: NodeId,
        slot: SlotRef,
        index: usize,
    },
    Removed {
        node: NodeId,
        slot: SlotRef,
        released: usize,
    },
    Moved {
        node: NodeId,
        from: SlotRef,
        to: SlotRef,
        index: usize,
    },
    Reordered {
        node: NodeId,
        slot: SlotRef,
        from: usize,
        to: usize,
    },
    AttributeChanged {
        node: NodeId,
        key: String,
    },
    Renamed {
        node: NodeId,
    },
}

impl TreeEvent {
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TreeEvent::Inserted { .. }
                | TreeEvent::Removed { .. }
                | TreeEvent::Moved { .. }
                | TreeEvent::Reordered { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&TreeEvent)>;

#[derive(Default)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    /// Bumped on every structural change
    version: u64,
    /// Bumped on every change to a layout-affecting attribute
    layout_version: u64,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("version", &self.version)
            .field("layout_version", &self.layout_version)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Observation ────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&TreeEvent) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    fn emit(&mut self, event: TreeEvent) {
        if event.is_structural() {
            self.version += 1;
        }
        for (_, observer) in self.observers.iter_mut() {
            observer(&event);
        }
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, EditorError> {
        self.nodes.get(&id).ok_or(EditorError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, EditorError> {
        self.nodes.get_mut(&id).ok_or(EditorError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Top-level nodes on the canvas, in document order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of nodes attached under the canvas
    pub fn len(&self) -> usize {
        self.document_order().len()
    }

    pub fn slot_children(&self, slot: SlotRef) -> Option<&[NodeId]> {
        match slot {
            SlotRef::Root => Some(&self.roots),
            SlotRef::Child { owner, name } => self.nodes.get(&owner)?.slot(name),
        }
    }

    fn slot_vec_mut(&mut self, slot: SlotRef) -> Option<&mut Vec<NodeId>> {
        match slot {
            SlotRef::Root => Some(&mut self.roots),
            SlotRef::Child { owner, name } => self.nodes.get_mut(&owner)?.slot_mut(name),
        }
    }

    /// Children across every slot of `node`, slots in document order
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children().collect())
            .unwrap_or_default()
    }

    pub fn parent_slot(&self, node: NodeId) -> Option<SlotRef> {
        self.nodes.get(&node)?.parent
    }

    /// Nearest placed ancestor, skipping slot wrappers; `None` at root
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.parent_slot(node)?.owner()
    }

    /// Placed ancestors of `node`, nearest first
    pub fn ancestors_of(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_node(node);
        while let Some(id) = current {
            out.push(id);
            current = self.parent_node(id);
        }
        out
    }

    /// True when `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent_node(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_node(id);
        }
        false
    }

    /// True when the slot's owner, or any ancestor of it, has `variant`
    pub fn slot_within(&self, slot: SlotRef, variant: Variant) -> bool {
        let Some(owner) = slot.owner() else {
            return false;
        };
        std::iter::once(owner)
            .chain(self.ancestors_of(owner))
            .filter_map(|id| self.nodes.get(&id))
            .any(|n| n.variant == variant)
    }

    /// All attached nodes, depth-first in document order
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                let children: Vec<NodeId> = node.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        out
    }

    /// First attached node in document order matching `predicate`
    pub fn find(&self, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|id| self.nodes.get(id).is_some_and(&predicate))
    }

    pub fn find_all(&self, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(&predicate))
            .collect()
    }

    /// Root-level headers and locked panel sections keep their position
    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| {
            n.locked || (n.variant == Variant::Header && n.parent == Some(SlotRef::Root))
        })
    }

    // ── Structural mutation ───────────────────────────────────────

    /// Create a detached node with default name and empty slots
    pub fn create_node(&mut self, kind: Kind, variant: Variant) -> NodeId {
        let node = Node::new(kind, variant);
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Attach a child to a slot of a detached subtree without notifying
    /// observers; used while a blueprint is being built.
    pub(crate) fn adopt(&mut self, owner: NodeId, slot: SlotName, child: NodeId) -> Result<(), EditorError> {
        let target = SlotRef::child(owner, slot);
        self.check_insertable(child, target)?;
        let list = self.slot_vec_mut(target).ok_or(EditorError::NodeNotFound(owner))?;
        list.push(child);
        let limit = self.node(owner).ok().and_then(Self::grid_columns);
        let n = self.node_mut(child)?;
        n.parent = Some(target);
        if let Some(limit) = limit {
            if n.attributes.get_u32(keys::GRID_COLUMN).is_some_and(|span| span > limit) {
                n.attributes.insert(keys::GRID_COLUMN, AttrValue::Int(limit));
            }
        }
        Ok(())
    }

    fn check_insertable(&self, node: NodeId, slot: SlotRef) -> Result<(), EditorError> {
        let n = self.node(node)?;
        if let Some(parent) = n.parent {
            return Err(EditorError::AlreadyAttached { node, parent });
        }
        self.check_target(node, slot)
    }

    fn check_target(&self, node: NodeId, slot: SlotRef) -> Result<(), EditorError> {
        if let SlotRef::Child { owner, name } = slot {
            let o = self.node(owner)?;
            if !o.has_slot(name) {
                return Err(EditorError::InvalidSlot {
                    owner,
                    variant: o.variant,
                    slot: name,
                });
            }
            if owner == node || self.is_ancestor(node, owner) {
                return Err(EditorError::CyclicInsert { node, slot });
            }
        }
        Ok(())
    }

    /// Attach a detached node at `index` within `slot`
    pub fn insert(&mut self, slot: SlotRef, node: NodeId, index: usize) -> Result<(), EditorError> {
        if let Err(e) = self.check_insertable(node, slot) {
            error!(%node, %slot, error = %e, "rejected insert");
            return Err(e);
        }
        let list = self
            .slot_vec_mut(slot)
            .ok_or_else(|| EditorError::integrity(format!("slot {} vanished", slot)))?;
        if index > list.len() {
            return Err(EditorError::InvalidIndex {
                slot,
                index,
                len: list.len(),
            });
        }
        list.insert(index, node);
        self.node_mut(node)?.parent = Some(slot);
        debug!(%node, %slot, index, "inserted node");
        self.emit(TreeEvent::Inserted { node, slot, index });
        self.clamp_span(node)
    }

    /// Detach `node` and release its whole subtree.
    ///
    /// Returns the slot it was removed from; a no-op returning `None` for a
    /// node without a parent.
    pub fn remove(&mut self, node: NodeId) -> Option<SlotRef> {
        let slot = self.nodes.get(&node)?.parent?;
        self.unlink(node, slot);
        let released = self.release(node);
        debug!(%node, %slot, released, "removed subtree");
        self.emit(TreeEvent::Removed {
            node,
            slot,
            released,
        });
        Some(slot)
    }

    /// Drop a detached subtree that was never inserted
    pub(crate) fn discard(&mut self, node: NodeId) -> usize {
        match self.nodes.get(&node) {
            Some(n) if n.parent.is_none() => self.release(node),
            _ => 0,
        }
    }

    fn unlink(&mut self, node: NodeId, slot: SlotRef) -> Option<usize> {
        let list = self.slot_vec_mut(slot)?;
        let index = list.iter().position(|id| *id == node)?;
        list.remove(index);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = None;
        }
        Some(index)
    }

    fn release(&mut self, node: NodeId) -> usize {
        let mut released = 0;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(n) = self.nodes.remove(&id) {
                released += 1;
                stack.extend(n.children());
            }
        }
        released
    }

    /// Swap `node` with its neighbour in `direction`.
    ///
    /// Returns false at either end of the sibling list, for detached nodes,
    /// and when either node involved is pinned.
    pub fn move_within_siblings(&mut self, node: NodeId, direction: Direction) -> bool {
        let Some(slot) = self.parent_slot(node) else {
            return false;
        };
        let Some(siblings) = self.slot_children(slot) else {
            return false;
        };
        let Some(index) = siblings.iter().position(|id| *id == node) else {
            return false;
        };
        let target = match direction {
            Direction::Left if index > 0 => index - 1,
            Direction::Right if index + 1 < siblings.len() => index + 1,
            _ => return false,
        };
        let neighbour = siblings[target];
        if self.is_pinned(node) || self.is_pinned(neighbour) {
            return false;
        }
        if let Some(list) = self.slot_vec_mut(slot) {
            list.swap(index, target);
        }
        self.emit(TreeEvent::Reordered {
            node,
            slot,
            from: index,
            to: target,
        });
        true
    }

    /// Move an attached node to `index` of `slot`.
    ///
    /// `index` is interpreted against the slot as it is before the move.
    pub fn move_to(&mut self, node: NodeId, slot: SlotRef, index: usize) -> Result<(), EditorError> {
        let n = self.node(node)?;
        if n.locked {
            return Err(EditorError::LockedNode(node));
        }
        let Some(from) = n.parent else {
            return self.insert(slot, node, index);
        };
        self.check_target(node, slot)?;
        let len = self
            .slot_children(slot)
            .map(|c| c.len())
            .ok_or_else(|| EditorError::integrity(format!("slot {} vanished", slot)))?;
        if index > len {
            return Err(EditorError::InvalidIndex { slot, index, len });
        }
        let from_index = self
            .unlink(node, from)
            .ok_or_else(|| EditorError::integrity(format!("{} missing from {}", node, from)))?;
        let mut index = index;
        if from == slot && from_index < index {
            index -= 1;
        }
        let list = self
            .slot_vec_mut(slot)
            .ok_or_else(|| EditorError::integrity(format!("slot {} vanished", slot)))?;
        let index = index.min(list.len());
        list.insert(index, node);
        self.node_mut(node)?.parent = Some(slot);
        debug!(%node, %from, to = %slot, index, "moved node");
        self.emit(TreeEvent::Moved {
            node,
            from,
            to: slot,
            index,
        });
        self.clamp_span(node)
    }

    // ── Property edits ────────────────────────────────────────────

    pub fn rename(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), EditorError> {
        self.node_mut(node)?.name = name.into();
        self.emit(TreeEvent::Renamed { node });
        Ok(())
    }

    /// Set an attribute after validating it against the variant's schema.
    ///
    /// A `gridColumn` is clamped to the parent grid's column count. Lowering
    /// `cols`, or switching a container back to grid, clamps the spans of
    /// the container's children.
    pub fn set_attribute(&mut self, node: NodeId, key: &str, value: AttrValue) -> Result<(), EditorError> {
        let variant = self.node(node)?.variant;
        let def = *schema_for(variant)
            .get(key)
            .ok_or_else(|| crate::error::AttrError::UnknownKey {
                variant,
                key: key.to_string(),
            })?;
        def.check(&value)?;

        let value = match (key, value) {
            (keys::GRID_COLUMN, AttrValue::Int(span)) => match self.parent_grid_columns(node) {
                Some(limit) => AttrValue::Int(span.min(limit)),
                None => AttrValue::Int(span),
            },
            (_, v) => v,
        };

        self.write_attribute(node, key, value, def.affects_layout())?;
        if key == keys::COLS || key == keys::LAYOUT {
            self.clamp_child_spans(node)?;
        }
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn clear_attribute(&mut self, node: NodeId, key: &str) -> Result<bool, EditorError> {
        let variant = self.node(node)?.variant;
        let affects_layout = schema_for(variant)
            .get(key)
            .is_some_and(|d| d.affects_layout());
        let removed = self.node_mut(node)?.attributes.remove(key).is_some();
        if removed {
            if affects_layout {
                self.layout_version += 1;
            }
            self.emit(TreeEvent::AttributeChanged {
                node,
                key: key.to_string(),
            });
        }
        Ok(removed)
    }

    fn write_attribute(&mut self, node: NodeId, key: &str, value: AttrValue, affects_layout: bool) -> Result<(), EditorError> {
        let n = self.node_mut(node)?;
        if n.attributes.get(key) == Some(&value) {
            return Ok(());
        }
        n.attributes.insert(key, value);
        if affects_layout {
            self.layout_version += 1;
        }
        self.emit(TreeEvent::AttributeChanged {
            node,
            key: key.to_string(),
        });
        Ok(())
    }

    /// Column count of the grid `node` sits in, if its parent lays out as a grid
    fn parent_grid_columns(&self, node: NodeId) -> Option<u32> {
        let parent = self.get(self.parent_node(node)?)?;
        Self::grid_columns(parent)
    }

    fn grid_columns(container: &Node) -> Option<u32> {
        let schema = schema_for(container.variant);
        if schema.get(keys::COLS).is_none() {
            return None;
        }
        if container.attributes.layout_mode() != LayoutMode::Grid {
            return None;
        }
        Some(
            container
                .attributes
                .get_u32(keys::COLS)
                .unwrap_or(MAX_GRID_COLUMNS),
        )
    }

    /// Pull `node`'s span in to the column count of the grid it now sits in
    fn clamp_span(&mut self, node: NodeId) -> Result<(), EditorError> {
        let Some(limit) = self.parent_grid_columns(node) else {
            return Ok(());
        };
        let span = self.node(node)?.attributes.get_u32(keys::GRID_COLUMN);
        if span.is_some_and(|span| span > limit) {
            debug!(%node, limit, "clamping grid span");
            self.write_attribute(node, keys::GRID_COLUMN, AttrValue::Int(limit), true)?;
        }
        Ok(())
    }

    fn clamp_child_spans(&mut self, container: NodeId) -> Result<(), EditorError> {
        let node = self.node(container)?;
        let Some(limit) = Self::grid_columns(node) else {
            return Ok(());
        };
        let over: Vec<NodeId> = node
            .slot(SlotName::Children)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|c| {
                self.get(*c)
                    .and_then(|n| n.attributes.get_u32(keys::GRID_COLUMN))
                    .is_some_and(|span| span > limit)
            })
            .collect();
        for child in over {
            debug!(node = %child, limit, "clamping grid span");
            self.write_attribute(child, keys::GRID_COLUMN, AttrValue::Int(limit), true)?;
        }
        Ok(())
    }

    // ── Integrity ─────────────────────────────────────────────────

    /// Verify every structural invariant of the placed tree
    pub fn check_integrity(&self) -> Result<(), EditorError> {
        let mut seen = HashSet::new();
        let mut stack: Vec<(NodeId, SlotRef)> =
            self.roots.iter().map(|id| (*id, SlotRef::Root)).collect();
        while let Some((id, expected)) = stack.pop() {
            let node = self
                .get(id)
                .ok_or_else(|| EditorError::integrity(format!("dangling child {}", id)))?;
            if !seen.insert(id) {
                return Err(EditorError::integrity(format!("{} has two parents", id)));
            }
            if node.parent != Some(expected) {
                return Err(EditorError::integrity(format!(
                    "{} back-reference {:?} does not match {}",
                    id, node.parent, expected
                )));
            }
            for (name, children) in &node.slots {
                for child in children {
                    stack.push((*child, SlotRef::child(id, *name)));
                }
            }
        }

        for variant in [Variant::Header, Variant::Splitter] {
            let found = self.find_all(|n| n.variant == variant);
            if found.len() > 1 {
                return Err(EditorError::integrity(format!("{} {} nodes", found.len(), variant)));
            }
            if let Some(id) = found.first() {
                if self.parent_slot(*id) != Some(SlotRef::Root) {
                    return Err(EditorError::integrity(format!("{} is not at root", variant)));
                }
            }
        }
        if let Some(header) = self.find(|n| n.variant == Variant::Header) {
            if self.roots.first() != Some(&header) {
                return Err(EditorError::integrity("header is not first on the canvas"));
            }
            let actions = self.get(header).and_then(|h| h.slot(SlotName::Actions)).unwrap_or_default();
            if actions.iter().any(|a| self.get(*a).map(|n| n.variant) != Some(Variant::Button)) {
                return Err(EditorError::integrity("header actions hold a non-button"));
            }
        }

        for id in self.find_all(|n| n.attributes.get_u32(keys::GRID_COLUMN).is_some()) {
            let span = self.get(id).map_or(1, |n| n.attributes.grid_column());
            if let Some(limit) = self.parent_grid_columns(id) {
                if span > limit {
                    return Err(EditorError::integrity(format!(
                        "{} spans {} columns of a {}-column grid",
                        id, span, limit
                    )));
                }
            }
        }

        for id in self.find_all(|n| n.variant.requires_form()) {
            let Some(slot) = self.parent_slot(id) else {
                continue;
            };
            let in_header = slot.name() == Some(SlotName::Actions);
            let is_button = self.get(id).map(|n| n.variant) == Some(Variant::Button);
            if !self.slot_within(slot, Variant::Form) && !(in_header && is_button) {
                return Err(EditorError::integrity(format!("{} outside a form", id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn section(tree: &mut NodeTree) -> NodeId {
        tree.create_node(Kind::Container, Variant::Section)
    }

    #[test]
    fn test_insert_and_remove_roundtrip() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.insert(SlotRef::child(s, SlotName::Children), t, 0).unwrap();

        assert_eq!(tree.roots(), &[s]);
        assert_eq!(tree.children_of(s), vec![t]);
        assert_eq!(tree.ancestors_of(t), vec![s]);
        assert_eq!(tree.len(), 2);

        assert_eq!(tree.remove(s), Some(SlotRef::Root));
        assert!(tree.is_empty());
        assert!(!tree.contains(t), "descendants are released with the subtree");
    }

    #[test]
    fn test_remove_detached_is_noop() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        let before = tree.version();
        assert_eq!(tree.remove(s), None);
        assert_eq!(tree.version(), before);
        assert!(tree.contains(s));
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut tree = NodeTree::new();
        let outer = section(&mut tree);
        let inner = section(&mut tree);
        tree.insert(SlotRef::Root, outer, 0).unwrap();
        tree.insert(SlotRef::child(outer, SlotName::Children), inner, 0).unwrap();

        // outer is attached, so detach it first to attempt the cycle
        let detached = tree.create_node(Kind::Container, Variant::Card);
        let err = tree
            .insert(SlotRef::child(detached, SlotName::Children), detached, 0)
            .unwrap_err();
        assert!(matches!(err, EditorError::CyclicInsert { .. }));

        let err = tree
            .move_to(outer, SlotRef::child(inner, SlotName::Children), 0)
            .unwrap_err();
        assert!(matches!(err, EditorError::CyclicInsert { .. }));
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_insert_rejects_bad_slot_and_index() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);

        let err = tree
            .insert(SlotRef::child(s, SlotName::Actions), t, 0)
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidSlot { .. }));

        let err = tree
            .insert(SlotRef::child(s, SlotName::Children), t, 3)
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidIndex { len: 0, .. }));

        let err = tree.insert(SlotRef::Root, s, 0).unwrap_err();
        assert!(matches!(err, EditorError::AlreadyAttached { .. }));
    }

    #[test]
    fn test_move_within_siblings_boundaries() {
        let mut tree = NodeTree::new();
        let a = section(&mut tree);
        let b = section(&mut tree);
        tree.insert(SlotRef::Root, a, 0).unwrap();
        tree.insert(SlotRef::Root, b, 1).unwrap();

        assert!(!tree.move_within_siblings(a, Direction::Left));
        assert!(!tree.move_within_siblings(b, Direction::Right));
        assert!(tree.move_within_siblings(b, Direction::Left));
        assert_eq!(tree.roots(), &[b, a]);
    }

    #[test]
    fn test_header_stays_first() {
        let mut tree = NodeTree::new();
        let header = tree.create_node(Kind::Component, Variant::Header);
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, header, 0).unwrap();
        tree.insert(SlotRef::Root, s, 1).unwrap();

        assert!(!tree.move_within_siblings(s, Direction::Left));
        assert!(!tree.move_within_siblings(header, Direction::Right));
        assert_eq!(tree.roots(), &[header, s]);
    }

    #[test]
    fn test_move_to_same_slot_adjusts_index() {
        let mut tree = NodeTree::new();
        let ids: Vec<NodeId> = (0..3).map(|_| section(&mut tree)).collect();
        for (i, id) in ids.iter().enumerate() {
            tree.insert(SlotRef::Root, *id, i).unwrap();
        }
        // Append the first node to the end of its own slot
        tree.move_to(ids[0], SlotRef::Root, 3).unwrap();
        assert_eq!(tree.roots(), &[ids[1], ids[2], ids[0]]);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_find_in_document_order() {
        let mut tree = NodeTree::new();
        let a = section(&mut tree);
        let b = tree.create_node(Kind::Container, Variant::Form);
        tree.insert(SlotRef::Root, a, 0).unwrap();
        tree.insert(SlotRef::Root, b, 1).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.insert(SlotRef::child(b, SlotName::Children), t, 0).unwrap();

        assert_eq!(tree.find(|n| n.variant() == Variant::Form), Some(b));
        assert_eq!(tree.find(|n| n.variant() == Variant::List), None);
        assert_eq!(tree.document_order(), vec![a, b, t]);
        assert!(tree.slot_within(SlotRef::child(b, SlotName::Children), Variant::Form));
        assert!(!tree.slot_within(SlotRef::Root, Variant::Form));
    }

    #[test]
    fn test_observers_fire_synchronously() {
        let mut tree = NodeTree::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let id = tree.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert!(matches!(log.borrow()[0], TreeEvent::Inserted { index: 0, .. }));

        assert!(tree.unsubscribe(id));
        tree.remove(s);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_cols_decrease_clamps_child_spans() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        tree.set_attribute(s, keys::COLS, AttrValue::Int(4)).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.insert(SlotRef::child(s, SlotName::Children), t, 0).unwrap();
        tree.set_attribute(t, keys::GRID_COLUMN, AttrValue::Int(3)).unwrap();

        tree.set_attribute(s, keys::COLS, AttrValue::Int(2)).unwrap();
        assert_eq!(tree.get(t).unwrap().attributes().grid_column(), 2);

        // New spans are clamped on write as well
        tree.set_attribute(t, keys::GRID_COLUMN, AttrValue::Int(4)).unwrap();
        assert_eq!(tree.get(t).unwrap().attributes().grid_column(), 2);
    }

    #[test]
    fn test_move_into_narrower_grid_clamps_span() {
        let mut tree = NodeTree::new();
        let wide = section(&mut tree);
        let narrow = section(&mut tree);
        tree.insert(SlotRef::Root, wide, 0).unwrap();
        tree.insert(SlotRef::Root, narrow, 1).unwrap();
        tree.set_attribute(wide, keys::COLS, AttrValue::Int(4)).unwrap();
        tree.set_attribute(narrow, keys::COLS, AttrValue::Int(1)).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.insert(SlotRef::child(wide, SlotName::Children), t, 0).unwrap();
        tree.set_attribute(t, keys::GRID_COLUMN, AttrValue::Int(4)).unwrap();

        tree.move_to(t, SlotRef::child(narrow, SlotName::Children), 0).unwrap();
        assert_eq!(tree.get(t).unwrap().attributes().grid_column(), 1);
        tree.check_integrity().unwrap();

        // A detached node keeps its span until it lands in a grid
        tree.remove(t);
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.set_attribute(t, keys::GRID_COLUMN, AttrValue::Int(3)).unwrap();
        tree.insert(SlotRef::child(narrow, SlotName::Children), t, 0).unwrap();
        assert_eq!(tree.get(t).unwrap().attributes().grid_column(), 1);
    }

    #[test]
    fn test_integrity_flags_oversized_span() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        tree.set_attribute(s, keys::COLS, AttrValue::Int(2)).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.insert(SlotRef::child(s, SlotName::Children), t, 0).unwrap();
        tree.node_mut(t)
            .unwrap()
            .attributes
            .insert(keys::GRID_COLUMN, AttrValue::Int(3));

        let err = tree.check_integrity().unwrap_err();
        assert!(err.to_string().contains("spans 3 columns of a 2-column grid"));
    }

    #[test]
    fn test_flex_parent_does_not_clamp() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        tree.set_attribute(s, keys::COLS, AttrValue::Int(1)).unwrap();
        tree.set_attribute(s, keys::LAYOUT, AttrValue::Layout(LayoutMode::Flex)).unwrap();
        let t = tree.create_node(Kind::Component, Variant::Text);
        tree.insert(SlotRef::child(s, SlotName::Children), t, 0).unwrap();

        tree.set_attribute(t, keys::GRID_COLUMN, AttrValue::Int(3)).unwrap();
        assert_eq!(tree.get(t).unwrap().attributes().grid_column(), 3);

        // Back to grid: the span is pulled in
        tree.set_attribute(s, keys::LAYOUT, AttrValue::Layout(LayoutMode::Grid)).unwrap();
        assert_eq!(tree.get(t).unwrap().attributes().grid_column(), 1);
    }

    #[test]
    fn test_layout_version_tracks_only_layout_keys() {
        let mut tree = NodeTree::new();
        let s = section(&mut tree);
        tree.insert(SlotRef::Root, s, 0).unwrap();
        let before = tree.layout_version();
        tree.set_attribute(s, keys::TITLE, AttrValue::str("Billing")).unwrap();
        assert_eq!(tree.layout_version(), before);
        tree.set_attribute(s, keys::COLS, AttrValue::Int(2)).unwrap();
        assert_eq!(tree.layout_version(), before + 1);
        // Same value again is not a change
        tree.set_attribute(s, keys::COLS, AttrValue::Int(2)).unwrap();
        assert_eq!(tree.layout_version(), before + 1);
    }

    #[test]
    fn test_schema_rejects_unknown_key() {
        let mut tree = NodeTree::new();
        let t = tree.create_node(Kind::Component, Variant::Text);
        let err = tree.set_attribute(t, keys::COLS, AttrValue::Int(2)).unwrap_err();
        assert!(matches!(err, EditorError::Attribute(_)));
    }
}
