//! Drop legality: where a dragged payload lands and whether it may
//!
//! Pure functions over a read-only tree. Nothing here mutates, logs at
//! more than trace level, or fails: an illegal placement is an ordinary
//! [`Resolution::Illegal`] value.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::overlay::{PointerHit, Surface};
use crate::tree::{Kind, NodeId, NodeTree, SlotName, SlotRef, Variant};

/// What is being dragged: a palette item, or an existing node when
/// `source` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub kind: Kind,
    pub variant: Variant,
    #[serde(default, skip)]
    pub source: Option<NodeId>,
}

impl Payload {
    pub fn new(kind: Kind, variant: Variant) -> Self {
        Self {
            kind,
            variant,
            source: None,
        }
    }

    /// Palette payload with the variant's own kind
    pub fn palette(variant: Variant) -> Self {
        Self::new(variant.kind(), variant)
    }

    /// Payload for dragging an existing node
    pub fn moving(tree: &NodeTree, node: NodeId) -> Option<Self> {
        let n = tree.get(node)?;
        Some(Self {
            kind: n.kind(),
            variant: n.variant(),
            source: Some(node),
        })
    }

    pub fn is_well_formed(&self) -> bool {
        self.kind == self.variant.kind()
    }
}

/// Variants legal directly on the canvas
pub fn can_accept_at_root(payload: &Payload) -> bool {
    payload.is_well_formed()
        && matches!(
            payload.variant,
            Variant::Section
                | Variant::Form
                | Variant::Splitter
                | Variant::Datagrid
                | Variant::Tabs
                | Variant::Header
        )
}

/// Resolved insertion point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub slot: SlotRef,
    pub index: usize,
}

impl DropTarget {
    /// Surface the drop indicator covers
    pub fn surface(&self) -> Surface {
        Surface::of_slot(self.slot)
    }
}

/// Why a drop was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Pointer is not over the canvas, or over a node no longer placed
    NoTarget,
    /// Payload kind disagrees with its variant
    MalformedPayload,
    SingletonExists,
    SingletonNotAtRoot,
    HeaderAcceptsOnlyButtons,
    RequiresForm,
    NotAllowedInForm,
    NotAllowedAtRoot,
    /// Target slot lies inside the dragged node
    Cycle,
    /// Dragged node is locked in place
    Locked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::NoTarget => "no drop target under the pointer",
            Rejection::MalformedPayload => "payload kind does not match its variant",
            Rejection::SingletonExists => "only one may exist",
            Rejection::SingletonNotAtRoot => "only allowed directly on the canvas",
            Rejection::HeaderAcceptsOnlyButtons => "header actions accept only buttons",
            Rejection::RequiresForm => "must be placed inside a form",
            Rejection::NotAllowedInForm => "not allowed inside a form",
            Rejection::NotAllowedAtRoot => "not allowed directly on the canvas",
            Rejection::Cycle => "cannot drop a node into itself",
            Rejection::Locked => "node is locked",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Legal(DropTarget),
    Illegal {
        /// Slot the pointer resolved to, if any
        target: Option<SlotRef>,
        reason: Rejection,
    },
}

impl Resolution {
    pub fn is_legal(&self) -> bool {
        matches!(self, Resolution::Legal(_))
    }

    pub fn target(&self) -> Option<DropTarget> {
        match self {
            Resolution::Legal(t) => Some(*t),
            Resolution::Illegal { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Resolution::Legal(_) => None,
            Resolution::Illegal { reason, .. } => Some(*reason),
        }
    }

    fn illegal(target: Option<SlotRef>, reason: Rejection) -> Self {
        trace!(?target, %reason, "drop rejected");
        Resolution::Illegal { target, reason }
    }
}

/// Map a pointer hit to the slot a drop would land in.
///
/// Walks up from the hit node to the nearest drop container. Arriving at a
/// container from below selects the slot the walk came through, so a hit
/// inside a splitter panel resolves to that panel; hitting a container
/// directly selects its first slot. No container on the way means the
/// canvas root.
pub fn resolve_slot(tree: &NodeTree, hit: PointerHit) -> Option<SlotRef> {
    match hit {
        PointerHit::Outside => None,
        PointerHit::Canvas => Some(SlotRef::Root),
        PointerHit::Slot(SlotRef::Root) => Some(SlotRef::Root),
        PointerHit::Slot(slot @ SlotRef::Child { owner, name }) => {
            let node = tree.get(owner)?;
            is_placed(tree, owner).then_some(())?;
            node.has_slot(name).then_some(slot)
        }
        PointerHit::Node(id) => {
            if !is_placed(tree, id) {
                return None;
            }
            let mut current = id;
            let mut via: Option<SlotRef> = None;
            loop {
                let node = tree.get(current)?;
                if node.variant().is_drop_container() {
                    return match via {
                        Some(slot) if slot.owner() == Some(current) => Some(slot),
                        _ => node
                            .slot_names()
                            .next()
                            .map(|name| SlotRef::child(current, name)),
                    };
                }
                via = node.parent();
                match via.and_then(SlotRef::owner) {
                    Some(owner) => current = owner,
                    None => return Some(SlotRef::Root),
                }
            }
        }
    }
}

fn is_placed(tree: &NodeTree, id: NodeId) -> bool {
    match tree.get(id) {
        None => false,
        Some(n) => match n.parent() {
            None => false,
            Some(SlotRef::Root) => true,
            Some(SlotRef::Child { owner, .. }) => is_placed(tree, owner),
        },
    }
}

/// Decide where `payload` would land under `hit`, and whether it may.
///
/// Rules apply in order: singleton, header actions, form requirement,
/// form allow-list, canvas allow-list, cycle.
pub fn resolve_drop_target(tree: &NodeTree, payload: &Payload, hit: PointerHit) -> Resolution {
    let Some(slot) = resolve_slot(tree, hit) else {
        return Resolution::illegal(None, Rejection::NoTarget);
    };
    check_slot(tree, payload, slot)
}

/// Apply the placement rules to an already resolved slot
pub fn check_slot(tree: &NodeTree, payload: &Payload, slot: SlotRef) -> Resolution {
    let target = Some(slot);
    if !payload.is_well_formed() {
        return Resolution::illegal(target, Rejection::MalformedPayload);
    }
    if let Some(source) = payload.source {
        match tree.get(source) {
            None => return Resolution::illegal(target, Rejection::NoTarget),
            Some(n) if n.is_locked() => return Resolution::illegal(target, Rejection::Locked),
            Some(_) => {}
        }
    }
    let variant = payload.variant;

    // 1. Singletons live once, at root
    if variant.is_singleton() {
        let exists = tree
            .find(|n| n.variant() == variant && Some(n.id()) != payload.source)
            .is_some();
        if exists {
            return Resolution::illegal(target, Rejection::SingletonExists);
        }
        if !slot.is_root() {
            return Resolution::illegal(target, Rejection::SingletonNotAtRoot);
        }
    }

    // 2. Header actions hold buttons only
    let into_header = slot.name() == Some(SlotName::Actions);
    if into_header && variant != Variant::Button {
        return Resolution::illegal(target, Rejection::HeaderAcceptsOnlyButtons);
    }

    // 3. Form controls need a form, buttons may also go in the header
    let in_form = tree.slot_within(slot, Variant::Form);
    if variant.requires_form() && !in_form && !(variant == Variant::Button && into_header) {
        return Resolution::illegal(target, Rejection::RequiresForm);
    }

    // 4. Inside a form only the allow-list goes
    if in_form {
        debug_assert!(
            !tree.slot_within(slot, Variant::Header),
            "header nested inside a form"
        );
        if !variant.allowed_in_form() {
            return Resolution::illegal(target, Rejection::NotAllowedInForm);
        }
    }

    // A moved node brings its descendants along; they must satisfy 3 and 4 too
    if let Some(source) = payload.source {
        if let Some(reason) = check_carried(tree, source, in_form) {
            return Resolution::illegal(target, reason);
        }
    }

    if slot.is_root() && !can_accept_at_root(payload) {
        return Resolution::illegal(target, Rejection::NotAllowedAtRoot);
    }

    // 5. Never into the dragged node's own subtree
    if let (Some(source), Some(owner)) = (payload.source, slot.owner()) {
        if owner == source || tree.is_ancestor(source, owner) {
            return Resolution::illegal(target, Rejection::Cycle);
        }
    }

    let index = if variant == Variant::Header && slot.is_root() {
        0
    } else {
        tree.slot_children(slot).map_or(0, |c| c.len())
    };
    Resolution::Legal(DropTarget { slot, index })
}

/// Form rules for the descendants of a node being moved
fn check_carried(tree: &NodeTree, source: NodeId, in_form: bool) -> Option<Rejection> {
    let mut stack: Vec<NodeId> = tree.children_of(source);
    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let variant = node.variant();
        if in_form && !variant.allowed_in_form() {
            return Some(Rejection::NotAllowedInForm);
        }
        if !in_form && variant.requires_form() {
            let in_header = node.parent().and_then(SlotRef::name) == Some(SlotName::Actions);
            if !(in_header && variant == Variant::Button) && !form_between(tree, id, source) {
                return Some(Rejection::RequiresForm);
            }
        }
        stack.extend(node.children());
    }
    None
}

/// Whether a form sits on the path from `node` up to `top`, inclusive
fn form_between(tree: &NodeTree, node: NodeId, top: NodeId) -> bool {
    let mut current = tree.parent_node(node);
    while let Some(id) = current {
        if tree.get(id).is_some_and(|n| n.variant() == Variant::Form) {
            return true;
        }
        if id == top {
            break;
        }
        current = tree.parent_node(id);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(tree: &mut NodeTree, slot: SlotRef, variant: Variant) -> NodeId {
        let id = tree.create_node(variant.kind(), variant);
        let len = tree.slot_children(slot).unwrap().len();
        tree.insert(slot, id, len).unwrap();
        id
    }

    fn children(id: NodeId) -> SlotRef {
        SlotRef::child(id, SlotName::Children)
    }

    #[test]
    fn test_root_allow_list() {
        for v in [
            Variant::Section,
            Variant::Form,
            Variant::Splitter,
            Variant::Datagrid,
            Variant::Tabs,
            Variant::Header,
        ] {
            assert!(can_accept_at_root(&Payload::palette(v)), "{}", v);
        }
        for v in [Variant::Card, Variant::Input, Variant::List, Variant::Text] {
            assert!(!can_accept_at_root(&Payload::palette(v)), "{}", v);
        }
        assert!(!can_accept_at_root(&Payload::new(Kind::Component, Variant::Section)));
    }

    #[test]
    fn test_walk_up_to_nearest_container() {
        let mut tree = NodeTree::new();
        let section = place(&mut tree, SlotRef::Root, Variant::Section);
        let text = place(&mut tree, children(section), Variant::Text);

        assert_eq!(
            resolve_slot(&tree, PointerHit::Node(text)),
            Some(children(section))
        );
        assert_eq!(
            resolve_slot(&tree, PointerHit::Node(section)),
            Some(children(section))
        );
        assert_eq!(resolve_slot(&tree, PointerHit::Canvas), Some(SlotRef::Root));
        assert_eq!(resolve_slot(&tree, PointerHit::Outside), None);
    }

    #[test]
    fn test_root_level_leaf_resolves_to_root() {
        let mut tree = NodeTree::new();
        let grid = place(&mut tree, SlotRef::Root, Variant::Datagrid);
        assert_eq!(resolve_slot(&tree, PointerHit::Node(grid)), Some(SlotRef::Root));
    }

    #[test]
    fn test_splitter_panel_precedence() {
        let mut tree = NodeTree::new();
        let splitter = place(&mut tree, SlotRef::Root, Variant::Splitter);
        let right = SlotRef::child(splitter, SlotName::RightPanel);
        let card = place(&mut tree, right, Variant::Card);
        let text = place(&mut tree, SlotRef::child(card, SlotName::Children), Variant::Text);

        // Wrapper hit falls back to the left panel
        assert_eq!(
            resolve_slot(&tree, PointerHit::Node(splitter)),
            Some(SlotRef::child(splitter, SlotName::LeftPanel))
        );
        assert_eq!(resolve_slot(&tree, PointerHit::Slot(right)), Some(right));
        // A leaf directly in the panel resolves through the panel it sits in
        let list = place(&mut tree, right, Variant::List);
        assert_eq!(resolve_slot(&tree, PointerHit::Node(list)), Some(right));
        // Nested containers win over the panel
        assert_eq!(
            resolve_slot(&tree, PointerHit::Node(text)),
            Some(SlotRef::child(card, SlotName::Children))
        );
    }

    #[test]
    fn test_detached_hit_has_no_target() {
        let mut tree = NodeTree::new();
        let loose = tree.create_node(Kind::Container, Variant::Section);
        assert_eq!(resolve_slot(&tree, PointerHit::Node(loose)), None);
        let r = resolve_drop_target(&tree, &Payload::palette(Variant::Text), PointerHit::Node(loose));
        assert_eq!(r.rejection(), Some(Rejection::NoTarget));
    }

    #[test]
    fn test_singleton_rules() {
        let mut tree = NodeTree::new();
        let header = Payload::palette(Variant::Header);
        let r = resolve_drop_target(&tree, &header, PointerHit::Canvas);
        assert_eq!(r.target(), Some(DropTarget { slot: SlotRef::Root, index: 0 }));

        let section = place(&mut tree, SlotRef::Root, Variant::Section);
        let r = resolve_drop_target(&tree, &header, PointerHit::Node(section));
        assert_eq!(r.rejection(), Some(Rejection::SingletonNotAtRoot));

        place(&mut tree, SlotRef::Root, Variant::Header);
        let r = resolve_drop_target(&tree, &header, PointerHit::Canvas);
        assert_eq!(r.rejection(), Some(Rejection::SingletonExists));
    }

    #[test]
    fn test_header_is_inserted_first() {
        let mut tree = NodeTree::new();
        place(&mut tree, SlotRef::Root, Variant::Section);
        place(&mut tree, SlotRef::Root, Variant::Form);
        let r = resolve_drop_target(&tree, &Payload::palette(Variant::Header), PointerHit::Canvas);
        assert_eq!(r.target().map(|t| t.index), Some(0));

        let r = resolve_drop_target(&tree, &Payload::palette(Variant::Tabs), PointerHit::Canvas);
        assert_eq!(r.target().map(|t| t.index), Some(2));
    }

    #[test]
    fn test_header_actions() {
        let mut tree = NodeTree::new();
        let header = place(&mut tree, SlotRef::Root, Variant::Header);
        let actions = SlotRef::child(header, SlotName::Actions);

        let r = resolve_drop_target(&tree, &Payload::palette(Variant::Button), PointerHit::Node(header));
        assert_eq!(r.target().map(|t| t.slot), Some(actions));

        let r = resolve_drop_target(&tree, &Payload::palette(Variant::Text), PointerHit::Slot(actions));
        assert_eq!(r.rejection(), Some(Rejection::HeaderAcceptsOnlyButtons));
    }

    #[test]
    fn test_form_rules() {
        let mut tree = NodeTree::new();
        let section = place(&mut tree, SlotRef::Root, Variant::Section);
        let form = place(&mut tree, SlotRef::Root, Variant::Form);
        let nested = place(&mut tree, children(form), Variant::Section);

        let input = Payload::palette(Variant::Input);
        assert_eq!(
            resolve_drop_target(&tree, &input, PointerHit::Node(section)).rejection(),
            Some(Rejection::RequiresForm)
        );
        assert!(resolve_drop_target(&tree, &input, PointerHit::Node(form)).is_legal());
        // Any depth below the form counts
        assert!(resolve_drop_target(&tree, &input, PointerHit::Node(nested)).is_legal());

        let card = Payload::palette(Variant::Card);
        assert_eq!(
            resolve_drop_target(&tree, &card, PointerHit::Node(nested)).rejection(),
            Some(Rejection::NotAllowedInForm)
        );
        assert!(resolve_drop_target(&tree, &card, PointerHit::Node(section)).is_legal());
    }

    #[test]
    fn test_malformed_payload() {
        let tree = NodeTree::new();
        let bad = Payload::new(Kind::Container, Variant::Button);
        assert_eq!(
            resolve_drop_target(&tree, &bad, PointerHit::Canvas).rejection(),
            Some(Rejection::MalformedPayload)
        );
    }

    #[test]
    fn test_move_cycle_and_locked() {
        let mut tree = NodeTree::new();
        let outer = place(&mut tree, SlotRef::Root, Variant::Section);
        let inner = place(&mut tree, children(outer), Variant::Section);

        let moving = Payload::moving(&tree, outer).unwrap();
        assert_eq!(
            resolve_drop_target(&tree, &moving, PointerHit::Node(inner)).rejection(),
            Some(Rejection::Cycle)
        );
        assert_eq!(
            resolve_drop_target(&tree, &moving, PointerHit::Node(outer)).rejection(),
            Some(Rejection::Cycle)
        );

        let splitter = place(&mut tree, SlotRef::Root, Variant::Splitter);
        let panel = tree.create_node(Kind::Container, Variant::Section);
        tree.node_mut(panel).unwrap().locked = true;
        tree.insert(SlotRef::child(splitter, SlotName::LeftPanel), panel, 0)
            .unwrap();
        let moving = Payload::moving(&tree, panel).unwrap();
        assert_eq!(
            resolve_drop_target(&tree, &moving, PointerHit::Canvas).rejection(),
            Some(Rejection::Locked)
        );
    }

    #[test]
    fn test_moving_singleton_ignores_itself() {
        let mut tree = NodeTree::new();
        place(&mut tree, SlotRef::Root, Variant::Section);
        let header = place(&mut tree, SlotRef::Root, Variant::Header);
        let moving = Payload::moving(&tree, header).unwrap();
        assert!(resolve_drop_target(&tree, &moving, PointerHit::Canvas).is_legal());
    }

    #[test]
    fn test_moved_subtree_keeps_form_rules() {
        let mut tree = NodeTree::new();
        let form = place(&mut tree, SlotRef::Root, Variant::Form);
        let inner = place(&mut tree, children(form), Variant::Section);
        place(&mut tree, children(inner), Variant::Input);
        let outside = place(&mut tree, SlotRef::Root, Variant::Section);
        let card = place(&mut tree, children(outside), Variant::Card);

        // The input would lose its form
        let moving = Payload::moving(&tree, inner).unwrap();
        assert_eq!(
            resolve_drop_target(&tree, &moving, PointerHit::Node(outside)).rejection(),
            Some(Rejection::RequiresForm)
        );

        // The card may not enter a form, even inside a section
        let moving = Payload::moving(&tree, outside).unwrap();
        assert_eq!(
            resolve_drop_target(&tree, &moving, PointerHit::Node(form)).rejection(),
            Some(Rejection::NotAllowedInForm)
        );

        // A whole form carries its own controls anywhere it may go
        tree.remove(card);
        let moving = Payload::moving(&tree, form).unwrap();
        assert!(resolve_drop_target(&tree, &moving, PointerHit::Node(outside)).is_legal());
    }
}
