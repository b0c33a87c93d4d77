//! Drag-drop session state machine.
//!
//! A session is `Idle → Dragging → Idle`. Every pointer-over resolves the
//! drop target afresh and moves the drop indicator; a drop resolves once
//! more against the final pointer position before anything is created.
//!
//! ## Failure modes
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | Illegal target at drop | [`DropOutcome::Rejected`], tree untouched |
//! | Unknown variant or failing constructor | [`DropOutcome::FactoryFailed`], tree untouched |
//! | Drop or end without a session | [`DropOutcome::NotDragging`] |
//!
//! Whatever happens, the session returns to idle and the indicator hides.

use tracing::{debug, error};

use crate::error::EditorError;
use crate::factory::{style_header_actions, ComponentFactory};
use crate::overlay::{GeometryProvider, OverlaySynchronizer, Point, PointerHit};
use crate::placement::{resolve_drop_target, Payload, Rejection, Resolution};
use crate::tree::{NodeId, NodeTree, Variant};

/// Cursor feedback for the platform drag session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Copy,
    Move,
    /// "Not allowed" cursor
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        payload: Payload,
        /// Resolution from the latest pointer-over, for feedback only
        last: Option<Resolution>,
    },
}

/// Result of a drop
#[derive(Debug)]
pub enum DropOutcome {
    /// New node created and inserted
    Inserted(NodeId),
    /// Existing node moved
    Moved(NodeId),
    Rejected(Rejection),
    FactoryFailed(Variant),
    NotDragging,
    /// A tree mutation failed after validation passed
    Failed(EditorError),
}

impl DropOutcome {
    /// The node the drop placed, if it changed the tree
    pub fn placed(&self) -> Option<NodeId> {
        match self {
            DropOutcome::Inserted(id) | DropOutcome::Moved(id) => Some(*id),
            _ => None,
        }
    }
}

/// Everything a drop touches
pub struct DropContext<'a> {
    pub tree: &'a mut NodeTree,
    pub factory: &'a ComponentFactory,
    pub overlay: &'a mut OverlaySynchronizer,
    pub geometry: &'a dyn GeometryProvider,
}

#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.state {
            DragState::Dragging { payload, .. } => Some(payload),
            DragState::Idle => None,
        }
    }

    /// Start a session; any session still open is abandoned
    pub fn begin(&mut self, payload: Payload) {
        debug!(variant = %payload.variant, moving = payload.source.is_some(), "drag started");
        self.state = DragState::Dragging {
            payload,
            last: None,
        };
    }

    /// Pointer moved during a drag: hit-test and update feedback
    pub fn drag_over(&mut self, cx: &mut DropContext<'_>, point: Point) -> DropEffect {
        let hit = cx.geometry.hit_test(point);
        self.drag_over_hit(cx, hit)
    }

    pub fn drag_over_hit(&mut self, cx: &mut DropContext<'_>, hit: PointerHit) -> DropEffect {
        let DragState::Dragging { payload, last } = &mut self.state else {
            return DropEffect::None;
        };
        let resolution = resolve_drop_target(cx.tree, payload, hit);
        *last = Some(resolution);
        match resolution {
            Resolution::Legal(target) => {
                cx.overlay
                    .show_drop_indicator(cx.tree, cx.geometry, target.surface());
                if payload.source.is_some() {
                    DropEffect::Move
                } else {
                    DropEffect::Copy
                }
            }
            Resolution::Illegal { .. } => {
                cx.overlay.hide_drop_indicator();
                DropEffect::None
            }
        }
    }

    pub fn drop(&mut self, cx: &mut DropContext<'_>, point: Point) -> DropOutcome {
        let hit = cx.geometry.hit_test(point);
        self.drop_on_hit(cx, hit)
    }

    /// Finish the session at `hit`.
    ///
    /// The target is resolved again here; the resolution from the last
    /// pointer-over is never reused.
    pub fn drop_on_hit(&mut self, cx: &mut DropContext<'_>, hit: PointerHit) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        cx.overlay.hide_drop_indicator();
        let DragState::Dragging { payload, .. } = state else {
            return DropOutcome::NotDragging;
        };

        let target = match resolve_drop_target(cx.tree, &payload, hit) {
            Resolution::Legal(target) => target,
            Resolution::Illegal { reason, .. } => {
                debug!(variant = %payload.variant, %reason, "drop rejected");
                return DropOutcome::Rejected(reason);
            }
        };

        if let Some(source) = payload.source {
            return match cx.tree.move_to(source, target.slot, target.index) {
                Ok(()) => {
                    debug!(node = %source, slot = %target.slot, "moved by drag");
                    DropOutcome::Moved(source)
                }
                Err(e) => {
                    error!(node = %source, error = %e, "validated move failed");
                    DropOutcome::Failed(e)
                }
            };
        }

        let Some(mut blueprint) = cx.factory.create(payload.kind, payload.variant) else {
            return DropOutcome::FactoryFailed(payload.variant);
        };
        if payload.variant == Variant::Header {
            style_header_actions(&mut blueprint);
        }
        let node = match blueprint.instantiate(cx.tree) {
            Ok(node) => node,
            Err(e) => {
                error!(variant = %payload.variant, error = %e, "failed to build subtree");
                return DropOutcome::Failed(e);
            }
        };
        if let Err(e) = cx.tree.insert(target.slot, node, target.index) {
            cx.tree.discard(node);
            return DropOutcome::Failed(e);
        }
        debug!(%node, slot = %target.slot, index = target.index, "dropped");
        DropOutcome::Inserted(node)
    }

    /// Platform drag end or abort; always leaves the session idle
    pub fn cancel(&mut self, overlay: &mut OverlaySynchronizer) -> bool {
        overlay.hide_drop_indicator();
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComponentDefaults, EditorConfig};
    use crate::overlay::{Rect, StaticGeometry, Surface};
    use crate::tree::{Kind, SlotName, SlotRef};

    struct Fixture {
        tree: NodeTree,
        factory: ComponentFactory,
        overlay: OverlaySynchronizer,
        geo: StaticGeometry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tree: NodeTree::new(),
                factory: ComponentFactory::with_builtins(ComponentDefaults::default()),
                overlay: OverlaySynchronizer::new(&EditorConfig::default()),
                geo: StaticGeometry::new()
                    .with_rect(Surface::Canvas, Rect::new(0.0, 0.0, 1000.0, 800.0)),
            }
        }

        fn cx(&mut self) -> DropContext<'_> {
            DropContext {
                tree: &mut self.tree,
                factory: &self.factory,
                overlay: &mut self.overlay,
                geometry: &self.geo,
            }
        }
    }

    #[test]
    fn test_drop_section_on_empty_canvas() {
        let mut f = Fixture::new();
        let mut drag = DragCoordinator::new();
        drag.begin(Payload::palette(Variant::Section));

        let effect = drag.drag_over_hit(&mut f.cx(), PointerHit::Canvas);
        assert_eq!(effect, DropEffect::Copy);
        assert!(f.overlay.drop_indicator().visible);
        assert_eq!(f.overlay.drop_surface(), Some(Surface::Canvas));

        let outcome = drag.drop_on_hit(&mut f.cx(), PointerHit::Canvas);
        let id = outcome.placed().unwrap();
        assert_eq!(f.tree.roots(), &[id]);
        assert!(!drag.is_dragging());
        assert!(!f.overlay.drop_indicator().visible);
    }

    #[test]
    fn test_illegal_over_hides_indicator() {
        let mut f = Fixture::new();
        let mut drag = DragCoordinator::new();
        drag.begin(Payload::palette(Variant::Input));
        assert_eq!(drag.drag_over_hit(&mut f.cx(), PointerHit::Canvas), DropEffect::None);
        assert!(!f.overlay.drop_indicator().visible);

        let outcome = drag.drop_on_hit(&mut f.cx(), PointerHit::Canvas);
        assert!(matches!(outcome, DropOutcome::Rejected(Rejection::RequiresForm)));
        assert!(f.tree.is_empty());
    }

    #[test]
    fn test_drop_recomputes_target() {
        let mut f = Fixture::new();
        let mut drag = DragCoordinator::new();
        drag.begin(Payload::palette(Variant::Header));
        assert_eq!(drag.drag_over_hit(&mut f.cx(), PointerHit::Canvas), DropEffect::Copy);

        // A header appears between the last pointer-over and the drop
        let other = f.tree.create_node(Kind::Component, Variant::Header);
        f.tree.insert(SlotRef::Root, other, 0).unwrap();

        let outcome = drag.drop_on_hit(&mut f.cx(), PointerHit::Canvas);
        assert!(matches!(outcome, DropOutcome::Rejected(Rejection::SingletonExists)));
        assert_eq!(f.tree.len(), 1);
    }

    #[test]
    fn test_unknown_variant_is_noop() {
        let mut f = Fixture::new();
        f.factory.unregister(Variant::Tabs);
        let mut drag = DragCoordinator::new();
        drag.begin(Payload::palette(Variant::Tabs));
        let outcome = drag.drop_on_hit(&mut f.cx(), PointerHit::Canvas);
        assert!(matches!(outcome, DropOutcome::FactoryFailed(Variant::Tabs)));
        assert!(f.tree.is_empty());
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_header_drop_styles_actions() {
        let mut f = Fixture::new();
        f.factory.register(Variant::Header, |_| {
            let mut header = crate::factory::Blueprint::new(Variant::Header);
            for label in ["Save", "Share"] {
                header = header.with_child(
                    SlotName::Actions,
                    crate::factory::Blueprint::new(Variant::Button).named(label),
                );
            }
            Ok(header)
        });
        let mut drag = DragCoordinator::new();
        drag.begin(Payload::palette(Variant::Header));
        let header = drag
            .drop_on_hit(&mut f.cx(), PointerHit::Canvas)
            .placed()
            .unwrap();
        let actions = f
            .tree
            .slot_children(SlotRef::child(header, SlotName::Actions))
            .unwrap()
            .to_vec();
        let share = f.tree.get(actions[1]).unwrap().attributes();
        assert_eq!(share.button_style(), Some(crate::tree::ButtonStyle::Icon));
        assert_eq!(share.get_str(crate::tree::keys::ICON), Some("more"));
    }

    #[test]
    fn test_cancel_always_resets() {
        let mut f = Fixture::new();
        let mut drag = DragCoordinator::new();
        assert!(!drag.cancel(&mut f.overlay));

        drag.begin(Payload::palette(Variant::Form));
        drag.drag_over_hit(&mut f.cx(), PointerHit::Canvas);
        assert!(drag.cancel(&mut f.overlay));
        assert!(!f.overlay.drop_indicator().visible);
        assert!(matches!(
            drag.drop_on_hit(&mut f.cx(), PointerHit::Canvas),
            DropOutcome::NotDragging
        ));
    }

    #[test]
    fn test_move_existing_node() {
        let mut f = Fixture::new();
        let a = f.tree.create_node(Kind::Container, Variant::Section);
        let b = f.tree.create_node(Kind::Container, Variant::Section);
        f.tree.insert(SlotRef::Root, a, 0).unwrap();
        f.tree.insert(SlotRef::Root, b, 1).unwrap();

        let mut drag = DragCoordinator::new();
        drag.begin(Payload::moving(&f.tree, a).unwrap());
        assert_eq!(drag.drag_over_hit(&mut f.cx(), PointerHit::Node(b)), DropEffect::Move);
        let outcome = drag.drop_on_hit(&mut f.cx(), PointerHit::Node(b));
        assert!(matches!(outcome, DropOutcome::Moved(id) if id == a));
        assert_eq!(f.tree.roots(), &[b]);
        assert_eq!(f.tree.children_of(b), vec![a]);
        f.tree.check_integrity().unwrap();
    }
}
