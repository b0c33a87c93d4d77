//! Hover, selection and drop-indicator rectangles kept in canvas space
//!
//! Change signals (tree mutation, resize, scroll) never recompute geometry
//! directly. They mark a frame as pending; the host's next animation frame
//! runs one [`OverlaySynchronizer::sync`] pass however many signals arrived.

use std::fmt;

use tracing::{debug, trace};

use crate::config::EditorConfig;
use crate::tree::{FlexDirection, LayoutMode, Node, NodeId, NodeTree, SlotRef};

use super::geometry::{GeometryProvider, Point, Rect, Surface};

/// One feedback rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub rect: Rect,
    pub visible: bool,
}

impl Overlay {
    fn hidden(offscreen: f64) -> Self {
        Self {
            rect: Rect::offscreen(offscreen),
            visible: false,
        }
    }
}

/// Distance of the badge from the selection rectangle's top-left corner
pub const BADGE_INSET: f64 = 4.0;

/// Layout mode shown inside the selection rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutBadge {
    Grid,
    Flex(FlexDirection),
}

impl LayoutBadge {
    /// Badge for a node, `None` for variants without a layout mode
    pub fn for_node(node: &Node) -> Option<Self> {
        if !node.variant().has_layout_mode() {
            return None;
        }
        let attrs = node.attributes();
        Some(match attrs.layout_mode() {
            LayoutMode::Grid => LayoutBadge::Grid,
            LayoutMode::Flex => LayoutBadge::Flex(attrs.flex_direction()),
        })
    }
}

impl fmt::Display for LayoutBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutBadge::Grid => write!(f, "GRID"),
            LayoutBadge::Flex(dir) => write!(f, "FLEX {}", dir.as_str().to_uppercase()),
        }
    }
}

#[derive(Debug)]
pub struct OverlaySynchronizer {
    offset: f64,
    offscreen: f64,
    hover: Overlay,
    selection: Overlay,
    drop: Overlay,
    badge: Option<LayoutBadge>,
    hovered: Option<NodeId>,
    drop_surface: Option<Surface>,
    /// Scrollers between the selected node and the canvas
    watched: Vec<Surface>,
    last_pointer: Option<Point>,
    pending: bool,
    seen_version: u64,
    seen_layout_version: u64,
    passes: u64,
}

impl OverlaySynchronizer {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            offset: config.overlay_offset,
            offscreen: config.offscreen,
            hover: Overlay::hidden(config.offscreen),
            selection: Overlay::hidden(config.offscreen),
            drop: Overlay::hidden(config.offscreen),
            badge: None,
            hovered: None,
            drop_surface: None,
            watched: Vec::new(),
            last_pointer: None,
            pending: false,
            seen_version: 0,
            seen_layout_version: 0,
            passes: 0,
        }
    }

    pub fn hover(&self) -> Overlay {
        self.hover
    }

    pub fn selection(&self) -> Overlay {
        self.selection
    }

    pub fn drop_indicator(&self) -> Overlay {
        self.drop
    }

    pub fn badge(&self) -> Option<LayoutBadge> {
        self.badge
    }

    /// Canvas-space position of the badge, inset from the selection
    /// rectangle's top-left corner. `None` while no badge is shown or the
    /// selection is parked off-screen.
    pub fn badge_anchor(&self) -> Option<Point> {
        self.badge?;
        let rect = self.selection.rect;
        if !self.selection.visible || rect.is_empty() {
            return None;
        }
        Some(Point::new(
            rect.x + BADGE_INSET.min(rect.width),
            rect.y + BADGE_INSET.min(rect.height),
        ))
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn drop_surface(&self) -> Option<Surface> {
        self.drop_surface
    }

    pub fn watched_scrollers(&self) -> &[Surface] {
        &self.watched
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Number of sync passes run so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn offscreen_rect(&self) -> Rect {
        Rect::offscreen(self.offscreen)
    }

    // ── Geometry ──────────────────────────────────────────────────

    /// Scrollable surfaces between `surface` and the canvas, nearest first,
    /// followed by the canvas's outer scroll wrapper
    pub fn scroll_chain(&self, tree: &NodeTree, geometry: &dyn GeometryProvider, surface: Surface) -> Vec<Surface> {
        let mut chain = Vec::new();
        let mut next_slot = match surface {
            Surface::Node(id) => tree.parent_slot(id),
            Surface::Slot(SlotRef::Child { owner, .. }) => {
                chain.push(Surface::Node(owner));
                tree.parent_slot(owner)
            }
            Surface::Slot(SlotRef::Root) | Surface::Canvas | Surface::CanvasWrap => None,
        };
        while let Some(slot) = next_slot {
            let SlotRef::Child { owner, .. } = slot else {
                break;
            };
            chain.push(Surface::Slot(slot));
            chain.push(Surface::Node(owner));
            next_slot = tree.parent_slot(owner);
        }
        chain.retain(|s| geometry.is_scroll_container(*s));
        if surface != Surface::CanvasWrap && geometry.client_rect(Surface::CanvasWrap).is_some() {
            chain.push(Surface::CanvasWrap);
        }
        chain
    }

    fn is_live(tree: &NodeTree, surface: Surface) -> bool {
        match surface {
            Surface::Canvas | Surface::CanvasWrap | Surface::Slot(SlotRef::Root) => true,
            Surface::Node(id) => tree.contains(id),
            Surface::Slot(SlotRef::Child { owner, name }) => {
                tree.get(owner).is_some_and(|n| n.has_slot(name))
            }
        }
    }

    /// Bounding box of `surface` in canvas coordinates, inflated by the
    /// configured offset and clipped by every scrollable ancestor.
    ///
    /// Degrades to the off-screen rectangle when the surface is gone, has no
    /// geometry, or is scrolled fully out of view.
    pub fn rect_of(&self, tree: &NodeTree, geometry: &dyn GeometryProvider, surface: Surface) -> Rect {
        let surface = match surface {
            Surface::Slot(SlotRef::Root) => Surface::Canvas,
            other => other,
        };
        if !Self::is_live(tree, surface) {
            return self.offscreen_rect();
        }
        let Some(canvas) = geometry.client_rect(Surface::Canvas) else {
            return self.offscreen_rect();
        };
        let target = geometry.client_rect(surface).or_else(|| match surface {
            Surface::Slot(slot) => slot.owner().and_then(|o| geometry.client_rect(Surface::Node(o))),
            _ => None,
        });
        let Some(target) = target else {
            return self.offscreen_rect();
        };

        let origin = canvas.origin();
        let mut rect = target.relative_to(origin).inflate(self.offset);
        for scroller in self.scroll_chain(tree, geometry, surface) {
            let Some(clip) = geometry.client_rect(scroller) else {
                continue;
            };
            match rect.intersection(&clip.relative_to(origin)) {
                Some(r) => rect = r,
                None => return self.offscreen_rect(),
            }
        }
        rect
    }

    // ── Scheduling ────────────────────────────────────────────────

    /// Request a sync pass on the next animation frame.
    ///
    /// Returns false when a pass is already pending; the request folds into it.
    pub fn schedule_sync(&mut self) -> bool {
        if self.pending {
            trace!("sync already pending");
            return false;
        }
        self.pending = true;
        true
    }

    /// Schedule a pass if the tree changed structure or layout since the
    /// last one
    pub fn observe_tree(&mut self, tree: &NodeTree) -> bool {
        if tree.version() == self.seen_version && tree.layout_version() == self.seen_layout_version {
            return false;
        }
        self.seen_version = tree.version();
        self.seen_layout_version = tree.layout_version();
        self.schedule_sync();
        true
    }

    pub fn notify_resize(&mut self) -> bool {
        self.schedule_sync()
    }

    pub fn notify_scroll(&mut self, surface: Surface) -> bool {
        trace!(?surface, watched = self.watched.contains(&surface), "scroll");
        self.schedule_sync()
    }

    /// Run the pending pass, if any
    pub fn on_animation_frame(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, selected: Option<NodeId>) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.sync(tree, geometry, selected);
        true
    }

    /// Recompute every visible rectangle from current geometry
    pub fn sync(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, selected: Option<NodeId>) {
        self.passes += 1;
        self.seen_version = tree.version();
        self.seen_layout_version = tree.layout_version();

        match selected.filter(|id| tree.contains(*id)) {
            Some(id) => {
                self.selection = Overlay {
                    rect: self.rect_of(tree, geometry, Surface::Node(id)),
                    visible: true,
                };
                self.badge = tree.get(id).and_then(LayoutBadge::for_node);
            }
            None => {
                self.selection = Overlay::hidden(self.offscreen);
                self.badge = None;
            }
        }

        if let Some(point) = self.last_pointer {
            self.update_hover(tree, geometry, point, selected);
        }

        if let Some(surface) = self.drop_surface {
            self.drop.rect = self.rect_of(tree, geometry, surface);
        }
        debug!(pass = self.passes, ?selected, "overlay sync");
    }

    // ── Hover ─────────────────────────────────────────────────────

    fn update_hover(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, point: Point, selected: Option<NodeId>) {
        let node = geometry
            .hit_test(point)
            .node()
            .filter(|id| tree.contains(*id));
        match node {
            Some(id) if Some(id) != selected => {
                self.hover = Overlay {
                    rect: self.rect_of(tree, geometry, Surface::Node(id)),
                    visible: true,
                };
                self.hovered = Some(id);
            }
            _ => self.hide_hover(),
        }
    }

    fn hide_hover(&mut self) {
        self.hover.visible = false;
        self.hovered = None;
    }

    /// Track the pointer and update hover immediately
    pub fn pointer_moved(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, point: Point, selected: Option<NodeId>) -> Option<NodeId> {
        self.last_pointer = Some(point);
        self.update_hover(tree, geometry, point, selected);
        self.hovered
    }

    /// Pointer left the canvas
    pub fn pointer_left(&mut self) {
        self.last_pointer = None;
        self.hide_hover();
    }

    // ── Selection ─────────────────────────────────────────────────

    pub fn show_selection(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, node: NodeId) {
        self.selection = Overlay {
            rect: self.rect_of(tree, geometry, Surface::Node(node)),
            visible: true,
        };
        self.badge = tree.get(node).and_then(LayoutBadge::for_node);
        if self.hovered == Some(node) {
            self.hide_hover();
        }
        self.attach_scroll_chain(tree, geometry, node);
    }

    pub fn hide_selection(&mut self) {
        self.selection = Overlay::hidden(self.offscreen);
        self.badge = None;
        self.detach_scroll_chain();
    }

    /// Watch the scrollers above `node`, replacing the previous chain
    pub fn attach_scroll_chain(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, node: NodeId) {
        self.detach_scroll_chain();
        self.watched = self.scroll_chain(tree, geometry, Surface::Node(node));
        trace!(%node, scrollers = self.watched.len(), "attached scroll chain");
    }

    pub fn detach_scroll_chain(&mut self) {
        self.watched.clear();
    }

    // ── Drop indicator ────────────────────────────────────────────

    pub fn show_drop_indicator(&mut self, tree: &NodeTree, geometry: &dyn GeometryProvider, surface: Surface) {
        self.drop = Overlay {
            rect: self.rect_of(tree, geometry, surface),
            visible: true,
        };
        self.drop_surface = Some(surface);
    }

    pub fn hide_drop_indicator(&mut self) {
        self.drop = Overlay::hidden(self.offscreen);
        self.drop_surface = None;
    }
}
