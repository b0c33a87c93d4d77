//! The editor facade: one tree, one factory, one selection, one overlay.
//!
//! Host input (pointer, keyboard, drag, scroll, animation frames) comes in
//! through `Editor` methods. Each method finishes its tree mutation, then
//! schedules an overlay re-sync and notifies subscribers, in that order.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::drag::{DragCoordinator, DragState, DropContext, DropEffect, DropOutcome};
use crate::error::EditorError;
use crate::factory::ComponentFactory;
use crate::overlay::{GeometryProvider, OverlaySynchronizer, Point, PointerHit, StaticGeometry, Surface};
use crate::placement::Payload;
use crate::selection::{Deletion, Selection};
use crate::tree::{schema_for, AttrValue, Direction, NodeId, NodeTree, TreeEvent};

/// Change notification for tree-view and properties consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Nodes were added, removed or reordered
    StructureChanged,
    SelectionChanged(Option<NodeId>),
    /// A node's attributes or name changed
    AttributesChanged(NodeId),
}

/// Keys the canvas reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    ArrowUp,
    ArrowLeft,
    ArrowRight,
    Escape,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Delete" => Ok(Key::Delete),
            "Backspace" => Ok(Key::Backspace),
            "ArrowUp" => Ok(Key::ArrowUp),
            "ArrowLeft" => Ok(Key::ArrowLeft),
            "ArrowRight" => Ok(Key::ArrowRight),
            "Escape" => Ok(Key::Escape),
            other => Err(format!("unsupported key '{}'", other)),
        }
    }
}

type Listener = Box<dyn FnMut(&EditorEvent)>;

pub struct Editor<G: GeometryProvider = StaticGeometry> {
    config: EditorConfig,
    tree: NodeTree,
    factory: ComponentFactory,
    overlay: OverlaySynchronizer,
    selection: Selection,
    drag: DragCoordinator,
    geometry: G,
    empty_hint: bool,
    tree_events: Rc<RefCell<Vec<TreeEvent>>>,
    listeners: Vec<Listener>,
}

impl<G: GeometryProvider> fmt::Debug for Editor<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("tree", &self.tree)
            .field("selected", &self.selection.selected())
            .field("drag", self.drag.state())
            .field("empty_hint", &self.empty_hint)
            .finish()
    }
}

impl Editor<StaticGeometry> {
    /// Editor with built-in components and no geometry
    pub fn new(config: EditorConfig) -> Self {
        Self::with_geometry(config, StaticGeometry::new())
    }
}

impl<G: GeometryProvider> Editor<G> {
    pub fn with_geometry(config: EditorConfig, geometry: G) -> Self {
        let factory = ComponentFactory::with_builtins(config.components.clone());
        Self::with_factory(config, factory, geometry)
    }

    pub fn with_factory(config: EditorConfig, factory: ComponentFactory, geometry: G) -> Self {
        let mut tree = NodeTree::new();
        let tree_events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&tree_events);
        tree.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            overlay: OverlaySynchronizer::new(&config),
            config,
            tree,
            factory,
            selection: Selection::new(),
            drag: DragCoordinator::new(),
            geometry,
            empty_hint: true,
            tree_events,
            listeners: Vec::new(),
        }
    }

    // ── Read access ───────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn roots(&self) -> &[NodeId] {
        self.tree.roots()
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.children_of(node)
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.selection.selected()
    }

    pub fn factory(&self) -> &ComponentFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut ComponentFactory {
        &mut self.factory
    }

    pub fn overlay(&self) -> &OverlaySynchronizer {
        &self.overlay
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Geometry changes are not observed; follow them with
    /// [`Editor::notify_resize`] or [`Editor::notify_scroll`]
    pub fn geometry_mut(&mut self) -> &mut G {
        &mut self.geometry
    }

    /// Placeholder text, while the canvas is empty
    pub fn empty_hint(&self) -> Option<&str> {
        self.empty_hint
            .then_some(self.config.empty_canvas_message.as_str())
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: EditorEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Forward tree changes: schedule the overlay, drop a dangling
    /// selection, update the placeholder and notify listeners
    fn flush(&mut self) {
        let events: Vec<TreeEvent> = self.tree_events.borrow_mut().drain(..).collect();
        if events.is_empty() {
            return;
        }
        self.overlay.observe_tree(&self.tree);

        let mut touched: Vec<NodeId> = Vec::new();
        let mut structural = false;
        for event in &events {
            match event {
                TreeEvent::AttributeChanged { node, .. } | TreeEvent::Renamed { node } => {
                    if !touched.contains(node) {
                        touched.push(*node);
                    }
                }
                _ => structural = true,
            }
        }

        if structural {
            if self.selection.forget_if_removed(&self.tree, &mut self.overlay) {
                self.emit(EditorEvent::SelectionChanged(None));
            }
            self.empty_hint = self.tree.is_empty();
            self.emit(EditorEvent::StructureChanged);
        }
        for node in touched {
            self.emit(EditorEvent::AttributesChanged(node));
        }
    }

    // ── Drag and drop ─────────────────────────────────────────────

    pub fn drag_start(&mut self, payload: Payload) {
        self.drag.begin(payload);
    }

    /// Start dragging an existing node; locked nodes do not drag
    pub fn drag_start_node(&mut self, node: NodeId) -> bool {
        match Payload::moving(&self.tree, node) {
            Some(payload) if !self.tree.get(node).is_some_and(|n| n.is_locked()) => {
                self.drag.begin(payload);
                true
            }
            _ => false,
        }
    }

    pub fn drag_over(&mut self, point: Point) -> DropEffect {
        let hit = self.geometry.hit_test(point);
        self.drag_over_hit(hit)
    }

    pub fn drag_over_hit(&mut self, hit: PointerHit) -> DropEffect {
        let mut cx = DropContext {
            tree: &mut self.tree,
            factory: &self.factory,
            overlay: &mut self.overlay,
            geometry: &self.geometry,
        };
        self.drag.drag_over_hit(&mut cx, hit)
    }

    pub fn drop(&mut self, point: Point) -> DropOutcome {
        let hit = self.geometry.hit_test(point);
        self.drop_on(hit)
    }

    /// Complete the drag at `hit`; a placed node becomes the selection
    pub fn drop_on(&mut self, hit: PointerHit) -> DropOutcome {
        let mut cx = DropContext {
            tree: &mut self.tree,
            factory: &self.factory,
            overlay: &mut self.overlay,
            geometry: &self.geometry,
        };
        let outcome = self.drag.drop_on_hit(&mut cx, hit);
        if let Some(node) = outcome.placed() {
            self.flush();
            self.select(node);
        }
        outcome
    }

    /// Platform drag end: always returns to idle
    pub fn drag_end(&mut self) {
        if self.drag.cancel(&mut self.overlay) {
            debug!("drag cancelled");
        }
    }

    // ── Pointer ───────────────────────────────────────────────────

    /// Select the node under the pointer, or clear on a miss
    pub fn click(&mut self, point: Point) -> Option<NodeId> {
        let hit = self.geometry.hit_test(point);
        self.click_hit(hit)
    }

    pub fn click_hit(&mut self, hit: PointerHit) -> Option<NodeId> {
        match hit.node() {
            Some(node) if self.select(node) => Some(node),
            _ => {
                self.clear_selection();
                None
            }
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<NodeId> {
        let selected = self.selection.selected();
        self.overlay
            .pointer_moved(&self.tree, &self.geometry, point, selected)
    }

    pub fn pointer_leave(&mut self) {
        self.overlay.pointer_left();
    }

    // ── Selection ─────────────────────────────────────────────────

    pub fn select(&mut self, node: NodeId) -> bool {
        let previous = self.selection.selected();
        if !self
            .selection
            .select(&self.tree, &mut self.overlay, &self.geometry, node)
        {
            return false;
        }
        if previous != Some(node) {
            self.emit(EditorEvent::SelectionChanged(Some(node)));
        }
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        let cleared = self.selection.clear(&mut self.overlay);
        if cleared {
            self.emit(EditorEvent::SelectionChanged(None));
        }
        cleared
    }

    pub fn select_parent(&mut self) -> Option<NodeId> {
        let parent = self
            .selection
            .select_parent(&self.tree, &mut self.overlay, &self.geometry)?;
        self.emit(EditorEvent::SelectionChanged(Some(parent)));
        Some(parent)
    }

    pub fn delete_selected(&mut self) -> Option<Deletion> {
        let deletion =
            self.selection
                .delete_selected(&mut self.tree, &mut self.overlay, &self.geometry)?;
        self.flush();
        self.emit(EditorEvent::SelectionChanged(deletion.parent));
        Some(deletion)
    }

    pub fn move_selected(&mut self, direction: Direction) -> bool {
        let moved = self.selection.move_selected(&mut self.tree, direction);
        self.flush();
        moved
    }

    // ── Properties ────────────────────────────────────────────────

    pub fn set_attribute(&mut self, node: NodeId, key: &str, value: AttrValue) -> Result<(), EditorError> {
        let result = self.tree.set_attribute(node, key, value);
        if let Err(e) = &result {
            warn!(%node, key, error = %e, "attribute edit rejected");
        }
        self.flush();
        result
    }

    /// Set an attribute from its text form, as typed into a properties panel
    pub fn set_attribute_str(&mut self, node: NodeId, key: &str, raw: &str) -> Result<(), EditorError> {
        let variant = self.tree.node(node)?.variant();
        let value = schema_for(variant).parse(key, raw)?;
        self.set_attribute(node, key, value)
    }

    pub fn rename(&mut self, node: NodeId, name: impl Into<String>) -> Result<(), EditorError> {
        let result = self.tree.rename(node, name);
        self.flush();
        result
    }

    // ── Geometry signals ──────────────────────────────────────────

    pub fn notify_scroll(&mut self, surface: Surface) -> bool {
        self.overlay.notify_scroll(surface)
    }

    pub fn notify_resize(&mut self) -> bool {
        self.overlay.notify_resize()
    }

    /// Host animation frame: run the pending overlay pass, if any
    pub fn animation_frame(&mut self) -> bool {
        let selected = self.selection.selected();
        self.overlay
            .on_animation_frame(&self.tree, &self.geometry, selected)
    }

    // ── Keyboard ──────────────────────────────────────────────────

    /// Returns whether the key did anything
    pub fn handle_key(&mut self, key: Key) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        match key {
            Key::Delete | Key::Backspace => self.delete_selected().is_some(),
            Key::ArrowUp => self.select_parent().is_some(),
            Key::ArrowLeft => self.move_selected(Direction::Left),
            Key::ArrowRight => self.move_selected(Direction::Right),
            Key::Escape => self.clear_selection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::LayoutBadge;
    use crate::tree::{keys, Kind, Variant};

    fn editor() -> Editor {
        Editor::new(EditorConfig::default())
    }

    fn drop_palette(editor: &mut Editor, variant: Variant, hit: PointerHit) -> Option<NodeId> {
        editor.drag_start(Payload::palette(variant));
        editor.drop_on(hit).placed()
    }

    #[test]
    fn test_drop_selects_and_hides_hint() {
        let mut ed = editor();
        assert!(ed.empty_hint().is_some());
        let section = drop_palette(&mut ed, Variant::Section, PointerHit::Canvas).unwrap();
        assert_eq!(ed.selected_node(), Some(section));
        assert!(ed.empty_hint().is_none());
        assert!(ed.overlay().is_pending());
    }

    #[test]
    fn test_events_reach_listeners() {
        let mut ed = editor();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        ed.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let section = drop_palette(&mut ed, Variant::Section, PointerHit::Canvas).unwrap();
        ed.set_attribute(section, keys::COLS, AttrValue::Int(2)).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                EditorEvent::StructureChanged,
                EditorEvent::SelectionChanged(Some(section)),
                EditorEvent::AttributesChanged(section),
            ]
        );
    }

    #[test]
    fn test_keyboard_commands() {
        let mut ed = editor();
        let form = drop_palette(&mut ed, Variant::Form, PointerHit::Canvas).unwrap();
        let a = drop_palette(&mut ed, Variant::Input, PointerHit::Node(form)).unwrap();
        let b = drop_palette(&mut ed, Variant::Text, PointerHit::Node(form)).unwrap();

        assert_eq!(ed.selected_node(), Some(b));
        assert!(ed.handle_key(Key::ArrowLeft));
        assert_eq!(ed.children_of(form), vec![b, a]);
        assert!(!ed.handle_key(Key::ArrowLeft));

        assert!(ed.handle_key(Key::ArrowUp));
        assert_eq!(ed.selected_node(), Some(form));
        assert!(ed.handle_key(Key::Escape));
        assert_eq!(ed.selected_node(), None);
        assert!(!ed.handle_key(Key::Delete));
    }

    #[test]
    fn test_set_attribute_from_text() {
        let mut ed = editor();
        let section = drop_palette(&mut ed, Variant::Section, PointerHit::Canvas).unwrap();
        ed.set_attribute_str(section, keys::LAYOUT, "flex").unwrap();
        // The badge refreshes on the next frame
        assert_eq!(ed.overlay().badge(), Some(LayoutBadge::Grid));
        assert!(ed.animation_frame());
        assert_eq!(
            ed.overlay().badge().map(|b| b.to_string()),
            Some("FLEX ROW".to_string())
        );
        assert!(ed.set_attribute_str(section, keys::COLS, "12").is_err());
    }

    #[test]
    fn test_locked_nodes_do_not_drag() {
        let mut ed = editor();
        let splitter = drop_palette(&mut ed, Variant::Splitter, PointerHit::Canvas).unwrap();
        let panel = ed.children_of(splitter)[0];
        assert!(!ed.drag_start_node(panel));
        assert!(ed.drag_start_node(splitter));
        assert_eq!(
            ed.tree().get(panel).map(|n| n.kind()),
            Some(Kind::Container)
        );
    }
}
