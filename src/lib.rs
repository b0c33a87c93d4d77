//! Layout Builder - placement engine for a drag-and-drop page editor
//!
//! This library keeps the document tree of a visual layout builder, decides
//! where dragged palette items and existing nodes may land, and positions the
//! hover, selection and drop-indicator overlays over a scrolling canvas.
//!
//! # Example
//!
//! ```rust
//! use layout_builder::{Editor, EditorConfig, Payload, PointerHit, Variant};
//!
//! let mut editor = Editor::new(EditorConfig::default());
//! editor.drag_start(Payload::palette(Variant::Form));
//! let form = editor.drop_on(PointerHit::Canvas).placed().unwrap();
//!
//! editor.drag_start(Payload::palette(Variant::Input));
//! editor.drop_on(PointerHit::Node(form));
//! assert_eq!(editor.children_of(form).len(), 1);
//! ```

pub mod config;
pub mod drag;
pub mod editor;
pub mod error;
pub mod factory;
pub mod overlay;
pub mod placement;
pub mod scenario;
pub mod selection;
pub mod tree;

pub use config::{ComponentDefaults, ConfigError, EditorConfig};
pub use drag::{DragState, DropEffect, DropOutcome};
pub use editor::{Editor, EditorEvent, Key};
pub use error::{AttrError, EditorError};
pub use factory::{Blueprint, ComponentFactory, FactoryError};
pub use overlay::{GeometryProvider, OverlaySynchronizer, Point, PointerHit, Rect, StaticGeometry, Surface};
pub use placement::{resolve_drop_target, DropTarget, Payload, Rejection, Resolution};
pub use scenario::{Scenario, ScenarioError, Step};
pub use selection::Deletion;
pub use tree::{render_outline, AttrValue, Direction, Kind, NodeId, NodeTree, SlotName, SlotRef, Variant};
