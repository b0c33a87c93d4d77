//! Drag-drop coordination

mod coordinator;

pub use coordinator::{DragCoordinator, DragState, DropContext, DropEffect, DropOutcome};
