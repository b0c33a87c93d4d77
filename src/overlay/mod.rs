//! Overlay geometry: canvas-space feedback rectangles and their re-sync

mod geometry;
mod sync;

pub use geometry::{GeometryProvider, Point, PointerHit, Rect, StaticGeometry, Surface};
pub use sync::{LayoutBadge, Overlay, OverlaySynchronizer, BADGE_INSET};
