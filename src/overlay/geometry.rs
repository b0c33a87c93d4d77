//! Geometry primitives and the host geometry seam

use std::collections::{HashMap, HashSet};

use crate::tree::{NodeId, SlotRef};

/// A point in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-area rectangle parked at `(origin, origin)`
    pub fn offscreen(origin: f64) -> Self {
        Self::new(origin, origin, 0.0, 0.0)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if this rectangle contains a point (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Overlapping region, `None` when the overlap has no area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }

    /// Grow by `by` on every side
    pub fn inflate(&self, by: f64) -> Rect {
        Rect::new(
            self.x - by,
            self.y - by,
            self.width + by * 2.0,
            self.height + by * 2.0,
        )
    }

    /// Express this rectangle relative to `origin`
    pub fn relative_to(&self, origin: Point) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Anything the host lays out and can report a box for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The canvas content element; overlay coordinates are relative to it
    Canvas,
    /// Outer scroll wrapper around the canvas
    CanvasWrap,
    Node(NodeId),
    /// Slot wrapper element (header actions, splitter panel)
    Slot(SlotRef),
}

impl Surface {
    /// The root slot is the canvas itself
    pub fn of_slot(slot: SlotRef) -> Self {
        match slot {
            SlotRef::Root => Surface::Canvas,
            other => Surface::Slot(other),
        }
    }
}

/// Result of hit-testing a pointer position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerHit {
    /// Outside the canvas entirely
    Outside,
    /// Canvas background, not over any node
    Canvas,
    Node(NodeId),
    /// A slot wrapper, not over any node inside it
    Slot(SlotRef),
}

impl PointerHit {
    /// The placed node under the pointer; slot wrappers resolve to their owner
    pub fn node(self) -> Option<NodeId> {
        match self {
            PointerHit::Node(id) => Some(id),
            PointerHit::Slot(slot) => slot.owner(),
            PointerHit::Outside | PointerHit::Canvas => None,
        }
    }
}

/// Box geometry reported by the host styling engine.
///
/// Layout itself is never computed here; the host answers where things
/// ended up, in viewport coordinates.
pub trait GeometryProvider {
    /// Viewport bounding box, `None` when the surface is not laid out
    fn client_rect(&self, surface: Surface) -> Option<Rect>;

    /// Whether the surface clips and scrolls its content
    fn is_scroll_container(&self, surface: Surface) -> bool;

    /// Deepest surface under `point`
    fn hit_test(&self, point: Point) -> PointerHit;
}

/// Geometry from a fixed table of rectangles.
///
/// Hit testing picks the smallest node or slot rectangle containing the
/// point. Used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticGeometry {
    rects: HashMap<Surface, Rect>,
    scrollers: HashSet<Surface>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rect(mut self, surface: Surface, rect: Rect) -> Self {
        self.set_rect(surface, rect);
        self
    }

    pub fn with_scroller(mut self, surface: Surface) -> Self {
        self.scrollers.insert(surface);
        self
    }

    pub fn set_rect(&mut self, surface: Surface, rect: Rect) {
        self.rects.insert(surface, rect);
    }

    pub fn remove(&mut self, surface: Surface) -> Option<Rect> {
        self.scrollers.remove(&surface);
        self.rects.remove(&surface)
    }

    pub fn set_scroll_container(&mut self, surface: Surface, scrolls: bool) {
        if scrolls {
            self.scrollers.insert(surface);
        } else {
            self.scrollers.remove(&surface);
        }
    }

    /// Shift the boxes of `surfaces` by `(dx, dy)`, as scrolling their
    /// container would
    pub fn shift(&mut self, surfaces: &[Surface], dx: f64, dy: f64) {
        for surface in surfaces {
            if let Some(rect) = self.rects.get_mut(surface) {
                rect.x += dx;
                rect.y += dy;
            }
        }
    }
}

impl GeometryProvider for StaticGeometry {
    fn client_rect(&self, surface: Surface) -> Option<Rect> {
        self.rects.get(&surface).copied()
    }

    fn is_scroll_container(&self, surface: Surface) -> bool {
        self.scrollers.contains(&surface)
    }

    fn hit_test(&self, point: Point) -> PointerHit {
        let best = self
            .rects
            .iter()
            .filter(|(s, r)| matches!(s, Surface::Node(_) | Surface::Slot(_)) && r.contains(point))
            .min_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()));
        match best {
            Some((Surface::Node(id), _)) => PointerHit::Node(*id),
            Some((Surface::Slot(slot), _)) => PointerHit::Slot(*slot),
            _ => match self.rects.get(&Surface::Canvas) {
                Some(canvas) if canvas.contains(point) => PointerHit::Canvas,
                _ => PointerHit::Outside,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 25.0, 100.0, 50.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(50.0, 25.0, 50.0, 50.0)));

        // Touching edges have no area
        let c = Rect::new(100.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_inflate_and_relative() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0).inflate(1.0);
        assert_eq!(r, Rect::new(9.0, 19.0, 32.0, 42.0));
        assert_eq!(
            r.relative_to(Point::new(9.0, 9.0)),
            Rect::new(0.0, 10.0, 32.0, 42.0)
        );
    }

    #[test]
    fn test_offscreen_is_empty() {
        let r = Rect::offscreen(-9999.0);
        assert!(r.is_empty());
        assert_eq!(r.x, -9999.0);
    }

    #[test]
    fn test_hit_test_picks_smallest() {
        let outer = NodeId::next();
        let inner = NodeId::next();
        let geo = StaticGeometry::new()
            .with_rect(Surface::Canvas, Rect::new(0.0, 0.0, 500.0, 500.0))
            .with_rect(Surface::Node(outer), Rect::new(0.0, 0.0, 200.0, 200.0))
            .with_rect(Surface::Node(inner), Rect::new(10.0, 10.0, 50.0, 50.0));

        assert_eq!(geo.hit_test(Point::new(20.0, 20.0)), PointerHit::Node(inner));
        assert_eq!(geo.hit_test(Point::new(150.0, 150.0)), PointerHit::Node(outer));
        assert_eq!(geo.hit_test(Point::new(400.0, 400.0)), PointerHit::Canvas);
        assert_eq!(geo.hit_test(Point::new(600.0, 10.0)), PointerHit::Outside);
    }
}
