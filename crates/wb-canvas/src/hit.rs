//! Hit testing: point → entity lookup and drop-target classification.
//!
//! Components sit above frames. Among components the topmost wins: higher
//! `z_index` first, later list position breaking ties (last placed paints
//! last). All positions here are virtual-canvas coordinates except the
//! resize-handle tests, which work on screen-space bounds because handles
//! have a fixed on-screen size regardless of zoom.

use kurbo::{Point, Rect};
use wb_core::{EntityId, EntityStore};

/// What a pointer position resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Component(EntityId),
    Frame(EntityId),
}

/// Where a drag-end lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// The free canvas background.
    Canvas,
    /// A specific frame's interior.
    Frame(EntityId),
}

/// Topmost entity at a virtual point: components first, then frames.
/// `None` means the canvas background.
pub fn hit_test(store: &EntityStore, point: Point) -> Option<HitTarget> {
    component_at(store, point)
        .map(HitTarget::Component)
        .or_else(|| frame_at(store, point).map(HitTarget::Frame))
}

/// Topmost component whose bounds contain the point.
pub fn component_at(store: &EntityStore, point: Point) -> Option<EntityId> {
    store
        .components()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.bounds().contains(point))
        .max_by_key(|(index, c)| (c.z_index, *index))
        .map(|(_, c)| c.id)
}

/// Topmost frame whose bounds contain the point (later list position wins).
pub fn frame_at(store: &EntityStore, point: Point) -> Option<EntityId> {
    store
        .frames()
        .iter()
        .rev()
        .find(|f| f.bounds().contains(point))
        .map(|f| f.id)
}

/// Classify the container a drop point lands in.
pub fn drop_target(store: &EntityStore, point: Point) -> DropTarget {
    match frame_at(store, point) {
        Some(id) => DropTarget::Frame(id),
        None => DropTarget::Canvas,
    }
}

// ─── Resize handles ──────────────────────────────────────────────────────

/// The eight resize handles around a selected entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDirection {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeDirection {
    pub fn moves_left_edge(self) -> bool {
        matches!(self, Self::West | Self::NorthWest | Self::SouthWest)
    }

    pub fn moves_right_edge(self) -> bool {
        matches!(self, Self::East | Self::NorthEast | Self::SouthEast)
    }

    pub fn moves_top_edge(self) -> bool {
        matches!(self, Self::North | Self::NorthEast | Self::NorthWest)
    }

    pub fn moves_bottom_edge(self) -> bool {
        matches!(self, Self::South | Self::SouthEast | Self::SouthWest)
    }
}

/// On-screen edge length of a resize handle, in screen pixels.
pub const RESIZE_HANDLE_SIZE: f64 = 8.0;

/// Which resize handle (if any) of an entity's screen-space bounds is under
/// the screen-space point. Handles only exist for the selected entity; the
/// caller checks selection before calling.
pub fn resize_handle_at(screen_bounds: Rect, screen_point: Point) -> Option<ResizeDirection> {
    use ResizeDirection::*;
    let mid_x = (screen_bounds.x0 + screen_bounds.x1) / 2.0;
    let mid_y = (screen_bounds.y0 + screen_bounds.y1) / 2.0;
    let anchors = [
        (NorthWest, Point::new(screen_bounds.x0, screen_bounds.y0)),
        (North, Point::new(mid_x, screen_bounds.y0)),
        (NorthEast, Point::new(screen_bounds.x1, screen_bounds.y0)),
        (East, Point::new(screen_bounds.x1, mid_y)),
        (SouthEast, Point::new(screen_bounds.x1, screen_bounds.y1)),
        (South, Point::new(mid_x, screen_bounds.y1)),
        (SouthWest, Point::new(screen_bounds.x0, screen_bounds.y1)),
        (West, Point::new(screen_bounds.x0, mid_y)),
    ];
    let half = RESIZE_HANDLE_SIZE / 2.0;
    anchors
        .into_iter()
        .find(|(_, anchor)| {
            (screen_point.x - anchor.x).abs() <= half && (screen_point.y - anchor.y).abs() <= half
        })
        .map(|(direction, _)| direction)
}
