//! Viewport state: zoom level, pan offset, and the screen ↔ virtual canvas
//! coordinate transform.
//!
//! The rendered screen position of a virtual point `v` is
//! `(v + pan) * zoom`, relative to the canvas container's origin; the
//! inverse is `screen / zoom - pan`. Every gesture handler normalizes
//! pointer events through these two functions before comparing against
//! entity bounds.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use wb_core::CANVAS_SIZE;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 3.0;
/// Step applied by the zoom-in / zoom-out controls.
pub const ZOOM_STEP: f64 = 0.1;
/// Per-tick factors for ctrl+wheel zooming.
pub const WHEEL_ZOOM_IN: f64 = 1.1;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Camera state for the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Zoom level (1.0 = 100%), clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f64,
    /// Pan offset in virtual-canvas units, applied before scaling.
    pub pan: Vec2,
    /// Whether a pan gesture is in flight.
    #[serde(skip)]
    pub is_panning: bool,
    /// Size of the on-screen viewport, in screen pixels.
    #[serde(skip, default = "default_view_size")]
    pub view_size: Size,
}

fn default_view_size() -> Size {
    Size::new(800.0, 600.0)
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            is_panning: false,
            view_size: default_view_size(),
        }
    }
}

impl Viewport {
    pub fn new(view_size: Size) -> Self {
        let mut viewport = Self {
            view_size,
            ..Self::default()
        };
        viewport.center_canvas();
        viewport
    }

    // ─── Coordinate transform ────────────────────────────────────────────

    /// Virtual canvas point → screen point.
    pub fn to_screen(&self, virtual_point: Point) -> Point {
        Point::new(
            (virtual_point.x + self.pan.x) * self.zoom,
            (virtual_point.y + self.pan.y) * self.zoom,
        )
    }

    /// Screen point → virtual canvas point. Exact inverse of `to_screen`.
    pub fn to_virtual(&self, screen_point: Point) -> Point {
        Point::new(
            screen_point.x / self.zoom - self.pan.x,
            screen_point.y / self.zoom - self.pan.y,
        )
    }

    /// Screen-space bounds of a virtual-space rectangle.
    pub fn screen_bounds(&self, virtual_bounds: Rect) -> Rect {
        Rect::from_origin_size(
            self.to_screen(virtual_bounds.origin()),
            virtual_bounds.size() * self.zoom,
        )
    }

    /// Convert a screen-space delta to virtual units at the current zoom.
    pub fn to_virtual_delta(&self, screen_delta: Vec2) -> Vec2 {
        screen_delta / self.zoom
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    /// Step zoom in by `ZOOM_STEP`, keeping the viewport center fixed.
    pub fn zoom_in(&mut self) {
        self.zoom_about(self.zoom + ZOOM_STEP, self.view_center());
    }

    /// Step zoom out by `ZOOM_STEP`, keeping the viewport center fixed.
    pub fn zoom_out(&mut self) {
        self.zoom_about(self.zoom - ZOOM_STEP, self.view_center());
    }

    /// Wheel zoom: apply `factor` (`WHEEL_ZOOM_IN` / `WHEEL_ZOOM_OUT` per
    /// tick), keeping the cursor's screen position fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.zoom_about(self.zoom * factor, screen_point);
    }

    /// Reset to 100%, keeping the viewport center fixed.
    pub fn reset_zoom(&mut self) {
        self.zoom_about(1.0, self.view_center());
    }

    /// Set the zoom level, recomputing the pan offset so the virtual point
    /// under `focal` (a screen position) stays under it.
    fn zoom_about(&mut self, new_zoom: f64, focal: Point) {
        let old_zoom = self.zoom;
        self.zoom = new_zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if self.zoom != old_zoom {
            self.pan.x += focal.x / self.zoom - focal.x / old_zoom;
            self.pan.y += focal.y / self.zoom - focal.y / old_zoom;
        }
    }

    // ─── Pan ─────────────────────────────────────────────────────────────

    /// Pan by a screen-space delta. Content follows the hand: dragging
    /// right moves the pan offset right.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta / self.zoom;
    }

    pub fn start_pan(&mut self) {
        self.is_panning = true;
    }

    pub fn end_pan(&mut self) {
        self.is_panning = false;
    }

    /// Recompute the pan offset so the virtual canvas square is centered in
    /// the viewport. Called on mount and on viewport resize.
    pub fn center_canvas(&mut self) {
        self.pan = Vec2::new(
            self.view_size.width / (2.0 * self.zoom) - CANVAS_SIZE / 2.0,
            self.view_size.height / (2.0 * self.zoom) - CANVAS_SIZE / 2.0,
        );
    }

    pub fn set_view_size(&mut self, view_size: Size) {
        self.view_size = view_size;
    }

    fn view_center(&self) -> Point {
        Point::new(self.view_size.width / 2.0, self.view_size.height / 2.0)
    }
}
