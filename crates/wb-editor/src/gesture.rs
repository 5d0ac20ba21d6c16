//! Per-pointer-gesture state machine.
//!
//! Exactly one mode is active at a time: drawing a new frame, dragging an
//! entity, resizing an entity, or panning the viewport. Every mode other
//! than panning is entered on a left-button press without ctrl; panning
//! takes the middle button, or ctrl+left when the press is not on a
//! component (a ctrl+left press on a component toggles multi-selection
//! instead — the entity captures the event before the container would).
//!
//! The machine consumes normalized input events plus read-only context and
//! emits effects: live store mutations during drags and resizes, selection
//! and hover updates, pan deltas, and a drop request on release that the
//! caller feeds through drop resolution.

use crate::input::{InputEvent, Modifiers, PointerButton};
use kurbo::{Point, Rect, Size, Vec2};
use wb_canvas::{HitTarget, ResizeDirection, Viewport, hit_test, resize_handle_at};
use wb_core::{
    CANVAS_SIZE, EntityId, EntityStore, MIN_COMPONENT_HEIGHT, MIN_COMPONENT_WIDTH, MIN_FRAME_EDGE,
    Selection, StoreMutation,
};

/// What a drag gesture is carrying.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSubject {
    Component(EntityId),
    Frame(EntityId),
    /// A new component dragged in from the palette; instantiated on drop.
    Palette { type_name: String, size: Size },
}

/// The active gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureState {
    Idle,
    /// "Add Frame" was requested; the next left press starts the rubber band.
    ArmedFrameDraw,
    DrawingFrame {
        start: Point,
        current: Point,
    },
    DraggingEntity {
        subject: DragSubject,
        /// Virtual-space offset from the subject's origin to the grab point.
        grab_offset: Vec2,
        /// Live origin of the dragged rectangle, virtual coordinates.
        origin: Point,
        moved: bool,
    },
    ResizingEntity {
        target: HitTarget,
        direction: ResizeDirection,
        last_screen: Point,
    },
    Panning {
        last_screen: Point,
    },
}

/// An effect for the caller to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// Apply a store mutation (live drag/resize feedback).
    Mutate(StoreMutation),
    /// Pan the viewport by a screen-space delta.
    PanBy(Vec2),
    StartPan,
    EndPan,
    /// Selection change: `None` clears (background click).
    Select {
        target: Option<HitTarget>,
        multi: bool,
    },
    /// Hover change while idle.
    Hover(Option<HitTarget>),
    /// A completed rubber-band rectangle at or above the minimum size.
    FrameDrawn(Rect),
    /// Drag released; resolve through drop resolution.
    Drop { subject: DragSubject, origin: Point },
}

/// Read-only context the machine consults during transitions.
pub struct GestureContext<'a> {
    pub store: &'a EntityStore,
    pub viewport: &'a Viewport,
    pub selection: &'a Selection,
}

#[derive(Debug, Clone, Default)]
pub struct Gesture {
    state: GestureState,
}

impl Default for GestureState {
    fn default() -> Self {
        Self::Idle
    }
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    /// Arm the canvas so the next left press starts drawing a frame.
    pub fn arm_frame_draw(&mut self) {
        if matches!(self.state, GestureState::Idle) {
            self.state = GestureState::ArmedFrameDraw;
        }
    }

    /// Begin dragging a new component in from the palette. The drag follows
    /// pointer moves and resolves on release like any entity drag.
    pub fn start_palette_drag(&mut self, type_name: impl Into<String>, size: Size, at: Point) {
        if matches!(self.state, GestureState::Idle) {
            self.state = GestureState::DraggingEntity {
                subject: DragSubject::Palette {
                    type_name: type_name.into(),
                    size,
                },
                grab_offset: Vec2::ZERO,
                origin: at,
                moved: true,
            };
        }
    }

    /// Cancel an in-flight frame draw (Escape / context menu). Other
    /// gestures have no cancel path — release commits through drop
    /// resolution.
    pub fn cancel_frame_draw(&mut self) -> bool {
        match self.state {
            GestureState::ArmedFrameDraw | GestureState::DrawingFrame { .. } => {
                self.state = GestureState::Idle;
                true
            }
            _ => false,
        }
    }

    /// The live rubber-band rectangle while drawing, for preview rendering.
    pub fn frame_preview(&self) -> Option<Rect> {
        match &self.state {
            GestureState::DrawingFrame { start, current } => {
                Some(Rect::from_points(*start, *current))
            }
            _ => None,
        }
    }

    /// The dragged rectangle's live origin, for ghost rendering during
    /// palette drags.
    pub fn drag_preview(&self) -> Option<Point> {
        match &self.state {
            GestureState::DraggingEntity { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    /// Feed one input event through the machine.
    pub fn handle(&mut self, event: &InputEvent, ctx: &GestureContext) -> Vec<GestureEffect> {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => self.pointer_down(Point::new(*x, *y), *button, *modifiers, ctx),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y), ctx),
            InputEvent::PointerUp { .. } => self.pointer_up(),
            _ => Vec::new(),
        }
    }

    fn pointer_down(
        &mut self,
        screen: Point,
        button: PointerButton,
        modifiers: Modifiers,
        ctx: &GestureContext,
    ) -> Vec<GestureEffect> {
        // Right click cancels frame drawing, nothing else.
        if button == PointerButton::Right {
            self.cancel_frame_draw();
            return Vec::new();
        }

        if !matches!(
            self.state,
            GestureState::Idle | GestureState::ArmedFrameDraw
        ) {
            // A gesture is already in flight; pointer capture should make
            // this unreachable.
            return Vec::new();
        }

        let virtual_point = ctx.viewport.to_virtual(screen);
        let hit = hit_test(ctx.store, virtual_point);

        // Middle button always pans.
        if button == PointerButton::Middle {
            self.state = GestureState::Panning {
                last_screen: screen,
            };
            return vec![GestureEffect::StartPan];
        }

        if button != PointerButton::Left {
            return Vec::new();
        }

        if modifiers.command() {
            // Ctrl+left on a component: multi-select toggle. Anywhere else
            // it falls through to the container and pans.
            if let Some(HitTarget::Component(id)) = hit {
                return vec![GestureEffect::Select {
                    target: Some(HitTarget::Component(id)),
                    multi: true,
                }];
            }
            self.state = GestureState::Panning {
                last_screen: screen,
            };
            return vec![GestureEffect::StartPan];
        }

        if matches!(self.state, GestureState::ArmedFrameDraw) {
            self.state = GestureState::DrawingFrame {
                start: virtual_point,
                current: virtual_point,
            };
            return Vec::new();
        }

        // Resize handles only exist on the selected entity, and a press on
        // one suppresses dragging.
        if let Some((target, bounds)) = selected_entity_bounds(ctx)
            && let Some(direction) = resize_handle_at(ctx.viewport.screen_bounds(bounds), screen)
        {
            self.state = GestureState::ResizingEntity {
                target,
                direction,
                last_screen: screen,
            };
            return Vec::new();
        }

        match hit {
            Some(HitTarget::Component(id)) => {
                let Some(component) = ctx.store.component(id) else {
                    return Vec::new();
                };
                let origin = component.position;
                self.state = GestureState::DraggingEntity {
                    subject: DragSubject::Component(id),
                    grab_offset: virtual_point - origin,
                    origin,
                    moved: false,
                };
                vec![GestureEffect::Select {
                    target: Some(HitTarget::Component(id)),
                    multi: false,
                }]
            }
            Some(HitTarget::Frame(id)) => {
                let Some(frame) = ctx.store.frame(id) else {
                    return Vec::new();
                };
                let origin = frame.position;
                self.state = GestureState::DraggingEntity {
                    subject: DragSubject::Frame(id),
                    grab_offset: virtual_point - origin,
                    origin,
                    moved: false,
                };
                vec![GestureEffect::Select {
                    target: Some(HitTarget::Frame(id)),
                    multi: false,
                }]
            }
            None => {
                // Background click clears the selection.
                vec![GestureEffect::Select {
                    target: None,
                    multi: false,
                }]
            }
        }
    }

    fn pointer_move(&mut self, screen: Point, ctx: &GestureContext) -> Vec<GestureEffect> {
        let virtual_point = ctx.viewport.to_virtual(screen);
        match &mut self.state {
            GestureState::Idle | GestureState::ArmedFrameDraw => {
                vec![GestureEffect::Hover(hit_test(ctx.store, virtual_point))]
            }
            GestureState::DrawingFrame { current, .. } => {
                *current = virtual_point;
                Vec::new()
            }
            GestureState::DraggingEntity {
                subject,
                grab_offset,
                origin,
                moved,
            } => {
                *origin = virtual_point - *grab_offset;
                *moved = true;
                match subject {
                    DragSubject::Component(id) => {
                        vec![GestureEffect::Mutate(StoreMutation::MoveComponent {
                            id: *id,
                            to: *origin,
                        })]
                    }
                    DragSubject::Frame(id) => {
                        vec![GestureEffect::Mutate(StoreMutation::MoveFrame {
                            id: *id,
                            to: *origin,
                        })]
                    }
                    // The palette ghost is render-only until drop.
                    DragSubject::Palette { .. } => Vec::new(),
                }
            }
            GestureState::ResizingEntity {
                target,
                direction,
                last_screen,
            } => {
                let delta = ctx.viewport.to_virtual_delta(screen - *last_screen);
                *last_screen = screen;
                match target {
                    HitTarget::Component(id) => {
                        let Some(component) = ctx.store.component(*id) else {
                            return Vec::new();
                        };
                        let bounds = resized_bounds(
                            component.bounds(),
                            *direction,
                            delta,
                            Size::new(MIN_COMPONENT_WIDTH, MIN_COMPONENT_HEIGHT),
                        );
                        vec![GestureEffect::Mutate(StoreMutation::ResizeComponent {
                            id: *id,
                            origin: bounds.origin(),
                            size: bounds.size(),
                        })]
                    }
                    HitTarget::Frame(id) => {
                        let Some(frame) = ctx.store.frame(*id) else {
                            return Vec::new();
                        };
                        let bounds = resized_bounds(
                            frame.bounds(),
                            *direction,
                            delta,
                            Size::new(MIN_FRAME_EDGE, MIN_FRAME_EDGE),
                        );
                        vec![GestureEffect::Mutate(StoreMutation::ResizeFrame {
                            id: *id,
                            origin: bounds.origin(),
                            size: bounds.size(),
                        })]
                    }
                }
            }
            GestureState::Panning { last_screen } => {
                let delta = screen - *last_screen;
                *last_screen = screen;
                vec![GestureEffect::PanBy(delta)]
            }
        }
    }

    fn pointer_up(&mut self) -> Vec<GestureEffect> {
        let state = std::mem::take(&mut self.state);
        match state {
            GestureState::DrawingFrame { start, current } => {
                let rect = Rect::from_points(start, current);
                if rect.width() > MIN_FRAME_EDGE && rect.height() > MIN_FRAME_EDGE {
                    vec![GestureEffect::FrameDrawn(rect)]
                } else {
                    Vec::new()
                }
            }
            GestureState::DraggingEntity {
                subject,
                origin,
                moved,
                ..
            } => {
                if moved {
                    vec![GestureEffect::Drop { subject, origin }]
                } else {
                    Vec::new()
                }
            }
            GestureState::Panning { .. } => vec![GestureEffect::EndPan],
            _ => Vec::new(),
        }
    }
}

/// The selected entity's id and virtual bounds, if any.
fn selected_entity_bounds(ctx: &GestureContext) -> Option<(HitTarget, Rect)> {
    if let Some(id) = ctx.selection.selected_component() {
        let component = ctx.store.component(id)?;
        return Some((HitTarget::Component(id), component.bounds()));
    }
    if let Some(id) = ctx.selection.selected_frame() {
        let frame = ctx.store.frame(id)?;
        return Some((HitTarget::Frame(id), frame.bounds()));
    }
    None
}

/// Apply a resize delta to one or two edges, honoring minimum dimensions
/// and the canvas bounds.
fn resized_bounds(bounds: Rect, direction: ResizeDirection, delta: Vec2, min: Size) -> Rect {
    let mut x0 = bounds.x0;
    let mut y0 = bounds.y0;
    let mut x1 = bounds.x1;
    let mut y1 = bounds.y1;
    // min/max chains rather than clamp: an entity already below the minimum
    // size would invert the clamp range. The size floor wins over the
    // canvas bound; the store re-clamps positions on apply.
    if direction.moves_left_edge() {
        x0 = (x0 + delta.x).max(0.0).min(x1 - min.width);
    }
    if direction.moves_right_edge() {
        x1 = (x1 + delta.x).min(CANVAS_SIZE).max(x0 + min.width);
    }
    if direction.moves_top_edge() {
        y0 = (y0 + delta.y).max(0.0).min(y1 - min.height);
    }
    if direction.moves_bottom_edge() {
        y1 = (y1 + delta.y).min(CANVAS_SIZE).max(y0 + min.height);
    }
    Rect::new(x0, y0, x1, y1)
}
