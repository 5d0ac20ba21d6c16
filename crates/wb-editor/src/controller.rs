//! The canvas controller: the host-facing entry point.
//!
//! Holds the entity store, selection, viewport, gesture machine, undo stack,
//! and sync engine. All host input flows through `handle_event`; state
//! changes the host needs to mirror upward (selection, deletes, frame adds,
//! hover, home-frame changes) are queued as `EditorEvent`s and drained with
//! `take_events`.

use crate::commands::CommandStack;
use crate::drop::{DropOutcome, resolve_drop};
use crate::gesture::{Gesture, GestureContext, GestureEffect, GestureState};
use crate::input::InputEvent;
use crate::shortcuts::{EditorAction, ShortcutMap};
use crate::sync::{ChangeKind, CodeGenerator, RegenOutcome, RegenRequest, SyncEngine};
use kurbo::{Point, Size, Vec2};
use serde_json::Value;
use wb_canvas::{HitTarget, Viewport, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};
use wb_core::persist::{KEY_VIEWPORT, StoragePort, load_store, save_store};
use wb_core::registry::TypeRegistry;
use wb_core::{EntityId, EntityStore, Frame, Selection, StoreMutation, clamp_to_canvas};

const UNDO_DEPTH: usize = 100;
/// Offset applied to duplicated components.
const DUPLICATE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// State changes surfaced to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    SelectionChanged {
        component: Option<EntityId>,
        frame: Option<EntityId>,
        multi: Vec<EntityId>,
    },
    PropertiesUpdated {
        id: EntityId,
    },
    ItemResized {
        id: EntityId,
        size: Size,
    },
    ItemDeleted {
        id: EntityId,
    },
    FrameAdded {
        id: EntityId,
    },
    ComponentCreated {
        id: EntityId,
    },
    FrameHovered {
        id: Option<EntityId>,
    },
    HomeFrameChanged {
        id: Option<EntityId>,
    },
    RegenerationFailed {
        id: EntityId,
        error: String,
    },
}

pub struct CanvasController {
    store: EntityStore,
    selection: Selection,
    viewport: Viewport,
    gesture: Gesture,
    commands: CommandStack,
    sync: SyncEngine,
    registry: Box<dyn TypeRegistry>,
    events: Vec<EditorEvent>,
    gesture_batch_open: bool,
}

impl CanvasController {
    pub fn new(view_size: Size, registry: Box<dyn TypeRegistry>) -> Self {
        Self {
            store: EntityStore::new(),
            selection: Selection::new(),
            viewport: Viewport::new(view_size),
            gesture: Gesture::new(),
            commands: CommandStack::new(UNDO_DEPTH),
            sync: SyncEngine::new(),
            registry,
            events: Vec::new(),
            gesture_batch_open: false,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Drain queued events for the host to mirror upward.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    // ─── Input dispatch ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Key { key, modifiers } => {
                if let Some(action) = ShortcutMap::resolve(key, *modifiers) {
                    self.dispatch_action(action);
                    // Escape may have torn down an active gesture
                    self.sync_gesture_batch();
                }
            }
            InputEvent::Wheel {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => {
                if modifiers.command() {
                    let factor = if *dy < 0.0 { WHEEL_ZOOM_IN } else { WHEEL_ZOOM_OUT };
                    self.viewport.zoom_at(Point::new(*x, *y), factor);
                } else {
                    // Two-finger scroll pans; content moves opposite the
                    // wheel delta, scaled by 1/zoom inside pan_by.
                    self.viewport.pan_by(Vec2::new(-dx, -dy));
                }
            }
            _ => {
                let effects = {
                    let ctx = GestureContext {
                        store: &self.store,
                        viewport: &self.viewport,
                        selection: &self.selection,
                    };
                    self.gesture.handle(event, &ctx)
                };
                self.sync_gesture_batch();
                self.process_effects(effects);
                // A pointer-up may have just ended the gesture
                self.sync_gesture_batch();
            }
        }
    }

    /// Open or close the undo batch to track whether a gesture is active.
    fn sync_gesture_batch(&mut self) {
        let active = matches!(
            self.gesture.state(),
            GestureState::DrawingFrame { .. }
                | GestureState::DraggingEntity { .. }
                | GestureState::ResizingEntity { .. }
        );
        if active && !self.gesture_batch_open {
            self.commands.begin_batch(&self.store);
            self.gesture_batch_open = true;
        } else if !active && self.gesture_batch_open {
            self.commands.end_batch(&self.store, "canvas gesture");
            self.gesture_batch_open = false;
        }
    }

    fn process_effects(&mut self, effects: Vec<GestureEffect>) {
        for effect in effects {
            match effect {
                GestureEffect::Mutate(mutation) => self.apply_mutation(mutation),
                GestureEffect::PanBy(delta) => self.viewport.pan_by(delta),
                GestureEffect::StartPan => self.viewport.start_pan(),
                GestureEffect::EndPan => self.viewport.end_pan(),
                GestureEffect::Select { target, multi } => self.apply_selection(target, multi),
                GestureEffect::Hover(target) => self.apply_hover(target),
                GestureEffect::FrameDrawn(rect) => self.create_frame(rect),
                GestureEffect::Drop { subject, origin } => {
                    let (mutations, outcome) =
                        resolve_drop(&self.store, self.registry.as_ref(), &subject, origin);
                    for mutation in mutations {
                        self.apply_mutation(mutation);
                    }
                    match outcome {
                        DropOutcome::ComponentCreated { id, .. } => {
                            self.selection.select_component(id, false);
                            self.sync.begin_session(id);
                            self.events.push(EditorEvent::ComponentCreated { id });
                            self.push_selection_event();
                        }
                        DropOutcome::ComponentMoved { id, .. }
                        | DropOutcome::FrameMoved { id } => {
                            self.events.push(EditorEvent::PropertiesUpdated { id });
                        }
                        DropOutcome::Aborted => {}
                    }
                }
            }
        }
    }

    fn apply_mutation(&mut self, mutation: StoreMutation) {
        let resize_event = match &mutation {
            StoreMutation::ResizeComponent { id, size, .. }
            | StoreMutation::ResizeFrame { id, size, .. } => Some((*id, *size)),
            _ => None,
        };
        let properties_event = match &mutation {
            StoreMutation::SetProperties { id, .. } => Some(*id),
            _ => None,
        };
        self.commands.execute(&mut self.store, mutation, "canvas edit");
        if let Some((id, size)) = resize_event {
            self.events.push(EditorEvent::ItemResized { id, size });
        }
        if let Some(id) = properties_event {
            self.events.push(EditorEvent::PropertiesUpdated { id });
        }
    }

    fn apply_selection(&mut self, target: Option<HitTarget>, multi: bool) {
        match target {
            Some(HitTarget::Component(id)) => {
                self.selection.select_component(id, multi);
                if self.selection.selected_component() == Some(id) {
                    self.sync.begin_session(id);
                }
            }
            Some(HitTarget::Frame(id)) => {
                self.selection.select_frame(id);
                self.sync.end_session();
            }
            None => {
                self.selection.clear();
                self.sync.end_session();
            }
        }
        self.push_selection_event();
    }

    fn apply_hover(&mut self, target: Option<HitTarget>) {
        let previous_frame = self.selection.hovered_frame;
        match target {
            Some(HitTarget::Component(id)) => {
                self.selection.hovered_component = Some(id);
                self.selection.hovered_frame = None;
            }
            Some(HitTarget::Frame(id)) => {
                self.selection.hovered_component = None;
                self.selection.hovered_frame = Some(id);
            }
            None => {
                self.selection.hovered_component = None;
                self.selection.hovered_frame = None;
            }
        }
        if self.selection.hovered_frame != previous_frame {
            self.events.push(EditorEvent::FrameHovered {
                id: self.selection.hovered_frame,
            });
        }
    }

    fn create_frame(&mut self, rect: kurbo::Rect) {
        let id = EntityId::fresh_frame();
        let label = format!("Frame {}", self.store.frames().len() + 1);
        let frame = Frame::new(id, label, rect.origin(), rect.size());
        self.apply_mutation(StoreMutation::AddFrame { frame });
        self.selection.select_frame(id);
        self.events.push(EditorEvent::FrameAdded { id });
        self.push_selection_event();
    }

    fn push_selection_event(&mut self) {
        self.events.push(EditorEvent::SelectionChanged {
            component: self.selection.selected_component(),
            frame: self.selection.selected_frame(),
            multi: self.selection.multi_selected().to_vec(),
        });
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    fn dispatch_action(&mut self, action: EditorAction) {
        match action {
            EditorAction::DeleteSelected => self.delete_selected(),
            EditorAction::Cancel => {
                if !self.gesture.cancel_frame_draw() {
                    self.selection.clear();
                    self.sync.end_session();
                    self.push_selection_event();
                }
            }
            EditorAction::Undo => {
                if self.commands.undo(&mut self.store).is_some() {
                    self.prune_selection();
                }
            }
            EditorAction::Redo => {
                if self.commands.redo(&mut self.store).is_some() {
                    self.prune_selection();
                }
            }
            EditorAction::Duplicate => self.duplicate_selected(),
            EditorAction::ZoomIn => self.viewport.zoom_in(),
            EditorAction::ZoomOut => self.viewport.zoom_out(),
            EditorAction::ResetZoom => self.viewport.reset_zoom(),
            EditorAction::BringForward => self.step_z_index(1),
            EditorAction::SendBackward => self.step_z_index(-1),
            EditorAction::ArmFrameDraw => self.gesture.arm_frame_draw(),
        }
    }

    /// Arm the canvas so the next left press draws a frame ("Add Frame").
    pub fn arm_frame_draw(&mut self) {
        self.gesture.arm_frame_draw();
    }

    /// Begin dragging a new component from the palette. Returns false (and
    /// logs) when the type is unknown — nothing is armed.
    pub fn start_palette_drag(&mut self, type_name: &str, at_screen: Point) -> bool {
        let Some(def) = self.registry.lookup(type_name) else {
            log::warn!("palette drag rejected: unknown component type {type_name:?}");
            return false;
        };
        let size = def.default_size;
        let at = self.viewport.to_virtual(at_screen);
        self.gesture.start_palette_drag(type_name, size, at);
        self.sync_gesture_batch();
        true
    }

    /// Delete the current selection. Frame deletion cascades to members.
    pub fn delete_selected(&mut self) {
        if let Some(frame_id) = self.selection.selected_frame() {
            let members = self.store.members_of(frame_id);
            let home_before = self.store.home_frame();
            self.apply_mutation(StoreMutation::RemoveFrame { id: frame_id });
            self.selection.forget(frame_id);
            self.events.push(EditorEvent::ItemDeleted { id: frame_id });
            for member in members {
                self.selection.forget(member);
                self.sync.forget_component(member);
                self.events.push(EditorEvent::ItemDeleted { id: member });
            }
            if self.store.home_frame() != home_before {
                self.events.push(EditorEvent::HomeFrameChanged {
                    id: self.store.home_frame(),
                });
            }
            return;
        }

        let targets: Vec<EntityId> = if self.selection.multi_selected().is_empty() {
            self.selection.selected_component().into_iter().collect()
        } else {
            self.selection.multi_selected().to_vec()
        };
        if targets.is_empty() {
            return;
        }
        self.commands.begin_batch(&self.store);
        for id in &targets {
            self.commands.execute(
                &mut self.store,
                StoreMutation::RemoveComponent { id: *id },
                "delete component",
            );
        }
        self.commands.end_batch(&self.store, "delete selection");
        for id in targets {
            self.selection.forget(id);
            self.sync.forget_component(id);
            self.events.push(EditorEvent::ItemDeleted { id });
        }
    }

    /// Clone the selected component with a small offset; the clone becomes
    /// the selection.
    pub fn duplicate_selected(&mut self) {
        let Some(source_id) = self.selection.selected_component() else {
            return;
        };
        let Some(original) = self.store.component(source_id).cloned() else {
            return;
        };
        let id = EntityId::fresh_component();
        let mut clone = original;
        clone.id = id;
        clone.position = clamp_to_canvas(clone.position + DUPLICATE_OFFSET, clone.size);
        self.apply_mutation(StoreMutation::AddComponent {
            component: Box::new(clone),
        });
        self.selection.select_component(id, false);
        self.sync.begin_session(id);
        self.events.push(EditorEvent::ComponentCreated { id });
        self.push_selection_event();
    }

    fn step_z_index(&mut self, step: i32) {
        let Some(id) = self.selection.selected_component() else {
            return;
        };
        let Some(component) = self.store.component(id) else {
            return;
        };
        let z_index = component.z_index + step;
        self.apply_mutation(StoreMutation::SetZIndex { id, z_index });
    }

    /// Designate the home frame shown by default in run mode.
    pub fn set_home_frame(&mut self, id: EntityId) {
        let before = self.store.home_frame();
        self.store.set_home_frame(id);
        if self.store.home_frame() != before {
            self.events.push(EditorEvent::HomeFrameChanged {
                id: self.store.home_frame(),
            });
        }
    }

    /// Drop entities that no longer exist from the selection (after undo).
    fn prune_selection(&mut self) {
        if let Some(id) = self.selection.selected_frame()
            && !self.store.frame_exists(id)
        {
            self.selection.forget(id);
        }
        let stale: Vec<EntityId> = self
            .selection
            .multi_selected()
            .iter()
            .copied()
            .filter(|id| self.store.component(*id).is_none())
            .collect();
        for id in stale {
            self.selection.forget(id);
        }
        if let Some(id) = self.selection.selected_component()
            && self.store.component(id).is_none()
        {
            self.selection.forget(id);
        }
    }

    // ─── Direct manipulation ─────────────────────────────────────────────

    /// Append a change record to the active edit session.
    pub fn record_change(
        &mut self,
        property_path: &str,
        old_value: Value,
        new_value: Value,
        kind: ChangeKind,
    ) -> bool {
        self.sync.record_change(property_path, old_value, new_value, kind)
    }

    /// Fold the session log into the component's overlay maps.
    pub fn save_edit_session(&mut self) {
        if let Some(mutation) = self.sync.save_session(&self.store) {
            self.apply_mutation(mutation);
        }
    }

    /// Replay the session backward and remove the overlays.
    pub fn revert_edit_session(&mut self) {
        if let Some(mutation) = self.sync.revert_session(&self.store) {
            self.apply_mutation(mutation);
        }
    }

    /// Record an element position from element-positioning mode.
    pub fn set_element_position(&mut self, component_id: EntityId, element_id: &str, position: Point) {
        if let Some(mutation) =
            self.sync
                .set_element_position(&self.store, component_id, element_id, position)
        {
            self.apply_mutation(mutation);
        }
    }

    // ─── Regeneration ────────────────────────────────────────────────────

    /// Issue a regeneration request for the component's element layout.
    pub fn request_regeneration(&mut self, component_id: EntityId) -> Option<RegenRequest> {
        self.sync.request_regeneration(&self.store, component_id)
    }

    /// Complete a previously issued request with the generator's response.
    pub fn complete_regeneration(&mut self, request_id: u64, result: Result<String, String>) {
        match self.sync.complete_regeneration(&self.store, request_id, result) {
            RegenOutcome::Applied(mutation) => self.apply_mutation(mutation),
            RegenOutcome::Failed { id, error } => {
                self.events.push(EditorEvent::RegenerationFailed { id, error });
            }
            RegenOutcome::Stale => {}
        }
    }

    /// Request + complete in one step against a synchronous generator.
    pub fn regenerate_with(
        &mut self,
        generator: &mut dyn CodeGenerator,
        component_id: EntityId,
    ) -> bool {
        let Some(request) = self.request_regeneration(component_id) else {
            return false;
        };
        let result = generator.regenerate(&request.prompt, &request.component_type);
        self.complete_regeneration(request.request_id, result);
        true
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Load the entity store and viewport preferences, replacing current
    /// state. Corrupt or absent data falls back to defaults.
    pub fn load(&mut self, storage: &dyn StoragePort) {
        self.store = load_store(storage);
        if let Some(raw) = storage.load(KEY_VIEWPORT) {
            match serde_json::from_str::<Viewport>(&raw) {
                Ok(mut viewport) => {
                    viewport.view_size = self.viewport.view_size;
                    self.viewport = viewport;
                }
                Err(err) => {
                    log::warn!("discarding corrupt viewport preferences: {err}");
                }
            }
        }
        self.selection = Selection::new();
        self.commands = CommandStack::new(UNDO_DEPTH);
        self.sync = SyncEngine::new();
    }

    /// Persist the entity store and viewport preferences.
    pub fn save(&self, storage: &mut dyn StoragePort) -> Result<(), String> {
        save_store(storage, &self.store)?;
        let viewport = serde_json::to_string(&self.viewport).map_err(|e| format!("viewport: {e}"))?;
        storage.save(KEY_VIEWPORT, viewport);
        Ok(())
    }

    /// Update the viewport dimensions (host resize) and re-center.
    pub fn resize_view(&mut self, view_size: Size) {
        self.viewport.set_view_size(view_size);
        self.viewport.center_canvas();
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }
}
