//! Selection and hover state.
//!
//! Component and frame selection are mutually exclusive: selecting one kind
//! clears the other. Multi-select is components-only and driven by a
//! modifier click toggling membership. Hover ids are independent of
//! selection and only feed highlight rendering.

use crate::id::EntityId;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected_component: Option<EntityId>,
    selected_frame: Option<EntityId>,
    multi: SmallVec<[EntityId; 4]>,
    pub hovered_component: Option<EntityId>,
    pub hovered_frame: Option<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_component(&self) -> Option<EntityId> {
        self.selected_component
    }

    pub fn selected_frame(&self) -> Option<EntityId> {
        self.selected_frame
    }

    /// All components in the multi-selection (includes the single selection).
    pub fn multi_selected(&self) -> &[EntityId] {
        &self.multi
    }

    pub fn is_component_selected(&self, id: EntityId) -> bool {
        self.selected_component == Some(id) || self.multi.contains(&id)
    }

    /// Select a component. Without the modifier this becomes the exclusive
    /// selection (multi reduces to the singleton set); with it, membership
    /// in the multi-selection toggles.
    pub fn select_component(&mut self, id: EntityId, multi_modifier: bool) {
        self.selected_frame = None;
        if multi_modifier {
            if let Some(pos) = self.multi.iter().position(|m| *m == id) {
                self.multi.remove(pos);
                if self.selected_component == Some(id) {
                    self.selected_component = self.multi.last().copied();
                }
            } else {
                self.multi.push(id);
                self.selected_component = Some(id);
            }
        } else {
            self.selected_component = Some(id);
            self.multi.clear();
            self.multi.push(id);
        }
    }

    /// Select a frame exclusively. Frames are never multi-selected.
    pub fn select_frame(&mut self, id: EntityId) {
        self.selected_component = None;
        self.multi.clear();
        self.selected_frame = Some(id);
    }

    /// Background click: clear both selections.
    pub fn clear(&mut self) {
        self.selected_component = None;
        self.selected_frame = None;
        self.multi.clear();
    }

    /// Drop a deleted entity from selection and hover state.
    pub fn forget(&mut self, id: EntityId) {
        if self.selected_component == Some(id) {
            self.selected_component = None;
        }
        if self.selected_frame == Some(id) {
            self.selected_frame = None;
        }
        self.multi.retain(|m| *m != id);
        if self.selected_component.is_none() {
            self.selected_component = self.multi.last().copied();
        }
        if self.hovered_component == Some(id) {
            self.hovered_component = None;
        }
        if self.hovered_frame == Some(id) {
            self.hovered_frame = None;
        }
    }
}
