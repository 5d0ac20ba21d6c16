//! Spatial entity model: frames, components, and the copy-on-write store.
//!
//! The canvas holds two flat entity lists — `Frame`s (screen containers) and
//! `Component`s (placed UI elements). A component's `position` is always in
//! absolute canvas coordinates, even while it belongs to a frame; frame
//! membership only determines grouping for cascade moves and cascade
//! deletion, never the coordinate origin.
//!
//! Both lists are `Arc`-backed so every mutation replaces the list wholesale
//! and renderers holding a snapshot observe a consistent state mid-frame.

use crate::id::EntityId;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Edge length of the finite virtual canvas, in virtual units.
pub const CANVAS_SIZE: f64 = 10_000.0;

/// Minimum edge of a frame created by rubber-band drawing.
pub const MIN_FRAME_EDGE: f64 = 50.0;

/// Minimum component dimensions enforced during resize.
pub const MIN_COMPONENT_WIDTH: f64 = 50.0;
pub const MIN_COMPONENT_HEIGHT: f64 = 20.0;

/// Clamp an entity origin so the entity stays inside `[0, CANVAS_SIZE - size]`
/// on each axis. Clamping is the recovery strategy for out-of-bounds
/// positions — they are never rejected.
pub fn clamp_to_canvas(position: Point, size: Size) -> Point {
    Point::new(
        position.x.clamp(0.0, (CANVAS_SIZE - size.width).max(0.0)),
        position.y.clamp(0.0, (CANVAS_SIZE - size.height).max(0.0)),
    )
}

// ─── Frames ──────────────────────────────────────────────────────────────

/// A "screen" container drawn on the canvas. Components reference a frame by
/// id; the frame's bounds group them for cascade moves and deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: EntityId,
    pub label: String,
    /// Top-left corner in virtual canvas coordinates.
    pub position: Point,
    pub size: Size,
}

impl Frame {
    pub fn new(id: EntityId, label: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id,
            label: label.into(),
            position,
            size,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

// ─── Components ──────────────────────────────────────────────────────────

/// The property bag of a placed component.
///
/// The typed fields are the direct-manipulation overlays: they are applied at
/// render time *on top of* the base configuration or generated source and are
/// never baked into it. `None` means "no overlay — fall back to base", which
/// is distinct from an empty map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentProperties {
    /// Type-specific configuration; schema is documented per type by the
    /// registry (`label` for buttons, `content` for text, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, Value>,

    /// CSS property name (kebab-case) → value, applied over the base style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_overrides: Option<BTreeMap<String, String>>,

    /// Content overlays for text-bearing elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// AI-generated source for generated components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,

    /// Intra-component absolute positions for elements inside generated
    /// markup, keyed by the element's stable id attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_positions: Option<BTreeMap<String, Point>>,
}

impl ComponentProperties {
    /// Merge the style overlay into a base style map, last write wins.
    /// Applying the same overlay twice yields the same result as once.
    pub fn apply_style_overrides(
        &self,
        base: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut merged = base.clone();
        if let Some(overrides) = &self.style_overrides {
            for (k, v) in overrides {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }

    /// The text shown for this component: content overlay if present,
    /// otherwise the base value.
    pub fn effective_text<'a>(&'a self, base: &'a str) -> &'a str {
        self.text_content.as_deref().unwrap_or(base)
    }
}

/// A placed UI element instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: EntityId,
    /// Element kind, looked up in the component-type registry.
    pub type_name: String,
    /// Top-left corner in absolute virtual canvas coordinates — absolute
    /// even when the component belongs to a frame.
    pub position: Point,
    pub size: Size,
    /// Owning frame, if any. `None` renders as a floating canvas object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<EntityId>,
    /// Owning generated component, for elements authored by generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_component_id: Option<EntityId>,
    #[serde(default = "default_z_index")]
    pub z_index: i32,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub properties: ComponentProperties,
}

fn default_z_index() -> i32 {
    1
}

fn default_opacity() -> f64 {
    1.0
}

impl Component {
    pub fn new(id: EntityId, type_name: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            position,
            size,
            frame_id: None,
            parent_component_id: None,
            z_index: default_z_index(),
            opacity: default_opacity(),
            properties: ComponentProperties::default(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

// ─── Store mutations ─────────────────────────────────────────────────────

/// A mutation applied to the entity store. Gestures and drop resolution
/// produce these; `EntityStore::apply` executes them transactionally (a
/// frame move lands on the frame and all its members in one list swap).
#[derive(Debug, Clone, PartialEq)]
pub enum StoreMutation {
    MoveComponent {
        id: EntityId,
        to: Point,
    },
    /// Move a frame and cascade the exact delta to every member component.
    MoveFrame {
        id: EntityId,
        to: Point,
    },
    /// Resize with an explicit origin: dragging a north or west handle
    /// moves the origin while the opposite edge stays put.
    ResizeComponent {
        id: EntityId,
        origin: Point,
        size: Size,
    },
    ResizeFrame {
        id: EntityId,
        origin: Point,
        size: Size,
    },
    AddFrame {
        frame: Frame,
    },
    AddComponent {
        component: Box<Component>,
    },
    RemoveComponent {
        id: EntityId,
    },
    /// Remove a frame and every component that belongs to it.
    RemoveFrame {
        id: EntityId,
    },
    /// Re-parent a component; `None` floats it on the free canvas.
    SetFrameMembership {
        id: EntityId,
        frame: Option<EntityId>,
    },
    SetProperties {
        id: EntityId,
        properties: ComponentProperties,
    },
    SetZIndex {
        id: EntityId,
        z_index: i32,
    },
    SetOpacity {
        id: EntityId,
        opacity: f64,
    },
    SetFrameLabel {
        id: EntityId,
        label: String,
    },
}

// ─── Entity store ────────────────────────────────────────────────────────

/// The canvas entity lists plus the process-wide home-frame designation.
///
/// Cloning the store is cheap (two `Arc` bumps); mutation goes through
/// copy-on-write so outstanding snapshots keep observing the pre-mutation
/// lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    components: Arc<Vec<Component>>,
    frames: Arc<Vec<Frame>>,
    home_frame: Option<EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        components: Vec<Component>,
        frames: Vec<Frame>,
        home_frame: Option<EntityId>,
    ) -> Self {
        let mut store = Self {
            components: Arc::new(components),
            frames: Arc::new(frames),
            home_frame: None,
        };
        // Route through the setter so a stale persisted home id is dropped.
        if let Some(id) = home_frame {
            store.set_home_frame(id);
        }
        store
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Shared snapshot of the component list for renderers.
    pub fn components_snapshot(&self) -> Arc<Vec<Component>> {
        Arc::clone(&self.components)
    }

    pub fn frames_snapshot(&self) -> Arc<Vec<Frame>> {
        Arc::clone(&self.frames)
    }

    pub fn component(&self, id: EntityId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn frame(&self, id: EntityId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn frame_exists(&self, id: EntityId) -> bool {
        self.frame(id).is_some()
    }

    /// Ids of components belonging to the given frame.
    pub fn members_of(&self, frame_id: EntityId) -> Vec<EntityId> {
        self.components
            .iter()
            .filter(|c| c.frame_id == Some(frame_id))
            .map(|c| c.id)
            .collect()
    }

    pub fn home_frame(&self) -> Option<EntityId> {
        self.home_frame
    }

    /// Designate the home frame. Ignored if the frame does not exist.
    pub fn set_home_frame(&mut self, id: EntityId) {
        if self.frame_exists(id) {
            self.home_frame = Some(id);
        } else {
            log::warn!("set_home_frame: no frame {id}, keeping current home");
        }
    }

    fn components_mut(&mut self) -> &mut Vec<Component> {
        Arc::make_mut(&mut self.components)
    }

    fn frames_mut(&mut self) -> &mut Vec<Frame> {
        Arc::make_mut(&mut self.frames)
    }

    fn component_mut(&mut self, id: EntityId) -> Option<&mut Component> {
        self.components_mut().iter_mut().find(|c| c.id == id)
    }

    fn frame_mut(&mut self, id: EntityId) -> Option<&mut Frame> {
        self.frames_mut().iter_mut().find(|f| f.id == id)
    }

    /// Apply a single mutation. Unknown target ids are a silent no-op —
    /// a gesture may outlive the entity it grabbed.
    pub fn apply(&mut self, mutation: StoreMutation) {
        match mutation {
            StoreMutation::MoveComponent { id, to } => {
                if let Some(c) = self.component_mut(id) {
                    c.position = clamp_to_canvas(to, c.size);
                }
            }
            StoreMutation::MoveFrame { id, to } => {
                let delta = match self.frame(id) {
                    Some(f) => clamp_to_canvas(to, f.size) - f.position,
                    None => return,
                };
                self.translate_frame(id, delta);
            }
            StoreMutation::ResizeComponent { id, origin, size } => {
                if let Some(c) = self.component_mut(id) {
                    c.size = size;
                    c.position = clamp_to_canvas(origin, size);
                }
            }
            StoreMutation::ResizeFrame { id, origin, size } => {
                if let Some(f) = self.frame_mut(id) {
                    f.size = size;
                    f.position = clamp_to_canvas(origin, size);
                }
            }
            StoreMutation::AddFrame { frame } => {
                self.frames_mut().push(frame);
            }
            StoreMutation::AddComponent { component } => {
                self.components_mut().push(*component);
            }
            StoreMutation::RemoveComponent { id } => {
                self.components_mut().retain(|c| c.id != id);
            }
            StoreMutation::RemoveFrame { id } => {
                self.frames_mut().retain(|f| f.id != id);
                self.components_mut().retain(|c| c.frame_id != Some(id));
                if self.home_frame == Some(id) {
                    // Home frame reassigns to another frame, or unsets.
                    self.home_frame = self.frames.first().map(|f| f.id);
                }
            }
            StoreMutation::SetFrameMembership { id, frame } => {
                // A drop may race a frame delete; skip rather than attach
                // a component to a frame that no longer exists.
                if let Some(frame_id) = frame
                    && !self.frame_exists(frame_id)
                {
                    log::debug!("membership change for {id} skipped: frame {frame_id} is gone");
                    return;
                }
                if let Some(c) = self.component_mut(id) {
                    c.frame_id = frame;
                }
            }
            StoreMutation::SetProperties { id, properties } => {
                if let Some(c) = self.component_mut(id) {
                    c.properties = properties;
                }
            }
            StoreMutation::SetZIndex { id, z_index } => {
                if let Some(c) = self.component_mut(id) {
                    c.z_index = z_index;
                }
            }
            StoreMutation::SetOpacity { id, opacity } => {
                if let Some(c) = self.component_mut(id) {
                    c.opacity = opacity.clamp(0.0, 1.0);
                }
            }
            StoreMutation::SetFrameLabel { id, label } => {
                if let Some(f) = self.frame_mut(id) {
                    f.label = label;
                }
            }
        }
    }

    pub fn apply_all(&mut self, mutations: impl IntoIterator<Item = StoreMutation>) {
        for m in mutations {
            self.apply(m);
        }
    }

    /// Translate a frame and all of its members by the same delta.
    fn translate_frame(&mut self, id: EntityId, delta: Vec2) {
        if delta.x == 0.0 && delta.y == 0.0 {
            return;
        }
        if let Some(f) = self.frame_mut(id) {
            f.position += delta;
        }
        for c in self.components_mut().iter_mut() {
            if c.frame_id == Some(id) {
                c.position += delta;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(id: &str, x: f64, y: f64) -> Frame {
        Frame::new(
            EntityId::intern(id),
            id.to_string(),
            Point::new(x, y),
            Size::new(400.0, 300.0),
        )
    }

    fn component(id: &str, x: f64, y: f64, frame: Option<&str>) -> Component {
        let mut c = Component::new(
            EntityId::intern(id),
            "button",
            Point::new(x, y),
            Size::new(120.0, 40.0),
        );
        c.frame_id = frame.map(EntityId::intern);
        c
    }

    #[test]
    fn frame_move_cascades_to_members_only() {
        let mut store = EntityStore::from_parts(
            vec![
                component("a", 150.0, 150.0, Some("f1")),
                component("b", 200.0, 180.0, Some("f1")),
                component("c", 700.0, 700.0, None),
            ],
            vec![frame("f1", 100.0, 100.0)],
            None,
        );

        store.apply(StoreMutation::MoveFrame {
            id: EntityId::intern("f1"),
            to: Point::new(150.0, 160.0),
        });

        assert_eq!(
            store.frame(EntityId::intern("f1")).unwrap().position,
            Point::new(150.0, 160.0)
        );
        assert_eq!(
            store.component(EntityId::intern("a")).unwrap().position,
            Point::new(200.0, 210.0)
        );
        assert_eq!(
            store.component(EntityId::intern("b")).unwrap().position,
            Point::new(250.0, 240.0)
        );
        // Free component untouched
        assert_eq!(
            store.component(EntityId::intern("c")).unwrap().position,
            Point::new(700.0, 700.0)
        );
    }

    #[test]
    fn frame_delete_cascades_and_reassigns_home() {
        let mut store = EntityStore::from_parts(
            vec![
                component("a", 150.0, 150.0, Some("f1")),
                component("b", 200.0, 180.0, Some("f1")),
                component("c", 700.0, 700.0, None),
            ],
            vec![frame("f1", 100.0, 100.0), frame("f2", 900.0, 100.0)],
            Some(EntityId::intern("f1")),
        );

        store.apply(StoreMutation::RemoveFrame {
            id: EntityId::intern("f1"),
        });

        assert!(store.frame(EntityId::intern("f1")).is_none());
        assert!(store.component(EntityId::intern("a")).is_none());
        assert!(store.component(EntityId::intern("b")).is_none());
        assert!(store.component(EntityId::intern("c")).is_some());
        // Home moved to the surviving frame, not None
        assert_eq!(store.home_frame(), Some(EntityId::intern("f2")));
    }

    #[test]
    fn deleting_last_frame_unsets_home() {
        let mut store = EntityStore::from_parts(
            vec![],
            vec![frame("only", 0.0, 0.0)],
            Some(EntityId::intern("only")),
        );
        store.apply(StoreMutation::RemoveFrame {
            id: EntityId::intern("only"),
        });
        assert_eq!(store.home_frame(), None);
    }

    #[test]
    fn move_clamps_into_canvas() {
        let mut store =
            EntityStore::from_parts(vec![component("a", 10.0, 10.0, None)], vec![], None);

        store.apply(StoreMutation::MoveComponent {
            id: EntityId::intern("a"),
            to: Point::new(-50.0, CANVAS_SIZE + 100.0),
        });

        let c = store.component(EntityId::intern("a")).unwrap();
        assert_eq!(c.position.x, 0.0);
        assert_eq!(c.position.y, CANVAS_SIZE - c.size.height);
    }

    #[test]
    fn membership_to_missing_frame_is_skipped() {
        let mut store =
            EntityStore::from_parts(vec![component("a", 10.0, 10.0, None)], vec![], None);

        store.apply(StoreMutation::SetFrameMembership {
            id: EntityId::intern("a"),
            frame: Some(EntityId::intern("ghost")),
        });
        assert_eq!(store.component(EntityId::intern("a")).unwrap().frame_id, None);
    }

    #[test]
    fn snapshots_are_isolated_from_mutation() {
        let mut store =
            EntityStore::from_parts(vec![component("a", 10.0, 10.0, None)], vec![], None);
        let snapshot = store.components_snapshot();

        store.apply(StoreMutation::MoveComponent {
            id: EntityId::intern("a"),
            to: Point::new(500.0, 500.0),
        });

        assert_eq!(snapshot[0].position, Point::new(10.0, 10.0));
        assert_eq!(
            store.component(EntityId::intern("a")).unwrap().position,
            Point::new(500.0, 500.0)
        );
    }

    #[test]
    fn style_overlay_is_idempotent() {
        let props = ComponentProperties {
            style_overrides: Some(BTreeMap::from([(
                "background-color".to_string(),
                "red".to_string(),
            )])),
            ..Default::default()
        };

        let base = BTreeMap::from([
            ("background-color".to_string(), "blue".to_string()),
            ("font-size".to_string(), "14px".to_string()),
        ]);

        let once = props.apply_style_overrides(&base);
        let twice = props.apply_style_overrides(&once);
        assert_eq!(once, twice);
        assert_eq!(once["background-color"], "red");
        assert_eq!(once["font-size"], "14px");
    }
}
