//! Drop resolution: turn a released drag into store mutations.
//!
//! The drop point is the dragged rectangle's translated top-left — not the
//! raw pointer position — so the computed position is where the entity's own
//! origin lands. Positions are clamped into the canvas, the target container
//! is classified (free canvas vs. a frame's interior), and frame moves
//! cascade to members inside a single transactional apply.

use crate::gesture::DragSubject;
use kurbo::Point;
use wb_core::{Component, EntityId, EntityStore, StoreMutation, clamp_to_canvas};
use wb_core::registry::TypeRegistry;
use wb_canvas::{DropTarget, drop_target};

/// What a resolved drop did.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    FrameMoved {
        id: EntityId,
    },
    ComponentMoved {
        id: EntityId,
        frame: Option<EntityId>,
    },
    /// A palette drop instantiated a new component; it becomes selected.
    ComponentCreated {
        id: EntityId,
        frame: Option<EntityId>,
    },
    /// Nothing happened (stale entity, unknown palette type).
    Aborted,
}

/// Resolve a drag-end into mutations. The returned list is applied as one
/// transaction; an empty list means the drop was a no-op.
pub fn resolve_drop(
    store: &EntityStore,
    registry: &dyn TypeRegistry,
    subject: &DragSubject,
    origin: Point,
) -> (Vec<StoreMutation>, DropOutcome) {
    match subject {
        DragSubject::Frame(id) => {
            // The frame may have been deleted mid-gesture; skip silently.
            if !store.frame_exists(*id) {
                return (Vec::new(), DropOutcome::Aborted);
            }
            (
                vec![StoreMutation::MoveFrame { id: *id, to: origin }],
                DropOutcome::FrameMoved { id: *id },
            )
        }
        DragSubject::Component(id) => {
            let Some(component) = store.component(*id) else {
                return (Vec::new(), DropOutcome::Aborted);
            };
            let position = clamp_to_canvas(origin, component.size);
            let frame = match drop_target(store, position) {
                DropTarget::Frame(frame_id) => Some(frame_id),
                DropTarget::Canvas => None,
            };
            (
                vec![
                    StoreMutation::MoveComponent {
                        id: *id,
                        to: position,
                    },
                    StoreMutation::SetFrameMembership {
                        id: *id,
                        frame,
                    },
                ],
                DropOutcome::ComponentMoved { id: *id, frame },
            )
        }
        DragSubject::Palette { type_name, .. } => {
            let Some(def) = registry.lookup(type_name) else {
                // Unknown type: abort the creation, leave the store unchanged.
                log::warn!("palette drop aborted: unknown component type {type_name:?}");
                return (Vec::new(), DropOutcome::Aborted);
            };
            let position = clamp_to_canvas(origin, def.default_size);
            let frame = match drop_target(store, position) {
                DropTarget::Frame(frame_id) => Some(frame_id),
                DropTarget::Canvas => None,
            };
            let id = EntityId::fresh_component();
            let mut component = Component::new(id, type_name.clone(), position, def.default_size);
            component.frame_id = frame;
            component.properties.config = def.default_config.clone();
            (
                vec![StoreMutation::AddComponent {
                    component: Box::new(component),
                }],
                DropOutcome::ComponentCreated { id, frame },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use pretty_assertions::assert_eq;
    use wb_core::{BuiltinRegistry, CANVAS_SIZE, Frame};

    fn store() -> EntityStore {
        let frame = Frame::new(
            EntityId::intern("d_f1"),
            "Screen",
            Point::new(100.0, 100.0),
            Size::new(400.0, 300.0),
        );
        let component = Component::new(
            EntityId::intern("d_free"),
            "button",
            Point::new(700.0, 700.0),
            Size::new(120.0, 40.0),
        );
        EntityStore::from_parts(vec![component], vec![frame], None)
    }

    #[test]
    fn component_dropped_on_frame_reparents() {
        let store = store();
        let registry = BuiltinRegistry::new();
        let (mutations, outcome) = resolve_drop(
            &store,
            &registry,
            &DragSubject::Component(EntityId::intern("d_free")),
            Point::new(150.0, 150.0),
        );
        assert_eq!(
            outcome,
            DropOutcome::ComponentMoved {
                id: EntityId::intern("d_free"),
                frame: Some(EntityId::intern("d_f1")),
            }
        );

        let mut store = store;
        store.apply_all(mutations);
        let c = store.component(EntityId::intern("d_free")).unwrap();
        // Absolute canvas coordinates, not frame-relative
        assert_eq!(c.position, Point::new(150.0, 150.0));
        assert_eq!(c.frame_id, Some(EntityId::intern("d_f1")));
    }

    #[test]
    fn component_dropped_on_canvas_clears_membership() {
        let mut store = store();
        store.apply(StoreMutation::SetFrameMembership {
            id: EntityId::intern("d_free"),
            frame: Some(EntityId::intern("d_f1")),
        });
        let registry = BuiltinRegistry::new();

        let (mutations, _) = resolve_drop(
            &store,
            &registry,
            &DragSubject::Component(EntityId::intern("d_free")),
            Point::new(900.0, 900.0),
        );
        store.apply_all(mutations);
        let c = store.component(EntityId::intern("d_free")).unwrap();
        assert_eq!(c.frame_id, None);
        assert_eq!(c.position, Point::new(900.0, 900.0));
    }

    #[test]
    fn drop_position_clamps_to_canvas() {
        let mut store = store();
        let registry = BuiltinRegistry::new();
        let (mutations, _) = resolve_drop(
            &store,
            &registry,
            &DragSubject::Component(EntityId::intern("d_free")),
            Point::new(-80.0, CANVAS_SIZE + 50.0),
        );
        store.apply_all(mutations);
        let c = store.component(EntityId::intern("d_free")).unwrap();
        assert_eq!(c.position.x, 0.0);
        assert_eq!(c.position.y, CANVAS_SIZE - 40.0);
    }

    #[test]
    fn palette_drop_creates_inside_frame() {
        let mut store = store();
        let registry = BuiltinRegistry::new();
        let (mutations, outcome) = resolve_drop(
            &store,
            &registry,
            &DragSubject::Palette {
                type_name: "button".to_string(),
                size: Size::new(120.0, 40.0),
            },
            Point::new(150.0, 150.0),
        );
        store.apply_all(mutations);

        let DropOutcome::ComponentCreated { id, frame } = outcome else {
            panic!("expected ComponentCreated, got {outcome:?}");
        };
        assert_eq!(frame, Some(EntityId::intern("d_f1")));
        let c = store.component(id).unwrap();
        assert_eq!(c.position, Point::new(150.0, 150.0));
        assert_eq!(c.frame_id, Some(EntityId::intern("d_f1")));
        assert_eq!(c.properties.config["label"], serde_json::json!("Button"));
    }

    #[test]
    fn unknown_palette_type_aborts_silently() {
        let store = store();
        let registry = BuiltinRegistry::new();
        let before = store.clone();
        let (mutations, outcome) = resolve_drop(
            &store,
            &registry,
            &DragSubject::Palette {
                type_name: "warp-core".to_string(),
                size: Size::new(100.0, 100.0),
            },
            Point::new(200.0, 200.0),
        );
        assert!(mutations.is_empty());
        assert_eq!(outcome, DropOutcome::Aborted);
        assert_eq!(store, before);
    }

    #[test]
    fn drop_of_deleted_frame_is_noop() {
        let store = store();
        let registry = BuiltinRegistry::new();
        let (mutations, outcome) = resolve_drop(
            &store,
            &registry,
            &DragSubject::Frame(EntityId::intern("d_gone")),
            Point::new(50.0, 50.0),
        );
        assert!(mutations.is_empty());
        assert_eq!(outcome, DropOutcome::Aborted);
    }
}
