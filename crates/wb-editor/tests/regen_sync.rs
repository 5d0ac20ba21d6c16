//! Integration tests: direct-manipulation overlays and the regeneration
//! path through the controller.

use kurbo::{Point, Size};
use pretty_assertions::assert_eq;
use serde_json::json;
use wb_core::persist::MemoryStorage;
use wb_core::{BuiltinRegistry, EntityId};
use wb_editor::controller::{CanvasController, EditorEvent};
use wb_editor::input::{InputEvent, Modifiers, PointerButton};
use wb_editor::sync::{ChangeKind, CodeGenerator};

const VIEW: Size = Size {
    width: 800.0,
    height: 600.0,
};

fn controller() -> CanvasController {
    CanvasController::new(VIEW, Box::new(BuiltinRegistry::new()))
}

fn place(controller: &mut CanvasController, type_name: &str, x: f64, y: f64) -> EntityId {
    let s = controller.viewport().to_screen(Point::new(x, y));
    assert!(controller.start_palette_drag(type_name, s));
    controller.handle_event(&InputEvent::pointer_up(s.x, s.y, Modifiers::NONE));
    controller
        .take_events()
        .iter()
        .find_map(|e| match e {
            EditorEvent::ComponentCreated { id } => Some(*id),
            _ => None,
        })
        .expect("component should have been created")
}

/// Deterministic generator standing in for the code-generation collaborator.
struct EchoGenerator {
    calls: Vec<String>,
    fail: bool,
}

impl EchoGenerator {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail: false,
        }
    }
}

impl CodeGenerator for EchoGenerator {
    fn regenerate(&mut self, prompt: &str, component_type: &str) -> Result<String, String> {
        self.calls.push(prompt.to_string());
        if self.fail {
            Err("model unavailable".to_string())
        } else {
            Ok(format!("<div data-type=\"{component_type}\"><!-- {prompt} --></div>"))
        }
    }
}

#[test]
fn style_edits_fold_into_overrides_on_save() {
    let mut c = controller();
    let id = place(&mut c, "button", 200.0, 200.0);

    // Placing selected the component, which opened an edit session
    assert!(c.record_change("backgroundColor", json!("blue"), json!("red"), ChangeKind::Style));
    assert!(c.record_change("textContent", json!("Button"), json!("Buy now"), ChangeKind::Content));
    c.save_edit_session();

    let props = &c.store().component(id).unwrap().properties;
    assert_eq!(
        props.style_overrides.as_ref().unwrap()["background-color"],
        "red"
    );
    assert_eq!(props.text_content.as_deref(), Some("Buy now"));
    // The base config is untouched — the overlay sits on top of it
    assert_eq!(props.config["label"], json!("Button"));
    assert_eq!(props.effective_text("Button"), "Buy now");
}

#[test]
fn revert_clears_overlays_entirely() {
    let mut c = controller();
    let id = place(&mut c, "button", 200.0, 200.0);
    c.record_change("color", json!("black"), json!("red"), ChangeKind::Style);
    c.record_change("textContent", json!("Button"), json!("Go"), ChangeKind::Content);
    c.save_edit_session();
    assert!(c.store().component(id).unwrap().properties.style_overrides.is_some());

    c.revert_edit_session();
    let props = &c.store().component(id).unwrap().properties;
    assert_eq!(props.style_overrides, None);
    assert_eq!(props.text_content, None);
    assert_eq!(props.effective_text("Button"), "Button");
}

#[test]
fn deselecting_ends_the_edit_session() {
    let mut c = controller();
    place(&mut c, "button", 200.0, 200.0);
    assert!(c.record_change("color", json!("black"), json!("red"), ChangeKind::Style));

    // Background click clears the selection and with it the session
    let s = c.viewport().to_screen(Point::new(3000.0, 3000.0));
    c.handle_event(&InputEvent::pointer_down(
        s.x,
        s.y,
        PointerButton::Left,
        Modifiers::NONE,
    ));
    c.handle_event(&InputEvent::pointer_up(s.x, s.y, Modifiers::NONE));
    assert!(!c.record_change("color", json!("red"), json!("green"), ChangeKind::Style));
}

#[test]
fn regeneration_round_trip_through_generator() {
    let mut c = controller();
    let id = place(&mut c, "ai-component", 300.0, 300.0);
    c.set_element_position(id, "headline", Point::new(24.0, 16.0));
    c.set_element_position(id, "cta", Point::new(24.0, 80.0));

    let mut generator = EchoGenerator::new();
    assert!(c.regenerate_with(&mut generator, id));

    assert_eq!(generator.calls.len(), 1);
    assert!(generator.calls[0].contains("headline: position absolute, left 24px, top 16px"));
    assert!(generator.calls[0].contains("cta: position absolute, left 24px, top 80px"));

    let props = &c.store().component(id).unwrap().properties;
    let code = props.generated_code.as_ref().unwrap();
    assert!(code.contains("data-type=\"ai-component\""));
    // Positions persist alongside the regenerated source
    assert_eq!(
        props.element_positions.as_ref().unwrap()["cta"],
        Point::new(24.0, 80.0)
    );
}

#[test]
fn failed_regeneration_surfaces_event_and_keeps_code() {
    let mut c = controller();
    let id = place(&mut c, "ai-component", 300.0, 300.0);
    c.set_element_position(id, "headline", Point::new(24.0, 16.0));

    // Seed existing generated code via a successful pass
    let mut generator = EchoGenerator::new();
    assert!(c.regenerate_with(&mut generator, id));
    let code_before = c
        .store()
        .component(id)
        .unwrap()
        .properties
        .generated_code
        .clone();
    c.take_events();

    generator.fail = true;
    assert!(c.regenerate_with(&mut generator, id));
    let events = c.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        EditorEvent::RegenerationFailed { id: failed, .. } if *failed == id
    )));
    // Previous source retained unchanged
    assert_eq!(
        c.store().component(id).unwrap().properties.generated_code,
        code_before
    );
}

#[test]
fn late_response_for_deleted_component_is_discarded() {
    let mut c = controller();
    let id = place(&mut c, "ai-component", 300.0, 300.0);
    c.set_element_position(id, "headline", Point::new(24.0, 16.0));

    let request = c.request_regeneration(id).unwrap();
    c.delete_selected();
    assert!(c.store().component(id).is_none());

    // The response arrives after deletion: nothing is applied, no panic
    c.complete_regeneration(request.request_id, Ok("<div/>".to_string()));
    assert!(c.store().component(id).is_none());
}

#[test]
fn requests_without_tracked_positions_are_refused() {
    let mut c = controller();
    let id = place(&mut c, "button", 200.0, 200.0);
    assert!(c.request_regeneration(id).is_none());
}

#[test]
fn store_and_viewport_survive_persistence() {
    let mut c = controller();
    let id = place(&mut c, "button", 200.0, 200.0);
    c.record_change("backgroundColor", json!("blue"), json!("red"), ChangeKind::Style);
    c.save_edit_session();
    c.viewport_mut().zoom_at(Point::new(100.0, 100.0), 1.5);

    let mut storage = MemoryStorage::new();
    c.save(&mut storage).unwrap();

    let mut restored = controller();
    restored.load(&storage);
    let props = &restored.store().component(id).unwrap().properties;
    assert_eq!(
        props.style_overrides.as_ref().unwrap()["background-color"],
        "red"
    );
    assert_eq!(restored.viewport().zoom, c.viewport().zoom);
    assert_eq!(restored.viewport().pan, c.viewport().pan);
}
