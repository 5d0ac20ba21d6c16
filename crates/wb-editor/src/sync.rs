//! Direct-manipulation sync engine.
//!
//! Lets the user tweak a rendered component's visual properties — inline
//! style, text, positions of elements inside generated markup — without
//! regenerating its source. Edits accumulate in an append-only change log
//! tied to the current editing target; on save the log folds into overlay
//! maps on the component's properties, applied at render time on top of the
//! base configuration and never baked into the generated source string.
//!
//! Element-level positions feed the regeneration path: the engine describes
//! the desired layout as text for the external code generator and applies
//! the returned source, discarding responses that arrive after the component
//! was deleted or a newer request superseded them.

use kurbo::Point;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use wb_core::{ComponentProperties, EntityId, EntityStore, StoreMutation};

/// Classification of a tracked edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Style,
    Content,
    Layout,
}

/// One tracked property edit. Records are only appended, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub seq: u64,
    pub property_path: String,
    pub old_value: Value,
    pub new_value: Value,
    pub kind: ChangeKind,
}

/// The change log for one editing target.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub component_id: EntityId,
    log: Vec<ChangeRecord>,
    next_seq: u64,
}

impl EditSession {
    pub fn new(component_id: EntityId) -> Self {
        Self {
            component_id,
            log: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn record(&mut self, property_path: &str, old_value: Value, new_value: Value, kind: ChangeKind) {
        self.log.push(ChangeRecord {
            seq: self.next_seq,
            property_path: property_path.to_string(),
            old_value,
            new_value,
            kind,
        });
        self.next_seq += 1;
    }

    pub fn log(&self) -> &[ChangeRecord] {
        &self.log
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Fold the log into the overlay maps. Style paths convert to
    /// kebab-case CSS property names; content paths land in the discrete
    /// content fields. Overlays are keyed maps, last write wins, so folding
    /// the same log twice yields the same overlays.
    pub fn save_into(&self, properties: &mut ComponentProperties) {
        for record in &self.log {
            match record.kind {
                ChangeKind::Style => {
                    properties
                        .style_overrides
                        .get_or_insert_with(BTreeMap::new)
                        .insert(
                            kebab_case(&record.property_path),
                            value_to_css(&record.new_value),
                        );
                }
                ChangeKind::Content => match record.property_path.as_str() {
                    "textContent" => properties.text_content = value_as_string(&record.new_value),
                    "placeholder" => properties.placeholder = value_as_string(&record.new_value),
                    other => {
                        log::debug!("ignoring content change with unknown path {other:?}");
                    }
                },
                // Layout edits travel through the element-positions map,
                // not the overlay fold.
                ChangeKind::Layout => {}
            }
        }
    }

    /// Replay the log backward — most recent first — restoring old values
    /// for config-backed paths, then remove the overlay maps entirely (not
    /// set-to-empty) and clear the log.
    pub fn revert_into(&mut self, properties: &mut ComponentProperties) {
        for record in self.log.iter().rev() {
            if properties.config.contains_key(&record.property_path) {
                properties
                    .config
                    .insert(record.property_path.clone(), record.old_value.clone());
            }
        }
        properties.style_overrides = None;
        properties.text_content = None;
        properties.placeholder = None;
        self.log.clear();
    }
}

/// `backgroundColor` → `background-color`.
fn kebab_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 4);
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn value_to_css(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// ─── Regeneration ────────────────────────────────────────────────────────

/// Code-generation collaborator boundary. Hosts with an async pipeline use
/// the request/complete pair instead and call the generator themselves.
pub trait CodeGenerator {
    fn regenerate(&mut self, prompt: &str, component_type: &str) -> Result<String, String>;
}

/// A regeneration request handed to the external generator.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenRequest {
    pub request_id: u64,
    pub component_id: EntityId,
    pub component_type: String,
    pub prompt: String,
}

/// Result of completing a regeneration request.
#[derive(Debug, Clone, PartialEq)]
pub enum RegenOutcome {
    /// Apply this mutation to land the new source on the component.
    Applied(StoreMutation),
    /// The generator failed; the previous source is retained unchanged.
    Failed { id: EntityId, error: String },
    /// Late response for a deleted component or a superseded request;
    /// discarded.
    Stale,
}

/// The sync engine: one optional edit session plus regeneration bookkeeping.
///
/// Per-component epochs are the cancellation tokens: issuing a new request
/// bumps the component's epoch, and a completion whose epoch no longer
/// matches is discarded rather than applied to stale state.
#[derive(Debug, Default)]
pub struct SyncEngine {
    session: Option<EditSession>,
    epochs: HashMap<EntityId, u64>,
    inflight: HashMap<u64, (EntityId, u64)>,
    next_request_id: u64,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Edit sessions ───────────────────────────────────────────────────

    /// Start tracking edits against a component, replacing any previous
    /// session (the log is tied to the currently selected target).
    pub fn begin_session(&mut self, component_id: EntityId) {
        self.session = Some(EditSession::new(component_id));
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Append a change to the active session. Returns false if no session
    /// is active.
    pub fn record_change(
        &mut self,
        property_path: &str,
        old_value: Value,
        new_value: Value,
        kind: ChangeKind,
    ) -> bool {
        match &mut self.session {
            Some(session) => {
                session.record(property_path, old_value, new_value, kind);
                true
            }
            None => false,
        }
    }

    /// Fold the session log into the target's overlay maps. The session
    /// stays open so a later revert can still replay it backward.
    pub fn save_session(&self, store: &EntityStore) -> Option<StoreMutation> {
        let session = self.session.as_ref()?;
        if session.is_empty() {
            return None;
        }
        let component = store.component(session.component_id)?;
        let mut properties = component.properties.clone();
        session.save_into(&mut properties);
        Some(StoreMutation::SetProperties {
            id: session.component_id,
            properties,
        })
    }

    /// Revert the session: replay backward, remove overlays, clear the log.
    pub fn revert_session(&mut self, store: &EntityStore) -> Option<StoreMutation> {
        let session = self.session.as_mut()?;
        let component = store.component(session.component_id)?;
        let mut properties = component.properties.clone();
        session.revert_into(&mut properties);
        Some(StoreMutation::SetProperties {
            id: session.component_id,
            properties,
        })
    }

    /// Drop the session without touching the component.
    pub fn end_session(&mut self) {
        self.session = None;
    }

    // ─── Element positioning ─────────────────────────────────────────────

    /// Record an intra-component element position (element positioning
    /// mode drag). Updates the map live, distinct from `style_overrides`.
    pub fn set_element_position(
        &self,
        store: &EntityStore,
        component_id: EntityId,
        element_id: &str,
        position: Point,
    ) -> Option<StoreMutation> {
        let component = store.component(component_id)?;
        let mut properties = component.properties.clone();
        properties
            .element_positions
            .get_or_insert_with(BTreeMap::new)
            .insert(element_id.to_string(), position);
        Some(StoreMutation::SetProperties {
            id: component_id,
            properties,
        })
    }

    /// Natural-language description of the tracked element layout, handed
    /// to the code generator so the position intent lives in the source,
    /// not just as a runtime overlay.
    pub fn layout_prompt(positions: &BTreeMap<String, Point>) -> String {
        positions
            .iter()
            .map(|(element_id, p)| {
                format!(
                    "{element_id}: position absolute, left {}px, top {}px",
                    p.x.round(),
                    p.y.round()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ─── Regeneration ────────────────────────────────────────────────────

    /// Issue a regeneration request for a component's tracked element
    /// positions. Bumps the component's epoch so any earlier in-flight
    /// request becomes stale.
    pub fn request_regeneration(
        &mut self,
        store: &EntityStore,
        component_id: EntityId,
    ) -> Option<RegenRequest> {
        let component = store.component(component_id)?;
        let positions = component.properties.element_positions.as_ref()?;
        if positions.is_empty() {
            return None;
        }
        let epoch = self.epochs.entry(component_id).or_insert(0);
        *epoch += 1;
        let epoch = *epoch;

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.inflight.insert(request_id, (component_id, epoch));

        Some(RegenRequest {
            request_id,
            component_id,
            component_type: component.type_name.clone(),
            prompt: Self::layout_prompt(positions),
        })
    }

    /// Complete a regeneration request with the generator's response. The
    /// response is discarded if the component is gone or the request was
    /// superseded; failures retain the previous generated source.
    pub fn complete_regeneration(
        &mut self,
        store: &EntityStore,
        request_id: u64,
        result: Result<String, String>,
    ) -> RegenOutcome {
        let Some((component_id, epoch)) = self.inflight.remove(&request_id) else {
            log::debug!("regeneration response {request_id} has no in-flight request");
            return RegenOutcome::Stale;
        };
        if self.epochs.get(&component_id) != Some(&epoch) {
            log::debug!("regeneration response {request_id} superseded for {component_id}");
            return RegenOutcome::Stale;
        }
        let Some(component) = store.component(component_id) else {
            log::debug!("regeneration response {request_id} for deleted component {component_id}");
            return RegenOutcome::Stale;
        };
        match result {
            Ok(source) => {
                let mut properties = component.properties.clone();
                properties.generated_code = Some(source);
                // element_positions persist alongside the new source.
                RegenOutcome::Applied(StoreMutation::SetProperties {
                    id: component_id,
                    properties,
                })
            }
            Err(error) => RegenOutcome::Failed {
                id: component_id,
                error,
            },
        }
    }

    /// Forget a deleted component: drops its epoch and any session on it.
    /// In-flight requests then resolve as stale.
    pub fn forget_component(&mut self, component_id: EntityId) {
        self.epochs.remove(&component_id);
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.component_id == component_id)
        {
            self.session = None;
        }
    }
}
