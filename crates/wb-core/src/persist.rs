//! Persistence port and store snapshots.
//!
//! The host owns the actual storage (browser localStorage, a file, ...);
//! the core reads and writes JSON strings through `StoragePort`. Loads are
//! best-effort: absent or corrupt data falls back to empty defaults per key,
//! never a crash.

use crate::id::EntityId;
use crate::model::{Component, EntityStore, Frame};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

pub const KEY_COMPONENTS: &str = "wireboard.components";
pub const KEY_FRAMES: &str = "wireboard.frames";
pub const KEY_HOME_FRAME: &str = "wireboard.homeFrame";
pub const KEY_VIEWPORT: &str = "wireboard.viewport";

/// Key/value storage boundary.
pub trait StoragePort {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: String);
}

/// In-memory storage for tests and headless use.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Parse one persisted list, falling back to empty on absent or corrupt data.
fn load_list<T: DeserializeOwned>(storage: &dyn StoragePort, key: &str) -> Vec<T> {
    match storage.load(key) {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(err) => {
                log::warn!("discarding corrupt persisted data under {key}: {err}");
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}

/// Load the entity store from storage. A persisted home-frame id pointing at
/// a frame that no longer exists is dropped.
pub fn load_store(storage: &dyn StoragePort) -> EntityStore {
    let components: Vec<Component> = load_list(storage, KEY_COMPONENTS);
    let frames: Vec<Frame> = load_list(storage, KEY_FRAMES);
    let home_frame = storage
        .load(KEY_HOME_FRAME)
        .and_then(|raw| serde_json::from_str::<String>(&raw).ok())
        .map(|s| EntityId::intern(&s));
    EntityStore::from_parts(components, frames, home_frame)
}

/// Persist the entity store.
pub fn save_store(storage: &mut dyn StoragePort, store: &EntityStore) -> Result<(), String> {
    let components =
        serde_json::to_string(store.components()).map_err(|e| format!("components: {e}"))?;
    let frames = serde_json::to_string(store.frames()).map_err(|e| format!("frames: {e}"))?;
    storage.save(KEY_COMPONENTS, components);
    storage.save(KEY_FRAMES, frames);
    if let Some(home) = store.home_frame() {
        let raw = serde_json::to_string(home.as_str()).map_err(|e| format!("home frame: {e}"))?;
        storage.save(KEY_HOME_FRAME, raw);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};
    use pretty_assertions::assert_eq;

    #[test]
    fn roundtrip_preserves_entities() {
        let frame = Frame::new(
            EntityId::intern("f1"),
            "Login",
            Point::new(100.0, 100.0),
            Size::new(400.0, 300.0),
        );
        let mut component = Component::new(
            EntityId::intern("c1"),
            "button",
            Point::new(150.0, 150.0),
            Size::new(120.0, 40.0),
        );
        component.frame_id = Some(frame.id);
        let store = EntityStore::from_parts(vec![component], vec![frame], Some(EntityId::intern("f1")));

        let mut storage = MemoryStorage::new();
        save_store(&mut storage, &store).unwrap();
        let loaded = load_store(&storage);

        assert_eq!(loaded, store);
    }

    #[test]
    fn corrupt_data_falls_back_to_empty() {
        let mut storage = MemoryStorage::new();
        storage.save(KEY_COMPONENTS, "{not json".to_string());
        storage.save(KEY_FRAMES, "[1, 2, 3]".to_string());

        let store = load_store(&storage);
        assert!(store.components().is_empty());
        assert!(store.frames().is_empty());
        assert_eq!(store.home_frame(), None);
    }

    #[test]
    fn stale_home_frame_is_dropped() {
        let mut storage = MemoryStorage::new();
        storage.save(KEY_FRAMES, "[]".to_string());
        storage.save(KEY_HOME_FRAME, "\"gone\"".to_string());

        let store = load_store(&storage);
        assert_eq!(store.home_frame(), None);
    }

    #[test]
    fn absent_keys_yield_empty_store() {
        let storage = MemoryStorage::new();
        let store = load_store(&storage);
        assert!(store.components().is_empty());
        assert!(store.frames().is_empty());
    }
}
