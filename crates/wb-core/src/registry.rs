//! Component-type registry port.
//!
//! The host supplies the real registry (it knows how to render each type);
//! the core only needs default geometry and the initial config for a type
//! string when a palette drop instantiates it.

use kurbo::Size;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Definition of a placeable component type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTypeDef {
    pub type_name: String,
    pub default_size: Size,
    /// Initial `config` entries for a fresh instance.
    pub default_config: BTreeMap<String, Value>,
}

impl ComponentTypeDef {
    pub fn new(type_name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            type_name: type_name.into(),
            default_size: Size::new(width, height),
            default_config: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, key: &str, value: Value) -> Self {
        self.default_config.insert(key.to_string(), value);
        self
    }
}

/// Lookup port for component types. Unknown type names return `None`; the
/// caller logs and aborts creation rather than producing a malformed entity.
pub trait TypeRegistry {
    fn lookup(&self, type_name: &str) -> Option<&ComponentTypeDef>;
}

/// Registry backed by a plain map, pre-seeded with the built-in palette.
#[derive(Debug, Clone, Default)]
pub struct BuiltinRegistry {
    defs: HashMap<String, ComponentTypeDef>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        for def in [
            ComponentTypeDef::new("button", 120.0, 40.0).with_config("label", json!("Button")),
            ComponentTypeDef::new("text", 200.0, 24.0).with_config("content", json!("Text")),
            ComponentTypeDef::new("input", 200.0, 40.0)
                .with_config("placeholder", json!("Enter text")),
            ComponentTypeDef::new("textarea", 240.0, 96.0)
                .with_config("placeholder", json!("Enter text")),
            ComponentTypeDef::new("image", 200.0, 150.0),
            ComponentTypeDef::new("checkbox", 24.0, 24.0).with_config("checked", json!(false)),
            ComponentTypeDef::new("card", 300.0, 200.0),
            ComponentTypeDef::new("ai-component", 320.0, 240.0),
        ] {
            registry.register(def);
        }
        registry
    }

    pub fn register(&mut self, def: ComponentTypeDef) {
        self.defs.insert(def.type_name.clone(), def);
    }
}

impl TypeRegistry for BuiltinRegistry {
    fn lookup(&self, type_name: &str) -> Option<&ComponentTypeDef> {
        self.defs.get(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_types_resolve() {
        let registry = BuiltinRegistry::new();
        let button = registry.lookup("button").unwrap();
        assert_eq!(button.default_size, Size::new(120.0, 40.0));
        assert_eq!(button.default_config["label"], json!("Button"));
        assert!(registry.lookup("holo-deck").is_none());
    }

    #[test]
    fn custom_registration_overrides() {
        let mut registry = BuiltinRegistry::new();
        registry.register(ComponentTypeDef::new("button", 80.0, 28.0));
        assert_eq!(
            registry.lookup("button").unwrap().default_size,
            Size::new(80.0, 28.0)
        );
    }
}
