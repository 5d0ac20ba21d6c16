pub mod id;
pub mod model;
pub mod persist;
pub mod registry;
pub mod selection;

pub use id::EntityId;
pub use model::{
    CANVAS_SIZE, Component, ComponentProperties, EntityStore, Frame, MIN_COMPONENT_HEIGHT,
    MIN_COMPONENT_WIDTH, MIN_FRAME_EDGE, StoreMutation, clamp_to_canvas,
};
pub use persist::{MemoryStorage, StoragePort, load_store, save_store};
pub use registry::{BuiltinRegistry, ComponentTypeDef, TypeRegistry};
pub use selection::Selection;

// Re-export the geometry vocabulary so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size, Vec2};
