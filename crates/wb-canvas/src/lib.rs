pub mod hit;
pub mod viewport;

pub use hit::{
    DropTarget, HitTarget, RESIZE_HANDLE_SIZE, ResizeDirection, component_at, drop_target,
    frame_at, hit_test, resize_handle_at,
};
pub use viewport::{MAX_ZOOM, MIN_ZOOM, Viewport, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT, ZOOM_STEP};
