pub mod commands;
pub mod controller;
pub mod drop;
pub mod gesture;
pub mod input;
pub mod shortcuts;
pub mod sync;

pub use commands::CommandStack;
pub use controller::{CanvasController, EditorEvent};
pub use drop::{DropOutcome, resolve_drop};
pub use gesture::{DragSubject, Gesture, GestureContext, GestureEffect, GestureState};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use shortcuts::{EditorAction, ShortcutMap};
pub use sync::{
    ChangeKind, ChangeRecord, CodeGenerator, EditSession, RegenOutcome, RegenRequest, SyncEngine,
};
