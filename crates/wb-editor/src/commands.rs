//! Undo/redo command stack.
//!
//! Every undo step is a snapshot pair of the entity store. The store is
//! copy-on-write, so a snapshot is two `Arc` bumps — cheap enough to capture
//! on every mutation. Gestures use **snapshot batching**: the store is
//! captured at the start and end of the gesture, so undo reverses an entire
//! drag in a single step rather than one step per pointer-move.

use wb_core::{EntityStore, StoreMutation};

#[derive(Debug, Clone)]
struct Snapshot {
    before: EntityStore,
    after: EntityStore,
    description: String,
}

/// Manages undo/redo stacks with batch grouping for gestures.
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Store snapshot captured at the start of a batch.
    batch_snapshot: Option<EntityStore>,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
        }
    }

    /// Start a batch group, capturing the current store. All mutations
    /// until `end_batch` apply live but undo as one atomic step.
    pub fn begin_batch(&mut self, store: &EntityStore) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(store.clone());
        }
        self.batch_depth += 1;
    }

    /// Close a batch group. When the outermost batch closes and the store
    /// actually changed, one snapshot command lands on the undo stack.
    pub fn end_batch(&mut self, store: &EntityStore, description: &str) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            if let Some(before) = self.batch_snapshot.take()
                && before != *store
            {
                self.push(Snapshot {
                    before,
                    after: store.clone(),
                    description: description.to_string(),
                });
            }
        }
    }

    /// Apply a mutation through the stack. Outside a batch this records an
    /// individual undo step; inside one, the surrounding batch captures it.
    pub fn execute(&mut self, store: &mut EntityStore, mutation: StoreMutation, description: &str) {
        if self.batch_depth > 0 {
            store.apply(mutation);
            return;
        }
        let before = store.clone();
        store.apply(mutation);
        if before != *store {
            self.push(Snapshot {
                before,
                after: store.clone(),
                description: description.to_string(),
            });
        }
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // New action invalidates the redo history
        self.redo_stack.clear();
    }

    /// Undo the last step. Returns its description.
    pub fn undo(&mut self, store: &mut EntityStore) -> Option<String> {
        let snapshot = self.undo_stack.pop()?;
        *store = snapshot.before.clone();
        let description = snapshot.description.clone();
        self.redo_stack.push(snapshot);
        Some(description)
    }

    /// Redo the last undone step. Returns its description.
    pub fn redo(&mut self, store: &mut EntityStore) -> Option<String> {
        let snapshot = self.redo_stack.pop()?;
        *store = snapshot.after.clone();
        let description = snapshot.description.clone();
        self.undo_stack.push(snapshot);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
