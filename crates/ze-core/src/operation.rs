//! Undo/redo operation queue
//!
//! Tools apply their edits directly and then hand a reversible record to
//! the [`OperationQueue`]. Records are grouped into batches so that one
//! user action (a multi-object drag, a brush stroke) is a single undo step.

use uuid::Uuid;

/// A reversible edit.
///
/// `W` is the world the operation edits, usually a trait object such as
/// `dyn TransformAccess`. Operations are queued after they have been
/// applied, so the first call they receive is `undo`.
pub trait Operation<W: ?Sized> {
    /// Label shown in history lists
    fn name(&self) -> &str;

    /// Restore the state from before the edit
    fn undo(&self, world: &mut W);

    /// Reapply the edit
    fn redo(&self, world: &mut W);
}

/// Several operations undone and redone as one.
pub struct OperationBatch<W: ?Sized> {
    name: String,
    operations: Vec<Box<dyn Operation<W>>>,
}

impl<W: ?Sized> OperationBatch<W> {
    /// Create an empty batch
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    /// Append an operation
    pub fn push(&mut self, operation: Box<dyn Operation<W>>) {
        self.operations.push(operation);
    }

    /// Number of operations in the batch
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the batch holds no operations
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Rename the batch
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl<W: ?Sized> Operation<W> for OperationBatch<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&self, world: &mut W) {
        for operation in self.operations.iter().rev() {
            operation.undo(world);
        }
    }

    fn redo(&self, world: &mut W) {
        for operation in &self.operations {
            operation.redo(world);
        }
    }
}

struct QueuedOperation<W: ?Sized> {
    id: Uuid,
    operation: Box<dyn Operation<W>>,
}

/// Undo and redo stacks with batching.
pub struct OperationQueue<W: ?Sized> {
    undo_stack: Vec<QueuedOperation<W>>,
    redo_stack: Vec<QueuedOperation<W>>,
    open_batches: Vec<OperationBatch<W>>,
}

impl<W: ?Sized> Default for OperationQueue<W> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open_batches: Vec::new(),
        }
    }
}

impl<W: ?Sized + 'static> OperationQueue<W> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an already applied operation.
    ///
    /// While a batch is open the operation joins the batch and `None` is
    /// returned. Otherwise it becomes a new undo step and its id is returned.
    /// Any queued step discards the redo history.
    pub fn queue(&mut self, operation: Box<dyn Operation<W>>) -> Option<Uuid> {
        if let Some(batch) = self.open_batches.last_mut() {
            batch.push(operation);
            return None;
        }
        Some(self.push_step(operation))
    }

    fn push_step(&mut self, operation: Box<dyn Operation<W>>) -> Uuid {
        let id = Uuid::new_v4();
        tracing::debug!("Queued undo step '{}' ({})", operation.name(), id);
        self.redo_stack.clear();
        self.undo_stack.push(QueuedOperation { id, operation });
        id
    }

    /// Open a batch. Batches nest; only the outermost becomes an undo step.
    pub fn begin_batch(&mut self) {
        self.open_batches.push(OperationBatch::new("Batch"));
    }

    /// Name the innermost open batch
    pub fn set_active_batch_name(&mut self, name: impl Into<String>) {
        if let Some(batch) = self.open_batches.last_mut() {
            batch.set_name(name);
        }
    }

    /// Close the innermost batch. Empty batches are dropped.
    ///
    /// Returns the id of the new undo step when the outermost batch closed
    /// with content.
    pub fn end_batch(&mut self) -> Option<Uuid> {
        let Some(batch) = self.open_batches.pop() else {
            tracing::warn!("end_batch called without an open batch");
            return None;
        };
        if batch.is_empty() {
            return None;
        }
        self.queue(Box::new(batch))
    }

    /// Whether a batch is open
    pub fn is_batching(&self) -> bool {
        !self.open_batches.is_empty()
    }

    /// Undo the most recent step
    pub fn undo(&mut self, world: &mut W) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        tracing::debug!("Undo '{}'", entry.operation.name());
        entry.operation.undo(world);
        self.redo_stack.push(entry);
        true
    }

    /// Redo the most recently undone step
    pub fn redo(&mut self, world: &mut W) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        tracing::debug!("Redo '{}'", entry.operation.name());
        entry.operation.redo(world);
        self.undo_stack.push(entry);
        true
    }

    /// Check if there is anything to undo
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there is anything to redo
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Ids and labels of the undo steps, oldest first
    pub fn undo_names(&self) -> Vec<(Uuid, String)> {
        self.undo_stack
            .iter()
            .map(|e| (e.id, e.operation.name().to_string()))
            .collect()
    }

    /// Drop all history and any open batches
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_batches.clear();
    }
}
