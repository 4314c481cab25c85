// src/system/batch.rs

//! The queue of shell commands waiting to run.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// An ordered list of shell commands waiting to be run as one chained invocation.
///
/// The list sits behind a mutex so a batch can be shared between the part of the
/// program that queues commands and the part that runs them. [`stash`](Self::stash)
/// takes the whole list in one locked step, which is what makes a stashed run
/// immune to commands appended while it executes.
#[derive(Debug, Default)]
pub struct CommandBatch {
    commands: Mutex<Vec<String>>,
}

impl CommandBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A panic while holding the lock cannot leave a Vec half-updated.
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a command at the end of the batch.
    pub fn append(&self, command: impl Into<String>) {
        self.lock().push(command.into());
    }

    /// Adds commands at the end of the batch, keeping their order.
    pub fn append_all<I, S>(&self, commands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().extend(commands.into_iter().map(Into::into));
    }

    /// Adds a command before everything already queued.
    pub fn prepend(&self, command: impl Into<String>) {
        self.lock().insert(0, command.into());
    }

    /// Inserts commands before everything already queued, as a unit.
    ///
    /// Prepending `[a, b]` and then `[c, d]` yields `[c, d, a, b]`.
    pub fn prepend_all<I, S>(&self, commands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut combined: Vec<String> = commands.into_iter().map(Into::into).collect();
        let mut guard = self.lock();
        combined.append(&mut guard);
        *guard = combined;
    }

    /// Discards every pending command.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Takes every pending command, leaving the batch empty.
    pub fn stash(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// A copy of the pending commands.
    pub fn pending(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no command is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let batch = CommandBatch::new();
        batch.append("a");
        batch.append_all(["b", "c"]);
        batch.append("d");
        assert_eq!(batch.pending(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_prepend_all_splices_as_a_unit() {
        let batch = CommandBatch::new();
        batch.prepend_all(["a", "b"]);
        batch.prepend_all(["c", "d"]);
        assert_eq!(batch.pending(), vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_prepend_goes_before_queued_commands() {
        let batch = CommandBatch::new();
        batch.append_all(["install", "migrate"]);
        batch.prepend("create");
        batch.prepend_all(vec!["check".to_string(), "fetch".to_string()]);
        assert_eq!(
            batch.pending(),
            vec!["check", "fetch", "create", "install", "migrate"]
        );
    }

    #[test]
    fn test_stash_empties_the_batch() {
        let batch = CommandBatch::new();
        batch.append_all(["one", "two"]);

        let stashed = batch.stash();
        assert_eq!(stashed, vec!["one", "two"]);
        assert!(batch.is_empty());

        batch.append("three");
        assert_eq!(stashed.len(), 2);
        assert_eq!(batch.pending(), vec!["three"]);
    }

    #[test]
    fn test_clear() {
        let batch = CommandBatch::new();
        batch.append_all(["one", "two"]);
        assert_eq!(batch.len(), 2);
        batch.clear();
        assert!(batch.is_empty());
    }
}
