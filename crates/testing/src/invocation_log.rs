//! Ordered record of provider operations, shared by all in-memory fakes.

use std::sync::{Arc, Mutex};

/// Thread-safe, append-only operation log.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: impl Into<String>) {
        self.entries.lock().unwrap().push(operation.into());
    }

    /// All recorded operations in invocation order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// How many times the operation was invoked.
    pub fn count_of(&self, operation: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == operation)
            .count()
    }

    /// Index of the first invocation of the operation, if any.
    pub fn position_of(&self, operation: &str) -> Option<usize> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .position(|e| e.as_str() == operation)
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.position_of(operation).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
