//! In-process vector store for dry runs and tests.

use super::{VectorRecord, VectorStore};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::sync::Mutex;

/// Keeps upserted records in memory, keyed by id in first-insert order.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    dimension: usize,
    records: Mutex<IndexMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    /// Create an empty store for vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: Mutex::new(IndexMap::new()),
        }
    }

    /// Snapshot of every stored record.
    pub fn records(&self) -> Vec<VectorRecord> {
        self.lock().values().cloned().collect()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<VectorRecord> {
        self.lock().get(id).cloned()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, VectorRecord>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VectorStore for InMemoryVectorStore {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn upsert(&self, record: &VectorRecord) -> Result<()> {
        if record.values.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                found: record.values.len(),
            });
        }
        self.lock().insert(record.id.clone(), record.clone());
        Ok(())
    }
}
