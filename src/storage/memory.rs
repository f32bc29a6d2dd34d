use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::debug;

use crate::models::errors::StorageError;
use crate::storage::{Record, RecordStore};

/// In-process endpoint holding one table, ordered by record identity.
pub struct MemoryStore<R: Record> {
    name: String,
    rows: RwLock<BTreeMap<R::Key, R>>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(&self) -> StorageError {
        StorageError::Endpoint {
            endpoint: self.name.clone(),
            reason: "lock poisoned".to_string(),
        }
    }
}

impl<R: Record> RecordStore<R> for MemoryStore<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert(&self, records: &[R]) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| self.poisoned())?;
        for record in records {
            rows.insert(record.key(), record.clone());
        }
        debug!(
            "Inserted {} rows into {}.{}",
            records.len(),
            self.name,
            R::TABLE
        );
        Ok(())
    }

    fn list(
        &self,
        filter: &dyn Fn(&R) -> bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<R>, StorageError> {
        let rows = self.rows.read().map_err(|_| self.poisoned())?;
        Ok(rows
            .values()
            .filter(|record| filter(record))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
