pub mod memory;
pub mod replica;

use std::sync::Arc;
use tracing::debug;

use crate::models::datasets::blocks::ChainBlock;
use crate::models::datasets::logs::ChainLog;
use crate::models::errors::StorageError;
use crate::storage::replica::ReplicaRouter;

/// A canonical row with a stable identity inside its table.
pub trait Record: Clone {
    const TABLE: &'static str;
    type Key: Ord + Clone;

    fn key(&self) -> Self::Key;
}

impl Record for ChainBlock {
    const TABLE: &'static str = "blocks";
    type Key = u64;

    fn key(&self) -> u64 {
        self.number
    }
}

impl Record for ChainLog {
    const TABLE: &'static str = "logs";
    // (transaction hash, block number, log index)
    type Key = (String, u64, u64);

    fn key(&self) -> Self::Key {
        (
            self.transaction_hash.clone(),
            self.block_number,
            self.log_index,
        )
    }
}

/// One database endpoint as seen by the pipeline. Connection errors are
/// returned unchanged; there is no retry at this layer.
pub trait RecordStore<R: Record> {
    fn name(&self) -> &str;

    fn insert(&self, records: &[R]) -> Result<(), StorageError>;

    fn list(
        &self,
        filter: &dyn Fn(&R) -> bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<R>, StorageError>;
}

impl<R: Record, S: RecordStore<R> + ?Sized> RecordStore<R> for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn insert(&self, records: &[R]) -> Result<(), StorageError> {
        (**self).insert(records)
    }

    fn list(
        &self,
        filter: &dyn Fn(&R) -> bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<R>, StorageError> {
        (**self).list(filter, offset, limit)
    }
}

/// Table access over a replica set: writes go to the primary, reads to a
/// randomly chosen replica.
#[derive(Debug)]
pub struct Dao<S> {
    router: ReplicaRouter<S>,
}

impl<S> Dao<S> {
    pub fn new(router: ReplicaRouter<S>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &ReplicaRouter<S> {
        &self.router
    }

    pub fn create<R: Record>(&self, records: &[R]) -> Result<(), StorageError>
    where
        S: RecordStore<R>,
    {
        let endpoint = self.router.choose_write_endpoint();
        debug!(
            "Writing {} rows to {} on {}",
            records.len(),
            R::TABLE,
            endpoint.name()
        );
        endpoint.insert(records)
    }

    pub fn get<R: Record>(&self, filter: &dyn Fn(&R) -> bool) -> Result<R, StorageError>
    where
        S: RecordStore<R>,
    {
        self.list(filter, 0, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound {
                table: R::TABLE.to_string(),
            })
    }

    pub fn list<R: Record>(
        &self,
        filter: &dyn Fn(&R) -> bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<R>, StorageError>
    where
        S: RecordStore<R>,
    {
        self.router
            .choose_read_endpoint()
            .list(filter, offset, limit)
    }
}
