use std::fmt;
use std::sync::Mutex;
use tracing::debug;

use crate::models::errors::ConfigError;

/// One write endpoint plus a non-empty list of read endpoints.
#[derive(Debug, Clone)]
pub struct ReplicaSet<E> {
    write: E,
    reads: Vec<E>,
}

impl<E> ReplicaSet<E> {
    pub fn new(write: E, reads: Vec<E>) -> Result<Self, ConfigError> {
        if reads.is_empty() {
            return Err(ConfigError::EmptyReplicaSet);
        }
        Ok(Self { write, reads })
    }

    /// First endpoint is the primary, the rest serve reads. A lone endpoint
    /// serves both roles.
    pub fn from_endpoints(mut endpoints: Vec<E>) -> Result<Self, ConfigError>
    where
        E: Clone,
    {
        if endpoints.is_empty() {
            return Err(ConfigError::EmptyReplicaSet);
        }
        let write = endpoints.remove(0);
        let reads = if endpoints.is_empty() {
            vec![write.clone()]
        } else {
            endpoints
        };
        Self::new(write, reads)
    }

    pub fn write_endpoint(&self) -> &E {
        &self.write
    }

    pub fn read_endpoints(&self) -> &[E] {
        &self.reads
    }
}

/// Spreads reads uniformly over the read endpoints; writes always go to the primary.
///
/// Each router owns its generator. Use `fork` to give every worker its own
/// router instead of sharing one lock.
pub struct ReplicaRouter<E> {
    replicas: ReplicaSet<E>,
    rng: Mutex<fastrand::Rng>,
}

impl<E: fmt::Debug> fmt::Debug for ReplicaRouter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaRouter")
            .field("replicas", &self.replicas)
            .finish_non_exhaustive()
    }
}

impl<E> ReplicaRouter<E> {
    pub fn new(replicas: ReplicaSet<E>) -> Self {
        Self::with_rng(replicas, fastrand::Rng::new())
    }

    pub fn with_seed(replicas: ReplicaSet<E>, seed: u64) -> Self {
        Self::with_rng(replicas, fastrand::Rng::with_seed(seed))
    }

    pub fn with_rng(replicas: ReplicaSet<E>, rng: fastrand::Rng) -> Self {
        Self {
            replicas,
            rng: Mutex::new(rng),
        }
    }

    pub fn choose_read_endpoint(&self) -> &E {
        let reads = self.replicas.read_endpoints();
        let index = {
            // A poisoned generator is still a valid generator
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.usize(..reads.len())
        };
        debug!("Routing read to replica {} of {}", index, reads.len());
        &reads[index]
    }

    pub fn choose_write_endpoint(&self) -> &E {
        self.replicas.write_endpoint()
    }

    pub fn replicas(&self) -> &ReplicaSet<E> {
        &self.replicas
    }

    /// Router over the same endpoints with an independent generator derived
    /// from this one.
    pub fn fork(&self) -> Self
    where
        E: Clone,
    {
        let rng = self.rng.lock().unwrap_or_else(|e| e.into_inner()).fork();
        Self::with_rng(self.replicas.clone(), rng)
    }
}
