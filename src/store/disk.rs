use crate::core::quota::{QuotaState, QuotaStore, StorageError};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "quota";

fn backend(e: fjall::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// Quota state in an embedded fjall keyspace, one entry per quota key.
pub struct KvQuotaStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    key: String,
    location: String,
}

impl KvQuotaStore {
    pub fn open(path: &Path, key: &str) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path).map_err(|source| StorageError::Io {
            location: path.display().to_string(),
            source,
        })?;

        let keyspace = Config::new(path).open().map_err(backend)?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .map_err(backend)?;
        Ok(Self {
            keyspace,
            partition,
            key: key.to_string(),
            location: format!("{}#{}", path.display(), key),
        })
    }
}

impl QuotaStore for KvQuotaStore {
    fn read(&self) -> Result<Option<QuotaState>, StorageError> {
        match self.partition.get(self.key.as_bytes()).map_err(backend)? {
            Some(value) => {
                let state: QuotaState = serde_json::from_slice(&value)?;
                debug!("KV quota HIT for key {}: {:?}", self.key, state);
                Ok(Some(state))
            }
            None => {
                debug!("KV quota MISS for key {}", self.key);
                Ok(None)
            }
        }
    }

    fn write(&self, state: &QuotaState) -> Result<(), StorageError> {
        self.partition
            .insert(self.key.as_bytes(), serde_json::to_vec(state)?)
            .map_err(backend)?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(backend)?;
        debug!("KV quota PUT for key {}: {:?}", self.key, state);
        Ok(())
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}
