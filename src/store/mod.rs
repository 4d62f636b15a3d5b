//! Backends for the persisted quota counter.

pub mod disk;
pub mod file;
pub mod memory;

use crate::core::config::{AppConfig, StorageKind};
use crate::core::quota::QuotaStore;
use anyhow::{Context, Result};
use disk::KvQuotaStore;
use file::FileQuotaStore;
use memory::MemoryQuotaStore;
use tracing::debug;

/// Opens the store selected by `quota.storage`.
pub fn open_quota_store(config: &AppConfig) -> Result<Box<dyn QuotaStore>> {
    let store: Box<dyn QuotaStore> = match config.quota.storage {
        StorageKind::File => Box::new(FileQuotaStore::new(config.quota_path()?)),
        StorageKind::Kv => {
            let path = config.quota_path()?;
            Box::new(
                KvQuotaStore::open(&path, &config.quota.key)
                    .with_context(|| format!("Failed to open quota keyspace at {}", path.display()))?,
            )
        }
        StorageKind::Memory => Box::new(MemoryQuotaStore::new()),
    };
    debug!("Using quota store {}", store.describe());
    Ok(store)
}
