use crate::core::quota::{QuotaState, QuotaStore, StorageError};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory quota store. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemoryQuotaStore {
    inner: Arc<Mutex<Option<QuotaState>>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuotaStore for MemoryQuotaStore {
    fn read(&self) -> Result<Option<QuotaState>, StorageError> {
        let slot = self
            .inner
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        debug!("Memory quota READ: {:?}", *slot);
        Ok(slot.clone())
    }

    fn write(&self, state: &QuotaState) -> Result<(), StorageError> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        debug!("Memory quota WRITE: {:?}", state);
        *slot = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
