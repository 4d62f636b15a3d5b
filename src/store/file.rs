use crate::core::quota::{QuotaState, QuotaStore, StorageError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Quota state kept as a small JSON document, e.g. `{"remaining":49,"period":"2026-10"}`.
pub struct FileQuotaStore {
    path: PathBuf,
}

impl FileQuotaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            location: self.path.display().to_string(),
            source,
        }
    }
}

impl QuotaStore for FileQuotaStore {
    fn read(&self) -> Result<Option<QuotaState>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let state: QuotaState = serde_json::from_str(&raw)?;
        debug!("Read quota state {:?} from {}", state, self.path.display());
        Ok(Some(state))
    }

    fn write(&self, state: &QuotaState) -> Result<(), StorageError> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        // Replace the record in one rename so a crash never leaves it half written
        let data = serde_json::to_vec(state)?;
        let mut staged = NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        staged
            .write_all(&data)
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|e| self.io_error(e))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        debug!("Wrote quota state {:?} to {}", state, self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileQuotaStore::new(dir.path().join("pull_counter.json"));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let store = FileQuotaStore::new(dir.path().join("nested").join("pull_counter.json"));

        let state = QuotaState::full(42, "2026-10");
        store.write(&state).unwrap();
        assert_eq!(store.read().unwrap(), Some(state));

        // Overwrites, never appends
        let state = QuotaState::full(41, "2026-10");
        store.write(&state).unwrap();
        assert_eq!(store.read().unwrap(), Some(state));
    }

    #[test]
    fn test_reads_legacy_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pull_counter.json");
        fs::write(&path, r#"{"remaining": 37}"#).unwrap();

        let state = FileQuotaStore::new(&path).read().unwrap().unwrap();
        assert_eq!(state.remaining, 37);
        assert!(state.period.is_empty());
    }

    #[test]
    fn test_garbage_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pull_counter.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileQuotaStore::new(&path).read(),
            Err(StorageError::Codec(_))
        ));
    }

    #[test]
    fn test_write_into_directory_fails() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("pull_counter.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        // A non-empty directory cannot be replaced by a file
        let store = FileQuotaStore::new(&target);
        assert!(matches!(
            store.write(&QuotaState::full(1, "2026-10")),
            Err(StorageError::Io { .. })
        ));
        assert_eq!(fs::read_to_string(target.join("keep")).unwrap(), "x");

        // The staged file is cleaned up
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_write_keeps_previous_record() {
        let dir = tempdir().unwrap();
        let store = FileQuotaStore::new(dir.path().join("pull_counter.json"));
        let previous = QuotaState::full(3, "2026-10");
        store.write(&previous).unwrap();

        // The record is in place; now the replacement cannot be renamed over it
        let blocked = FileQuotaStore::new(dir.path());
        assert!(blocked.write(&QuotaState::full(50, "2026-10")).is_err());

        assert_eq!(store.read().unwrap(), Some(previous));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_keeps_previous_record() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileQuotaStore::new(dir.path().join("pull_counter.json"));
        let previous = QuotaState::full(3, "2026-10");
        store.write(&previous).unwrap();

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
        let result = store.write(&QuotaState::full(50, "2026-10"));
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users bypass the mode bits, in which case the write succeeds
        if result.is_err() {
            assert_eq!(store.read().unwrap(), Some(previous));
        }
    }
}
