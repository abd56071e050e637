use crate::errors::{BudgetApiError, Result};
use budget_core::AduData;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Dashboard dataset persisted as a JSON file.
pub struct FallbackStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FallbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FallbackStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved dataset, or the built-in one when the file is missing or unreadable.
    pub async fn load(&self) -> AduData {
        let data = match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<AduData>(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Ignoring corrupt data file {}: {}", self.path.display(), e);
                    AduData::fallback()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => AduData::fallback(),
            Err(e) => {
                warn!("Failed to read data file {}: {}", self.path.display(), e);
                AduData::fallback()
            }
        };

        data.touch()
    }

    /// Recompute phase totals and overwrite the file.
    pub async fn save(&self, mut data: AduData) -> Result<AduData> {
        data.recompute_totals();
        let data = data.touch();
        let body = serde_json::to_vec_pretty(&data)?;

        let _guard = self.write_lock.lock().await;
        tokio::fs::write(&self.path, body).await.map_err(|e| {
            BudgetApiError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        info!(
            "Saved dashboard data to {} ({} phases)",
            self.path.display(),
            data.expenses.len()
        );

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_serves_builtin_dataset() {
        let dir = tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("data.json"));

        let data = store.load().await;
        assert_eq!(data.expenses.len(), 7);
        assert_eq!(data.total_budget(), dec!(225600));
    }

    #[tokio::test]
    async fn test_corrupt_file_serves_builtin_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let data = FallbackStore::new(path).load().await;
        assert_eq!(data.expenses.len(), 7);
    }

    #[tokio::test]
    async fn test_save_recomputes_totals_and_round_trips() {
        let dir = tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("data.json"));

        let mut data = AduData::fallback();
        data.expenses.truncate(1);
        data.expenses[0].items[0].cost = dec!(9000);
        data.expenses[0].total = dec!(1);

        let saved = store.save(data).await.unwrap();
        assert_eq!(saved.expenses[0].total, dec!(22800));

        let loaded = store.load().await;
        assert_eq!(loaded.expenses.len(), 1);
        assert_eq!(loaded.expenses[0].total, dec!(22800));
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_is_storage_error() {
        let dir = tempdir().unwrap();
        let store = FallbackStore::new(dir.path().join("missing").join("data.json"));

        let err = store.save(AduData::fallback()).await.unwrap_err();
        assert!(matches!(err, BudgetApiError::Storage(_)));
    }
}
