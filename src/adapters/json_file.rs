use crate::adapters::memory::{InMemoryStore, TableData, Tables};
use crate::domain::model::{NaturalKey, StoredRecord, TableKind, ValidatedRecord};
use crate::domain::ports::RecordStore;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 以 JSON 檔保存三張資料表，每次成功寫入後落盤
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_path: PathBuf,
    inner: InMemoryStore,
}

impl JsonFileStore {
    /// Opens the store under `base_path`, loading any tables saved by a previous run.
    pub async fn open<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&base_path).await?;

        let mut tables = Tables::default();
        for kind in TableKind::ALL {
            *tables.table_mut(kind) = Self::load_table(&base_path, kind).await?;
        }
        tracing::debug!("Opened JSON store at {}", base_path.display());

        Ok(Self {
            base_path,
            inner: InMemoryStore::from_tables(tables),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        table_file(&self.base_path, kind)
    }

    pub async fn rows(&self, kind: TableKind) -> Vec<StoredRecord> {
        self.inner.rows(kind).await
    }

    async fn load_table(base_path: &Path, kind: TableKind) -> Result<TableData> {
        let path = table_file(base_path, kind);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TableData::default()),
            Err(e) => Err(IngestError::IoError(e)),
        }
    }

    async fn save_table(&self, kind: TableKind, data: &TableData) -> Result<()> {
        let path = self.table_path(kind);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(data)?;

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

fn table_file(base_path: &Path, kind: TableKind) -> PathBuf {
    base_path.join(format!("{}.json", kind.table_name()))
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn bulk_insert(&self, kind: TableKind, records: &[ValidatedRecord]) -> Result<usize> {
        // 持有寫鎖直到檔案寫完，寫檔失敗時還原記憶體內容
        let mut tables = self.inner.tables().write().await;
        let before = tables.table(kind).clone();

        let inserted = tables.insert_all(kind, records)?;
        if let Err(e) = self.save_table(kind, tables.table(kind)).await {
            *tables.table_mut(kind) = before;
            tracing::error!("Failed to persist {}: {}", kind.table_name(), e);
            return Err(IngestError::StorageError {
                message: format!("failed to persist {}: {}", kind.table_name(), e),
            });
        }

        tracing::debug!(
            "Persisted {} rows to {}",
            inserted,
            self.table_path(kind).display()
        );
        Ok(inserted)
    }

    async fn lookup_by_natural_key(&self, key: &NaturalKey) -> Result<Option<StoredRecord>> {
        self.inner.lookup_by_natural_key(key).await
    }

    async fn get_by_id(&self, kind: TableKind, id: i64) -> Result<Option<StoredRecord>> {
        self.inner.get_by_id(kind, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DepartmentRecord;
    use tempfile::TempDir;

    fn department(name: &str) -> ValidatedRecord {
        ValidatedRecord::Department(DepartmentRecord {
            name: name.to_string(),
        })
    }

    #[tokio::test]
    async fn test_tables_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let store = JsonFileStore::open(temp_dir.path()).await.unwrap();
        store
            .bulk_insert(TableKind::Department, &[department("Engineering")])
            .await
            .unwrap();
        assert!(store.table_path(TableKind::Department).exists());

        let reopened = JsonFileStore::open(temp_dir.path()).await.unwrap();
        store_has(&reopened, "Engineering").await;

        // ids continue from the saved sequence
        reopened
            .bulk_insert(TableKind::Department, &[department("Sales")])
            .await
            .unwrap();
        let rows = reopened.rows(TableKind::Department).await;
        assert_eq!(rows.last().unwrap().id, 2);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp_dir.path()).await.unwrap();
        store
            .bulk_insert(TableKind::Department, &[department("Engineering")])
            .await
            .unwrap();
        let before = std::fs::read(store.table_path(TableKind::Department)).unwrap();

        let result = store
            .bulk_insert(TableKind::Department, &[department("Engineering")])
            .await;
        assert!(matches!(result, Err(IngestError::IntegrityError { .. })));

        let after = std::fs::read(store.table_path(TableKind::Department)).unwrap();
        assert_eq!(before, after);
    }

    async fn store_has(store: &JsonFileStore, name: &str) {
        let key = NaturalKey::Department {
            name: name.to_string(),
        };
        assert!(store.lookup_by_natural_key(&key).await.unwrap().is_some());
    }
}
