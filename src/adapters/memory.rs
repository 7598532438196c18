use crate::domain::model::{NaturalKey, StoredRecord, TableKind, ValidatedRecord};
use crate::domain::ports::RecordStore;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows of one physical table plus its id sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableData {
    pub next_id: i64,
    pub rows: Vec<StoredRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub departments: TableData,
    pub jobs: TableData,
    pub employees: TableData,
}

impl Tables {
    pub fn table(&self, kind: TableKind) -> &TableData {
        match kind {
            TableKind::Department => &self.departments,
            TableKind::Job => &self.jobs,
            TableKind::Employee => &self.employees,
        }
    }

    pub fn table_mut(&mut self, kind: TableKind) -> &mut TableData {
        match kind {
            TableKind::Department => &mut self.departments,
            TableKind::Job => &mut self.jobs,
            TableKind::Employee => &mut self.employees,
        }
    }

    /// 先完整檢查再寫入，任何一筆失敗則整批不寫
    pub fn insert_all(&mut self, kind: TableKind, records: &[ValidatedRecord]) -> Result<usize> {
        if let Some(other) = records.iter().find(|r| r.kind() != kind) {
            return Err(IngestError::StorageError {
                message: format!("{} record passed to {} table", other.kind(), kind.table_name()),
            });
        }

        if kind == TableKind::Department {
            let mut names: HashSet<&str> = self
                .departments
                .rows
                .iter()
                .map(|row| row.record.name())
                .collect();
            for record in records {
                if !names.insert(record.name()) {
                    return Err(IngestError::IntegrityError {
                        message: format!(
                            "duplicate key value violates unique constraint on departments.name: '{}'",
                            record.name()
                        ),
                    });
                }
            }
        }

        let now = Utc::now();
        let table = self.table_mut(kind);
        for record in records {
            table.next_id += 1;
            table.rows.push(StoredRecord {
                id: table.next_id,
                record: record.clone(),
                created_at: now,
                updated_at: now,
            });
        }
        Ok(records.len())
    }

    pub fn find_by_natural_key(&self, key: &NaturalKey) -> Option<&StoredRecord> {
        self.table(key.kind())
            .rows
            .iter()
            .find(|row| row.record.natural_key() == *key)
    }

    pub fn find_by_id(&self, kind: TableKind, id: i64) -> Option<&StoredRecord> {
        self.table(kind).rows.iter().find(|row| row.id == id)
    }
}

/// 記憶體內的儲存層，用於測試與單次執行
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    pub async fn rows(&self, kind: TableKind) -> Vec<StoredRecord> {
        self.tables.read().await.table(kind).rows.clone()
    }

    pub async fn snapshot(&self) -> Tables {
        self.tables.read().await.clone()
    }

    pub(crate) fn tables(&self) -> &Arc<RwLock<Tables>> {
        &self.tables
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn bulk_insert(&self, kind: TableKind, records: &[ValidatedRecord]) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let inserted = tables.insert_all(kind, records)?;
        tracing::debug!("Stored {} rows in {}", inserted, kind.table_name());
        Ok(inserted)
    }

    async fn lookup_by_natural_key(&self, key: &NaturalKey) -> Result<Option<StoredRecord>> {
        Ok(self.tables.read().await.find_by_natural_key(key).cloned())
    }

    async fn get_by_id(&self, kind: TableKind, id: i64) -> Result<Option<StoredRecord>> {
        Ok(self.tables.read().await.find_by_id(kind, id).cloned())
    }
}
