use crate::domain::model::{NaturalKey, StoredRecord, TableKind, ValidatedRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// 關聯式儲存層：匯入流程只呼叫這個介面
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts every record or none of them; returns the number persisted.
    async fn bulk_insert(&self, kind: TableKind, records: &[ValidatedRecord]) -> Result<usize>;

    async fn lookup_by_natural_key(&self, key: &NaturalKey) -> Result<Option<StoredRecord>>;

    async fn get_by_id(&self, kind: TableKind, id: i64) -> Result<Option<StoredRecord>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn bulk_insert(&self, kind: TableKind, records: &[ValidatedRecord]) -> Result<usize> {
        (**self).bulk_insert(kind, records).await
    }

    async fn lookup_by_natural_key(&self, key: &NaturalKey) -> Result<Option<StoredRecord>> {
        (**self).lookup_by_natural_key(key).await
    }

    async fn get_by_id(&self, kind: TableKind, id: i64) -> Result<Option<StoredRecord>> {
        (**self).get_by_id(kind, id).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn max_batch_size(&self) -> usize;
    fn max_name_length(&self) -> usize;
    fn storage_path(&self) -> Option<&str>;
}
