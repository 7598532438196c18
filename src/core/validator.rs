use crate::core::coerce::{RowView, ValidationRules};
use crate::core::grid::TabularSource;
use crate::core::schema::{schema_for, TableSchema};
use crate::domain::model::{TableKind, ValidatedRecord};
use crate::utils::error::{IngestError, Result};

/// 依資料表驗證並正規化每一列；結構錯誤整批失敗，資料錯誤只丟棄該列
#[derive(Debug, Clone, Copy)]
pub struct RowValidator {
    schema: &'static TableSchema,
    rules: ValidationRules,
}

impl RowValidator {
    pub fn new(kind: TableKind, rules: ValidationRules) -> Self {
        Self {
            schema: schema_for(kind),
            rules,
        }
    }

    pub fn kind(&self) -> TableKind {
        self.schema.kind
    }

    pub fn validate<T>(&self, source: &T) -> Result<Vec<ValidatedRecord>>
    where
        T: TabularSource + ?Sized,
    {
        let schema = self.schema;
        let available = source.column_names();

        let missing = schema.missing_columns(&available);
        if !missing.is_empty() {
            tracing::error!(
                "Missing required columns for {}: {:?} (found {:?})",
                schema.kind,
                missing,
                available
            );
            return Err(IngestError::SchemaError {
                table: schema.kind.to_string(),
                missing,
            });
        }

        let ignored: Vec<&String> = available
            .iter()
            .filter(|c| !schema.is_recognized(c))
            .collect();
        if !ignored.is_empty() {
            tracing::debug!("Ignoring columns not used by {}: {:?}", schema.kind, ignored);
        }

        // 必要欄位對應到來源欄位（可能是別名）
        let mapping: Vec<(&'static str, &str)> = schema
            .required
            .iter()
            .filter_map(|canonical| {
                schema
                    .resolve_column(&available, canonical)
                    .map(|source_column| (*canonical, source_column))
            })
            .collect();

        let total = source.row_count();
        let mut records = Vec::with_capacity(total);
        for row in 0..total {
            let view = RowView::new(
                mapping
                    .iter()
                    .map(|(canonical, column)| (*canonical, source.cell(row, column)))
                    .collect(),
            );

            match (schema.normalizer)(&view, &self.rules) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    tracing::warn!("Dropping {} row {}: {}", schema.kind, row + 1, reason);
                }
            }
        }

        tracing::info!(
            "Validated {} of {} {} rows ({} dropped)",
            records.len(),
            total,
            schema.kind,
            total - records.len()
        );
        Ok(records)
    }
}
