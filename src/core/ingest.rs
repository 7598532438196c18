use crate::core::batch::BatchPolicy;
use crate::core::coerce::ValidationRules;
use crate::core::parser::TabularParser;
use crate::core::schema;
use crate::core::validator::RowValidator;
use crate::domain::model::{IngestReport, Record, ValidatedBatch};
use crate::domain::ports::{ConfigProvider, RecordStore};
use crate::utils::error::{IngestError, Result};
use crate::utils::monitor::SystemMonitor;

/// Raw input of one ingestion call.
#[derive(Debug, Clone, Copy)]
pub enum IngestInput<'a> {
    /// CSV file bytes; parsed before validation.
    Csv(&'a [u8]),
    /// Records from a direct JSON batch; validated as-is.
    Records(&'a [Record]),
}

impl IngestInput<'_> {
    pub fn source_name(&self) -> &'static str {
        match self {
            IngestInput::Csv(_) => "file",
            IngestInput::Records(_) => "json",
        }
    }
}

/// 解析直接批次的 JSON：物件陣列，或 `{"data": [...]}` 包裝
pub fn parse_json_batch(bytes: &[u8]) -> Result<Vec<Record>> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("data") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(IngestError::FormatError {
                    message: "expected a JSON array or an object with a \"data\" array".to_string(),
                })
            }
        },
        _ => {
            return Err(IngestError::FormatError {
                message: "expected a JSON array of objects".to_string(),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Record::from_json(item).ok_or_else(|| IngestError::FormatError {
                message: format!("batch item {} is not a JSON object", index + 1),
            })
        })
        .collect()
}

pub struct IngestEngine<S: RecordStore> {
    store: S,
    parser: TabularParser,
    policy: BatchPolicy,
    rules: ValidationRules,
    monitor: SystemMonitor,
}

impl<S: RecordStore> IngestEngine<S> {
    pub fn new(store: S) -> Self {
        Self::new_with_monitoring(store, false)
    }

    pub fn new_with_monitoring(store: S, monitor_enabled: bool) -> Self {
        Self {
            store,
            parser: TabularParser::new(),
            policy: BatchPolicy::default(),
            rules: ValidationRules::default(),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 套用設定檔中的批次與欄位限制
    pub fn with_config<C: ConfigProvider>(mut self, config: &C) -> Self {
        self.policy = BatchPolicy::new(config.max_batch_size());
        self.rules = ValidationRules {
            max_name_length: config.max_name_length(),
        };
        self
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parses, guards and validates without touching the store.
    pub fn prepare(&self, table: &str, input: IngestInput<'_>) -> Result<ValidatedBatch> {
        let schema = schema::lookup(table)?;
        let validator = RowValidator::new(schema.kind, self.rules);

        tracing::debug!(
            "Preparing {} batch for table '{}' ({})",
            input.source_name(),
            table,
            schema.kind
        );

        let (received, records) = match input {
            IngestInput::Csv(bytes) => {
                tracing::debug!("CSV content length: {}", bytes.len());
                let grid = self.parser.parse(bytes)?;
                self.policy.check(grid.len())?;
                (grid.len(), validator.validate(&grid)?)
            }
            IngestInput::Records(records) => {
                self.policy.check(records.len())?;
                (records.len(), validator.validate(records)?)
            }
        };

        if records.is_empty() {
            return Err(IngestError::EmptyResultError {
                table: schema.kind.to_string(),
            });
        }

        self.monitor.log_stats("Validate");

        Ok(ValidatedBatch {
            kind: schema.kind,
            received,
            records,
        })
    }

    pub async fn ingest(&self, table: &str, input: IngestInput<'_>) -> Result<IngestReport> {
        let batch = self.prepare(table, input)?;

        tracing::debug!("Inserting {} {} records", batch.len(), batch.kind);
        let inserted = self.store.bulk_insert(batch.kind, &batch.records).await?;
        self.monitor.log_stats("Insert");

        let report = IngestReport {
            table: batch.kind,
            received: batch.received,
            accepted: batch.len(),
            dropped: batch.dropped(),
            inserted,
        };
        tracing::info!(
            "Inserted {} {} records ({} received, {} dropped)",
            report.inserted,
            report.table,
            report.received,
            report.dropped
        );
        Ok(report)
    }

    pub async fn ingest_csv(&self, table: &str, bytes: &[u8]) -> Result<IngestReport> {
        self.ingest(table, IngestInput::Csv(bytes)).await
    }

    pub async fn ingest_records(&self, table: &str, records: &[Record]) -> Result<IngestReport> {
        self.ingest(table, IngestInput::Records(records)).await
    }
}
