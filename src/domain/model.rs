use crate::utils::error::{IngestError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 直接批次匯入的鬆散記錄（JSON 物件）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }

    /// 從 JSON 物件建立；非物件值回傳 None
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(obj) => Some(Self {
                data: obj.into_iter().collect(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Department,
    Job,
    Employee,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Department, TableKind::Job, TableKind::Employee];

    /// Names accepted by `FromStr`, singular forms first.
    pub const SUPPORTED_NAMES: [&'static str; 8] = [
        "department",
        "job",
        "employee",
        "hired_employee",
        "departments",
        "jobs",
        "employees",
        "hired_employees",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Department => "department",
            TableKind::Job => "job",
            TableKind::Employee => "employee",
        }
    }

    /// Name of the physical table in the store.
    pub fn table_name(&self) -> &'static str {
        match self {
            TableKind::Department => "departments",
            TableKind::Job => "jobs",
            TableKind::Employee => "employees",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "department" | "departments" => Ok(TableKind::Department),
            "job" | "jobs" => Ok(TableKind::Job),
            "employee" | "employees" | "hired_employee" | "hired_employees" => {
                Ok(TableKind::Employee)
            }
            _ => Err(IngestError::UnknownTableError {
                name: s.to_string(),
                supported: TableKind::SUPPORTED_NAMES.join(", "),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub name: String,
    pub department_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub name: String,
    pub hired_at: NaiveDateTime,
    pub department_id: i64,
    pub job_id: i64,
}

/// 驗證通過的記錄，依資料表區分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ValidatedRecord {
    Department(DepartmentRecord),
    Job(JobRecord),
    Employee(EmployeeRecord),
}

impl ValidatedRecord {
    pub fn kind(&self) -> TableKind {
        match self {
            ValidatedRecord::Department(_) => TableKind::Department,
            ValidatedRecord::Job(_) => TableKind::Job,
            ValidatedRecord::Employee(_) => TableKind::Employee,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ValidatedRecord::Department(d) => &d.name,
            ValidatedRecord::Job(j) => &j.name,
            ValidatedRecord::Employee(e) => &e.name,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        match self {
            ValidatedRecord::Department(d) => NaturalKey::Department {
                name: d.name.clone(),
            },
            ValidatedRecord::Job(j) => NaturalKey::Job {
                name: j.name.clone(),
                department_id: j.department_id,
            },
            ValidatedRecord::Employee(e) => NaturalKey::Employee {
                name: e.name.clone(),
                hired_at: e.hired_at,
            },
        }
    }
}

/// One table's worth of validated records, ready for bulk insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub kind: TableKind,
    pub received: usize,
    pub records: Vec<ValidatedRecord>,
}

impl ValidatedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.received.saturating_sub(self.records.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    Department { name: String },
    Job { name: String, department_id: i64 },
    Employee { name: String, hired_at: NaiveDateTime },
}

impl NaturalKey {
    pub fn kind(&self) -> TableKind {
        match self {
            NaturalKey::Department { .. } => TableKind::Department,
            NaturalKey::Job { .. } => TableKind::Job,
            NaturalKey::Employee { .. } => TableKind::Employee,
        }
    }
}

/// 已寫入儲存層的記錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    pub record: ValidatedRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub table: TableKind,
    pub received: usize,
    pub accepted: usize,
    pub dropped: usize,
    pub inserted: usize,
}

impl IngestReport {
    pub fn message(&self) -> String {
        format!(
            "Successfully uploaded {} records to {}",
            self.inserted, self.table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_kind_aliases() {
        assert_eq!("department".parse::<TableKind>().unwrap(), TableKind::Department);
        assert_eq!("Jobs".parse::<TableKind>().unwrap(), TableKind::Job);
        assert_eq!(
            "hired_employee".parse::<TableKind>().unwrap(),
            TableKind::Employee
        );
        assert_eq!(
            " hired_employees ".parse::<TableKind>().unwrap(),
            TableKind::Employee
        );
    }

    #[test]
    fn test_unknown_table_lists_supported_names() {
        let err = "unknown_table".parse::<TableKind>().unwrap_err();
        match err {
            IngestError::UnknownTableError { name, supported } => {
                assert_eq!(name, "unknown_table");
                assert!(supported.contains("hired_employee"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_record_from_json_rejects_non_objects() {
        assert!(Record::from_json(serde_json::json!({"name": "Sales"})).is_some());
        assert!(Record::from_json(serde_json::json!(["Sales"])).is_none());
        assert!(Record::from_json(serde_json::json!("Sales")).is_none());
    }

    #[test]
    fn test_batch_dropped_count() {
        let batch = ValidatedBatch {
            kind: TableKind::Department,
            received: 3,
            records: vec![ValidatedRecord::Department(DepartmentRecord {
                name: "Sales".to_string(),
            })],
        };
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.dropped(), 2);
    }
}
