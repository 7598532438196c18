//! Field coercion and the per-table row normalizers referenced by the schema registry.

use crate::core::grid::CellValue;
use crate::domain::model::{DepartmentRecord, EmployeeRecord, JobRecord, ValidatedRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

pub const DEFAULT_MAX_NAME_LENGTH: usize = 100;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// 單列被丟棄的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("column '{column}' is blank")]
    Blank { column: &'static str },

    #[error("column '{column}' is longer than {max} characters")]
    TooLong { column: &'static str, max: usize },

    #[error("column '{column}' is not a positive integer: '{value}'")]
    InvalidInteger { column: &'static str, value: String },

    #[error("column '{column}' is not a valid timestamp: '{value}'")]
    InvalidTimestamp { column: &'static str, value: String },

    #[error("column '{column}' holds an unsupported {kind} value")]
    Unsupported {
        column: &'static str,
        kind: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_name_length: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

static BLANK: CellValue<'static> = CellValue::Blank;

/// Cells of one input row, keyed by canonical column name.
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    cells: Vec<(&'static str, CellValue<'a>)>,
}

impl<'a> RowView<'a> {
    pub fn new(cells: Vec<(&'static str, CellValue<'a>)>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, column: &str) -> &CellValue<'a> {
        self.cells
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, cell)| cell)
            .unwrap_or(&BLANK)
    }
}

fn text<'c>(cell: &'c CellValue<'_>, column: &'static str) -> Result<&'c str, RowRejection> {
    match cell {
        CellValue::Blank => Err(RowRejection::Blank { column }),
        CellValue::Unsupported(kind) => Err(RowRejection::Unsupported { column, kind: *kind }),
        CellValue::Text(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(RowRejection::Blank { column })
            } else {
                Ok(trimmed)
            }
        }
    }
}

pub fn coerce_name(
    cell: &CellValue<'_>,
    column: &'static str,
    max_len: usize,
) -> Result<String, RowRejection> {
    let value = text(cell, column)?;
    if value.chars().count() > max_len {
        return Err(RowRejection::TooLong {
            column,
            max: max_len,
        });
    }
    Ok(value.to_string())
}

/// 解析正整數 ID；`"3.0"` 這類整數值浮點數也接受
pub fn coerce_id(cell: &CellValue<'_>, column: &'static str) -> Result<i64, RowRejection> {
    let value = text(cell, column)?;
    let invalid = || RowRejection::InvalidInteger {
        column,
        value: value.to_string(),
    };

    let parsed = match value.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            let f = value.parse::<f64>().map_err(|_| invalid())?;
            if !f.is_finite() || f.fract() != 0.0 || f.abs() > i64::MAX as f64 {
                return Err(invalid());
            }
            f as i64
        }
    };

    if parsed <= 0 {
        return Err(invalid());
    }
    Ok(parsed)
}

/// RFC 3339 values are converted to UTC; naive values are taken as-is.
pub fn coerce_timestamp(
    cell: &CellValue<'_>,
    column: &'static str,
) -> Result<NaiveDateTime, RowRejection> {
    let value = text(cell, column)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt);
    }

    Err(RowRejection::InvalidTimestamp {
        column,
        value: value.to_string(),
    })
}

pub fn normalize_department(
    row: &RowView<'_>,
    rules: &ValidationRules,
) -> Result<ValidatedRecord, RowRejection> {
    Ok(ValidatedRecord::Department(DepartmentRecord {
        name: coerce_name(row.cell("name"), "name", rules.max_name_length)?,
    }))
}

pub fn normalize_job(
    row: &RowView<'_>,
    rules: &ValidationRules,
) -> Result<ValidatedRecord, RowRejection> {
    Ok(ValidatedRecord::Job(JobRecord {
        name: coerce_name(row.cell("name"), "name", rules.max_name_length)?,
        department_id: coerce_id(row.cell("department_id"), "department_id")?,
    }))
}

pub fn normalize_employee(
    row: &RowView<'_>,
    rules: &ValidationRules,
) -> Result<ValidatedRecord, RowRejection> {
    Ok(ValidatedRecord::Employee(EmployeeRecord {
        name: coerce_name(row.cell("name"), "name", rules.max_name_length)?,
        hired_at: coerce_timestamp(row.cell("hired_at"), "hired_at")?,
        department_id: coerce_id(row.cell("department_id"), "department_id")?,
        job_id: coerce_id(row.cell("job_id"), "job_id")?,
    }))
}
