use crate::core::coerce::{
    normalize_department, normalize_employee, normalize_job, RowRejection, RowView,
    ValidationRules,
};
use crate::domain::model::{TableKind, ValidatedRecord};
use crate::utils::error::Result;

pub type RowNormalizer =
    fn(&RowView<'_>, &ValidationRules) -> std::result::Result<ValidatedRecord, RowRejection>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAlias {
    pub alias: &'static str,
    pub canonical: &'static str,
}

/// 單一資料表的欄位定義與列正規化函式
pub struct TableSchema {
    pub kind: TableKind,
    pub required: &'static [&'static str],
    /// Accepted but ignored; identity is assigned by the store.
    pub optional: &'static [&'static str],
    pub aliases: &'static [ColumnAlias],
    pub normalizer: RowNormalizer,
}

impl std::fmt::Debug for TableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSchema")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

static DEPARTMENT_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Department,
    required: &["name"],
    optional: &["id"],
    aliases: &[ColumnAlias {
        alias: "department",
        canonical: "name",
    }],
    normalizer: normalize_department,
};

static JOB_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Job,
    required: &["name", "department_id"],
    optional: &["id"],
    aliases: &[ColumnAlias {
        alias: "job",
        canonical: "name",
    }],
    normalizer: normalize_job,
};

static EMPLOYEE_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Employee,
    required: &["name", "hired_at", "department_id", "job_id"],
    optional: &["id"],
    aliases: &[ColumnAlias {
        alias: "datetime",
        canonical: "hired_at",
    }],
    normalizer: normalize_employee,
};

pub fn schema_for(kind: TableKind) -> &'static TableSchema {
    match kind {
        TableKind::Department => &DEPARTMENT_SCHEMA,
        TableKind::Job => &JOB_SCHEMA,
        TableKind::Employee => &EMPLOYEE_SCHEMA,
    }
}

/// Resolves a caller-supplied table name, aliases included.
pub fn lookup(table_name: &str) -> Result<&'static TableSchema> {
    Ok(schema_for(table_name.parse()?))
}

/// 是否為任一資料表認得的欄位名稱（含別名）
pub fn is_known_column(column: &str) -> bool {
    TableKind::ALL.iter().map(|k| schema_for(*k)).any(|schema| {
        schema.required.contains(&column)
            || schema.optional.contains(&column)
            || schema.aliases.iter().any(|a| a.alias == column)
    })
}

impl TableSchema {
    /// Finds the source column that supplies `canonical`, preferring the canonical name over an alias.
    pub fn resolve_column<'c>(&self, available: &'c [String], canonical: &str) -> Option<&'c str> {
        if let Some(found) = available.iter().find(|c| c.as_str() == canonical) {
            return Some(found.as_str());
        }
        self.aliases
            .iter()
            .filter(|a| a.canonical == canonical)
            .find_map(|a| available.iter().find(|c| c.as_str() == a.alias))
            .map(String::as_str)
    }

    /// Required columns not supplied by `available`, in schema order.
    pub fn missing_columns(&self, available: &[String]) -> Vec<String> {
        self.required
            .iter()
            .filter(|column| self.resolve_column(available, column).is_none())
            .map(|column| column.to_string())
            .collect()
    }

    pub fn is_recognized(&self, column: &str) -> bool {
        self.required.contains(&column)
            || self.optional.contains(&column)
            || self.aliases.iter().any(|a| a.alias == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::IngestError;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_lookup_resolves_aliases() {
        assert_eq!(lookup("hired_employee").unwrap().kind, TableKind::Employee);
        assert_eq!(lookup("departments").unwrap().kind, TableKind::Department);
        assert!(matches!(
            lookup("unknown_table"),
            Err(IngestError::UnknownTableError { .. })
        ));
    }

    #[test]
    fn test_missing_columns_in_schema_order() {
        let schema = schema_for(TableKind::Employee);
        let missing = schema.missing_columns(&columns(&["id", "name", "department_id"]));
        assert_eq!(missing, vec!["hired_at".to_string(), "job_id".to_string()]);
    }

    #[test]
    fn test_alias_columns_satisfy_requirements() {
        let schema = schema_for(TableKind::Employee);
        let available = columns(&["name", "datetime", "department_id", "job_id"]);
        assert!(schema.missing_columns(&available).is_empty());
        assert_eq!(schema.resolve_column(&available, "hired_at"), Some("datetime"));

        let schema = schema_for(TableKind::Job);
        let available = columns(&["id", "job", "department_id"]);
        assert_eq!(schema.resolve_column(&available, "name"), Some("job"));
    }

    #[test]
    fn test_canonical_column_wins_over_alias() {
        let schema = schema_for(TableKind::Department);
        let available = columns(&["department", "name"]);
        assert_eq!(schema.resolve_column(&available, "name"), Some("name"));
    }

    #[test]
    fn test_known_columns() {
        for column in ["id", "name", "department", "job", "datetime", "hired_at", "job_id"] {
            assert!(is_known_column(column), "{column}");
        }
        assert!(!is_known_column("engineering"));
    }
}
