use crate::core::batch::DEFAULT_MAX_BATCH_SIZE;
use crate::core::coerce::DEFAULT_MAX_NAME_LENGTH;
use crate::core::ConfigProvider;
use crate::utils::error::{IngestError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("environment variable pattern is valid")
});

/// Hard ceiling for `ingest.max_batch_size`.
pub const BATCH_SIZE_CEILING: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub max_batch_size: Option<usize>,
    pub max_name_length: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
            max_name_length: Some(DEFAULT_MAX_NAME_LENGTH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(IngestError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| IngestError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(size) = self.ingest.max_batch_size {
            crate::utils::validation::validate_range(
                "ingest.max_batch_size",
                size,
                1,
                BATCH_SIZE_CEILING,
            )?;
        }

        if let Some(len) = self.ingest.max_name_length {
            crate::utils::validation::validate_positive_number("ingest.max_name_length", len, 1)?;
        }

        if self.storage.backend == StorageBackend::Json {
            let path = crate::utils::validation::validate_required_field(
                "storage.path",
                &self.storage.path,
            )?;
            crate::utils::validation::validate_non_empty_string("storage.path", path)?;
            crate::utils::validation::validate_path("storage.path", path)?;
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn max_batch_size(&self) -> usize {
        self.ingest.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE)
    }

    fn max_name_length(&self) -> usize {
        self.ingest.max_name_length.unwrap_or(DEFAULT_MAX_NAME_LENGTH)
    }

    fn storage_path(&self) -> Option<&str> {
        match self.storage.backend {
            StorageBackend::Json => self.storage.path.as_deref(),
            StorageBackend::Memory => None,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[ingest]
max_batch_size = 500
max_name_length = 80

[storage]
backend = "json"
path = "./data"

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.max_batch_size(), 500);
        assert_eq!(config.max_name_length(), 80);
        assert_eq!(config.storage_path(), Some("./data"));
        assert!(config.json_logs());
        assert!(!config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_batch_size(), 1000);
        assert_eq!(config.max_name_length(), 100);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage_path(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ROSTER_ETL_TEST_DATA_DIR", "/tmp/roster-data");

        let toml_content = r#"
[storage]
backend = "json"
path = "${ROSTER_ETL_TEST_DATA_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/roster-data"));

        std::env::remove_var("ROSTER_ETL_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let too_large = TomlConfig::from_toml_str("[ingest]\nmax_batch_size = 5000\n").unwrap();
        assert!(too_large.validate().is_err());

        let zero = TomlConfig::from_toml_str("[ingest]\nmax_batch_size = 0\n").unwrap();
        assert!(zero.validate().is_err());

        let no_path = TomlConfig::from_toml_str("[storage]\nbackend = \"json\"\n").unwrap();
        assert!(matches!(
            no_path.validate(),
            Err(IngestError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[ingest\n").unwrap_err();
        assert!(matches!(err, IngestError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[ingest]\nmax_batch_size = 250\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.max_batch_size(), 250);
    }
}
