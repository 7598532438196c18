use crate::config::toml_config::TomlConfig;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extensions, validate_path, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "roster-etl")]
#[command(about = "Load department, job and employee exports into the roster store")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Persist tables as JSON files in this directory (overrides the config file)
    #[arg(long, global = true)]
    pub store_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,

    /// Settings loaded from `--config`, merged by `load_settings`.
    #[arg(skip)]
    pub settings: TomlConfig,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Upload a CSV file into a table
    Upload {
        #[arg(short, long)]
        table: String,
        #[arg(short, long)]
        file: String,
    },
    /// Insert a JSON batch (an array of objects, or {"data": [...]})
    Batch {
        #[arg(short, long)]
        table: String,
        #[arg(short, long)]
        file: String,
    },
    /// List the accepted table names
    Tables,
}

impl CliConfig {
    /// 讀取 `--config` 指定的 TOML 設定
    pub fn load_settings(&mut self) -> Result<()> {
        if let Some(path) = &self.config {
            self.settings = TomlConfig::from_file(path)?;
        }
        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.verbose || self.settings.verbose()
    }

    pub fn json_logs(&self) -> bool {
        self.json_logs || self.settings.json_logs()
    }
}

impl ConfigProvider for CliConfig {
    fn max_batch_size(&self) -> usize {
        self.settings.max_batch_size()
    }

    fn max_name_length(&self) -> usize {
        self.settings.max_name_length()
    }

    fn storage_path(&self) -> Option<&str> {
        self.store_dir
            .as_deref()
            .or_else(|| self.settings.storage_path())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        if let Some(dir) = &self.store_dir {
            validate_path("store_dir", dir)?;
        }

        match &self.command {
            Command::Upload { file, .. } => {
                validate_file_extensions("file", std::slice::from_ref(file), &["csv"])
            }
            Command::Batch { file, .. } => {
                validate_file_extensions("file", std::slice::from_ref(file), &["json"])
            }
            Command::Tables => Ok(()),
        }
    }
}
