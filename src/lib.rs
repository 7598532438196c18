pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{InMemoryStore, JsonFileStore};
pub use config::TomlConfig;
pub use crate::core::{
    batch::BatchPolicy,
    ingest::{IngestEngine, IngestInput},
    parser::TabularParser,
    validator::RowValidator,
};
pub use domain::model::{IngestReport, Record, TableKind, ValidatedRecord};
pub use domain::ports::RecordStore;
pub use utils::error::{IngestError, Result};
