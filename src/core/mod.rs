pub mod batch;
pub mod coerce;
pub mod grid;
pub mod ingest;
pub mod parser;
pub mod schema;
pub mod validator;

pub use crate::domain::model::{Record, ValidatedBatch, ValidatedRecord};
pub use crate::domain::ports::{ConfigProvider, RecordStore};
pub use crate::utils::error::Result;
