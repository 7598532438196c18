use clap::Parser;
use roster_etl::config::Command;
use roster_etl::core::ingest::parse_json_batch;
use roster_etl::core::ConfigProvider;
use roster_etl::domain::model::{IngestReport, TableKind};
use roster_etl::utils::error::ErrorSeverity;
use roster_etl::utils::{logger, validation::Validate};
use roster_etl::{CliConfig, InMemoryStore, IngestEngine, JsonFileStore, RecordStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = CliConfig::parse();

    // 載入設定檔（日誌設定也在其中，所以先於日誌初始化）
    if let Err(e) = config.load_settings() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Make sure the file exists and is valid TOML format");
        std::process::exit(1);
    }

    if config.json_logs() {
        logger::init_json_logger(config.verbose());
    } else {
        logger::init_cli_logger(config.verbose());
    }

    tracing::info!("Starting roster-etl");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Command::Tables = config.command {
        for kind in TableKind::ALL {
            println!("{:<12} -> {}", kind, kind.table_name());
        }
        println!("Accepted names: {}", TableKind::SUPPORTED_NAMES.join(", "));
        return Ok(());
    }

    let store: Arc<dyn RecordStore> = match config.storage_path() {
        Some(path) => {
            tracing::info!("📁 Using JSON store at {}", path);
            Arc::new(JsonFileStore::open(path).await?)
        }
        None => {
            tracing::warn!("No storage directory configured; records are kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    let engine = IngestEngine::new_with_monitoring(store, config.monitor).with_config(&config);
    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&engine, &config.command).await {
        Ok(None) => {}
        Ok(Some(report)) => {
            tracing::info!("✅ {}", report.message());
            println!("✅ {}", report.message());
            if report.dropped > 0 {
                println!(
                    "⚠️  {} of {} rows were dropped during validation",
                    report.dropped, report.received
                );
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Ingestion failed: {} (Category: {:?}, Severity: {:?}, Status: {})",
                e,
                e.category(),
                e.severity(),
                e.status_code()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run<S: RecordStore>(
    engine: &IngestEngine<S>,
    command: &Command,
) -> roster_etl::Result<Option<IngestReport>> {
    match command {
        Command::Upload { table, file } => {
            tracing::info!("📥 Uploading {} into {}", file, table);
            let bytes = tokio::fs::read(file).await?;
            engine.ingest_csv(table, &bytes).await.map(Some)
        }
        Command::Batch { table, file } => {
            tracing::info!("📥 Inserting batch {} into {}", file, table);
            let bytes = tokio::fs::read(file).await?;
            let records = parse_json_batch(&bytes)?;
            engine.ingest_records(table, &records).await.map(Some)
        }
        Command::Tables => Ok(None),
    }
}
