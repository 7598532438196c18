use anyhow::Result;
use roster_etl::config::toml_config::TomlConfig;
use roster_etl::core::ConfigProvider;
use roster_etl::domain::model::TableKind;
use roster_etl::utils::validation::Validate;
use roster_etl::{IngestEngine, IngestError, JsonFileStore, RecordStore};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_upload_persists_across_runs() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let store = JsonFileStore::open(temp_dir.path()).await?;
        let engine = IngestEngine::new(store);
        engine
            .ingest_csv("department", b"name\nEngineering\nMarketing")
            .await?;
        engine
            .ingest_csv("job", b"name,department_id\nSoftware Engineer,1")
            .await?;
    }

    let store = JsonFileStore::open(temp_dir.path()).await?;
    assert_eq!(store.rows(TableKind::Department).await.len(), 2);
    assert_eq!(store.rows(TableKind::Job).await.len(), 1);
    assert!(store.rows(TableKind::Employee).await.is_empty());

    let job = store.get_by_id(TableKind::Job, 1).await?;
    assert_eq!(job.map(|row| row.record.name().to_string()), Some("Software Engineer".to_string()));

    let saved = std::fs::read_to_string(temp_dir.path().join("departments.json"))?;
    assert!(saved.contains("Marketing"));
    Ok(())
}

#[tokio::test]
async fn test_engine_over_shared_dyn_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::open(temp_dir.path()).await?);
    let engine = IngestEngine::new(store);

    let report = engine
        .ingest_csv(
            "hired_employee",
            b"name,datetime,department_id,job_id\nJohn Doe,2023-01-15 09:00:00,1,1",
        )
        .await?;
    assert_eq!(report.inserted, 1);
    assert!(engine.store().get_by_id(TableKind::Employee, 1).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_config_limits_apply_to_engine() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("roster.toml");
    std::fs::write(
        &config_path,
        format!(
            "[ingest]\nmax_batch_size = 2\nmax_name_length = 10\n\n[storage]\nbackend = \"json\"\npath = \"{}\"\n",
            temp_dir.path().join("data").display()
        ),
    )?;

    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;

    let path = config.storage_path().map(str::to_string);
    let store = JsonFileStore::open(path.as_deref().unwrap_or("data")).await?;
    let engine = IngestEngine::new(store).with_config(&config);

    let err = engine
        .ingest_csv("department", b"name\nA\nB\nC")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::SizeError(_)));

    let report = engine
        .ingest_csv("department", b"name\nSales\nResearch and Development")
        .await?;
    assert_eq!(report.inserted, 1);
    assert_eq!(report.dropped, 1);

    assert!(temp_dir.path().join("data").join("departments.json").exists());
    Ok(())
}
