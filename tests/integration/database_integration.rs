//! Database integration tests

use chrono::Utc;
use pretty_assertions::assert_eq;

use crate::common::{logging, test_data, TestDatabase};
use dart_financials::database::{CompanyDatabase, LAST_LOADED_KEY};
use dart_financials::directory::{CompanyDirectory, DEFAULT_SOURCE};
use dart_financials::CompanyRegistry;

#[tokio::test]
async fn test_directory_import_workflow() {
    logging::init_test_logging();
    logging::log_test_step("Importing a directory snapshot into SQLite");

    let test_db = TestDatabase::new().await.expect("Failed to create test database");

    // Step 1: write a snapshot the way the downloader does
    let snapshot_dir = tempfile::tempdir().unwrap();
    let snapshot_path = snapshot_dir.path().join("corp_codes.json");
    CompanyDirectory::new(test_data::sample_companies(), DEFAULT_SOURCE)
        .save(&snapshot_path)
        .await
        .unwrap();

    // Step 2: load it back and store it
    let directory = CompanyDirectory::load(&snapshot_path).await.unwrap();
    assert_eq!(directory.metadata.total_count, 6);
    let stored = test_db.database.replace_all(&directory.companies).await.unwrap();
    assert_eq!(stored, 6);

    // Step 3: the registry built from the database answers searches
    let registry = CompanyRegistry::new();
    let loaded = test_db.database.load_registry(&registry).await.unwrap();
    assert_eq!(loaded, 6);

    let results = registry.search("하이닉스", 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].stock_code.as_deref(), Some("000660"));

    assert_eq!(
        test_db.database.get_last_loaded_date().await.unwrap(),
        Some(Utc::now().date_naive())
    );
    logging::log_test_data("stats", &registry.stats().unwrap());
}

#[tokio::test]
async fn test_reimport_replaces_previous_directory() {
    logging::init_test_logging();

    let test_db = TestDatabase::seeded().await.unwrap();
    test_db
        .database
        .replace_all(&[test_data::company("00000001", "신규회사", "New Company", None)])
        .await
        .unwrap();

    let companies = test_db.database.load_all().await.unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].corp_name, "신규회사");
    assert_eq!(test_db.database.get_company("00126380").await.unwrap(), None);
}

#[tokio::test]
async fn test_database_reopens_with_data() {
    let test_db = TestDatabase::seeded().await.unwrap();
    test_db.database.close().await;

    let reopened = CompanyDatabase::new(&test_db.path).await.unwrap();
    let stats = reopened.get_stats().await.unwrap();
    assert_eq!(stats.total_companies, 6);
    assert_eq!(stats.listed_companies, 4);
    assert!(reopened.get_metadata(LAST_LOADED_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_metadata_roundtrip() {
    let test_db = TestDatabase::new().await.unwrap();

    test_db.database.set_metadata("source", "OpenDart API").await.unwrap();
    test_db.database.set_metadata("source", "manual").await.unwrap();

    assert_eq!(
        test_db.database.get_metadata("source").await.unwrap().as_deref(),
        Some("manual")
    );
    assert_eq!(test_db.database.get_metadata("missing").await.unwrap(), None);
}
