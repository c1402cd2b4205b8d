//! Test database utilities built on CompanyDatabase

use anyhow::Result;
use dart_financials::database::CompanyDatabase;
use tempfile::TempDir;

/// A company database in its own temporary directory, removed on drop
pub struct TestDatabase {
    pub database: CompanyDatabase,
    pub path: String,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create a completely fresh database file
    pub async fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("companies.db").to_string_lossy().to_string();
        let database = CompanyDatabase::new(&path).await?;

        Ok(Self {
            database,
            path,
            _dir: dir,
        })
    }

    /// Fresh database pre-loaded with `test_data::sample_companies`
    pub async fn seeded() -> Result<Self> {
        let test_db = Self::new().await?;
        test_db
            .database
            .replace_all(&super::test_data::sample_companies())
            .await?;
        Ok(test_db)
    }
}
