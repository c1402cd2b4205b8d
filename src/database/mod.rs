use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Row, SqlitePool};
use tracing::{debug, info};

use crate::models::{CompanyRecord, RegistryStats};
use crate::registry::CompanyRegistry;

pub const LAST_LOADED_KEY: &str = "corp_codes_last_loaded";

/// SQLite store for the company directory
#[derive(Clone)]
pub struct CompanyDatabase {
    pool: SqlitePool,
}

impl CompanyDatabase {
    /// Open (or create) the database at `database_path` and ensure the schema exists
    pub async fn new(database_path: &str) -> Result<Self> {
        let path = database_path.strip_prefix("sqlite:").unwrap_or(database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(SqliteConnectOptions::new().filename(path).create_if_missing(true))
            .await?;

        // Enable WAL mode so readers are not blocked by a reload
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!("Company database ready at {}", path);
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                corp_code TEXT NOT NULL UNIQUE CHECK (corp_code <> ''),
                corp_name TEXT NOT NULL,
                corp_eng_name TEXT,
                stock_code TEXT,
                modify_date TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#
        ).execute(&self.pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#
        ).execute(&self.pool).await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_corp_name ON companies(corp_name)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_stock_code ON companies(stock_code)")
            .execute(&self.pool)
            .await?;

        debug!("Company database migrations completed");
        Ok(())
    }

    /// Replace every stored company inside one transaction.
    /// If any insert fails the transaction rolls back and the old rows stay.
    pub async fn replace_all(&self, companies: &[CompanyRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM companies")
            .execute(&mut *tx)
            .await?;

        for company in companies {
            sqlx::query(
                r#"
                INSERT INTO companies (corp_code, corp_name, corp_eng_name, stock_code, modify_date)
                VALUES (?, ?, ?, ?, ?)
                "#
            )
            .bind(company.corp_code.trim())
            .bind(&company.corp_name)
            .bind(&company.corp_eng_name)
            .bind(company.stock_code.as_deref().map(str::trim).filter(|code| !code.is_empty()))
            .bind(&company.modify_date)
            .execute(&mut *tx)
            .await?;
        }

        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(LAST_LOADED_KEY)
            .bind(&today)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Stored {} companies", companies.len());
        Ok(companies.len())
    }

    /// All stored companies, ordered by corp_code
    pub async fn load_all(&self) -> Result<Vec<CompanyRecord>> {
        let rows = sqlx::query(
            "SELECT corp_code, corp_name, corp_eng_name, stock_code, modify_date
             FROM companies ORDER BY corp_code"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(company_from_row).collect())
    }

    pub async fn get_company(&self, corp_code: &str) -> Result<Option<CompanyRecord>> {
        let row = sqlx::query(
            "SELECT corp_code, corp_name, corp_eng_name, stock_code, modify_date
             FROM companies WHERE corp_code = ?"
        )
        .bind(corp_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(company_from_row))
    }

    pub async fn get_stats(&self) -> Result<RegistryStats> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        let listed = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM companies WHERE stock_code IS NOT NULL AND stock_code != ''"
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RegistryStats {
            total_companies: total as usize,
            listed_companies: listed as usize,
            unlisted_companies: (total - listed) as usize,
        })
    }

    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Date the directory was last replaced, if ever
    pub async fn get_last_loaded_date(&self) -> Result<Option<NaiveDate>> {
        match self.get_metadata(LAST_LOADED_KEY).await? {
            Some(date_str) => Ok(Some(NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")?)),
            None => Ok(None),
        }
    }

    /// Load every stored company into `registry`, replacing its contents
    pub async fn load_registry(&self, registry: &CompanyRegistry) -> Result<usize> {
        let companies = self.load_all().await?;
        Ok(registry.replace_all(companies)?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn company_from_row(row: &sqlx::sqlite::SqliteRow) -> CompanyRecord {
    CompanyRecord {
        corp_code: row.get("corp_code"),
        corp_name: row.get("corp_name"),
        corp_eng_name: row.get::<Option<String>, _>("corp_eng_name").unwrap_or_default(),
        stock_code: row.get("stock_code"),
        modify_date: row.get::<Option<String>, _>("modify_date").unwrap_or_default(),
    }
}
