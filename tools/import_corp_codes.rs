use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use dart_financials::database::CompanyDatabase;
use dart_financials::directory::CompanyDirectory;
use dart_financials::models::Config;
use dart_financials::registry::CompanyRegistry;
use dart_financials::utils::{init_tracing, is_directory_stale, DIRECTORY_MAX_AGE_DAYS};

#[derive(Parser)]
#[command(name = "import_corp_codes")]
#[command(about = "Refresh the stored OpenDART company directory")]
struct Args {
    /// Directory JSON file (defaults to CORP_CODES_JSON)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Import even if the stored directory is recent
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("dart_financials=info,import_corp_codes=info");
    let args = Args::parse();

    info!("🔄 Company directory updater");

    let config = Config::from_env()?;
    let database = CompanyDatabase::new(&config.database_path).await?;

    let last_loaded = database.get_last_loaded_date().await?;
    let today = Utc::now().date_naive();
    match last_loaded {
        Some(date) => info!(
            "📅 Directory last loaded: {} ({} days ago)",
            date,
            (today - date).num_days()
        ),
        None => info!("📋 No previous directory import found"),
    }

    if args.force || is_directory_stale(last_loaded, today, DIRECTORY_MAX_AGE_DAYS) {
        let path = args
            .file
            .unwrap_or_else(|| PathBuf::from(&config.corp_codes_json));
        let directory = CompanyDirectory::load(&path)
            .await
            .with_context(|| format!("loading {}", path.display()))?;

        // Rejects empty or duplicate corp codes before the stored copy is replaced
        CompanyRegistry::with_records(directory.companies.clone())?;

        let stored = database.replace_all(&directory.companies).await?;
        info!("✅ Imported {} companies from {}", stored, path.display());
    } else {
        info!("✅ Directory is recent, no import needed");
    }

    let stats = database.get_stats().await?;
    info!(
        "📊 Database contains {} companies ({} listed, {} unlisted)",
        stats.total_companies, stats.listed_companies, stats.unlisted_companies
    );

    database.close().await;
    Ok(())
}
