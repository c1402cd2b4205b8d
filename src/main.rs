use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use dart_financials::analysis::{parse_raw_items, process_financial_data};
use dart_financials::api::DartClient;
use dart_financials::database::CompanyDatabase;
use dart_financials::directory::CompanyDirectory;
use dart_financials::models::{
    CompanyRecord, Config, FinancialReport, MetricId, ProcessedFinancials, ReportCode,
    StatementDivision,
};
use dart_financials::utils::{format_amount, init_tracing};
use dart_financials::{CompanyRegistry, FinancialReportService};

#[derive(Parser)]
#[command(name = "dart-financials")]
#[command(about = "Search OpenDART companies and normalize their financial statements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a company directory JSON file into the database
    Import {
        /// Directory file (defaults to CORP_CODES_JSON)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Search companies by Korean or English name
    Search {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one company by corp_code
    Company { corp_code: String },
    /// Show directory statistics
    Stats,
    /// Fetch and normalize a filing from OpenDART
    Financials {
        corp_code: String,
        year: String,
        /// annual, half, q1, q3 or an 1101x code
        #[arg(short, long, default_value = "annual")]
        report: ReportCode,
        /// CFS (consolidated) or OFS (separate)
        #[arg(short, long, default_value = "CFS")]
        division: StatementDivision,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize a saved OpenDART response without calling the API
    Process { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("dart_financials=info");

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Import { file } => {
            let path = file.unwrap_or_else(|| PathBuf::from(&config.corp_codes_json));
            import_directory(&config, &path).await
        }
        Command::Search { query, limit } => {
            let registry = load_registry(&config).await?;
            let limit = limit.unwrap_or(config.search_limit);
            let results = registry.search(&query, limit)?;

            if results.is_empty() {
                println!("No companies match '{}'", query.trim());
                let suggestions = registry.suggest_similar(&query, 5)?;
                if !suggestions.is_empty() {
                    println!("Did you mean:");
                    for company in &suggestions {
                        print_company_line(company);
                    }
                }
            } else {
                println!("{} result(s) for '{}':", results.len(), query.trim());
                for company in &results {
                    print_company_line(company);
                }
            }
            Ok(())
        }
        Command::Company { corp_code } => {
            let registry = load_registry(&config).await?;
            let company = registry.require(corp_code.trim())?;
            print_company_line(&company);
            if !company.corp_eng_name.is_empty() {
                println!("  English name: {}", company.corp_eng_name);
            }
            if !company.modify_date.is_empty() {
                println!("  Modified:     {}", company.modify_date);
            }
            Ok(())
        }
        Command::Stats => {
            let registry = load_registry(&config).await?;
            let stats = registry.stats()?;
            println!("Total companies:    {}", stats.total_companies);
            println!("Listed companies:   {}", stats.listed_companies);
            println!("Unlisted companies: {}", stats.unlisted_companies);
            Ok(())
        }
        Command::Financials {
            corp_code,
            year,
            report,
            division,
            json,
        } => {
            let registry = load_registry(&config).await?;
            let client = DartClient::new(&config)?;
            let service = FinancialReportService::new(registry, client);

            let report = service.fetch_report(&corp_code, &year, report, division).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Command::Process { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let raw_items = parse_raw_items(&content)?;
            let processed = process_financial_data(&raw_items);
            println!("{}", serde_json::to_string_pretty(&processed)?);
            Ok(())
        }
    }
}

async fn import_directory(config: &Config, path: &Path) -> Result<()> {
    let directory = CompanyDirectory::load(path)
        .await
        .with_context(|| format!("loading company directory {}", path.display()))?;

    // Validate through the registry before touching the stored copy
    let registry = CompanyRegistry::new();
    registry.replace_all(directory.companies.clone())?;

    let database = CompanyDatabase::new(&config.database_path).await?;
    let stored = database.replace_all(&directory.companies).await?;
    let stats = database.get_stats().await?;
    database.close().await;

    println!(
        "Imported {} companies ({} listed) from {}, downloaded {}",
        stored,
        stats.listed_companies,
        directory.metadata.source,
        directory.metadata.download_date
    );
    Ok(())
}

/// Registry from the database, falling back to the directory JSON file
async fn load_registry(config: &Config) -> Result<CompanyRegistry> {
    let registry = CompanyRegistry::new();

    let database = CompanyDatabase::new(&config.database_path).await?;
    let loaded = database.load_registry(&registry).await?;
    database.close().await;

    if loaded == 0 {
        warn!(
            "Company database is empty, reading {} instead",
            config.corp_codes_json
        );
        let directory = CompanyDirectory::load(&config.corp_codes_json)
            .await
            .with_context(|| {
                format!(
                    "no companies available; run `dart-financials import` or provide {}",
                    config.corp_codes_json
                )
            })?;
        registry.replace_all(directory.companies)?;
    }

    info!("Registry ready: {} companies", registry.stats()?.total_companies);
    Ok(registry)
}

fn print_company_line(company: &CompanyRecord) {
    match &company.stock_code {
        Some(stock_code) => println!("{}  {}  [{}]", company.corp_code, company.corp_name, stock_code),
        None => println!("{}  {}", company.corp_code, company.corp_name),
    }
}

fn print_report(report: &FinancialReport) {
    println!(
        "{} ({}) {} report {} [{}]",
        report.company.corp_name,
        report.company.corp_code,
        report.year,
        report.report_code,
        report.statement_division.code()
    );
    print_financials(&report.financial_data);
}

fn print_financials(data: &ProcessedFinancials) {
    let summary = &data.summary;
    println!(
        "Line items: {} total, {} balance sheet, {} income statement, {} other",
        summary.total_items,
        summary.balance_sheet_items,
        summary.income_statement_items,
        summary.other_items
    );
    if summary.amount_parse_failures > 0 {
        println!("Unreadable amounts recorded as 0: {}", summary.amount_parse_failures);
    }

    if data.key_metrics.metrics.is_empty() {
        println!("No headline accounts found");
        return;
    }

    println!();
    for id in MetricId::ALL {
        if let Some(metric) = data.key_metrics.get(id) {
            println!(
                "{:<12} {:>22} {:>22} {:>8.2}%",
                metric.name,
                format_amount(metric.current),
                format_amount(metric.previous),
                metric.change_rate
            );
        }
    }

    let ratios = &data.key_metrics.ratios;
    if !ratios.is_empty() {
        println!();
        if let Some(value) = ratios.debt_ratio {
            println!("Debt ratio:       {:.2}%", value);
        }
        if let Some(value) = ratios.operating_margin {
            println!("Operating margin: {:.2}%", value);
        }
        if let Some(value) = ratios.net_margin {
            println!("Net margin:       {:.2}%", value);
        }
    }
}
