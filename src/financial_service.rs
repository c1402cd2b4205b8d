use tracing::{info, warn};

use crate::analysis::process_financial_data;
use crate::api::{FilingsSource, StatementRequest};
use crate::error::{FinancialsError, Result};
use crate::models::{FinancialReport, ReportCode, StatementDivision};
use crate::registry::CompanyRegistry;

/// Looks companies up in the registry and turns their filings into reports
pub struct FinancialReportService<S: FilingsSource> {
    registry: CompanyRegistry,
    source: S,
}

impl<S: FilingsSource> FinancialReportService<S> {
    pub fn new(registry: CompanyRegistry, source: S) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &CompanyRegistry {
        &self.registry
    }

    /// Fetch and process one filing.
    ///
    /// Unknown companies fail before any request is made. A filing without
    /// statement data yields a report with an empty `financial_data`.
    pub async fn fetch_report(
        &self,
        corp_code: &str,
        year: &str,
        report_code: ReportCode,
        division: StatementDivision,
    ) -> Result<FinancialReport> {
        validate_year(year)?;
        let company = self.registry.require(corp_code.trim())?;

        let request = StatementRequest {
            corp_code: company.corp_code.clone(),
            year: year.to_string(),
            report_code,
            division,
        };
        let raw_items = self.source.get_financial_statement(&request).await?;
        if raw_items.is_empty() {
            warn!("{} ({}) has no statement data for {}", company.corp_name, company.corp_code, year);
        }

        let financial_data = process_financial_data(&raw_items);
        info!(
            "Built {} report for {} ({}): {} line items",
            year, company.corp_name, company.corp_code, financial_data.summary.total_items
        );

        Ok(FinancialReport {
            company,
            year: year.to_string(),
            report_code,
            statement_division: division,
            financial_data,
        })
    }
}

fn validate_year(year: &str) -> Result<()> {
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(FinancialsError::InvalidYear {
            year: year.to_string(),
        })
    }
}
