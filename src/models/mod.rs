use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Accepts a JSON string, number, bool or null and keeps it as text.
fn deserialize_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn deserialize_loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_loose_string(deserializer)?.unwrap_or_default())
}

/// Blank ticker strings mean the company is unlisted.
fn deserialize_stock_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_stock_code(deserialize_loose_string(deserializer)?))
}

pub fn normalize_stock_code(stock_code: Option<String>) -> Option<String> {
    stock_code
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

// ============================================================================
// Filing line items
// ============================================================================

/// One line item as returned by the OpenDART single-company account API.
/// Every field is optional; missing values get a per-field default during
/// classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLineItem {
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub rcept_no: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub bsns_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub corp_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub stock_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub reprt_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub account_nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub fs_div: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub fs_nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub sj_div: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub sj_nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub thstrm_nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub thstrm_dt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub thstrm_amount: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub frmtrm_nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub frmtrm_dt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub frmtrm_amount: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub bfefrmtrm_nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub bfefrmtrm_dt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub bfefrmtrm_amount: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub ord: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Consolidated (CFS) vs. separate (OFS) financial statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementDivision {
    #[serde(rename = "CFS")]
    Consolidated,
    #[serde(rename = "OFS")]
    Separate,
}

impl Default for StatementDivision {
    fn default() -> Self {
        StatementDivision::Consolidated
    }
}

impl StatementDivision {
    pub fn code(&self) -> &'static str {
        match self {
            StatementDivision::Consolidated => "CFS",
            StatementDivision::Separate => "OFS",
        }
    }

    /// Lenient mapping used for filing records: only `OFS` means separate.
    pub fn from_code(code: &str) -> Self {
        if code == "OFS" {
            StatementDivision::Separate
        } else {
            StatementDivision::Consolidated
        }
    }
}

impl FromStr for StatementDivision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CFS" => Ok(StatementDivision::Consolidated),
            "OFS" => Ok(StatementDivision::Separate),
            other => Err(format!("unknown statement division '{}' (expected CFS or OFS)", other)),
        }
    }
}

/// Statement a line item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    #[serde(rename = "BS")]
    BalanceSheet,
    #[serde(rename = "IS")]
    IncomeStatement,
    #[serde(rename = "OTHER")]
    Other,
}

impl StatementType {
    /// Exact, case-sensitive match on the `sj_div` code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "BS" => StatementType::BalanceSheet,
            "IS" => StatementType::IncomeStatement,
            _ => StatementType::Other,
        }
    }
}

/// OpenDART report codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCode {
    Annual,
    HalfYear,
    FirstQuarter,
    ThirdQuarter,
}

impl Default for ReportCode {
    fn default() -> Self {
        ReportCode::Annual
    }
}

impl ReportCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReportCode::Annual => "11011",
            ReportCode::HalfYear => "11012",
            ReportCode::FirstQuarter => "11013",
            ReportCode::ThirdQuarter => "11014",
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "11011" | "annual" => Ok(ReportCode::Annual),
            "11012" | "half" | "half-year" => Ok(ReportCode::HalfYear),
            "11013" | "q1" => Ok(ReportCode::FirstQuarter),
            "11014" | "q3" => Ok(ReportCode::ThirdQuarter),
            other => Err(format!("unknown report code '{}'", other)),
        }
    }
}

impl Serialize for ReportCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Label, date and amount of one reporting period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAmount {
    pub name: String,
    pub date: String,
    pub amount: i64,
}

/// Classified line item. Built once per raw record and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLineItem {
    pub account_name: String,
    pub statement_division: StatementDivision,
    pub division_name: String,
    pub statement_type: StatementType,
    pub statement_name: String,
    pub current_period: PeriodAmount,
    pub previous_period: PeriodAmount,
    pub currency: String,
    pub order: i64,
}

// ============================================================================
// Metrics and ratios
// ============================================================================

/// Fixed internal key for a headline account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    TotalAssets,
    TotalLiabilities,
    TotalEquity,
    Revenue,
    OperatingProfit,
    NetIncome,
}

impl MetricId {
    pub const ALL: [MetricId; 6] = [
        MetricId::TotalAssets,
        MetricId::TotalLiabilities,
        MetricId::TotalEquity,
        MetricId::Revenue,
        MetricId::OperatingProfit,
        MetricId::NetIncome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::TotalAssets => "total_assets",
            MetricId::TotalLiabilities => "total_liabilities",
            MetricId::TotalEquity => "total_equity",
            MetricId::Revenue => "revenue",
            MetricId::OperatingProfit => "operating_profit",
            MetricId::NetIncome => "net_income",
        }
    }
}

/// Year-over-year view of one headline account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub current: i64,
    pub previous: i64,
    pub change: i64,
    pub change_rate: f64,
}

/// Secondary ratios, in percent. A ratio whose inputs are missing is omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_margin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<f64>,
}

impl RatioSet {
    pub fn is_empty(&self) -> bool {
        self.debt_ratio.is_none() && self.operating_margin.is_none() && self.net_margin.is_none()
    }
}

/// Metrics keyed by id plus the derived ratios, serialized as one flat object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMetrics {
    #[serde(flatten)]
    pub metrics: BTreeMap<MetricId, Metric>,
    pub ratios: RatioSet,
}

impl KeyMetrics {
    pub fn get(&self, id: MetricId) -> Option<&Metric> {
        self.metrics.get(&id)
    }
}

/// Counts reported alongside a processed statement set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub total_items: usize,
    pub balance_sheet_items: usize,
    pub income_statement_items: usize,
    pub other_items: usize,
    pub amount_parse_failures: usize,
}

/// Output of the normalization pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedFinancials {
    pub balance_sheet: Vec<NormalizedLineItem>,
    pub income_statement: Vec<NormalizedLineItem>,
    pub key_metrics: KeyMetrics,
    pub summary: ProcessingSummary,
}

// ============================================================================
// Company directory
// ============================================================================

/// One entry of the OpenDART company directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default, deserialize_with = "deserialize_loose_text")]
    pub corp_code: String,
    #[serde(default, deserialize_with = "deserialize_loose_text")]
    pub corp_name: String,
    #[serde(default, deserialize_with = "deserialize_loose_text")]
    pub corp_eng_name: String,
    #[serde(default, deserialize_with = "deserialize_stock_code")]
    pub stock_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_text")]
    pub modify_date: String,
}

impl CompanyRecord {
    pub fn is_listed(&self) -> bool {
        self.stock_code.is_some()
    }
}

/// Registry size broken down by listing status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_companies: usize,
    pub listed_companies: usize,
    pub unlisted_companies: usize,
}

/// Processed statements for one company, year and report
#[derive(Debug, Clone, Serialize)]
pub struct FinancialReport {
    pub company: CompanyRecord,
    pub year: String,
    pub report_code: ReportCode,
    pub statement_division: StatementDivision,
    pub financial_data: ProcessedFinancials,
}

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_DART_BASE_URL: &str = "https://opendart.fss.or.kr/api";

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub dart_api_key: Option<String>,
    pub dart_base_url: String,
    pub database_path: String,
    pub corp_codes_json: String,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dart_api_key: None,
            dart_base_url: DEFAULT_DART_BASE_URL.to_string(),
            database_path: "companies.db".to_string(),
            corp_codes_json: "corp_codes.json".to_string(),
            rate_limit_per_minute: 600,
            request_timeout_secs: 30,
            search_limit: 20,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();

        Ok(Config {
            dart_api_key: std::env::var("OPENDART_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            dart_base_url: std::env::var("OPENDART_BASE_URL")
                .unwrap_or(defaults.dart_base_url),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or(defaults.database_path),
            corp_codes_json: std::env::var("CORP_CODES_JSON")
                .unwrap_or(defaults.corp_codes_json),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_per_minute),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            search_limit: std::env::var("SEARCH_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.search_limit),
        })
    }

    /// API key, required only by the filings client
    pub fn require_api_key(&self) -> crate::error::Result<&str> {
        self.dart_api_key.as_deref().ok_or_else(|| {
            crate::error::FinancialsError::Config(
                "OPENDART_API_KEY environment variable required".to_string(),
            )
        })
    }
}
