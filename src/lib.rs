pub mod analysis;
pub mod api;
pub mod database;
pub mod directory;
pub mod error;
pub mod financial_service;
pub mod models;
pub mod registry;
pub mod utils;

pub use analysis::process_financial_data;
pub use error::{FinancialsError, Result};
pub use financial_service::FinancialReportService;
pub use registry::CompanyRegistry;
