use governor::{clock::DefaultClock, state::{InMemoryState, NotKeyed}, Quota, RateLimiter};
use std::num::NonZeroU32;

use crate::error::Result;
use crate::models::{RawLineItem, ReportCode, StatementDivision};

pub mod dart_client;
pub use dart_client::DartClient;

/// Rate limiter shared by all requests of one client
#[derive(Debug)]
pub struct ApiRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }

    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

/// Which statements to fetch for a company
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRequest {
    pub corp_code: String,
    pub year: String,
    pub report_code: ReportCode,
    pub division: StatementDivision,
}

impl StatementRequest {
    pub fn annual(corp_code: &str, year: &str) -> Self {
        Self {
            corp_code: corp_code.to_string(),
            year: year.to_string(),
            report_code: ReportCode::Annual,
            division: StatementDivision::Consolidated,
        }
    }
}

/// Source of raw financial statement line items
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FilingsSource: Send + Sync {
    /// Line items for one company/year/report. An empty list means the
    /// filing exists but has no statement data.
    async fn get_financial_statement(&self, request: &StatementRequest) -> Result<Vec<RawLineItem>>;
}
