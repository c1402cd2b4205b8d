use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{ApiRateLimiter, FilingsSource, StatementRequest};
use crate::analysis::raw_items_from_values;
use crate::error::{FinancialsError, Result};
use crate::models::{Config, RawLineItem};

pub const STATUS_OK: &str = "000";
pub const STATUS_NO_DATA: &str = "013";

const SINGLE_ACCOUNT_ENDPOINT: &str = "fnlttSinglAcnt.json";

/// Envelope shared by the OpenDART JSON endpoints
#[derive(Debug, Deserialize)]
struct DartResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    list: Vec<Value>,
}

/// OpenDART API client
#[derive(Debug)]
pub struct DartClient {
    client: Client,
    api_key: String,
    base_url: Url,
    rate_limiter: ApiRateLimiter,
}

impl DartClient {
    /// Create a client from configuration; fails without an API key
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(
            config.require_api_key()?,
            &config.dart_base_url,
            config.rate_limit_per_minute,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        requests_per_minute: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("dart-financials/1.0")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: parse_base_url(base_url)?,
            rate_limiter: ApiRateLimiter::new(requests_per_minute),
        })
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| FinancialsError::Config(format!("invalid endpoint {}: {}", name, e)))
    }

    async fn get_json(&self, name: &str, params: &[(&str, &str)]) -> Result<DartResponse> {
        let url = self.endpoint(name)?;
        self.rate_limiter.wait().await;

        debug!("GET {} {:?}", url, params);
        let response = self
            .client
            .get(url)
            .query(&[("crtfc_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<DartResponse>().await?)
    }
}

#[async_trait::async_trait]
impl FilingsSource for DartClient {
    async fn get_financial_statement(&self, request: &StatementRequest) -> Result<Vec<RawLineItem>> {
        let response = self
            .get_json(
                SINGLE_ACCOUNT_ENDPOINT,
                &[
                    ("corp_code", request.corp_code.as_str()),
                    ("bsns_year", request.year.as_str()),
                    ("reprt_code", request.report_code.code()),
                    ("fs_div", request.division.code()),
                ],
            )
            .await?;

        match response.status.as_str() {
            STATUS_OK => {
                let items = raw_items_from_values(response.list)?;
                debug!(
                    "Retrieved {} line items for {} {} ({})",
                    items.len(),
                    request.corp_code,
                    request.year,
                    request.report_code
                );
                Ok(items)
            }
            STATUS_NO_DATA => {
                warn!("No statement data for {} {}", request.corp_code, request.year);
                Ok(Vec::new())
            }
            _ => Err(FinancialsError::Api {
                status: response.status,
                message: response.message,
            }),
        }
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized)
        .map_err(|e| FinancialsError::Config(format!("invalid OpenDART base URL {}: {}", base_url, e)))
}
