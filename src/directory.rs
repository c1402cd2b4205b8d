//! JSON snapshot of the OpenDART company directory.
//!
//! Layout: `{"metadata": {...}, "companies": [...]}`. A bare array of
//! companies is accepted on load as well.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::CompanyRecord;

pub const DEFAULT_SOURCE: &str = "OpenDart API";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryMetadata {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub download_date: String,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDirectory {
    #[serde(default)]
    pub metadata: DirectoryMetadata,
    pub companies: Vec<CompanyRecord>,
}

impl CompanyDirectory {
    /// Wrap freshly downloaded companies with metadata stamped now
    pub fn new(companies: Vec<CompanyRecord>, source: &str) -> Self {
        Self {
            metadata: DirectoryMetadata {
                total_count: companies.len(),
                download_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                source: source.to_string(),
            },
            companies,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let directory = match serde_json::from_str::<Value>(json)? {
            Value::Array(companies) => {
                let companies: Vec<CompanyRecord> = serde_json::from_value(Value::Array(companies))?;
                Self {
                    metadata: DirectoryMetadata {
                        total_count: companies.len(),
                        ..Default::default()
                    },
                    companies,
                }
            }
            other => serde_json::from_value(other)?,
        };

        if directory.metadata.total_count != directory.companies.len() {
            warn!(
                "Directory metadata claims {} companies but {} were read",
                directory.metadata.total_count,
                directory.companies.len()
            );
        }
        Ok(directory)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let directory = Self::from_json_str(&content)?;
        info!(
            "Loaded {} companies from {} (downloaded {})",
            directory.companies.len(),
            path.display(),
            directory.metadata.download_date
        );
        Ok(directory)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!("Saved {} companies to {}", self.companies.len(), path.display());
        Ok(())
    }
}
