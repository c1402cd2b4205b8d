//! In-memory company directory with ranked name search.
//!
//! Readers clone an `Arc` to the current snapshot under a short read lock and
//! search it without holding the lock. `replace_all` validates and builds the
//! next snapshot before taking the write lock, so a rejected batch leaves the
//! current data untouched and readers never see a half-loaded registry.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::error::{FinancialsError, Result};
use crate::models::{normalize_stock_code, CompanyRecord, RegistryStats};

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

struct RegistryEntry {
    record: CompanyRecord,
    name_lower: String,
    eng_name_lower: String,
}

/// Immutable view of one registry load, sorted by (corp_name, corp_code)
struct RegistrySnapshot {
    entries: Vec<RegistryEntry>,
    by_code: HashMap<String, usize>,
    stats: RegistryStats,
}

impl RegistrySnapshot {
    fn build(records: Vec<CompanyRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        let mut entries = Vec::with_capacity(records.len());

        for (index, mut record) in records.into_iter().enumerate() {
            record.corp_code = record.corp_code.trim().to_string();
            if record.corp_code.is_empty() {
                return Err(FinancialsError::MissingCorpCode { index });
            }
            if !seen.insert(record.corp_code.clone()) {
                return Err(FinancialsError::DuplicateCorpCode {
                    corp_code: record.corp_code,
                });
            }
            record.stock_code = normalize_stock_code(record.stock_code.take());

            entries.push(RegistryEntry {
                name_lower: record.corp_name.to_lowercase(),
                eng_name_lower: record.corp_eng_name.to_lowercase(),
                record,
            });
        }

        entries.sort_by(|a, b| {
            a.record
                .corp_name
                .cmp(&b.record.corp_name)
                .then_with(|| a.record.corp_code.cmp(&b.record.corp_code))
        });

        let by_code = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.record.corp_code.clone(), i))
            .collect();

        let listed = entries.iter().filter(|e| e.record.is_listed()).count();
        let stats = RegistryStats {
            total_companies: entries.len(),
            listed_companies: listed,
            unlisted_companies: entries.len() - listed,
        };

        Ok(Self {
            entries,
            by_code,
            stats,
        })
    }
}

/// Shared handle to the company registry. Clones point at the same store.
#[derive(Clone, Default)]
pub struct CompanyRegistry {
    current: Arc<RwLock<Option<Arc<RegistrySnapshot>>>>,
}

impl CompanyRegistry {
    /// Create an empty registry; reads fail until the first `replace_all`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry already holding `records`
    pub fn with_records(records: Vec<CompanyRecord>) -> Result<Self> {
        let registry = Self::new();
        registry.replace_all(records)?;
        Ok(registry)
    }

    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Swap in a new set of companies, discarding the old one.
    /// Returns the number of companies now loaded.
    pub fn replace_all(&self, records: Vec<CompanyRecord>) -> Result<usize> {
        let snapshot = Arc::new(RegistrySnapshot::build(records)?);
        let count = snapshot.entries.len();

        // The slot only ever holds a complete snapshot, so a poisoned lock is safe to reuse.
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(snapshot);
        drop(current);

        info!("Company registry loaded with {} companies", count);
        Ok(count)
    }

    fn snapshot(&self) -> Result<Arc<RegistrySnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(FinancialsError::RegistryUnavailable)
    }

    /// Case-insensitive substring search over Korean and English names.
    ///
    /// Results are ranked exact name match first, then name prefix, then any
    /// other match, alphabetical by `corp_name` within a rank.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<CompanyRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FinancialsError::InvalidQuery);
        }
        let snapshot = self.snapshot()?;
        let needle = query.to_lowercase();

        let mut hits: Vec<(u8, &RegistryEntry)> = snapshot
            .entries
            .iter()
            .filter(|entry| {
                entry.name_lower.contains(&needle) || entry.eng_name_lower.contains(&needle)
            })
            .map(|entry| {
                let rank = if entry.record.corp_name == query {
                    0
                } else if entry.name_lower.starts_with(&needle) {
                    1
                } else {
                    2
                };
                (rank, entry)
            })
            .collect();

        // Entries are already in name order; a stable sort keeps it within each rank.
        hits.sort_by_key(|(rank, _)| *rank);

        let results: Vec<CompanyRecord> = hits
            .into_iter()
            .take(limit.max(1))
            .map(|(_, entry)| entry.record.clone())
            .collect();

        debug!("Search '{}' returned {} companies", query, results.len());
        Ok(results)
    }

    /// Exact lookup by corp_code
    pub fn get(&self, corp_code: &str) -> Result<Option<CompanyRecord>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .by_code
            .get(corp_code)
            .map(|&i| snapshot.entries[i].record.clone()))
    }

    /// Like `get`, but an unknown code is a `NotFound` error
    pub fn require(&self, corp_code: &str) -> Result<CompanyRecord> {
        self.get(corp_code)?
            .ok_or_else(|| FinancialsError::NotFound {
                corp_code: corp_code.to_string(),
            })
    }

    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(self.snapshot()?.stats)
    }

    /// Fuzzy name suggestions for a query that found nothing.
    ///
    /// Falls back to the first two characters of the query when the whole
    /// query matches no name even fuzzily.
    pub fn suggest_similar(&self, query: &str, limit: usize) -> Result<Vec<CompanyRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FinancialsError::InvalidQuery);
        }
        let snapshot = self.snapshot()?;

        let mut suggestions = fuzzy_rank(&snapshot, query);
        if suggestions.is_empty() {
            let short: String = query.chars().take(2).collect();
            if short != query {
                suggestions = fuzzy_rank(&snapshot, &short);
            }
        }

        Ok(suggestions
            .into_iter()
            .take(limit.max(1))
            .map(|(_, entry)| entry.record.clone())
            .collect())
    }
}

fn fuzzy_rank<'a>(snapshot: &'a RegistrySnapshot, pattern: &str) -> Vec<(i64, &'a RegistryEntry)> {
    let matcher = SkimMatcherV2::default();

    let mut scored: Vec<(i64, &RegistryEntry)> = snapshot
        .entries
        .iter()
        .filter_map(|entry| {
            let name_score = matcher.fuzzy_match(&entry.record.corp_name, pattern);
            let eng_score = matcher.fuzzy_match(&entry.record.corp_eng_name, pattern);
            name_score.max(eng_score).map(|score| (score, entry))
        })
        .collect();

    // Highest score first; name order breaks ties because the sort is stable.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
}
