//! Financial statement normalization pipeline.
//!
//! Raw OpenDART line items are classified into balance sheet and income
//! statement sequences, the headline accounts are pulled out as
//! year-over-year metrics, and a few ratios are derived from those metrics.
//! Everything here is pure and synchronous.

pub mod amount_parser;
pub mod key_metrics;
pub mod line_item_classifier;
pub mod ratio_calculator;

pub use amount_parser::parse_amount;
pub use key_metrics::extract_metrics;
pub use line_item_classifier::{classify, partition_statements};
pub use ratio_calculator::derive_ratios;

use serde_json::Value;
use tracing::debug;

use crate::error::{FinancialsError, Result};
use crate::models::{KeyMetrics, ProcessedFinancials, ProcessingSummary, RawLineItem};

/// Turn raw filing records into classified statements, metrics and ratios.
///
/// Malformed amount fields are recovered as `0` and counted in the summary;
/// an empty input produces an empty result.
pub fn process_financial_data(raw_items: &[RawLineItem]) -> ProcessedFinancials {
    let mut amount_parse_failures = 0;
    let classified: Vec<_> = raw_items
        .iter()
        .map(|raw| {
            let (item, failures) = line_item_classifier::classify_with_diagnostics(raw);
            amount_parse_failures += failures;
            item
        })
        .collect();

    let partition = partition_statements(classified);

    let metrics = extract_metrics(
        partition
            .balance_sheet
            .iter()
            .chain(partition.income_statement.iter()),
    );
    let ratios = derive_ratios(&metrics);

    let summary = ProcessingSummary {
        total_items: raw_items.len(),
        balance_sheet_items: partition.balance_sheet.len(),
        income_statement_items: partition.income_statement.len(),
        other_items: partition.other_items,
        amount_parse_failures,
    };

    debug!(
        "Processed {} line items: {} BS, {} IS, {} metrics",
        summary.total_items,
        summary.balance_sheet_items,
        summary.income_statement_items,
        metrics.len()
    );

    ProcessedFinancials {
        balance_sheet: partition.balance_sheet,
        income_statement: partition.income_statement,
        key_metrics: KeyMetrics { metrics, ratios },
        summary,
    }
}

/// Read raw line items from JSON.
///
/// Accepts either a bare array of records or an OpenDART response envelope
/// with a `list` array. A `null` or non-object element is rejected with
/// `MalformedRecord`.
pub fn parse_raw_items(json: &str) -> Result<Vec<RawLineItem>> {
    let value: Value = serde_json::from_str(json)?;

    let elements = match value {
        Value::Array(elements) => elements,
        Value::Object(mut envelope) => match envelope.remove("list") {
            Some(Value::Array(elements)) => elements,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(FinancialsError::Json(serde::de::Error::custom(
                    "`list` must be an array of line items",
                )))
            }
        },
        _ => {
            return Err(FinancialsError::Json(serde::de::Error::custom(
                "expected an array of line items or a response envelope",
            )))
        }
    };

    raw_items_from_values(elements)
}

pub fn raw_items_from_values(values: Vec<Value>) -> Result<Vec<RawLineItem>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            if !value.is_object() {
                return Err(FinancialsError::MalformedRecord { index });
            }
            Ok(serde_json::from_value(value)?)
        })
        .collect()
}
