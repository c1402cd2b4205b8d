use tracing::debug;

use super::amount_parser::parse_amount;
use crate::models::{
    NormalizedLineItem, PeriodAmount, RawLineItem, StatementDivision, StatementType,
};

pub const DEFAULT_CURRENCY: &str = "KRW";

/// Balance sheet and income statement items, each in presentation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementPartition {
    pub balance_sheet: Vec<NormalizedLineItem>,
    pub income_statement: Vec<NormalizedLineItem>,
    pub other_items: usize,
}

/// Classify one raw record
pub fn classify(raw: &RawLineItem) -> NormalizedLineItem {
    classify_with_diagnostics(raw).0
}

/// Classify one raw record and report how many amount fields fell back to 0
pub fn classify_with_diagnostics(raw: &RawLineItem) -> (NormalizedLineItem, usize) {
    let account_name = raw.account_nm.clone().unwrap_or_default();
    let mut failures = 0;

    let current_amount = period_amount(raw.thstrm_amount.as_deref(), &account_name, &mut failures);
    let previous_amount = period_amount(raw.frmtrm_amount.as_deref(), &account_name, &mut failures);

    let item = NormalizedLineItem {
        statement_division: StatementDivision::from_code(raw.fs_div.as_deref().unwrap_or_default()),
        division_name: raw.fs_nm.clone().unwrap_or_default(),
        statement_type: StatementType::from_code(raw.sj_div.as_deref().unwrap_or_default()),
        statement_name: raw.sj_nm.clone().unwrap_or_default(),
        current_period: PeriodAmount {
            name: raw.thstrm_nm.clone().unwrap_or_default(),
            date: raw.thstrm_dt.clone().unwrap_or_default(),
            amount: current_amount,
        },
        previous_period: PeriodAmount {
            name: raw.frmtrm_nm.clone().unwrap_or_default(),
            date: raw.frmtrm_dt.clone().unwrap_or_default(),
            amount: previous_amount,
        },
        currency: raw
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        order: parse_order(raw.ord.as_deref()),
        account_name,
    };

    (item, failures)
}

/// Split classified items by statement and sort each by display order.
/// `Vec::sort_by_key` is stable, so equal orders keep their input order.
pub fn partition_statements<I>(items: I) -> StatementPartition
where
    I: IntoIterator<Item = NormalizedLineItem>,
{
    let mut partition = StatementPartition::default();

    for item in items {
        match item.statement_type {
            StatementType::BalanceSheet => partition.balance_sheet.push(item),
            StatementType::IncomeStatement => partition.income_statement.push(item),
            StatementType::Other => partition.other_items += 1,
        }
    }

    partition.balance_sheet.sort_by_key(|item| item.order);
    partition.income_statement.sort_by_key(|item| item.order);
    partition
}

fn period_amount(raw: Option<&str>, account_name: &str, failures: &mut usize) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };

    match parse_amount(raw) {
        Ok(amount) => amount,
        Err(e) => {
            debug!("{} for account '{}', using 0", e, account_name);
            *failures += 1;
            0
        }
    }
}

fn parse_order(raw: Option<&str>) -> i64 {
    raw.and_then(|ord| ord.trim().parse().ok()).unwrap_or(0)
}
