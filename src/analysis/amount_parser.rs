use crate::error::{FinancialsError, Result};

/// Sentinel OpenDART uses for "no value"
pub const MISSING_AMOUNT: &str = "-";

/// Parse a filing amount such as `"1,234,567"` or `"-52,000"`.
///
/// `"-"` and empty strings mean "no value" and yield `0`. Grouping commas are
/// dropped; anything else that is not a signed integer is a `Parse` error,
/// which callers recover from locally.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == MISSING_AMOUNT {
        return Ok(0);
    }

    let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
    digits.parse::<i64>().map_err(|_| FinancialsError::Parse {
        raw: raw.to_string(),
    })
}
