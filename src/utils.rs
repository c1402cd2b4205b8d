use chrono::NaiveDate;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Days after which the stored company directory is reloaded
pub const DIRECTORY_MAX_AGE_DAYS: i64 = 30;

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    // A subscriber may already be installed (tests, embedding binaries)
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Format a won amount with thousands separators, e.g. `-1,234,567`
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Whether a directory loaded on `last_loaded` should be refreshed on `today`
pub fn is_directory_stale(last_loaded: Option<NaiveDate>, today: NaiveDate, max_age_days: i64) -> bool {
    match last_loaded {
        Some(date) => (today - date).num_days() > max_age_days,
        None => true,
    }
}
