pub mod image;

use anyhow::{anyhow, Result};
use chrono::Utc;

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Today's calendar date (UTC) as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

pub fn format_decimal(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_money(value: f64) -> String {
    format!("${}", format_decimal(value))
}

/// Parses the leading decimal number of `value`, accepting `,` as separator.
/// Trailing text is ignored, so `"12.50 EUR"` yields `12.5`.
pub fn parse_decimal(value: &str) -> Result<f64> {
    let normalized = value.trim().replace(',', ".");
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (idx, ch) in normalized.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }

    if !seen_digit {
        return Err(anyhow!("Parse decimal: no number in {:?}", value));
    }

    normalized[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .map_err(|e| anyhow!("Parse decimal: {}", e))
}
