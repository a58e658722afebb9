// Utility helpers for parsing and number formatting.
//
// This module centralizes the "dirty" CSV number handling so the rest of
// the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a traffic cell into a non-negative `f64`, forgiving the formatting
/// quirks common in analytics exports.
///
/// - Strips thousands separators like `","` and surrounding whitespace.
/// - Returns `None` for empty cells and placeholders such as `"-"`.
/// - Accepts exponent notation (`"1.2E+05"`) as written by spreadsheet re-saves.
/// - Rejects negative and non-finite values (`"-5"`, `"inf"`, `"NaN"`).
pub fn parse_traffic(s: &str) -> Option<f64> {
    let s = s.replace(',', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 {
        Some(v)
    } else {
        None
    }
}

/// Cleaned traffic text, or `None` when nothing is left after removing
/// separators and whitespace.
pub fn clean_traffic_text(s: &str) -> Option<String> {
    let cleaned = s.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Percentage change of `diff` against `baseline`.
///
/// Absent whenever the baseline is not strictly positive; never infinity
/// and never a fabricated zero.
pub fn percent_change(diff: f64, baseline: f64) -> Option<f64> {
    if baseline > 0.0 {
        Some(diff / baseline * 100.0)
    } else {
        None
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus locale-aware thousands separators
    // (e.g. `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Past u128 range the digits are printed ungrouped.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Signed percentage with two decimals, or `n/a` for an undefined baseline.
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) if r > 0.0 => format!("+{}%", format_number(r, 2)),
        Some(r) => format!("{}%", format_number(r, 2)),
        None => "n/a".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
