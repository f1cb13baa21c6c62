//! Display formatting and small numeric helpers.
//!
//! All output follows the Spanish (es-ES) conventions the dashboard is
//! written for: `.` groups thousands (only from five integer digits up),
//! `,` is the decimal separator, and units are separated by a no-break
//! space. Everything here is a pure function.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// No-break space placed between a number and its unit.
const NBSP: char = '\u{a0}';

/// Text shown for dates that cannot be parsed.
pub const INVALID_DATE: &str = "Fecha inválida";

/// Capitalized month names, used as chart labels.
pub const MONTHS: [&str; 12] = [
    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio",
    "Julio", "Agosto", "Septiembre", "Octubre", "Noviembre", "Diciembre",
];

const MONTHS_LONG: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio",
    "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
];

const MONTHS_SHORT: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun",
    "jul", "ago", "sept", "oct", "nov", "dic",
];

// ── Numbers ─────────────────────────────────────────────────────────

/// Whole euros, e.g. `12.345 €`.
pub fn format_currency(value: f64) -> String {
    format!("{}{NBSP}€", format_fixed(value, 0))
}

/// Up to three decimals, trailing zeros dropped, e.g. `12.345,5`.
pub fn format_number(value: f64) -> String {
    let fixed = format_fixed(value, 3);
    match fixed.split_once(',') {
        Some((int_part, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int_part.to_string()
            } else {
                format!("{int_part},{frac}")
            }
        }
        None => fixed,
    }
}

/// `value` is already a percentage (12.5 → `12,5 %`).
pub fn format_percentage(value: f64) -> String {
    format!("{}{NBSP}%", format_fixed(value, 1))
}

/// Relative change as a signed percentage with one decimal.
///
/// A zero baseline has no meaningful ratio and yields `+∞%`.
pub fn format_change(current: f64, previous: f64) -> String {
    if previous == 0.0 {
        return "+∞%".to_string();
    }
    let change = (current - previous) / previous.abs() * 100.0;
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{sign}{change:.1}%")
}

/// Direction of a change, for colouring stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Increase,
    Decrease,
    Neutral,
}

pub fn change_type(current: f64, previous: f64) -> ChangeType {
    if current > previous {
        ChangeType::Increase
    } else if current < previous {
        ChangeType::Decrease
    } else {
        ChangeType::Neutral
    }
}

/// Cut `text` to `max_chars` characters and append `...` if anything was cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

/// Fixed decimals with es-ES separators.
fn format_fixed(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let is_zero = raw.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    let grouped = group_thousands(int_part);
    match frac {
        Some(f) => format!("{sign}{grouped},{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// es-ES only groups integers of five or more digits.
fn group_thousands(digits: &str) -> String {
    if digits.len() < 5 {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

// ── Dates ───────────────────────────────────────────────────────────

/// Output shape for `format_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `15/01/2025`
    Numeric,
    /// `ene 2025`
    MonthYear,
    /// `15 de enero de 2025`
    Long,
}

/// Parse an ISO date or timestamp the backend sends.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Format an ISO date string; unparseable input yields `Fecha inválida`.
pub fn format_date(input: &str, style: DateStyle) -> String {
    match parse_date(input) {
        Some(date) => format_naive_date(date, style),
        None => INVALID_DATE.to_string(),
    }
}

pub fn format_date_short(input: &str) -> String {
    format_date(input, DateStyle::MonthYear)
}

pub fn format_date_long(input: &str) -> String {
    format_date(input, DateStyle::Long)
}

pub fn format_naive_date(date: NaiveDate, style: DateStyle) -> String {
    use chrono::Datelike;

    let month_idx = date.month0() as usize;
    match style {
        DateStyle::Numeric => date.format("%d/%m/%Y").to_string(),
        DateStyle::MonthYear => format!("{} {}", MONTHS_SHORT[month_idx], date.year()),
        DateStyle::Long => format!(
            "{:02} de {} de {}",
            date.day(),
            MONTHS_LONG[month_idx],
            date.year()
        ),
    }
}

/// True when both dates parse and `start <= end`.
pub fn validate_date_range(start: &str, end: &str) -> bool {
    match (parse_date(start), parse_date(end)) {
        (Some(s), Some(e)) => s <= e,
        _ => false,
    }
}

/// True when `date` is `today` or later.
pub fn is_date_in_future(date: &str, today: NaiveDate) -> bool {
    parse_date(date).is_some_and(|d| d >= today)
}

// ── Statistics ──────────────────────────────────────────────────────

/// Arithmetic mean; 0 for an empty slice.
pub fn calculate_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentage growth from `previous` to `current`; 0 when `previous` is 0.
pub fn calculate_growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous.abs() * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

/// Smallest and largest value, or `None` for an empty slice.
pub fn find_min_max(values: &[f64]) -> Option<MinMax> {
    let first = *values.first()?;
    Some(values.iter().fold(MinMax { min: first, max: first }, |acc, &v| MinMax {
        min: acc.min.min(v),
        max: acc.max.max(v),
    }))
}

pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
