//! pt-BR value formatting shared by tables and dashboard shaping.

use chrono::{DateTime, NaiveDate};

/// Group the integer part with `.` and use `,` as decimal separator.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let negative = value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative { out.push('-'); }
    out.push_str(&grouped);
    if let Some(f) = frac_part {
        out.push(',');
        out.push_str(f);
    }
    out
}

/// `R$ 1.234,56`
pub fn format_currency(value: f64) -> String {
    with_currency_symbol(format_number(value, 2))
}

/// `R$ 4.107.036`, rounded to whole reais.
pub fn format_currency_whole(value: f64) -> String {
    with_currency_symbol(format_number(value, 0))
}

fn with_currency_symbol(n: String) -> String {
    match n.strip_prefix('-') {
        Some(abs) => format!("-R$ {}", abs),
        None => format!("R$ {}", n),
    }
}

/// `1,11%`
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{}%", format_number(value, decimals))
}

/// `15/01/2025`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Render an API date string as `dd/mm/yyyy`, passing unknown shapes through.
pub fn format_api_date(s: &str) -> String {
    parse_api_date(s).map(format_date).unwrap_or_else(|| s.to_string())
}
