//! Amount parsing and display helpers.
//!
//! Ledger cells arrive from spreadsheets in whatever shape the operator typed
//! them, so [`normalize`] accepts numbers, Brazilian (`1.234,56`) or
//! international (`1,234.56`) text, currency prefixes and stray symbols, and
//! never fails.

use serde::{Deserialize, Serialize};

const CURRENCY_MARKERS: [&str; 2] = ["R$", "r$"];

/// A raw cell value as read from the ledger store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawAmount {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Number(value as f64)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

impl<T: Into<RawAmount>> From<Option<T>> for RawAmount {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawAmount::Missing)
    }
}

/// Converts a raw cell into a canonical amount. Unparsable input yields `0.0`.
pub fn normalize<R: Into<RawAmount>>(raw: R) -> f64 {
    match raw.into() {
        RawAmount::Missing => 0.0,
        RawAmount::Number(value) if value.is_finite() => value,
        RawAmount::Number(_) => 0.0,
        RawAmount::Text(text) => normalize_text(&text),
    }
}

fn normalize_text(raw: &str) -> f64 {
    let mut text = raw.to_string();
    for marker in CURRENCY_MARKERS {
        text = text.replace(marker, "");
    }
    text.retain(|c| !c.is_whitespace());

    if let Some(comma) = text.rfind(',') {
        match text.rfind('.') {
            // Period after the last comma: international grouping.
            Some(period) if period > comma => text.retain(|c| c != ','),
            Some(_) => {
                text.retain(|c| c != '.');
                text = text.replace(',', ".");
            }
            None => text = text.replace(',', "."),
        }
    }

    text.retain(|c| c.is_ascii_digit() || c == '.' || c == '-');
    if text.is_empty() {
        return 0.0;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Separator preferences used when rendering amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub currency_symbol: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "pt-BR".into(),
            currency_symbol: "R$".into(),
            decimal_separator: ',',
            grouping_separator: '.',
        }
    }
}

pub fn format_number(locale: &LocaleConfig, value: f64, precision: u8) -> String {
    let body = format!("{:.*}", precision as usize, value.abs());
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (body.as_str(), None),
    };
    let mut rendered = group_digits(int_part, locale.grouping_separator);
    if let Some(frac) = frac_part {
        rendered.push(locale.decimal_separator);
        rendered.push_str(frac);
    }
    if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
        rendered.insert(0, '-');
    }
    rendered
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// Renders an amount with the locale's currency symbol, e.g. `R$ 1.234,56`.
pub fn format_currency(locale: &LocaleConfig, value: f64) -> String {
    format!("{} {}", locale.currency_symbol, format_number(locale, value, 2))
}

/// Brazilian real rendering used throughout reports.
pub fn format_brl(value: f64) -> String {
    format_currency(&LocaleConfig::default(), value)
}

/// Plain two-decimal rendering used inside billing status labels (`R$ 20.00`).
pub fn format_plain(value: f64) -> String {
    format!("R$ {:.2}", value)
}
