//! Cell value parsing shared by the spreadsheet and CSV importers

use anyhow::{anyhow, bail, Context, Result};
use calamine::Data;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::inflation::Period;

/// Optional currency code or symbol around a number: "USD 12.50", "$1,234", "12.5 EUR"
static PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{3})?\s*([$¥£€₺﷼]|kr)?\s*([-+]?[\d,]*\.?\d+)\s*([A-Za-z]{3})?$")
        .expect("price pattern is valid")
});

/// Parse a price, ignoring any currency code or symbol.
///
/// Commas are thousands separators; the dot is the decimal separator.
pub fn parse_price(text: &str) -> Result<Decimal> {
    let cleaned = text.replace('\u{00A0}', " ");
    let cleaned = cleaned.trim();

    let caps = PRICE_PATTERN
        .captures(cleaned)
        .ok_or_else(|| anyhow!("Invalid price: '{}'", text))?;
    let number = caps
        .get(3)
        .map(|m| m.as_str().replace(',', ""))
        .ok_or_else(|| anyhow!("Invalid price: '{}'", text))?;

    Decimal::from_str(&number).with_context(|| format!("Invalid price: '{}'", text))
}

/// Parse an inflation rate given as a fraction ("0.05") or percentage ("5%").
pub fn parse_rate(text: &str) -> Result<Decimal> {
    let cleaned = text.trim().replace(',', ".");
    if let Some(pct) = cleaned.strip_suffix('%') {
        let value = Decimal::from_str(pct.trim())
            .with_context(|| format!("Invalid rate: '{}'", text))?;
        return Ok(value / Decimal::ONE_HUNDRED);
    }
    Decimal::from_str(&cleaned).with_context(|| format!("Invalid rate: '{}'", text))
}

pub fn parse_period(text: &str) -> Result<Period> {
    let trimmed = text.trim();
    let value = trimmed
        .strip_suffix(".0")
        .unwrap_or(trimmed)
        .parse::<u32>()
        .with_context(|| format!("Invalid period: '{}'", text))?;
    Ok(Period(value))
}

/// Exact decimal for a float cell, via its shortest round-trip text
pub fn float_to_decimal(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        bail!("Invalid number: {}", value);
    }
    Decimal::from_str(&value.to_string()).with_context(|| format!("Invalid number: {}", value))
}

pub fn cell_price(cell: &Data) -> Result<Decimal> {
    match cell {
        Data::Int(i) => Ok(Decimal::from(*i)),
        Data::Float(f) => float_to_decimal(*f),
        Data::String(s) => parse_price(s),
        other => bail!("Invalid price cell: {:?}", other),
    }
}

pub fn cell_rate(cell: &Data) -> Result<Decimal> {
    match cell {
        Data::Int(i) => Ok(Decimal::from(*i)),
        Data::Float(f) => float_to_decimal(*f),
        Data::String(s) => parse_rate(s),
        other => bail!("Invalid rate cell: {:?}", other),
    }
}

pub fn cell_period(cell: &Data) -> Result<Period> {
    match cell {
        Data::Int(i) => u32::try_from(*i)
            .map(Period)
            .map_err(|_| anyhow!("Invalid period: {}", i)),
        Data::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
            Ok(Period(*f as u32))
        }
        Data::String(s) => parse_period(s),
        other => bail!("Invalid period cell: {:?}", other),
    }
}

pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}
