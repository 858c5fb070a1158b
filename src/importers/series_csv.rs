use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::values::{parse_period, parse_rate};
use crate::inflation::InflationSeries;

/// Parse a two-column inflation CSV (period, rate).
///
/// Comma or semicolon delimited; semicolon files may use a decimal comma.
/// Rates are fractions ("0.005") or percentages ("0.5%").
pub fn import_series_csv<P: AsRef<Path>>(file_path: P) -> Result<InflationSeries> {
    let path = file_path.as_ref();
    info!("Parsing inflation CSV file: {:?}", path);

    let content = fs::read_to_string(path).context("Failed to open CSV file")?;
    parse_series_str(&content)
}

pub(crate) fn parse_series_str(content: &str) -> Result<InflationSeries> {
    let first_line = content.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains(';') { b';' } else { b',' };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let (period_idx, rate_idx) = find_columns(&headers)?;

    let mut entries = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.context("Failed to read CSV record")?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let period = record
            .get(period_idx)
            .ok_or_else(|| anyhow!("Line {}: missing period", line))
            .and_then(parse_period)
            .with_context(|| format!("Line {}", line))?;
        let rate = record
            .get(rate_idx)
            .ok_or_else(|| anyhow!("Line {}: missing rate", line))
            .and_then(parse_rate)
            .with_context(|| format!("Line {}", line))?;

        entries.push((period, rate));
    }

    info!("Successfully parsed {} inflation entries from CSV", entries.len());
    Ok(InflationSeries::new(entries)?)
}

fn find_columns(headers: &StringRecord) -> Result<(usize, usize)> {
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    let period = lower
        .iter()
        .position(|h| h.contains("period") || h.contains("month"));
    let rate = lower
        .iter()
        .position(|h| h.contains("rate") || h.contains("inflation"));

    match (period, rate) {
        (Some(p), Some(r)) => Ok((p, r)),
        _ => Err(anyhow!(
            "CSV must have period and rate columns (found: {:?})",
            lower
        )),
    }
}
