// Import module - source workbooks, inflation CSVs, World Bank rates and catalog backups

pub mod catalog_json;
pub mod series_csv;
pub mod source_excel;
pub mod template;
pub mod values;
pub mod worldbank;

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

use crate::catalog::Catalog;
use crate::inflation::InflationSeries;

pub use catalog_json::{read_catalog_json, write_catalog_json};
pub use series_csv::import_series_csv;
pub use source_excel::{parse_series_workbook, parse_source_workbook};
pub use template::write_template;
pub use worldbank::{AnnualInflation, WorldBankSource};

/// Everything a forecast run needs, as read from the input files
#[derive(Debug, Clone)]
pub struct SourceData {
    pub catalog: Catalog,
    pub series: InflationSeries,
}

/// Import catalog and series from a source workbook
pub fn import_workbook<P: AsRef<Path>>(path: P) -> Result<SourceData> {
    let path = path.as_ref();
    match extension_of(path)?.as_str() {
        "xlsx" | "xlsm" => parse_source_workbook(path),
        other => Err(anyhow!(
            "Unsupported source format: {}. Supported formats: .xlsx, .xlsm",
            other
        )),
    }
}

/// Import an inflation series on its own (auto-detects Excel vs CSV)
pub fn import_series<P: AsRef<Path>>(path: P) -> Result<InflationSeries> {
    let path = path.as_ref();
    let extension = extension_of(path)?;

    info!("Importing inflation series: {:?} (type: {})", path, extension);

    match extension.as_str() {
        "xlsx" | "xlsm" => parse_series_workbook(path),
        "csv" | "txt" => import_series_csv(path),
        _ => Err(anyhow!(
            "Unsupported file format: {}. Supported formats: .xlsx, .xlsm, .csv",
            extension
        )),
    }
}

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| anyhow!("File has no extension: {:?}", path))
}
