use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::reports::ReportDocument;

/// Pretty JSON rendering of the whole report document
pub fn to_json(doc: &ReportDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).context("Failed to serialize report")
}

pub fn write_json<P: AsRef<Path>>(doc: &ReportDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Writing report JSON: {:?}", path);
    std::fs::write(path, to_json(doc)?).with_context(|| format!("Failed to write {:?}", path))
}
