use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::catalog::Catalog;

/// Load a catalog saved with [`write_catalog_json`]; products are validated on load
pub fn read_catalog_json<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let path = path.as_ref();
    info!("Reading catalog: {:?}", path);

    let content = fs::read_to_string(path).context("Failed to open catalog file")?;
    let catalog: Catalog =
        serde_json::from_str(&content).with_context(|| format!("Invalid catalog file {:?}", path))?;

    info!("Loaded {} products", catalog.len());
    Ok(catalog)
}

pub fn write_catalog_json<P: AsRef<Path>>(catalog: &Catalog, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(catalog)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Saved {} products to {:?}", catalog.len(), path);
    Ok(())
}
