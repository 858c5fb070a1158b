//! User configuration (`config.toml`)
//!
//! Only report presentation lives here; forecast inputs always come from the
//! command line. A missing file means defaults.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::reports::{ChartLayout, ReportOptions};

const APP_DIR: &str = "priceforecast";
const CONFIG_FILENAME: &str = "config.toml";

/// Largest number of display decimals accepted from config or flags
pub const MAX_DECIMALS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub decimals: u32,
    pub chart_layout: ChartLayout,
    pub report_title: Option<String>,
    /// Directory for exports given as bare file names
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = ReportOptions::default();
        Self {
            decimals: defaults.decimals,
            chart_layout: defaults.chart_layout,
            report_title: None,
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let Some(default_path) = default_config_path() else {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                };
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    debug!("No config file at {:?}, using defaults", default_path);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading config: {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        if config.decimals > MAX_DECIMALS {
            return Err(anyhow!(
                "decimals must be between 0 and {} (got {})",
                MAX_DECIMALS,
                config.decimals
            ));
        }
        Ok(config)
    }

    pub fn report_options(&self) -> ReportOptions {
        let mut options = ReportOptions {
            chart_layout: self.chart_layout,
            decimals: self.decimals,
            ..ReportOptions::default()
        };
        if let Some(title) = &self.report_title {
            options.title = title.clone();
        }
        options
    }

    /// Place a bare output file name under `output_dir`; other paths are kept
    pub fn resolve_output(&self, path: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if path.parent().map_or(true, |p| p.as_os_str().is_empty()) => {
                dir.join(path)
            }
            _ => path.to_path_buf(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::default().decimals, 2);
    }

    #[test]
    fn test_parse_all_fields() {
        let config = AppConfig::parse(
            r#"
decimals = 3
chart_layout = "combined"
report_title = "Grocery prices"
output_dir = "/tmp/reports"
"#,
        )
        .unwrap();

        assert_eq!(config.decimals, 3);
        assert_eq!(config.chart_layout, ChartLayout::Combined);

        let options = config.report_options();
        assert_eq!(options.title, "Grocery prices");
        assert_eq!(options.decimals, 3);
        assert_eq!(options.chart_layout, ChartLayout::Combined);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::parse("decimals = 11").is_err());
        assert!(AppConfig::parse("chart_layout = \"pie\"").is_err());
        assert!(AppConfig::parse("colour = true").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "decimals = 0\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.decimals, 0);
        assert_eq!(config.chart_layout, ChartLayout::PerProduct);
    }

    #[test]
    fn test_resolve_output() {
        let config = AppConfig {
            output_dir: Some(PathBuf::from("/srv/out")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolve_output(Path::new("report.xlsx")),
            PathBuf::from("/srv/out/report.xlsx")
        );
        assert_eq!(
            config.resolve_output(Path::new("sub/report.xlsx")),
            PathBuf::from("sub/report.xlsx")
        );
        assert_eq!(
            AppConfig::default().resolve_output(Path::new("report.xlsx")),
            PathBuf::from("report.xlsx")
        );
    }
}
