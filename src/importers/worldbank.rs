//! Latest annual inflation per country from the World Bank indicators API
//!
//! Responses are cached as raw JSON under the user cache directory, one file
//! per country, and refreshed once they are older than a day. When a refresh
//! fails a stale cache file is used instead.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use super::values::float_to_decimal;

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
/// Consumer prices, annual %
pub const CPI_INDICATOR: &str = "FP.CPI.TOTL.ZG";
const CACHE_MAX_AGE_HOURS: u64 = 24;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Most recent non-empty observation for a country
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualInflation {
    pub country: String,
    pub year: String,
    /// Percent (4.5 means 4.5% a year)
    pub percent: Decimal,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WorldBankSource {
    base_url: String,
    cache_dir: PathBuf,
    max_age: Duration,
}

impl WorldBankSource {
    /// Source using the default API and the user cache directory
    pub fn new() -> Result<Self> {
        Ok(Self::with_cache_dir(default_cache_dir()?))
    }

    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: cache_dir.into(),
            max_age: Duration::from_secs(CACHE_MAX_AGE_HOURS * 3600),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Latest annual CPI inflation for an ISO country code ("US", "TUR")
    pub fn latest_annual_inflation(&self, country: &str) -> Result<AnnualInflation> {
        let code = normalize_country(country)?;
        let body = self.response_body(&code)?;
        let latest = parse_latest(&body, &code)?;
        info!(
            "World Bank inflation for {}: {}% ({})",
            latest.country, latest.percent, latest.year
        );
        Ok(latest)
    }

    pub fn url_for(&self, code: &str) -> String {
        format!(
            "{}/country/{}/indicator/{}?format=json&per_page=100",
            self.base_url, code, CPI_INDICATOR
        )
    }

    fn response_body(&self, code: &str) -> Result<String> {
        let cache_path = self.cache_dir.join(format!("{}.json", code));

        if cache_path.exists() && !cache_is_stale(&cache_path, self.max_age)? {
            debug!("Using cached World Bank response: {:?}", cache_path);
            return fs::read_to_string(&cache_path).context("Failed to read World Bank cache");
        }

        match self.download(code) {
            Ok(body) => {
                self.store(&cache_path, &body)?;
                Ok(body)
            }
            Err(e) if cache_path.exists() => {
                warn!("World Bank refresh failed, using stale cache: {:#}", e);
                fs::read_to_string(&cache_path).context("Failed to read World Bank cache")
            }
            Err(e) => Err(e),
        }
    }

    fn download(&self, code: &str) -> Result<String> {
        let url = self.url_for(code);
        info!("Downloading World Bank inflation: {}", url);

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to download World Bank inflation for '{}'", code))?
            .error_for_status()
            .context("World Bank API returned error status")?
            .text()
            .context("Failed to read World Bank response")
    }

    fn store(&self, cache_path: &Path, body: &str) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).context("Failed to create World Bank cache directory")?;
        let tmp_path = cache_path.with_extension("json.tmp");
        fs::write(&tmp_path, body).context("Failed to write World Bank cache")?;
        fs::rename(&tmp_path, cache_path).context("Failed to finalize World Bank cache file")?;
        Ok(())
    }
}

pub fn default_cache_dir() -> Result<PathBuf> {
    let cache_dir = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::cache_home)
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(cache_dir.join("priceforecast").join("worldbank"))
}

/// Lowercased ISO2/ISO3 code
pub fn normalize_country(country: &str) -> Result<String> {
    let code = country.trim().to_ascii_lowercase();
    if !(2..=3).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("Invalid country code '{}': expected 2 or 3 letters", country.trim());
    }
    Ok(code)
}

/// Pick the newest year with a value out of an indicator response.
///
/// The body is `[page_info, observations]`; errors come back as
/// `[{"message": [...]}]` and countries without data as `[page_info, null]`.
pub fn parse_latest(body: &str, country: &str) -> Result<AnnualInflation> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("World Bank response is not valid JSON")?;

    if let Some(message) = value.get(0).and_then(|v| v.get("message")) {
        bail!("World Bank API error for '{}': {}", country, message);
    }

    let observations: Vec<Observation> = match value.get(1) {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .context("Unexpected World Bank observation format")?,
        _ => Vec::new(),
    };

    let (year, raw) = observations
        .into_iter()
        .filter_map(|o| o.value.map(|v| (o.date, v)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .ok_or_else(|| anyhow!("No inflation data for country '{}'", country.to_uppercase()))?;

    Ok(AnnualInflation {
        country: country.to_uppercase(),
        year,
        percent: float_to_decimal(raw)?,
    })
}

fn cache_is_stale(path: &Path, max_age: Duration) -> Result<bool> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .context("Failed to read World Bank cache mtime")?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::from_secs(0));
    Ok(age > max_age)
}
