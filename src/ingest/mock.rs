//! Static fixture loaders for the satellite and forecast time series.
//!
//! Three JSON files, each keyed by basin id:
//!
//! ```text
//! rainfall_mockdata.json   { "<basin>": { "daily": [..], "weekly_forecast": [..] } }
//! soil_moisture_mock.json  { "<basin>": { "daily": [..] } }
//! SPEI_mock.json           { "<basin>": { "monthly": [..] } }
//! ```
//!
//! Daily and weekly rows are `{ "date": "YYYY-MM-DD", "value": n }`; monthly
//! rows are `{ "month": "YYYY-MM", "value": n }`. Rows keep file order.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::model::{DailyValue, FetchError, MonthlyValue};

/// Fixture contents keyed by basin id.
pub type BasinFixture<T> = BTreeMap<String, T>;

/// GPM satellite rainfall (past days) and the weekly rain forecast.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BasinRainfall {
    #[serde(default)]
    pub daily: Vec<DailyValue>,
    #[serde(default)]
    pub weekly_forecast: Vec<DailyValue>,
}

/// SMAP satellite surface soil moisture, m³/m³.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BasinSoilMoisture {
    #[serde(default)]
    pub daily: Vec<DailyValue>,
}

/// Monthly SPEI drought index forecast.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BasinSpei {
    #[serde(default)]
    pub monthly: Vec<MonthlyValue>,
}

pub type RainfallFixture = BasinFixture<BasinRainfall>;
pub type SoilMoistureFixture = BasinFixture<BasinSoilMoisture>;
pub type SpeiFixture = BasinFixture<BasinSpei>;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_rainfall_fixture(json: &str) -> Result<RainfallFixture, FetchError> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_soil_moisture_fixture(json: &str) -> Result<SoilMoistureFixture, FetchError> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_spei_fixture(json: &str) -> Result<SpeiFixture, FetchError> {
    Ok(serde_json::from_str(json)?)
}

// ---------------------------------------------------------------------------
// Loading (fail soft)
// ---------------------------------------------------------------------------

fn read_fixture<T: DeserializeOwned>(path: &Path) -> Result<T, FetchError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Reads and decodes a fixture; a missing, unreadable or malformed file is
/// logged and yields `None`.
fn load_soft<T: DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
    match read_fixture(path) {
        Ok(fixture) => Some(fixture),
        Err(e) => {
            log::warn!("Error fetching {} mock data from {}: {}", what, path.display(), e);
            None
        }
    }
}

pub fn load_rainfall_fixture(path: impl AsRef<Path>) -> Option<RainfallFixture> {
    load_soft(path.as_ref(), "rainfall")
}

pub fn load_soil_moisture_fixture(path: impl AsRef<Path>) -> Option<SoilMoistureFixture> {
    load_soft(path.as_ref(), "soil moisture")
}

pub fn load_spei_fixture(path: impl AsRef<Path>) -> Option<SpeiFixture> {
    load_soft(path.as_ref(), "SPEI")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
