//! cmwater Water API client.
//!
//! Handles fetching and JSON parsing for the three Chiang Mai water-network
//! endpoints:
//!   https://airvista.soc.cmu.ac.th:3843/cmwater/v1/Water/getReservoirData
//!   https://airvista.soc.cmu.ac.th:3843/cmwater/v1/Water/getDamData
//!   https://airvista.soc.cmu.ac.th:3843/cmwater/v1/Water/getWaterData
//!
//! Every endpoint wraps its rows in `{ "data": [...] }`. See `fixtures.rs` for
//! annotated examples of the response structure.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::model::{DamRecord, FetchError, Reading, ReservoirRecord, WaterStationRecord};

// ---------------------------------------------------------------------------
// Serde structures for the API envelope
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<Vec<T>>,
}

#[derive(Deserialize)]
struct ReservoirRow {
    #[serde(rename = "StationName", default)]
    station_name: String,
    #[serde(rename = "PercentStorage", default)]
    percent_storage: Reading,
}

#[derive(Deserialize)]
struct DamRow {
    #[serde(rename = "StationName", default)]
    station_name: String,
    #[serde(rename = "PercentStorage", default)]
    percent_storage: Reading,
    #[serde(rename = "TextLevel", default)]
    text_level: Option<String>,
}

#[derive(Deserialize)]
struct WaterRow {
    #[serde(rename = "StationName", default)]
    station_name: String,
    /// Arrives as a number on some deployments and a string on others.
    #[serde(rename = "DiffWlBank", default)]
    diff_wl_bank: serde_json::Value,
    #[serde(rename = "TextLevel", default)]
    text_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Unwraps the `{ data: [...] }` envelope. Missing or null `data` is an
/// empty list. Rows are kept as sent, including ones without a station name.
fn parse_envelope<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, FetchError> {
    let envelope: Envelope<T> = serde_json::from_str(json)?;
    Ok(envelope.data.unwrap_or_default())
}

/// Parses a reservoir endpoint response body.
///
/// # Errors
/// `FetchError::Decode` for malformed JSON or a non-envelope shape.
pub fn parse_reservoir_response(json: &str) -> Result<Vec<ReservoirRecord>, FetchError> {
    let rows: Vec<ReservoirRow> = parse_envelope(json)?;
    Ok(rows
        .into_iter()
        .map(|r| ReservoirRecord {
            name: r.station_name,
            val: r.percent_storage,
        })
        .collect())
}

/// Parses a dam endpoint response body.
pub fn parse_dam_response(json: &str) -> Result<Vec<DamRecord>, FetchError> {
    let rows: Vec<DamRow> = parse_envelope(json)?;
    Ok(rows
        .into_iter()
        .map(|r| DamRecord {
            name: r.station_name,
            val: r.percent_storage,
            text_level: r.text_level.unwrap_or_default(),
        })
        .collect())
}

/// Parses a water-station endpoint response body. `DiffWlBank` is accepted
/// as a number or a numeric string; anything else becomes `Reading::NoData`.
pub fn parse_water_response(json: &str) -> Result<Vec<WaterStationRecord>, FetchError> {
    let rows: Vec<WaterRow> = parse_envelope(json)?;
    Ok(rows
        .into_iter()
        .map(|r| WaterStationRecord {
            name: r.station_name,
            val: Reading::from_json(&r.diff_wl_bank),
            text_level: r.text_level.unwrap_or_default(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Builds the shared blocking client used for all three endpoints.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::blocking::Client, FetchError> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?)
}

/// GETs `url` and returns the body, treating any non-2xx status as an error.
fn fetch_body(client: &reqwest::blocking::Client, url: &str) -> Result<String, FetchError> {
    log::debug!("fetching {}", url);

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }

    Ok(response.text()?)
}

/// Fetch-then-parse with the fail-soft policy: any error is logged and the
/// caller gets an empty list.
fn fetch_soft<T>(
    client: &reqwest::blocking::Client,
    url: &str,
    what: &str,
    parse: fn(&str) -> Result<Vec<T>, FetchError>,
) -> Vec<T> {
    match fetch_body(client, url).and_then(|body| parse(&body)) {
        Ok(records) => {
            log::info!("{}: {} records", what, records.len());
            records
        }
        Err(e) => {
            log::warn!("Error fetching {} data: {}", what, e);
            Vec::new()
        }
    }
}

/// Fetches reservoir storage. Never fails; returns an empty list on error.
pub fn fetch_reservoir_data(client: &reqwest::blocking::Client, url: &str) -> Vec<ReservoirRecord> {
    fetch_soft(client, url, "reservoir", parse_reservoir_response)
}

/// Fetches dam storage and category labels. Never fails.
pub fn fetch_dam_data(client: &reqwest::blocking::Client, url: &str) -> Vec<DamRecord> {
    fetch_soft(client, url, "dam", parse_dam_response)
}

/// Fetches water-station levels and category labels. Never fails.
pub fn fetch_water_data(client: &reqwest::blocking::Client, url: &str) -> Vec<WaterStationRecord> {
    fetch_soft(client, url, "water station", parse_water_response)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
