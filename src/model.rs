//! Shared data types for the water situation report.
//!
//! Records (`*Record`) are what the remote and mock sources return; they live
//! for one fetch cycle. Entries (`*Entry`) are the reconciled, slot-aligned
//! values the report renders. A value that is missing anywhere downstream is
//! a `Reading::NoData`, shown as the `"-"` sentinel.

use chrono::NaiveDate;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

use crate::targets::StationSlot;

/// Text the UI shows for a value that has no data.
pub const NO_DATA_SENTINEL: &str = "-";

/// Default category label for a dam with no matching record.
pub const DAM_NO_DATA_LABEL: &str = "ไม่มีข้อมูล";

// ---------------------------------------------------------------------------
// Reading: number | "-"
// ---------------------------------------------------------------------------

/// A reconciled value: either a measured number or the no-data sentinel.
///
/// Serializes as a JSON number or the string `"-"`, so JSON consumers see the
/// same tagged union the report page does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Measured(f64),
    NoData,
}

impl Reading {
    /// Returns the number, or `None` for the sentinel.
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Measured(v) => Some(*v),
            Reading::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Reading::NoData)
    }

    /// Parses a loosely-typed source value. Numbers pass through; numeric
    /// strings are parsed; null, empty, `"-"` and anything else is `NoData`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(Reading::NoData, Reading::Measured),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_or(Reading::NoData, Reading::Measured),
            _ => Reading::NoData,
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Reading::NoData
    }
}

impl From<f64> for Reading {
    fn from(v: f64) -> Self {
        Reading::Measured(v)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Measured(v) => write!(f, "{}", v),
            Reading::NoData => f.write_str(NO_DATA_SENTINEL),
        }
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Measured(v) => serializer.serialize_f64(*v),
            Reading::NoData => serializer.serialize_str(NO_DATA_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReadingVisitor;

        impl<'de> Visitor<'de> for ReadingVisitor {
            type Value = Reading;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number, a numeric string, \"-\" or null")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Reading, E> {
                Ok(Reading::Measured(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Reading, E> {
                Ok(Reading::Measured(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Reading, E> {
                Ok(Reading::Measured(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Reading, E> {
                Ok(v.trim().parse::<f64>().map_or(Reading::NoData, Reading::Measured))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Reading, E> {
                Ok(Reading::NoData)
            }

            fn visit_none<E: de::Error>(self) -> Result<Reading, E> {
                Ok(Reading::NoData)
            }
        }

        deserializer.deserialize_any(ReadingVisitor)
    }
}

// ---------------------------------------------------------------------------
// Source records (one fetch cycle)
// ---------------------------------------------------------------------------

/// Reservoir storage as reported by the reservoir endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirRecord {
    pub name: String,
    /// Percent of capacity currently stored.
    pub val: Reading,
}

/// Dam storage plus the agency's category label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamRecord {
    pub name: String,
    pub val: Reading,
    pub text_level: String,
}

/// Water-station level relative to the bank, plus category label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterStationRecord {
    pub name: String,
    pub val: Reading,
    pub text_level: String,
}

/// One daily (or weekly) time-series value from a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// One monthly time-series value, `month` formatted `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyValue {
    pub month: String,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Reconciled entries (one render cycle)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirEntry {
    pub name: String,
    pub val: Reading,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamEntry {
    pub name: String,
    pub val: Reading,
    pub text_level: String,
}

/// A water-station slot joined with its matching record, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationEntry {
    pub slot: &'static StationSlot,
    pub val: Reading,
    pub text_level: String,
}

impl StationEntry {
    pub fn name(&self) -> &'static str {
        self.slot.name
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure while fetching or decoding a data source. Never escapes the
/// fail-soft `fetch_*` / `load_*` wrappers.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Status(u16),
    #[error("JSON decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("could not read fixture: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("an export is already in progress")]
    Busy,
    #[error("report assets are not ready: {0}")]
    Assets(String),
    #[error("rasterization failed: {0}")]
    Rasterize(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unknown basin '{0}'")]
    UnknownBasin(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Server(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
