//! Test fixtures: representative payloads from the cmwater Water API and the
//! time-series mock files.
//!
//! API response shape (all three endpoints):
//!   { "data": [ { "StationName": ..., ... }, ... ] }
//!
//! - getReservoirData: `PercentStorage` (number, may be null)
//! - getDamData:       `PercentStorage` + `TextLevel` (Thai category label)
//! - getWaterData:     `DiffWlBank` (number OR string) + `TextLevel`
//!
//! Extra fields the API sends (ids, timestamps, volumes) are kept in the
//! fixtures so the parser is exercised against the real envelope.

/// Three reservoirs, one with a null percentage (gauge offline).
pub(crate) fn fixture_reservoir_json() -> &'static str {
    r#"{
      "status": "success",
      "data": [
        { "StationID": 101, "StationName": "อ่างเก็บน้ำแม่แหลงหลวง", "PercentStorage": 45.32, "Volume": 1.82, "DataDate": "2025-11-01" },
        { "StationID": 102, "StationName": "อ่างเก็บน้ำห้วยเดื่อ", "PercentStorage": 8, "Volume": 0.21, "DataDate": "2025-11-01" },
        { "StationID": 109, "StationName": "อ่างเก็บน้ำโป่งจ้อ", "PercentStorage": null, "Volume": null, "DataDate": "2025-10-30" }
      ]
    }"#
}

/// Both large dams, with API names longer than the report's target names
/// (the substring rule must still match them).
pub(crate) fn fixture_dam_json() -> &'static str {
    r#"{
      "data": [
        { "StationName": "เขื่อนแม่งัดสมบูรณ์ชล", "PercentStorage": 71.6, "TextLevel": "น้ำมาก" },
        { "StationName": "เขื่อนแม่กวงอุดมธารา", "PercentStorage": 28.4, "TextLevel": "น้ำน้อย" }
      ]
    }"#
}

/// Station levels as a numeric string, a number, and null.
pub(crate) fn fixture_water_json() -> &'static str {
    r#"{
      "data": [
        { "StationName": "สถานีแม่แตง (P.4A)", "DiffWlBank": "-2.15", "TextLevel": "น้ำปกติ" },
        { "StationName": "สะพานนวรัฐ", "DiffWlBank": 0.8, "TextLevel": "น้ำล้นตลิ่ง" },
        { "StationName": "สถานีฮอด", "DiffWlBank": null, "TextLevel": null }
      ]
    }"#
}

/// A response cut off mid-stream.
pub(crate) fn fixture_truncated_json() -> &'static str {
    r#"{ "data": [ { "StationName": "อ่างเก็บน้ำแม่ตูบ", "PercentStorage": 6"#
}

/// Ping basin with a full week and 8-week forecast; Mae Taeng with two days
/// and no forecast block.
pub(crate) fn fixture_rainfall_json() -> &'static str {
    r#"{
      "ping": {
        "daily": [
          { "date": "2025-10-26", "value": 20.0 },
          { "date": "2025-10-27", "value": 40.0 },
          { "date": "2025-10-28", "value": 30.0 },
          { "date": "2025-10-29", "value": 25.0 },
          { "date": "2025-10-30", "value": 15.0 },
          { "date": "2025-10-31", "value": 10.0 },
          { "date": "2025-11-01", "value": 8.0 }
        ],
        "weekly_forecast": [
          { "date": "2025-11-02", "value": 10.0 },
          { "date": "2025-11-09", "value": 12.0 },
          { "date": "2025-11-16", "value": 15.0 },
          { "date": "2025-11-23", "value": 18.0 },
          { "date": "2025-11-30", "value": 20.0 },
          { "date": "2025-12-07", "value": 16.0 },
          { "date": "2025-12-14", "value": 14.0 },
          { "date": "2025-12-21", "value": 8.0 }
        ]
      },
      "mae_taeng": {
        "daily": [
          { "date": "2025-10-26", "value": 4.5 },
          { "date": "2025-10-27", "value": 0 }
        ]
      }
    }"#
}

pub(crate) fn fixture_soil_moisture_json() -> &'static str {
    r#"{
      "ping": {
        "daily": [
          { "date": "2025-10-26", "value": 0.28 },
          { "date": "2025-10-27", "value": 0.30 },
          { "date": "2025-10-28", "value": 0.32 }
        ]
      },
      "mae_kuang": { "daily": [] }
    }"#
}

pub(crate) fn fixture_spei_json() -> &'static str {
    r#"{
      "ping": {
        "monthly": [
          { "month": "2025-11", "value": -0.3 },
          { "month": "2025-12", "value": -0.5 },
          { "month": "2026-01", "value": -0.5 },
          { "month": "2026-02", "value": -0.6 },
          { "month": "2026-03", "value": -0.7 },
          { "month": "2026-04", "value": -0.9 }
        ]
      }
    }"#
}
