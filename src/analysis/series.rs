//! Basin selection and weekly aggregates for the time-series rows.
//!
//! Unlike the location lists these are not slot matched: the selected
//! basin's rows are shown in file order, and the cards are filled from
//! whatever is there.

use serde::Serialize;

use crate::ingest::mock::{BasinFixture, RainfallFixture, SoilMoistureFixture, SpeiFixture};
use crate::model::{DailyValue, MonthlyValue};

/// Looks up one basin's block in a fixture.
pub fn select_basin<'a, T>(fixture: &'a BasinFixture<T>, basin_id: &str) -> Option<&'a T> {
    fixture.get(basin_id)
}

/// Past-week satellite rainfall, mm/day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainfallSummary {
    pub days: Vec<DailyValue>,
    /// Accumulated rainfall over `days`.
    pub total: f64,
}

/// Past-week surface soil moisture, m³/m³.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilMoistureSummary {
    pub days: Vec<DailyValue>,
    /// `None` when there are no days.
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainForecast {
    pub weeks: Vec<DailyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroughtOutlook {
    pub months: Vec<MonthlyValue>,
}

pub fn total(values: &[DailyValue]) -> f64 {
    values.iter().map(|v| v.value).sum()
}

pub fn mean(values: &[DailyValue]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(total(values) / values.len() as f64)
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn summarize_rainfall(fixture: Option<&RainfallFixture>, basin_id: &str) -> Option<RainfallSummary> {
    let basin = select_basin(fixture?, basin_id)?;
    Some(RainfallSummary {
        days: basin.daily.clone(),
        total: total(&basin.daily),
    })
}

pub fn summarize_soil_moisture(
    fixture: Option<&SoilMoistureFixture>,
    basin_id: &str,
) -> Option<SoilMoistureSummary> {
    let basin = select_basin(fixture?, basin_id)?;
    Some(SoilMoistureSummary {
        days: basin.daily.clone(),
        mean: mean(&basin.daily),
    })
}

/// Weekly rain forecast for the basin. Comes from the rainfall fixture.
pub fn rain_forecast(fixture: Option<&RainfallFixture>, basin_id: &str) -> Option<RainForecast> {
    let basin = select_basin(fixture?, basin_id)?;
    Some(RainForecast {
        weeks: basin.weekly_forecast.clone(),
    })
}

pub fn drought_outlook(fixture: Option<&SpeiFixture>, basin_id: &str) -> Option<DroughtOutlook> {
    let basin = select_basin(fixture?, basin_id)?;
    Some(DroughtOutlook {
        months: basin.monthly.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use crate::ingest::mock::{parse_rainfall_fixture, parse_soil_moisture_fixture, parse_spei_fixture};

    #[test]
    fn test_soil_moisture_mean() {
        let soil = parse_soil_moisture_fixture(fixture_soil_moisture_json()).unwrap();
        let summary = summarize_soil_moisture(Some(&soil), "ping").expect("ping present");
        let mean = summary.mean.expect("non-empty");
        assert!((mean - 0.30).abs() < 1e-9, "mean was {}", mean);
        assert_eq!(format!("{:.2}", mean), "0.30");
    }

    #[test]
    fn test_soil_moisture_mean_of_empty_basin_is_none() {
        let soil = parse_soil_moisture_fixture(fixture_soil_moisture_json()).unwrap();
        let summary = summarize_soil_moisture(Some(&soil), "mae_kuang").expect("mae_kuang present");
        assert!(summary.days.is_empty());
        assert_eq!(summary.mean, None);
    }

    #[test]
    fn test_rainfall_total_keeps_file_order() {
        let rain = parse_rainfall_fixture(fixture_rainfall_json()).unwrap();
        let summary = summarize_rainfall(Some(&rain), "ping").unwrap();
        assert_eq!(summary.days.len(), 7);
        assert_eq!(summary.days[0].value, 20.0);
        assert_eq!(summary.days[6].value, 8.0);
        assert_eq!(format!("{:.1}", summary.total), "148.0");
    }

    #[test]
    fn test_forecast_and_outlook_lengths() {
        let rain = parse_rainfall_fixture(fixture_rainfall_json()).unwrap();
        let spei = parse_spei_fixture(fixture_spei_json()).unwrap();

        assert_eq!(rain_forecast(Some(&rain), "ping").unwrap().weeks.len(), 8);
        assert!(rain_forecast(Some(&rain), "mae_taeng").unwrap().weeks.is_empty());
        assert_eq!(drought_outlook(Some(&spei), "ping").unwrap().months.len(), 6);
    }

    #[test]
    fn test_missing_fixture_or_basin_is_none() {
        let rain = parse_rainfall_fixture(fixture_rainfall_json()).unwrap();
        assert!(summarize_rainfall(None, "ping").is_none());
        assert!(summarize_rainfall(Some(&rain), "nan").is_none());
        assert!(drought_outlook(None, "ping").is_none());
    }
}
