/// Data analysis for the water situation report.
///
/// Submodules:
/// - `reconcile` - aligns fetched records to the fixed target slots.
/// - `series`    - basin selection and weekly aggregates for time series.

pub mod reconcile;
pub mod series;
