/// Data ingestion for the water situation report.
///
/// Submodules:
/// - `cmwater`  - reservoir, dam and water-station API clients.
/// - `mock`     - rainfall, soil-moisture and SPEI fixture loaders.
/// - `fixtures` - representative payloads for tests.
///
/// Both client families fail soft: a source that cannot be reached or
/// decoded yields empty data, never an error to the caller.

pub mod cmwater;
pub mod mock;

#[cfg(test)]
pub(crate) mod fixtures;
