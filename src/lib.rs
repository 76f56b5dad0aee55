/// cmwater_report: weekly rain, water and drought situation report for the
/// Chiang Mai water network.
///
/// # Module structure
///
/// ```text
/// cmwater_report
/// ├── model       - shared data types (Reading, records, entries, error enums)
/// ├── targets     - fixed, ordered target slots (reservoirs, dams, stations, basins)
/// ├── config      - report.toml loader with compile-time defaults
/// ├── ingest
/// │   ├── cmwater - reservoir / dam / water-station API clients (fail soft)
/// │   ├── mock    - rainfall / soil-moisture / SPEI fixture loaders (fail soft)
/// │   └── fixtures (test only) - representative API and fixture payloads
/// ├── analysis
/// │   ├── reconcile - aligns fetched records to target slots
/// │   └── series    - basin selection + weekly aggregates
/// ├── palette     - value/label → color and icon cascades
/// ├── report      - load cycle, immutable snapshots, basin selection
/// ├── render      - fixed-layout HTML report page
/// ├── export      - PNG / JPG / PDF export of the composed report
/// └── endpoint    - HTTP surface (page, JSON, export downloads, assets)
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod endpoint;
pub mod export;
pub mod ingest;
pub mod model;
pub mod palette;
pub mod render;
pub mod report;
pub mod targets;
