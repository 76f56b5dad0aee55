//! Report configuration loader - parses report.toml
//!
//! Every setting has a compile-time default matching the production
//! endpoints and fixture names, so the service runs without a config file.
//! The file only needs the keys that differ.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::ConfigError;
use crate::targets::DEFAULT_BASIN;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "report.toml";

const API_BASE: &str = "https://airvista.soc.cmu.ac.th:3843/cmwater/v1/Water";

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Basin the time-series rows show on startup.
    pub default_basin: String,
    pub endpoints: EndpointConfig,
    pub fixtures: FixtureConfig,
    pub export: ExportSettings,
    pub server: ServerConfig,
}

/// Remote cmwater API endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub reservoir_url: String,
    pub dam_url: String,
    pub water_url: String,
    pub timeout_secs: u64,
}

/// Static JSON fixtures for the satellite/forecast time series.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    pub dir: PathBuf,
    pub rainfall: String,
    pub soil_moisture: String,
    pub spei: String,
}

/// Export raster and encoding settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Capture never narrower than this, so the fixed desktop layout holds.
    pub min_width: u32,
    pub pixel_ratio: u32,
    /// JPEG quality, 1-100. Also used for the raster embedded in PDFs.
    pub jpeg_quality: u8,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory holding the report's icons and backgrounds.
    pub assets_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_basin: DEFAULT_BASIN.to_string(),
            endpoints: EndpointConfig::default(),
            fixtures: FixtureConfig::default(),
            export: ExportSettings::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            reservoir_url: format!("{}/getReservoirData", API_BASE),
            dam_url: format!("{}/getDamData", API_BASE),
            water_url: format!("{}/getWaterData", API_BASE),
            timeout_secs: 30,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public"),
            rainfall: "rainfall_mockdata.json".to_string(),
            soil_moisture: "soil_moisture_mock.json".to_string(),
            spei: "SPEI_mock.json".to_string(),
        }
    }
}

impl FixtureConfig {
    pub fn rainfall_path(&self) -> PathBuf {
        self.dir.join(&self.rainfall)
    }

    pub fn soil_moisture_path(&self) -> PathBuf {
        self.dir.join(&self.soil_moisture)
    }

    pub fn spei_path(&self) -> PathBuf {
        self.dir.join(&self.spei)
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            min_width: 1200,
            pixel_ratio: 2,
            jpeg_quality: 92,
            file_prefix: "water-report".to_string(),
        }
    }
}

/// Widest accepted `min_width`, in CSS pixels.
pub const MAX_MIN_WIDTH: u32 = 8192;
/// Largest accepted `pixel_ratio`.
pub const MAX_PIXEL_RATIO: u32 = 4;

impl ExportSettings {
    /// Checks the ranges the rasterizer and encoders accept.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_MIN_WIDTH).contains(&self.min_width) {
            return Err(format!("export.min_width must be 1..={}, got {}", MAX_MIN_WIDTH, self.min_width));
        }
        if !(1..=MAX_PIXEL_RATIO).contains(&self.pixel_ratio) {
            return Err(format!("export.pixel_ratio must be 1..={}, got {}", MAX_PIXEL_RATIO, self.pixel_ratio));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!("export.jpeg_quality must be 1..=100, got {}", self.jpeg_quality));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("public"),
        }
    }
}

/// Parses a report configuration from TOML text and checks the export
/// settings.
pub fn parse_config(contents: &str, path: &Path) -> Result<ReportConfig, ConfigError> {
    let config: ReportConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.export.validate().map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(config)
}

/// Loads the report configuration from `path`.
///
/// # Errors
/// `ConfigError::Read` if the file cannot be read, `ConfigError::Parse` if it
/// is not valid TOML for `ReportConfig`, `ConfigError::Invalid` if an export
/// setting is out of range.
pub fn load_config(path: impl AsRef<Path>) -> Result<ReportConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Loads `path` if it exists, otherwise falls back to the compiled defaults.
/// A file that exists but does not parse is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ReportConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("{} not found, using built-in defaults", path.display());
        return Ok(ReportConfig::default());
    }
    load_config(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
