/// Report state: one complete load cycle per snapshot.
///
/// A snapshot is built from six independent loads (three remote endpoints,
/// three fixtures) that run in parallel on a small thread pool, then
/// reconciled and summarized. Snapshots are immutable; reloading or switching
/// basin builds a new one and swaps it in whole, so a reader never sees a mix
/// of two cycles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use threadpool::ThreadPool;

use crate::analysis::reconcile::{reconcile_dams, reconcile_reservoirs, reconcile_stations};
use crate::analysis::series::{
    DroughtOutlook, RainForecast, RainfallSummary, SoilMoistureSummary, drought_outlook,
    rain_forecast, summarize_rainfall, summarize_soil_moisture,
};
use crate::config::{EndpointConfig, FixtureConfig, ReportConfig};
use crate::ingest::cmwater;
use crate::ingest::mock::{self, RainfallFixture, SoilMoistureFixture, SpeiFixture};
use crate::model::{
    DamEntry, DamRecord, ReportError, ReservoirEntry, ReservoirRecord, StationEntry,
    WaterStationRecord,
};
use crate::targets::{Basin, TARGET_DAMS, TARGET_RESERVOIRS, TARGET_WATER_STATIONS, find_basin};

const LOAD_WORKERS: usize = 6;

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// Where a load cycle gets its raw data. Every method fails soft: errors are
/// logged by the implementation and show up as empty lists or `None`.
pub trait WaterDataSource: Send + Sync {
    fn reservoirs(&self) -> Vec<ReservoirRecord>;
    fn dams(&self) -> Vec<DamRecord>;
    fn water_stations(&self) -> Vec<WaterStationRecord>;
    fn rainfall(&self) -> Option<RainfallFixture>;
    fn soil_moisture(&self) -> Option<SoilMoistureFixture>;
    fn spei(&self) -> Option<SpeiFixture>;
}

/// The production source: cmwater API over HTTPS plus fixture files on disk.
pub struct LiveDataSource {
    client: reqwest::blocking::Client,
    endpoints: EndpointConfig,
    fixtures: FixtureConfig,
}

impl LiveDataSource {
    pub fn new(config: &ReportConfig) -> Result<Self, ReportError> {
        let client = cmwater::build_http_client(config.endpoints.timeout())?;
        Ok(LiveDataSource {
            client,
            endpoints: config.endpoints.clone(),
            fixtures: config.fixtures.clone(),
        })
    }
}

impl WaterDataSource for LiveDataSource {
    fn reservoirs(&self) -> Vec<ReservoirRecord> {
        cmwater::fetch_reservoir_data(&self.client, &self.endpoints.reservoir_url)
    }

    fn dams(&self) -> Vec<DamRecord> {
        cmwater::fetch_dam_data(&self.client, &self.endpoints.dam_url)
    }

    fn water_stations(&self) -> Vec<WaterStationRecord> {
        cmwater::fetch_water_data(&self.client, &self.endpoints.water_url)
    }

    fn rainfall(&self) -> Option<RainfallFixture> {
        mock::load_rainfall_fixture(self.fixtures.rainfall_path())
    }

    fn soil_moisture(&self) -> Option<SoilMoistureFixture> {
        mock::load_soil_moisture_fixture(self.fixtures.soil_moisture_path())
    }

    fn spei(&self) -> Option<SpeiFixture> {
        mock::load_spei_fixture(self.fixtures.spei_path())
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything one render of the report needs.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub basin: &'static Basin,
    pub generated_at: DateTime<Utc>,
    pub reservoirs: Vec<ReservoirEntry>,
    pub dams: Vec<DamEntry>,
    pub stations: Vec<StationEntry>,
    pub rainfall: Option<RainfallSummary>,
    pub soil_moisture: Option<SoilMoistureSummary>,
    pub rain_forecast: Option<RainForecast>,
    pub drought: Option<DroughtOutlook>,
}

enum Loaded {
    Reservoirs(Vec<ReservoirRecord>),
    Dams(Vec<DamRecord>),
    Stations(Vec<WaterStationRecord>),
    Rainfall(Option<RainfallFixture>),
    SoilMoisture(Option<SoilMoistureFixture>),
    Spei(Option<SpeiFixture>),
}

#[derive(Default)]
struct RawCycle {
    reservoirs: Vec<ReservoirRecord>,
    dams: Vec<DamRecord>,
    stations: Vec<WaterStationRecord>,
    rainfall: Option<RainfallFixture>,
    soil_moisture: Option<SoilMoistureFixture>,
    spei: Option<SpeiFixture>,
}

fn spawn_load(
    pool: &ThreadPool,
    tx: &mpsc::Sender<Loaded>,
    source: &Arc<dyn WaterDataSource>,
    load: fn(&dyn WaterDataSource) -> Loaded,
) {
    let tx = tx.clone();
    let source = Arc::clone(source);
    pool.execute(move || {
        // The receiver only disappears if the collector gave up; nothing to do.
        let _ = tx.send(load(source.as_ref()));
    });
}

/// Runs the six loads in parallel and collects whatever arrives. A load
/// whose worker panicked leaves its slot empty.
fn collect_cycle(source: &Arc<dyn WaterDataSource>) -> RawCycle {
    let pool = ThreadPool::new(LOAD_WORKERS);
    let (tx, rx) = mpsc::channel();

    spawn_load(&pool, &tx, source, |s| Loaded::Reservoirs(s.reservoirs()));
    spawn_load(&pool, &tx, source, |s| Loaded::Dams(s.dams()));
    spawn_load(&pool, &tx, source, |s| Loaded::Stations(s.water_stations()));
    spawn_load(&pool, &tx, source, |s| Loaded::Rainfall(s.rainfall()));
    spawn_load(&pool, &tx, source, |s| Loaded::SoilMoisture(s.soil_moisture()));
    spawn_load(&pool, &tx, source, |s| Loaded::Spei(s.spei()));
    drop(tx);

    let mut raw = RawCycle::default();
    for loaded in rx.iter() {
        match loaded {
            Loaded::Reservoirs(v) => raw.reservoirs = v,
            Loaded::Dams(v) => raw.dams = v,
            Loaded::Stations(v) => raw.stations = v,
            Loaded::Rainfall(v) => raw.rainfall = v,
            Loaded::SoilMoisture(v) => raw.soil_moisture = v,
            Loaded::Spei(v) => raw.spei = v,
        }
    }
    raw
}

/// Builds a complete snapshot for `basin`.
pub fn load_snapshot(source: &Arc<dyn WaterDataSource>, basin: &'static Basin) -> ReportSnapshot {
    let raw = collect_cycle(source);
    log::debug!(
        "load cycle: {} reservoir, {} dam, {} station records",
        raw.reservoirs.len(),
        raw.dams.len(),
        raw.stations.len()
    );

    ReportSnapshot {
        basin,
        generated_at: Utc::now(),
        reservoirs: reconcile_reservoirs(TARGET_RESERVOIRS, &raw.reservoirs),
        dams: reconcile_dams(TARGET_DAMS, &raw.dams),
        stations: reconcile_stations(TARGET_WATER_STATIONS, &raw.stations),
        rainfall: summarize_rainfall(raw.rainfall.as_ref(), basin.id),
        soil_moisture: summarize_soil_moisture(raw.soil_moisture.as_ref(), basin.id),
        rain_forecast: rain_forecast(raw.rainfall.as_ref(), basin.id),
        drought: drought_outlook(raw.spei.as_ref(), basin.id),
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Holds the current snapshot. Readers clone the `Arc` and keep it for as
/// long as they like; writers replace it.
pub struct ReportStore {
    source: Arc<dyn WaterDataSource>,
    current: RwLock<Arc<ReportSnapshot>>,
}

impl ReportStore {
    /// Loads the first snapshot for `basin_id`.
    pub fn new(source: Arc<dyn WaterDataSource>, basin_id: &str) -> Result<Self, ReportError> {
        let basin = find_basin(basin_id).ok_or_else(|| ReportError::UnknownBasin(basin_id.to_string()))?;
        let snapshot = load_snapshot(&source, basin);
        Ok(ReportStore {
            source,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn current(&self) -> Arc<ReportSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn replace(&self, snapshot: ReportSnapshot) -> Arc<ReportSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&snapshot);
        snapshot
    }

    /// Re-runs the load cycle for the current basin.
    pub fn reload(&self) -> Arc<ReportSnapshot> {
        let basin = self.current().basin;
        log::info!("reloading report for basin {}", basin.id);
        self.replace(load_snapshot(&self.source, basin))
    }

    /// Switches basin with a full reload. An unknown id leaves the current
    /// snapshot in place.
    pub fn select_basin(&self, basin_id: &str) -> Result<Arc<ReportSnapshot>, ReportError> {
        let basin = find_basin(basin_id).ok_or_else(|| ReportError::UnknownBasin(basin_id.to_string()))?;
        log::info!("selecting basin {}", basin.id);
        Ok(self.replace(load_snapshot(&self.source, basin)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
