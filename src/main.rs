//! Weekly water situation report - command line entry point
//!
//! Loads one report cycle (cmwater reservoir/dam/station APIs plus the
//! rainfall, soil-moisture and SPEI fixtures), prints a console summary and,
//! depending on flags, writes the HTML page, writes an export, or serves the
//! report over HTTP.
//!
//! Usage:
//!   cargo run --release                                # summary only
//!   cargo run --release -- --basin mae_taeng --html report.html
//!   cargo run --release -- --export pdf --prefix weekly
//!   cargo run --release -- --serve 8080
//!
//! Environment:
//!   RUST_LOG - log verbosity (e.g. `info`, `cmwater_report=debug`)

use cmwater_report::config::{self, DEFAULT_CONFIG_PATH};
use cmwater_report::endpoint::{self, AppState};
use cmwater_report::export::{ExportFormat, Exporter};
use cmwater_report::model::ReportError;
use cmwater_report::palette::StorageTier;
use cmwater_report::render::render_html;
use cmwater_report::report::{LiveDataSource, ReportSnapshot, ReportStore};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str =
    "[--config PATH] [--basin ID] [--html PATH] [--export png|jpg|pdf] [--prefix NAME] [--serve PORT]";

struct Options {
    config_path: PathBuf,
    basin: Option<String>,
    html_path: Option<PathBuf>,
    export_format: Option<ExportFormat>,
    prefix: Option<String>,
    serve_port: Option<u16>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        basin: None,
        html_path: None,
        export_format: None,
        prefix: None,
        serve_port: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1).ok_or_else(|| format!("{} requires a value", flag))?;
        match flag {
            "--config" => options.config_path = PathBuf::from(value),
            "--basin" => options.basin = Some(value.clone()),
            "--html" => options.html_path = Some(PathBuf::from(value)),
            "--export" => options.export_format = Some(value.parse()?),
            "--prefix" => options.prefix = Some(value.clone()),
            "--serve" => {
                options.serve_port = Some(value.parse().map_err(|_| format!("invalid port: {}", value))?);
            }
            _ => return Err(format!("Unknown argument: {}", flag)),
        }
        i += 2;
    }

    Ok(options)
}

fn print_summary(snapshot: &ReportSnapshot) {
    println!("📋 {} ({})", snapshot.basin.name, snapshot.basin.id);

    println!("\n   Reservoirs (% storage)");
    for entry in &snapshot.reservoirs {
        println!("   {:<6} {:?} - {}", entry.val.to_string(), StorageTier::classify(entry.val), entry.name);
    }

    println!("\n   Dams (% storage)");
    for entry in &snapshot.dams {
        println!("   {:<6} {} - {}", entry.val.to_string(), entry.text_level, entry.name);
    }

    let reporting = snapshot.stations.iter().filter(|e| !e.val.is_no_data()).count();
    println!("\n   Water stations: {}/{} reporting", reporting, snapshot.stations.len());

    match &snapshot.rainfall {
        Some(rain) => println!("   Rainfall: {} days, {:.1} mm total", rain.days.len(), rain.total),
        None => println!("   Rainfall: no data"),
    }
    match snapshot.soil_moisture.as_ref().and_then(|s| s.mean) {
        Some(mean) => println!("   Soil moisture: {:.2} m³/m³ weekly mean", mean),
        None => println!("   Soil moisture: no data"),
    }
    println!();
}

/// Writes the requested export into the working directory. `Ok(None)` when
/// there was nothing to export.
fn write_export(
    exporter: &Exporter,
    snapshot: &ReportSnapshot,
    format: ExportFormat,
    prefix: &str,
) -> Result<Option<(String, usize)>, ReportError> {
    let Some(artifact) = exporter.export(Some(snapshot), format, prefix)? else {
        return Ok(None);
    };
    fs::write(&artifact.filename, &artifact.bytes)?;
    Ok(Some((artifact.filename, artifact.bytes.len())))
}

fn run(options: Options) -> Result<(), ReportError> {
    let config = config::load_or_default(&options.config_path)?;
    let basin = options.basin.clone().unwrap_or_else(|| config.default_basin.clone());

    let source = LiveDataSource::new(&config)?;

    println!("📥 Loading report data...");
    let store = ReportStore::new(Arc::new(source), &basin)?;
    let snapshot = store.current();
    println!("✓ Report loaded\n");
    print_summary(&snapshot);

    if let Some(path) = &options.html_path {
        fs::write(path, render_html(&snapshot))?;
        println!("✓ Wrote {}", path.display());
    }

    let exporter = Exporter::new(config.export.clone());

    if let Some(format) = options.export_format {
        let prefix = options.prefix.as_deref().unwrap_or(&config.export.file_prefix);
        match write_export(&exporter, &snapshot, format, prefix)? {
            Some((filename, len)) => println!("✓ Exported {} ({} bytes)", filename, len),
            None => println!("   Nothing to export"),
        }
    }

    if let Some(port) = options.serve_port {
        println!("\n🚀 Starting report server...");
        let state = AppState {
            store,
            exporter,
            assets_dir: config.server.assets_dir.clone(),
        };
        endpoint::start_report_server(port, state)?;
    }

    Ok(())
}

fn main() {
    pretty_env_logger::init();

    println!("🌊 Weekly Water Situation Report");
    println!("================================\n");

    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: {} {}", args.first().map_or("cmwater_report", String::as_str), USAGE);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
