/// HTTP endpoint serving the report page, its data and exports
///
/// Endpoints:
/// - GET /                      - Reload the current basin, then the page
/// - GET /?basin={id}           - Load basin {id} (full reload), then the page
/// - GET /api/report            - Current snapshot as JSON
/// - GET /api/basins            - Basin registry
/// - GET /export/{png|jpg|pdf}  - Download the report (optional ?prefix=)
/// - GET /assets/{file}         - Icons and backgrounds
/// - GET /health                - Service health check
///
/// Requests are handled one at a time, in arrival order.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::{ExportFormat, Exporter, failure_alert};
use crate::model::{ExportError, ReportError};
use crate::render::render_html;
use crate::report::ReportStore;
use crate::targets::BASINS;

const ENDPOINTS: &[&str] = &[
    "/",
    "/?basin={id}",
    "/api/report",
    "/api/basins",
    "/export/{png|jpg|pdf}?prefix={name}",
    "/assets/{file}",
    "/health",
];

/// Everything a request handler needs.
pub struct AppState {
    pub store: ReportStore,
    pub exporter: Exporter,
    pub assets_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A response before it is handed to tiny_http.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_vec_pretty(value).unwrap_or_else(|e| {
            log::error!("failed to serialize response: {}", e);
            b"{}".to_vec()
        });
        Reply { status, content_type: "application/json", headers: Vec::new(), body }
    }

    fn html(body: String) -> Self {
        Reply { status: 200, content_type: "text/html; charset=utf-8", headers: Vec::new(), body: body.into_bytes() }
    }

    fn bytes(content_type: &'static str, body: Vec<u8>) -> Self {
        Reply { status: 200, content_type, headers: Vec::new(), body }
    }

    fn not_found() -> Self {
        Reply::json(
            404,
            &serde_json::json!({
                "error": "Not found",
                "available_endpoints": ENDPOINTS
            }),
        )
    }

    fn error(status: u16, message: String) -> Self {
        Reply::json(status, &serde_json::json!({ "error": message }))
    }

    fn into_response(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let mut response = tiny_http::Response::from_data(self.body)
            .with_status_code(tiny_http::StatusCode::from(self.status));
        let headers = std::iter::once(("Content-Type".to_string(), self.content_type.to_string())).chain(self.headers);
        for (name, value) in headers {
            match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                Ok(header) => response = response.with_header(header),
                Err(()) => log::warn!("dropping invalid header {}: {}", name, value),
            }
        }
        response
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum Route {
    Page { basin: Option<String> },
    Report,
    Basins,
    Health,
    Export { format: String, prefix: Option<String> },
    Asset(String),
    NotFound,
}

/// Decodes `a=1&b=x%20y` into a map. Later keys win; `+` is a space.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decode = |s: &str| urlencoding::decode(&s.replace('+', " ")).ok().map(|c| c.into_owned());
            Some((decode(key)?, decode(value)?))
        })
        .collect()
}

pub fn route(url: &str) -> Route {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let params = parse_query(query);
    let non_empty = |key: &str| params.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    match path {
        "/" | "/index.html" => Route::Page { basin: non_empty("basin") },
        "/api/report" => Route::Report,
        "/api/basins" => Route::Basins,
        "/health" => Route::Health,
        _ => {
            if let Some(format) = path.strip_prefix("/export/") {
                Route::Export { format: format.to_string(), prefix: non_empty("prefix") }
            } else if let Some(file) = path.strip_prefix("/assets/") {
                match urlencoding::decode(file) {
                    Ok(file) => Route::Asset(file.into_owned()),
                    Err(_) => Route::NotFound,
                }
            } else {
                Route::NotFound
            }
        }
    }
}

/// Accepts a bare file name inside the assets directory. Anything that could
/// walk out of it (separators, `..`, hidden files) is rejected.
pub fn sanitize_asset_name(name: &str) -> Option<&str> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) || name.contains("..") {
        return None;
    }
    Some(name)
}

fn asset_content_type(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("css") => "text/css",
        _ => "application/octet-stream",
    }
}

/// `Content-Disposition` value. The plain `filename` is ASCII-only; the
/// exact name goes in the RFC 5987 `filename*` form.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Handles one request. Only GET is served.
pub fn handle_request(state: &AppState, method: &tiny_http::Method, url: &str) -> Reply {
    if *method != tiny_http::Method::Get {
        return Reply::not_found();
    }

    match route(url) {
        Route::Page { basin } => handle_page(state, basin.as_deref()),
        Route::Report => Reply::json(200, state.store.current().as_ref()),
        Route::Basins => handle_basins(state),
        Route::Health => handle_health(),
        Route::Export { format, prefix } => handle_export(state, &format, prefix.as_deref()),
        Route::Asset(name) => handle_asset(&state.assets_dir, &name),
        Route::NotFound => Reply::not_found(),
    }
}

/// Every page load is a fresh load cycle. `?basin=` picks the basin for it,
/// otherwise the current basin is reloaded.
fn handle_page(state: &AppState, basin: Option<&str>) -> Reply {
    let snapshot = match basin {
        Some(id) => match state.store.select_basin(id) {
            Ok(snapshot) => snapshot,
            Err(ReportError::UnknownBasin(id)) => {
                return Reply::error(400, format!("unknown basin '{}'", id));
            }
            Err(e) => return Reply::error(500, e.to_string()),
        },
        None => state.store.reload(),
    };
    Reply::html(render_html(&snapshot))
}

fn handle_basins(state: &AppState) -> Reply {
    Reply::json(
        200,
        &serde_json::json!({
            "current": state.store.current().basin.id,
            "basins": BASINS
        }),
    )
}

fn handle_health() -> Reply {
    Reply::json(
        200,
        &serde_json::json!({
            "status": "ok",
            "service": "cmwater_report",
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

fn handle_export(state: &AppState, format: &str, prefix: Option<&str>) -> Reply {
    let format: ExportFormat = match format.parse() {
        Ok(format) => format,
        Err(message) => return Reply::error(400, message),
    };
    let prefix = prefix.unwrap_or(&state.exporter.settings().file_prefix);
    let snapshot = state.store.current();

    match state.exporter.export(Some(&snapshot), format, prefix) {
        Ok(Some(artifact)) => {
            let disposition = content_disposition(&artifact.filename);
            let mut reply = Reply::bytes(artifact.mime_type(), artifact.bytes);
            reply.headers.push(("Content-Disposition".to_string(), disposition));
            reply
        }
        Ok(None) => Reply { status: 204, content_type: "text/plain", headers: Vec::new(), body: Vec::new() },
        Err(e) => {
            let status = if matches!(e, ExportError::Busy) { 409 } else { 500 };
            log::warn!("export {} failed: {}", format, e);
            Reply::json(
                status,
                &serde_json::json!({
                    "error": e.to_string(),
                    "alert": failure_alert(&e)
                }),
            )
        }
    }
}

fn handle_asset(assets_dir: &Path, name: &str) -> Reply {
    let Some(name) = sanitize_asset_name(name) else {
        return Reply::error(400, "invalid asset path".to_string());
    };
    match fs::read(assets_dir.join(name)) {
        Ok(bytes) => Reply::bytes(asset_content_type(name), bytes),
        Err(e) => {
            log::debug!("asset {} not served: {}", name, e);
            Reply::not_found()
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start the report server on the specified port. Blocks for the life of
/// the server.
pub fn start_report_server(port: u16, state: AppState) -> Result<(), ReportError> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| ReportError::Server(format!("failed to start HTTP server: {}", e)))?;

    println!("📡 Report server listening on http://0.0.0.0:{}", port);
    for endpoint in ENDPOINTS {
        println!("   GET {}", endpoint);
    }
    println!();

    for request in server.incoming_requests() {
        let reply = handle_request(&state, request.method(), request.url());
        log::debug!("{} {} -> {}", request.method(), request.url(), reply.status);

        if let Err(e) = request.respond(reply.into_response()) {
            log::warn!("Failed to send response: {}", e);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportSettings;
    use crate::ingest::mock::{RainfallFixture, SoilMoistureFixture, SpeiFixture};
    use crate::model::{DamRecord, ReservoirRecord, WaterStationRecord};
    use crate::report::WaterDataSource;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tiny_http::Method;

    struct OfflineSource;

    impl WaterDataSource for OfflineSource {
        fn reservoirs(&self) -> Vec<ReservoirRecord> {
            Vec::new()
        }
        fn dams(&self) -> Vec<DamRecord> {
            Vec::new()
        }
        fn water_stations(&self) -> Vec<WaterStationRecord> {
            Vec::new()
        }
        fn rainfall(&self) -> Option<RainfallFixture> {
            None
        }
        fn soil_moisture(&self) -> Option<SoilMoistureFixture> {
            None
        }
        fn spei(&self) -> Option<SpeiFixture> {
            None
        }
    }

    /// Counts how often the remote lists are fetched.
    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
    }

    impl WaterDataSource for CountingSource {
        fn reservoirs(&self) -> Vec<ReservoirRecord> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Vec::new()
        }
        fn dams(&self) -> Vec<DamRecord> {
            Vec::new()
        }
        fn water_stations(&self) -> Vec<WaterStationRecord> {
            Vec::new()
        }
        fn rainfall(&self) -> Option<RainfallFixture> {
            None
        }
        fn soil_moisture(&self) -> Option<SoilMoistureFixture> {
            None
        }
        fn spei(&self) -> Option<SpeiFixture> {
            None
        }
    }

    fn state(assets_dir: PathBuf) -> AppState {
        AppState {
            store: ReportStore::new(Arc::new(OfflineSource), "ping").unwrap(),
            exporter: Exporter::new(ExportSettings { pixel_ratio: 1, ..ExportSettings::default() }),
            assets_dir,
        }
    }

    fn body_json(reply: &Reply) -> serde_json::Value {
        serde_json::from_slice(&reply.body).expect("JSON body")
    }

    #[test]
    fn test_route_table() {
        assert_eq!(route("/"), Route::Page { basin: None });
        assert_eq!(route("/?basin=mae_taeng"), Route::Page { basin: Some("mae_taeng".to_string()) });
        assert_eq!(route("/?basin="), Route::Page { basin: None });
        assert_eq!(route("/api/report"), Route::Report);
        assert_eq!(route("/health"), Route::Health);
        assert_eq!(
            route("/export/pdf?prefix=weekly%20report"),
            Route::Export { format: "pdf".to_string(), prefix: Some("weekly report".to_string()) }
        );
        assert_eq!(route("/assets/tag_gray.png"), Route::Asset("tag_gray.png".to_string()));
        assert_eq!(route("/site/05568500"), Route::NotFound);
    }

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query("prefix=%E0%B8%A3%E0%B8%B2%E0%B8%A2%E0%B8%87%E0%B8%B2%E0%B8%99&x=a+b&flag");
        assert_eq!(params["prefix"], "รายงาน");
        assert_eq!(params["x"], "a b");
        assert_eq!(params["flag"], "");
    }

    #[test]
    fn test_asset_names_cannot_escape() {
        assert_eq!(sanitize_asset_name("ResBlue.png"), Some("ResBlue.png"));
        assert_eq!(sanitize_asset_name("../Cargo.toml"), None);
        assert_eq!(sanitize_asset_name("sub/dir.png"), None);
        assert_eq!(sanitize_asset_name("..\\x"), None);
        assert_eq!(sanitize_asset_name(".env"), None);
        assert_eq!(sanitize_asset_name(""), None);
        // Encoded traversal decodes before the check.
        assert_eq!(route("/assets/..%2Freport.toml"), Route::Asset("../report.toml".to_string()));
    }

    #[test]
    fn test_content_disposition_is_ascii_safe() {
        let value = content_disposition("รายงาน.png");
        assert!(value.is_ascii());
        assert!(value.starts_with("attachment; filename=\""));
        assert!(value.contains("filename*=UTF-8''%E0%B8%A3"));
        assert_eq!(content_disposition("water-report.pdf"), "attachment; filename=\"water-report.pdf\"; filename*=UTF-8''water-report.pdf");
    }

    #[test]
    fn test_page_and_unknown_basin() {
        let state = state(PathBuf::from("public"));
        let reply = handle_request(&state, &Method::Get, "/");
        assert_eq!(reply.status, 200);
        assert!(String::from_utf8(reply.body).unwrap().contains("สถานการณ์ฝน"));

        let reply = handle_request(&state, &Method::Get, "/?basin=mekong");
        assert_eq!(reply.status, 400);
        assert_eq!(state.store.current().basin.id, "ping");

        let reply = handle_request(&state, &Method::Get, "/?basin=mae_chaem");
        assert_eq!(reply.status, 200);
        assert_eq!(state.store.current().basin.id, "mae_chaem");
    }

    #[test]
    fn test_every_page_load_refetches() {
        let source = Arc::new(CountingSource::default());
        let state = AppState {
            store: ReportStore::new(source.clone(), "ping").unwrap(),
            exporter: Exporter::new(ExportSettings::default()),
            assets_dir: PathBuf::from("public"),
        };
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);

        for _ in 0..3 {
            assert_eq!(handle_request(&state, &Method::Get, "/").status, 200);
        }
        assert_eq!(source.loads.load(Ordering::SeqCst), 4);

        // Re-selecting the current basin is a full reload too.
        assert_eq!(handle_request(&state, &Method::Get, "/?basin=ping").status, 200);
        assert_eq!(source.loads.load(Ordering::SeqCst), 5);
        assert_eq!(state.store.current().basin.id, "ping");

        // JSON and exports read the snapshot the page was built from.
        handle_request(&state, &Method::Get, "/api/report");
        assert_eq!(source.loads.load(Ordering::SeqCst), 5);

        // A rejected basin does not fetch.
        assert_eq!(handle_request(&state, &Method::Get, "/?basin=mekong").status, 400);
        assert_eq!(source.loads.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_report_json_uses_sentinel() {
        let state = state(PathBuf::from("public"));
        let reply = handle_request(&state, &Method::Get, "/api/report");
        assert_eq!(reply.content_type, "application/json");
        let json = body_json(&reply);
        assert_eq!(json["dams"][0]["val"], "-");
        assert_eq!(json["dams"][0]["text_level"], "ไม่มีข้อมูล");
    }

    #[test]
    fn test_export_download_headers() {
        let state = state(PathBuf::from("public"));
        let reply = handle_request(&state, &Method::Get, "/export/png?prefix=weekly");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/png");
        assert_eq!(&reply.body[..4], b"\x89PNG");
        let (_, disposition) = reply.headers.iter().find(|(n, _)| n == "Content-Disposition").unwrap();
        assert!(disposition.contains("weekly.png"));
    }

    #[test]
    fn test_bad_export_format() {
        let state = state(PathBuf::from("public"));
        let reply = handle_request(&state, &Method::Get, "/export/gif");
        assert_eq!(reply.status, 400);
    }

    #[test]
    fn test_assets_served_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ResBlue.png"), b"\x89PNG").unwrap();
        let state = state(dir.path().to_path_buf());

        let reply = handle_request(&state, &Method::Get, "/assets/ResBlue.png");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/png");

        assert_eq!(handle_request(&state, &Method::Get, "/assets/missing.png").status, 404);
        assert_eq!(handle_request(&state, &Method::Get, "/assets/..%2FResBlue.png").status, 400);
    }

    #[test]
    fn test_unknown_path_lists_endpoints() {
        let state = state(PathBuf::from("public"));
        let reply = handle_request(&state, &Method::Get, "/nope");
        assert_eq!(reply.status, 404);
        assert!(body_json(&reply)["available_endpoints"].as_array().unwrap().len() >= 6);

        assert_eq!(handle_request(&state, &Method::Post, "/").status, 404);
    }
}
