/// Report export: PNG, JPG or single-page PDF.
///
/// An export paints the current snapshot with a `Rasterizer`, then encodes
/// the raster. Only one export runs at a time; an overlapping request is
/// refused with `ExportError::Busy` rather than queued.
///
/// Capture width is `max(natural width, min_width)` times the pixel ratio,
/// so the fixed desktop layout never reflows in the exported image.

pub mod pdf;
pub mod raster;

use base64::Engine;
use image::RgbaImage;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ExportSettings;
use crate::model::ExportError;
use crate::report::ReportSnapshot;

pub use raster::BlockRasterizer;

/// Prefix applied when the caller passes an empty one.
pub const DEFAULT_FILE_PREFIX: &str = "water-report";

/// Text of the blocking alert shown when a download fails.
pub const DOWNLOAD_FAILED_ALERT: &str = "เกิดข้อผิดพลาดในการดาวน์โหลด";

pub fn failure_alert(err: &ExportError) -> String {
    format!("{}: {}", DOWNLOAD_FAILED_ALERT, err)
}

// ---------------------------------------------------------------------------
// Formats and artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unsupported export format '{}' (expected png, jpg or pdf)", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A finished export, ready to be written to disk or sent as a download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `data:<mime>;base64,...`, the form a browser link can download from.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

// ---------------------------------------------------------------------------
// Rasterizer seam
// ---------------------------------------------------------------------------

/// Paints a snapshot to pixels.
pub trait Rasterizer: Send + Sync {
    /// Checks that everything the view references is ready to paint.
    fn prepare(&self, view: &ReportSnapshot) -> Result<(), ExportError>;

    /// Width the view lays out at, in CSS pixels.
    fn natural_width(&self, view: &ReportSnapshot) -> u32;

    /// Paints the view `width` CSS pixels wide at `pixel_ratio` device pixels
    /// per CSS pixel, on a white background.
    fn rasterize(&self, view: &ReportSnapshot, width: u32, pixel_ratio: u32) -> Result<RgbaImage, ExportError>;
}

pub fn capture_width(natural_width: u32, min_width: u32) -> u32 {
    natural_width.max(min_width)
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Holds the busy flag for the life of one export.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ExportError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::Busy)?;
        Ok(BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Exporter {
    rasterizer: Box<dyn Rasterizer>,
    settings: ExportSettings,
    busy: AtomicBool,
}

impl Exporter {
    pub fn new(settings: ExportSettings) -> Self {
        Self::with_rasterizer(settings, Box::new(BlockRasterizer))
    }

    pub fn with_rasterizer(settings: ExportSettings, rasterizer: Box<dyn Rasterizer>) -> Self {
        Exporter {
            rasterizer,
            settings,
            busy: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Exports `view` as `{prefix}.{ext}`. With no view attached there is
    /// nothing to capture, and the call returns `Ok(None)`.
    ///
    /// # Errors
    /// `ExportError::Busy` while another export runs; otherwise whatever the
    /// rasterizer or encoder reports. The busy flag is released either way.
    pub fn export(
        &self,
        view: Option<&ReportSnapshot>,
        format: ExportFormat,
        prefix: &str,
    ) -> Result<Option<ExportArtifact>, ExportError> {
        let Some(view) = view else {
            log::debug!("export requested with no report attached; skipping");
            return Ok(None);
        };

        let _guard = BusyGuard::acquire(&self.busy)?;

        self.rasterizer.prepare(view)?;

        let width = capture_width(self.rasterizer.natural_width(view), self.settings.min_width);
        let ratio = self.settings.pixel_ratio.max(1);
        let image = self.rasterizer.rasterize(view, width, ratio)?;
        log::debug!("rasterized report at {}x{} px", image.width(), image.height());

        let bytes = match format {
            ExportFormat::Png => raster::encode_png(&image)?,
            ExportFormat::Jpg => raster::encode_jpeg(&image, self.settings.jpeg_quality)?,
            ExportFormat::Pdf => {
                let jpeg = raster::encode_jpeg(&image, self.settings.jpeg_quality)?;
                // Page size follows the capture in CSS pixels; the image
                // keeps its full device resolution.
                pdf::single_page_pdf(&jpeg, image.width(), image.height(), width, image.height() / ratio)?
            }
        };

        let prefix = match prefix.trim() {
            "" => DEFAULT_FILE_PREFIX,
            p => p,
        };
        let artifact = ExportArtifact {
            filename: format!("{}.{}", prefix, format.extension()),
            format,
            bytes,
        };
        log::info!("exported {} ({} bytes)", artifact.filename, artifact.bytes.len());
        Ok(Some(artifact))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
