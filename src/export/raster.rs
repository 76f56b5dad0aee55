//! Schematic raster of the report and the PNG/JPEG encoders.
//!
//! `BlockRasterizer` paints the fixed layout as flat colored panels: title
//! band, day cards in their accent colors, reservoir and dam blocks in their
//! storage-tier colors, station tags at their diagram positions, and bars
//! for the forecast and SPEI rows. Text is not drawn.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use super::Rasterizer;
use crate::model::ExportError;
use crate::palette::{StorageTier, WaterLevelClass, day_accent, hex_to_rgb};
use crate::render::{DAYS_PER_WEEK, PAGE_MIN_WIDTH_PX};
use crate::report::ReportSnapshot;
use crate::targets::Side;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TITLE_BLUE: &str = "#004aad";
const PANEL_BLUE: &str = "#2d5f8b";
const FORECAST_BAR: &str = "#4f8fd6";
const DROUGHT_BAR: &str = "#dd5252";
const NO_DATA_GRAY: &str = "#b4b4b4";

/// Upper bound on device pixels per capture (256 MiB of RGBA).
pub const MAX_CAPTURE_PIXELS: u64 = 64 * 1024 * 1024;

// Layout, CSS pixels.
const MARGIN: f32 = 32.0;
const GAP: f32 = 12.0;
const TITLE_H: f32 = 64.0;
const DAY_ROW_H: f32 = 150.0;
const STORAGE_ROW_H: f32 = 900.0;
const OUTLOOK_ROW_H: f32 = 220.0;
const FORECAST_WEEKS: usize = 8;
const SPEI_MONTHS: usize = 6;

/// Total layout height in CSS pixels.
pub fn layout_height() -> u32 {
    let rows = TITLE_H + 2.0 * DAY_ROW_H + STORAGE_ROW_H + 2.0 * OUTLOOK_ROW_H;
    (rows + 2.0 * MARGIN + 5.0 * GAP).ceil() as u32
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Wraps the image with a CSS-px to device-px scale.
struct Canvas {
    image: RgbaImage,
    scale: f32,
}

impl Canvas {
    /// Allocates the device-pixel buffer, refusing sizes that overflow or
    /// exceed `MAX_CAPTURE_PIXELS`.
    fn new(width: u32, height: u32, pixel_ratio: u32) -> Result<Self, ExportError> {
        let too_large = || {
            ExportError::Rasterize(format!(
                "capture of {}x{} px at ratio {} is too large",
                width, height, pixel_ratio
            ))
        };
        let px_w = width.checked_mul(pixel_ratio).ok_or_else(too_large)?;
        let px_h = height.checked_mul(pixel_ratio).ok_or_else(too_large)?;
        if u64::from(px_w) * u64::from(px_h) > MAX_CAPTURE_PIXELS {
            return Err(too_large());
        }
        let image = RgbaImage::from_pixel(px_w, px_h, WHITE);
        Ok(Canvas { image, scale: pixel_ratio as f32 })
    }

    /// Fills a rectangle given in CSS pixels. Zero-area rectangles are
    /// skipped.
    fn fill(&mut self, x: f32, y: f32, w: f32, h: f32, color: &str) -> Result<(), ExportError> {
        let [r, g, b] = hex_to_rgb(color).ok_or_else(|| ExportError::Rasterize(format!("bad color {}", color)))?;
        let (px_w, px_h) = ((w * self.scale).round(), (h * self.scale).round());
        if px_w < 1.0 || px_h < 1.0 {
            return Ok(());
        }
        let rect = Rect::at((x * self.scale).round() as i32, (y * self.scale).round() as i32)
            .of_size(px_w as u32, px_h as u32);
        draw_filled_rect_mut(&mut self.image, rect, Rgba([r, g, b, 255]));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rasterizer
// ---------------------------------------------------------------------------

/// Flat-panel painter for the fixed report layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRasterizer;

impl Rasterizer for BlockRasterizer {
    fn prepare(&self, view: &ReportSnapshot) -> Result<(), ExportError> {
        let colors = view
            .reservoirs
            .iter()
            .map(|e| StorageTier::classify(e.val).dam_color())
            .chain(view.dams.iter().map(|e| StorageTier::classify(e.val).dam_color()))
            .chain(view.stations.iter().map(|e| WaterLevelClass::classify(&e.text_level).swatch()))
            .chain((0..DAYS_PER_WEEK).map(day_accent));
        for color in colors {
            if hex_to_rgb(color).is_none() {
                return Err(ExportError::Assets(format!("color token {} is not #rrggbb", color)));
            }
        }
        for entry in &view.stations {
            let slot = entry.slot;
            if !(0.0..100.0).contains(&slot.top_pct) || !(0.0..100.0).contains(&slot.edge_pct) {
                return Err(ExportError::Assets(format!("station {} is placed off the diagram", slot.name)));
            }
        }
        Ok(())
    }

    fn natural_width(&self, _view: &ReportSnapshot) -> u32 {
        PAGE_MIN_WIDTH_PX
    }

    fn rasterize(&self, view: &ReportSnapshot, width: u32, pixel_ratio: u32) -> Result<RgbaImage, ExportError> {
        if width == 0 || pixel_ratio == 0 {
            return Err(ExportError::Rasterize("empty capture".to_string()));
        }
        let mut canvas = Canvas::new(width, layout_height(), pixel_ratio)?;
        let inner = width as f32 - 2.0 * MARGIN;
        let mut y = MARGIN;

        canvas.fill(MARGIN, y, inner, TITLE_H, TITLE_BLUE)?;
        y += TITLE_H + GAP;

        let rain_days = view.rainfall.as_ref().map_or(0, |r| r.days.len());
        paint_day_row(&mut canvas, MARGIN, y, inner, rain_days)?;
        y += DAY_ROW_H + GAP;

        let soil_days = view.soil_moisture.as_ref().map_or(0, |s| s.days.len());
        paint_day_row(&mut canvas, MARGIN, y, inner, soil_days)?;
        y += DAY_ROW_H + GAP;

        paint_storage_row(&mut canvas, view, MARGIN, y, inner)?;
        y += STORAGE_ROW_H + GAP;

        let weeks: Vec<f64> = view
            .rain_forecast
            .as_ref()
            .map(|f| f.weeks.iter().map(|w| w.value).collect())
            .unwrap_or_default();
        paint_bars(&mut canvas, MARGIN, y, inner, FORECAST_WEEKS, &weeks, FORECAST_BAR)?;
        y += OUTLOOK_ROW_H + GAP;

        let months: Vec<f64> = view
            .drought
            .as_ref()
            .map(|d| d.months.iter().map(|m| m.value.abs()).collect())
            .unwrap_or_default();
        paint_bars(&mut canvas, MARGIN, y, inner, SPEI_MONTHS, &months, DROUGHT_BAR)?;

        Ok(canvas.image)
    }
}

/// Seven cards in accent colors; days without data are gray.
fn paint_day_row(canvas: &mut Canvas, x: f32, y: f32, w: f32, present: usize) -> Result<(), ExportError> {
    canvas.fill(x, y, w, DAY_ROW_H, PANEL_BLUE)?;
    let card_w = (w - GAP * (DAYS_PER_WEEK as f32 + 1.0)) / DAYS_PER_WEEK as f32;
    for i in 0..DAYS_PER_WEEK {
        let color = if i < present { day_accent(i) } else { NO_DATA_GRAY };
        let card_x = x + GAP + i as f32 * (card_w + GAP);
        canvas.fill(card_x, y + GAP, card_w, DAY_ROW_H - 2.0 * GAP, color)?;
    }
    Ok(())
}

fn paint_storage_row(canvas: &mut Canvas, view: &ReportSnapshot, x: f32, y: f32, w: f32) -> Result<(), ExportError> {
    // Column split 1 : 0.8 : 1.2, matching the page grid.
    let unit = (w - 2.0 * GAP) / 3.0;
    let (res_w, dam_w, river_w) = (unit, unit * 0.8, unit * 1.2);
    let dam_x = x + res_w + GAP;
    let river_x = dam_x + dam_w + GAP;

    canvas.fill(x, y, res_w, STORAGE_ROW_H, PANEL_BLUE)?;
    let rows = view.reservoirs.len().div_ceil(2).max(1);
    let cell_w = (res_w - 3.0 * GAP) / 2.0;
    let cell_h = (STORAGE_ROW_H - GAP * (rows as f32 + 1.0)) / rows as f32;
    for (i, entry) in view.reservoirs.iter().enumerate() {
        let (col, row) = ((i % 2) as f32, (i / 2) as f32);
        let color = StorageTier::classify(entry.val).dam_color();
        canvas.fill(x + GAP + col * (cell_w + GAP), y + GAP + row * (cell_h + GAP), cell_w, cell_h, color)?;
    }

    canvas.fill(dam_x, y, dam_w, STORAGE_ROW_H, PANEL_BLUE)?;
    let dams = view.dams.len().max(1);
    let dam_h = (STORAGE_ROW_H - GAP * (dams as f32 + 1.0)) / dams as f32;
    for (i, entry) in view.dams.iter().enumerate() {
        let color = StorageTier::classify(entry.val).dam_color();
        canvas.fill(dam_x + GAP, y + GAP + i as f32 * (dam_h + GAP), dam_w - 2.0 * GAP, dam_h, color)?;
    }

    canvas.fill(river_x, y, river_w, STORAGE_ROW_H, PANEL_BLUE)?;
    for entry in &view.stations {
        let slot = entry.slot;
        let color = WaterLevelClass::classify(&entry.text_level).swatch();
        let (tag_w, tag_h) = (slot.width_px as f32, slot.height_px as f32);
        let tag_y = y + STORAGE_ROW_H * slot.top_pct / 100.0;
        let tag_x = match slot.side {
            Side::Left => river_x + river_w * slot.edge_pct / 100.0,
            Side::Right => river_x + river_w - river_w * slot.edge_pct / 100.0 - tag_w,
        };
        canvas.fill(tag_x, tag_y, tag_w, tag_h.min(y + STORAGE_ROW_H - tag_y), color)?;
    }
    Ok(())
}

/// `slots` bars scaled to the largest value; missing slots stay gray stubs.
fn paint_bars(
    canvas: &mut Canvas,
    x: f32,
    y: f32,
    w: f32,
    slots: usize,
    values: &[f64],
    color: &str,
) -> Result<(), ExportError> {
    canvas.fill(x, y, w, OUTLOOK_ROW_H, PANEL_BLUE)?;
    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    let bar_w = (w - GAP * (slots as f32 + 1.0)) / slots as f32;
    let full_h = OUTLOOK_ROW_H - 2.0 * GAP;
    for i in 0..slots {
        let bar_x = x + GAP + i as f32 * (bar_w + GAP);
        match values.get(i) {
            Some(v) if max > 0.0 => {
                let h = (full_h * (*v / max) as f32).max(GAP);
                canvas.fill(bar_x, y + GAP + full_h - h, bar_w, h, color)?;
            }
            _ => canvas.fill(bar_x, y + GAP + full_h - GAP, bar_w, GAP, NO_DATA_GRAY)?,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgba8)?;
    Ok(bytes)
}

/// Composites onto white; JPEG has no alpha channel.
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let rgb = flatten_onto_white(image);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::reconcile::{reconcile_dams, reconcile_reservoirs, reconcile_stations};
    use crate::model::{DamRecord, Reading};
    use crate::targets::{TARGET_DAMS, TARGET_RESERVOIRS, TARGET_WATER_STATIONS, find_basin};
    use chrono::Utc;

    fn snapshot() -> ReportSnapshot {
        ReportSnapshot {
            basin: find_basin("ping").unwrap(),
            generated_at: Utc::now(),
            reservoirs: reconcile_reservoirs(TARGET_RESERVOIRS, &[]),
            dams: reconcile_dams(TARGET_DAMS, &[]),
            stations: reconcile_stations(TARGET_WATER_STATIONS, &[]),
            rainfall: None,
            soil_moisture: None,
            rain_forecast: None,
            drought: None,
        }
    }

    #[test]
    fn test_raster_size_follows_width_and_ratio() {
        let image = BlockRasterizer.rasterize(&snapshot(), 1360, 2).unwrap();
        assert_eq!(image.width(), 2720);
        assert_eq!(image.height(), layout_height() * 2);
    }

    #[test]
    fn test_background_is_white() {
        let image = BlockRasterizer.rasterize(&snapshot(), 1360, 1).unwrap();
        assert_eq!(*image.get_pixel(1, 1), WHITE);
        assert_eq!(*image.get_pixel(1359, layout_height() - 1), WHITE);
    }

    #[test]
    fn test_dam_block_uses_tier_color() {
        let mut view = snapshot();
        view.dams = reconcile_dams(
            TARGET_DAMS,
            &[DamRecord { name: "เขื่อนแม่งัดสมบูรณ์ชล".to_string(), val: Reading::Measured(71.6), text_level: "น้ำมาก".to_string() }],
        );
        let image = BlockRasterizer.rasterize(&view, 1360, 1).unwrap();

        // Centre of the first dam block.
        let inner = 1360.0 - 2.0 * MARGIN;
        let unit = (inner - 2.0 * GAP) / 3.0;
        let dam_x = MARGIN + unit + GAP + unit * 0.4;
        let storage_y = MARGIN + TITLE_H + GAP + 2.0 * (DAY_ROW_H + GAP);
        let pixel = image.get_pixel(dam_x as u32, (storage_y + STORAGE_ROW_H / 4.0) as u32);
        assert_eq!(*pixel, Rgba([0xd6, 0x5c, 0x59, 255]));
    }

    #[test]
    fn test_prepare_accepts_reconciled_view() {
        assert!(BlockRasterizer.prepare(&snapshot()).is_ok());
    }

    #[test]
    fn test_zero_width_is_error() {
        let err = BlockRasterizer.rasterize(&snapshot(), 0, 2).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));
    }

    #[test]
    fn test_oversized_capture_is_error_not_panic() {
        // 70000 * 70000 does not fit in a u32.
        let err = BlockRasterizer.rasterize(&snapshot(), 70_000, 70_000).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));

        // Fits in a u32 but is far beyond the pixel budget.
        let err = BlockRasterizer.rasterize(&snapshot(), 60_000, 4).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(ref m) if m.contains("too large")));
    }

    #[test]
    fn test_flatten_blends_alpha_onto_white() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flat = flatten_onto_white(&image);
        assert_eq!(*flat.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*flat.get_pixel(1, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_encoders_write_signatures() {
        let image = RgbaImage::from_pixel(4, 4, WHITE);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let jpeg = encode_jpeg(&image, 92).unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }
}
