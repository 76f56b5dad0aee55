/// Presentation mapping: values and category labels to display tokens.
///
/// Every mapping is an ordered table evaluated top to bottom; the first row
/// that accepts the input wins. Numeric bounds are inclusive upper bounds,
/// so a reservoir at exactly 10% is still critically low.

use crate::model::{DAM_NO_DATA_LABEL, Reading};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Storage tiers (reservoirs and dams)
// ---------------------------------------------------------------------------

/// Storage level band for a percent-of-capacity reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StorageTier {
    NoData,
    CriticallyLow,
    Low,
    Normal,
    High,
    Overflow,
}

/// `(inclusive upper bound, tier)`, checked in order.
const STORAGE_BOUNDS: &[(f64, StorageTier)] = &[
    (10.0, StorageTier::CriticallyLow),
    (30.0, StorageTier::Low),
    (70.0, StorageTier::Normal),
    (100.0, StorageTier::High),
];

impl StorageTier {
    /// Classifies a storage percentage. NaN and the no-data sentinel both
    /// map to `NoData`.
    pub fn classify(reading: Reading) -> Self {
        let Some(pct) = reading.value() else {
            return StorageTier::NoData;
        };
        if pct.is_nan() {
            return StorageTier::NoData;
        }
        STORAGE_BOUNDS
            .iter()
            .find(|(bound, _)| pct <= *bound)
            .map_or(StorageTier::Overflow, |(_, tier)| *tier)
    }

    /// Icon for a cell in the reservoir grid.
    pub fn reservoir_image(&self) -> &'static str {
        match self {
            StorageTier::NoData => "/ResNodata.png",
            StorageTier::CriticallyLow => "/ResYellow.png",
            StorageTier::Low => "/ResGreen.png",
            StorageTier::Normal => "/ResBlue.png",
            StorageTier::High => "/ResRed.png",
            StorageTier::Overflow => "/ResDarkred.png",
        }
    }

    /// Fill color for a dam block.
    pub fn dam_color(&self) -> &'static str {
        match self {
            StorageTier::NoData => "#b4b4b4",
            StorageTier::CriticallyLow => "#fcfd71",
            StorageTier::Low => "#78d491",
            StorageTier::Normal => "#6c9cde",
            StorageTier::High => "#d65c59",
            StorageTier::Overflow => "#ab5252",
        }
    }
}

// ---------------------------------------------------------------------------
// Water-level classes (station tags)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaterLevelClass {
    NoData,
    CriticallyLow,
    Low,
    Normal,
    High,
    Overflow,
}

/// Label keywords in match order. `น้ำน้อยวิกฤต` contains `น้ำน้อย`, so it
/// has to come first.
const WATER_LEVEL_KEYWORDS: &[(&str, WaterLevelClass)] = &[
    ("น้ำน้อยวิกฤต", WaterLevelClass::CriticallyLow),
    ("น้ำน้อย", WaterLevelClass::Low),
    ("น้ำปกติ", WaterLevelClass::Normal),
    ("น้ำมาก", WaterLevelClass::High),
    ("น้ำล้นตลิ่ง", WaterLevelClass::Overflow),
];

impl WaterLevelClass {
    pub fn classify(text_level: &str) -> Self {
        let label = text_level.trim();
        if label.is_empty() || label == DAM_NO_DATA_LABEL {
            return WaterLevelClass::NoData;
        }
        WATER_LEVEL_KEYWORDS
            .iter()
            .find(|(keyword, _)| label.contains(keyword))
            .map_or(WaterLevelClass::NoData, |(_, class)| *class)
    }

    pub fn tag_image(&self) -> &'static str {
        match self {
            WaterLevelClass::NoData => "/tag_gray.png",
            WaterLevelClass::CriticallyLow => "/tag_yellow.png",
            WaterLevelClass::Low => "/tag_green.png",
            WaterLevelClass::Normal => "/tag_blue.png",
            WaterLevelClass::High => "/tag_red.png",
            WaterLevelClass::Overflow => "/tag_darkred.png",
        }
    }

    /// Flat color of the tag image, for the export raster.
    pub fn swatch(&self) -> &'static str {
        match self {
            WaterLevelClass::NoData => "#b4b4b4",
            WaterLevelClass::CriticallyLow => "#fcfd71",
            WaterLevelClass::Low => "#78d491",
            WaterLevelClass::Normal => "#6c9cde",
            WaterLevelClass::High => "#d65c59",
            WaterLevelClass::Overflow => "#ab5252",
        }
    }
}

/// Text color on a station tag or dam label pill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextTone {
    Black,
    White,
}

impl TextTone {
    pub fn css(&self) -> &'static str {
        match self {
            TextTone::Black => "#000000",
            TextTone::White => "#ffffff",
        }
    }
}

/// Dark tags (high water, overflow) get white text.
pub fn water_tag_text_tone(text_level: &str) -> TextTone {
    if text_level.contains("น้ำมาก") || text_level.contains("น้ำล้นตลิ่ง") {
        TextTone::White
    } else {
        TextTone::Black
    }
}

// ---------------------------------------------------------------------------
// Day cards
// ---------------------------------------------------------------------------

pub const DAY_ACCENTS: &[&str] = &[
    "#d69999", "#dfbc7d", "#cd9cba", "#77a479", "#d19772", "#84b9d8", "#9d8ac4",
];

/// Accent color for the `index`-th day card; cycles after seven.
pub fn day_accent(index: usize) -> &'static str {
    DAY_ACCENTS[index % DAY_ACCENTS.len()]
}

/// Parses a `#rrggbb` color into RGB. Used by the export rasterizer.
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
