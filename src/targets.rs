//! Target slot registry for the Chiang Mai water situation report.
//!
//! Defines the fixed, ordered lists of reservoirs, dams and water stations
//! the report always shows, with or without matching data, plus the basins
//! the time-series selector can switch between. This is the single source of
//! truth for location names - reconciliation and rendering should reference
//! slots from here rather than hardcoding names.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Reservoirs and dams
// ---------------------------------------------------------------------------

/// Medium-sized reservoirs, in the order of the two-column reservoir grid.
pub static TARGET_RESERVOIRS: &[&str] = &[
    "อ่างเก็บน้ำแม่แหลงหลวง",
    "อ่างเก็บน้ำห้วยเดื่อ",
    "อ่างเก็บน้ำแม่ทะลบหลวง",
    "อ่างเก็บน้ำห้วยแม่ข้อน",
    "อ่างเก็บน้ำแม่โก๋น",
    "อ่างเก็บน้ำห้วยแม่ออน",
    "อ่างเก็บน้ำแม่จอกหลวง",
    "อ่างเก็บน้ำห้วยมะนาว",
    "อ่างเก็บน้ำโป่งจ้อ",
    "อ่างเก็บน้ำสันหนอง",
    "อ่างเก็บน้ำแม่ตูบ",
];

/// Large dams, top to bottom in the dam column.
pub static TARGET_DAMS: &[&str] = &["เขื่อนแม่งัดสมบูรณ์ชล", "เขื่อนแม่กวง"];

// ---------------------------------------------------------------------------
// Water stations (positioned on the river diagram)
// ---------------------------------------------------------------------------

/// Which side of the river diagram a station tag hangs from. Left-side tags
/// are mirrored so their pointer faces the river.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A water-station slot with its fixed position on the river diagram.
#[derive(Debug, PartialEq, Serialize)]
pub struct StationSlot {
    /// Name used for matching against the water-station endpoint.
    pub name: &'static str,
    /// Label shown on the tag when it differs from `name` (may contain `\n`).
    pub display_name: Option<&'static str>,
    pub side: Side,
    /// Distance from the top of the diagram, percent.
    pub top_pct: f32,
    /// Distance from the `side` edge of the diagram, percent.
    pub edge_pct: f32,
    pub width_px: u32,
    pub height_px: u32,
    /// Smaller name font for long labels.
    pub name_font_px: Option<u32>,
}

impl StationSlot {
    pub fn label(&self) -> &'static str {
        self.display_name.unwrap_or(self.name)
    }
}

const fn left(name: &'static str, top_pct: f32, edge_pct: f32, width_px: u32, height_px: u32) -> StationSlot {
    StationSlot { name, display_name: None, side: Side::Left, top_pct, edge_pct, width_px, height_px, name_font_px: None }
}

const fn right(name: &'static str, top_pct: f32, edge_pct: f32, width_px: u32, height_px: u32) -> StationSlot {
    StationSlot { name, display_name: None, side: Side::Right, top_pct, edge_pct, width_px, height_px, name_font_px: None }
}

/// Water stations along the Ping river and its tributaries, left bank first
/// (north to south), then right bank.
pub static TARGET_WATER_STATIONS: &[StationSlot] = &[
    // Left side
    left("สถานีสะพานห้วยแม่สาว", 23.2, 32.2, 160, 95),
    left("สถานีแม่อาย", 31.7, 29.8, 150, 90),
    left("สถานีบ้านช่อแล", 39.5, 32.2, 160, 95),
    left("สถานีฮอด", 49.5, 25.9, 140, 90),
    left("สถานีสันทราย", 58.8, 24.7, 140, 80),
    left("สถานีสะพานบ้านแม่สา", 70.7, 25.0, 150, 90),
    left("สถานีทต.ทุ่งสะโตก", 79.3, 25.0, 150, 90),
    // Right side
    right("สถานีเชียงดาว", 30.7, 29.8, 160, 95),
    right("สถานีบ้านเชียงดาว", 39.5, 25.4, 150, 90),
    right("สถานีแม่แตง", 48.5, 24.7, 155, 85),
    StationSlot {
        display_name: Some("สถานีฝ่ายส่งน้ำและ\nบำรุงรักษาที่ 2"),
        name_font_px: Some(8),
        ..right("สถานีฝ่ายส่งน้ำและบำรุงรักษาที่ 2", 56.5, 24.7, 155, 90)
    },
    StationSlot {
        display_name: Some("สถานีบ้านแม่แต\n*สถานีเฝ้าระวัง"),
        name_font_px: Some(8),
        ..right("สถานีบ้านแม่แต", 64.2, 37.7, 160, 95)
    },
    StationSlot {
        display_name: Some("สถานีสะพานนวรัฐ\n*สถานีเตือนภัย"),
        name_font_px: Some(8),
        ..right("สถานีสะพานนวรัฐ", 73.0, 29.0, 160, 95)
    },
    StationSlot {
        display_name: Some("สถานีสะพานห้วย\nแม่ตาช้าง"),
        ..right("สถานีสะพานห้วยแม่ตาช้าง", 81.0, 31.3, 160, 100)
    },
];

// ---------------------------------------------------------------------------
// Basins (time-series selector)
// ---------------------------------------------------------------------------

/// A river basin the rainfall / soil-moisture / SPEI fixtures are keyed by.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Basin {
    pub id: &'static str,
    pub name: &'static str,
}

pub const DEFAULT_BASIN: &str = "ping";

pub static BASINS: &[Basin] = &[
    Basin { id: "ping", name: "ลุ่มน้ำปิงตอนบน" },
    Basin { id: "mae_taeng", name: "ลุ่มน้ำแม่แตง" },
    Basin { id: "mae_ngat", name: "ลุ่มน้ำแม่งัด" },
    Basin { id: "mae_kuang", name: "ลุ่มน้ำแม่กวง" },
    Basin { id: "mae_chaem", name: "ลุ่มน้ำแม่แจ่ม" },
];

/// Looks up a basin by id. Returns `None` if not found.
pub fn find_basin(id: &str) -> Option<&'static Basin> {
    BASINS.iter().find(|b| b.id == id)
}

/// Looks up a water-station slot by its matching name.
pub fn find_station_slot(name: &str) -> Option<&'static StationSlot> {
    TARGET_WATER_STATIONS.iter().find(|s| s.name == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_sizes_match_report_layout() {
        assert_eq!(TARGET_RESERVOIRS.len(), 11, "reservoir grid has 11 cells");
        assert_eq!(TARGET_DAMS.len(), 2, "dam column has 2 dams");
        assert_eq!(TARGET_WATER_STATIONS.len(), 14, "river diagram has 14 tags");
    }

    #[test]
    fn test_no_duplicate_target_names() {
        let mut seen = HashSet::new();
        for name in TARGET_RESERVOIRS.iter().chain(TARGET_DAMS) {
            assert!(seen.insert(*name), "duplicate target '{}'", name);
        }
        for slot in TARGET_WATER_STATIONS {
            assert!(seen.insert(slot.name), "duplicate station '{}'", slot.name);
        }
    }

    #[test]
    fn test_station_positions_inside_diagram() {
        for slot in TARGET_WATER_STATIONS {
            assert!(slot.top_pct > 0.0 && slot.top_pct < 100.0, "{}", slot.name);
            assert!(slot.edge_pct > 0.0 && slot.edge_pct < 50.0, "{}", slot.name);
            assert!(slot.width_px > 0 && slot.height_px > 0, "{}", slot.name);
        }
    }

    #[test]
    fn test_left_stations_listed_before_right() {
        let first_right = TARGET_WATER_STATIONS
            .iter()
            .position(|s| s.side == Side::Right)
            .expect("right-side stations exist");
        assert!(TARGET_WATER_STATIONS[..first_right].iter().all(|s| s.side == Side::Left));
        assert!(TARGET_WATER_STATIONS[first_right..].iter().all(|s| s.side == Side::Right));
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let mae_ai = find_station_slot("สถานีแม่อาย").expect("แม่อาย in registry");
        assert_eq!(mae_ai.label(), "สถานีแม่อาย");

        let nawarat = find_station_slot("สถานีสะพานนวรัฐ").expect("นวรัฐ in registry");
        assert!(nawarat.label().contains('\n'));
        assert_eq!(nawarat.name_font_px, Some(8));
    }

    #[test]
    fn test_default_basin_is_registered() {
        assert!(find_basin(DEFAULT_BASIN).is_some());
        assert!(find_basin("nowhere").is_none());
    }
}
