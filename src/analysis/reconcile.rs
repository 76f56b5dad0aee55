//! Slot reconciliation.
//!
//! The report always shows the same reservoirs, dams and stations in the
//! same order, whatever the APIs return. `reconcile` walks the target list
//! and, for each slot, takes the first source record the match rule accepts.
//! Unmatched slots get the `"-"` sentinel.
//!
//! Matching rules:
//! - reservoirs: exact name equality
//! - dams, water stations: bidirectional substring containment, first match
//!   in source order wins
//!
//! The substring rule is loose on purpose: API names carry suffixes such as
//! station codes or full dam names. When two records both contain a target
//! name, source order decides; the report currently depends on that order.

use crate::model::{
    DAM_NO_DATA_LABEL, DamEntry, DamRecord, Reading, ReservoirEntry, ReservoirRecord,
    StationEntry, WaterStationRecord,
};
use crate::targets::StationSlot;

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Produces exactly one entry per target, in target order.
///
/// `matches(target, record)` decides whether a record belongs to a slot; the
/// first accepted record (in `records` order) is passed to `build`, or `None`
/// when nothing matches.
pub fn reconcile<T, R, E>(
    targets: &[T],
    records: &[R],
    matches: impl Fn(&T, &R) -> bool,
    build: impl Fn(&T, Option<&R>) -> E,
) -> Vec<E> {
    targets
        .iter()
        .map(|target| {
            let found = records.iter().find(|record| matches(target, record));
            build(target, found)
        })
        .collect()
}

/// True if either name contains the other.
pub fn names_overlap(target: &str, source: &str) -> bool {
    source.contains(target) || target.contains(source)
}

// ---------------------------------------------------------------------------
// Per-source policies
// ---------------------------------------------------------------------------

/// Exact-name reconciliation for reservoirs.
pub fn reconcile_reservoirs(targets: &[&str], records: &[ReservoirRecord]) -> Vec<ReservoirEntry> {
    reconcile(
        targets,
        records,
        |target, record| record.name == *target,
        |target, found| match found {
            Some(record) => ReservoirEntry {
                name: record.name.clone(),
                val: record.val,
            },
            None => ReservoirEntry {
                name: target.to_string(),
                val: Reading::NoData,
            },
        },
    )
}

/// Substring reconciliation for dams. A matched entry keeps the API's name
/// and label; an unmatched one shows the target name and `ไม่มีข้อมูล`.
pub fn reconcile_dams(targets: &[&str], records: &[DamRecord]) -> Vec<DamEntry> {
    reconcile(
        targets,
        records,
        |target, record| names_overlap(target, &record.name),
        |target, found| match found {
            Some(record) => DamEntry {
                name: record.name.clone(),
                val: record.val,
                text_level: record.text_level.clone(),
            },
            None => DamEntry {
                name: target.to_string(),
                val: Reading::NoData,
                text_level: DAM_NO_DATA_LABEL.to_string(),
            },
        },
    )
}

/// Substring reconciliation for water stations. The slot (name, position,
/// label) always comes from the registry; only value and label come from the
/// matched record.
pub fn reconcile_stations(
    slots: &'static [StationSlot],
    records: &[WaterStationRecord],
) -> Vec<StationEntry> {
    let targets: Vec<&'static StationSlot> = slots.iter().collect();
    reconcile(
        &targets,
        records,
        |slot, record| names_overlap(slot.name, &record.name),
        |slot, found| StationEntry {
            slot: *slot,
            val: found.map_or(Reading::NoData, |r| r.val),
            text_level: found.map(|r| r.text_level.clone()).unwrap_or_default(),
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
