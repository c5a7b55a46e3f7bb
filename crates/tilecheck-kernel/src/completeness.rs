//! Per-axis completeness validation.
//!
//! Three independent group-and-count passes, each holding two dimensions
//! fixed and counting along the third:
//!
//! ```text
//! panel      (well, timepoint, channel) → rows        vs tiles_per_well
//! timepoint  (well, channel)            → distinct tp  vs |timepoints|
//! channel    (well, timepoint, panel)   → rows        vs |channels|
//! ```
//!
//! Under-counts flag a well as incomplete, over-counts flag it as having
//! extras. Flagged sets are unioned across axes, so a well only needs to
//! fail one axis to be reported.

use crate::report::{CompletenessReport, ReportKind, TileCell, TileReport, TileReportRow};
use crate::space::ExpectedSpace;
use crate::token::FileTable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Panel,
    Timepoint,
    Channel,
}

/// Wells flagged by one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisFlags {
    pub axis: Axis,
    pub expected: usize,
    /// Wells with at least one group counted below `expected`.
    pub under: BTreeSet<String>,
    /// Wells with at least one group counted above `expected`.
    pub over: BTreeSet<String>,
}

/// Flag every group whose count falls outside `[expected, expected]`.
fn flag_counts<K>(
    axis: Axis,
    counts: &BTreeMap<K, usize>,
    expected: usize,
    well_of: impl Fn(&K) -> &str,
) -> AxisFlags {
    let mut flags = AxisFlags {
        axis,
        expected,
        under: BTreeSet::new(),
        over: BTreeSet::new(),
    };
    for (key, &count) in counts {
        if count < expected {
            flags.under.insert(well_of(key).to_string());
        } else if count > expected {
            flags.over.insert(well_of(key).to_string());
        }
    }
    tracing::debug!(
        ?axis,
        expected,
        under = flags.under.len(),
        over = flags.over.len(),
        "axis checked"
    );
    flags
}

fn count_by<K: Ord>(keys: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Tile rows per (well, timepoint, channel).
pub fn check_panels(table: &FileTable, expected: &ExpectedSpace) -> AxisFlags {
    let counts = count_by(
        table
            .iter()
            .map(|r| (r.well.as_str(), r.timepoint, r.channel.as_str())),
    );
    flag_counts(
        Axis::Panel,
        &counts,
        expected.tiles_per_well as usize,
        |k| k.0,
    )
}

/// Distinct timepoints per (well, channel).
pub fn check_timepoints(table: &FileTable, expected: &ExpectedSpace) -> AxisFlags {
    let present: BTreeSet<(&str, &str, u32)> = table
        .iter()
        .map(|r| (r.well.as_str(), r.channel.as_str(), r.timepoint))
        .collect();
    let counts = count_by(present.into_iter().map(|(well, channel, _)| (well, channel)));
    flag_counts(Axis::Timepoint, &counts, expected.timepoints.len(), |k| k.0)
}

/// Rows per (well, timepoint, panel); each row is one channel image.
pub fn check_channels(table: &FileTable, expected: &ExpectedSpace) -> AxisFlags {
    let counts = count_by(
        table
            .iter()
            .map(|r| (r.well.as_str(), r.timepoint, r.panel)),
    );
    flag_counts(Axis::Channel, &counts, expected.channels.len(), |k| k.0)
}

/// Per-well outcome. A well can be both incomplete and have extras when
/// different slices show opposite defects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellStatus {
    pub well: String,
    pub incomplete: bool,
    pub has_extras: bool,
}

impl WellStatus {
    pub fn is_complete(&self) -> bool {
        !self.incomplete && !self.has_extras
    }
}

/// Union of the three axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub axes: Vec<AxisFlags>,
    pub incomplete_wells: BTreeSet<String>,
    pub extra_wells: BTreeSet<String>,
}

impl Classification {
    pub fn status(&self, well: &str) -> WellStatus {
        WellStatus {
            well: well.to_string(),
            incomplete: self.incomplete_wells.contains(well),
            has_extras: self.extra_wells.contains(well),
        }
    }
}

pub fn classify(table: &FileTable, expected: &ExpectedSpace) -> Classification {
    let axes = vec![
        check_panels(table, expected),
        check_timepoints(table, expected),
        check_channels(table, expected),
    ];
    let mut incomplete_wells = BTreeSet::new();
    let mut extra_wells = BTreeSet::new();
    for flags in &axes {
        incomplete_wells.extend(flags.under.iter().cloned());
        extra_wells.extend(flags.over.iter().cloned());
    }
    Classification {
        axes,
        incomplete_wells,
        extra_wells,
    }
}

/// Build the per-timepoint tile report for `flagged` wells.
///
/// Every distinct (well, channel) of the flagged wells becomes one row and
/// every expected timepoint one cell. A (well, channel, timepoint) with no
/// rows at all is recorded as [`TileCell::Absent`], which renders as the
/// full tile range.
pub fn assemble_report(
    kind: ReportKind,
    table: &FileTable,
    flagged: &BTreeSet<String>,
    expected: &ExpectedSpace,
) -> TileReport {
    let subset = table.restrict_wells(flagged);
    let mut observed: BTreeMap<(&str, &str), BTreeMap<u32, Vec<u32>>> = BTreeMap::new();
    for record in subset.iter() {
        observed
            .entry((record.well.as_str(), record.channel.as_str()))
            .or_default()
            .entry(record.timepoint)
            .or_default()
            .push(record.panel);
    }

    let rows = observed
        .iter()
        .map(|(&(well, channel), by_timepoint)| TileReportRow {
            well: well.to_string(),
            channel: channel.to_string(),
            cells: expected
                .timepoints
                .iter()
                .map(|tp| match by_timepoint.get(tp) {
                    Some(panels) => TileCell::observed(kind, panels, expected.tiles_per_well),
                    None => TileCell::Absent,
                })
                .collect(),
        })
        .collect();

    TileReport {
        kind,
        tiles_per_well: expected.tiles_per_well,
        timepoints: expected.timepoints.iter().copied().collect(),
        rows,
    }
}

/// Classify the table against `expected` and assemble both reports.
///
/// The table must already be restricted to the selected wells and
/// timepoints.
pub fn validate(table: &FileTable, expected: &ExpectedSpace) -> CompletenessReport {
    let classification = classify(table, expected);
    let incomplete = assemble_report(
        ReportKind::Missing,
        table,
        &classification.incomplete_wells,
        expected,
    );
    let extra = assemble_report(
        ReportKind::Extra,
        table,
        &classification.extra_wells,
        expected,
    );
    let wells = expected
        .wells
        .iter()
        .map(|well| classification.status(well))
        .collect();
    if !classification.incomplete_wells.is_empty() || !classification.extra_wells.is_empty() {
        tracing::warn!(
            incomplete = classification.incomplete_wells.len(),
            extra = classification.extra_wells.len(),
            "dataset failed completeness check"
        );
    }
    CompletenessReport {
        tiles_per_well: expected.tiles_per_well,
        wells,
        classification,
        incomplete,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::TokenStandard;
    use crate::token::tokenize;

    fn space(wells: &[&str], timepoints: &[u32], channels: &[&str], tiles: u32) -> ExpectedSpace {
        ExpectedSpace {
            wells: wells.iter().map(|s| s.to_string()).collect(),
            timepoints: timepoints.iter().copied().collect(),
            channels: channels.iter().map(|s| s.to_string()).collect(),
            tiles_per_well: tiles,
        }
    }

    fn names(specs: &[(&str, u32, &str, u32)]) -> Vec<String> {
        specs
            .iter()
            .map(|(well, tp, channel, panel)| {
                format!("PID1_Expt_T{tp}_0_{well}_{panel}_{channel}.tif")
            })
            .collect()
    }

    #[test]
    fn flag_counts_splits_under_and_over() {
        let counts = BTreeMap::from([("A01", 3), ("B01", 4), ("C01", 5)]);
        let flags = flag_counts(Axis::Panel, &counts, 4, |k| *k);
        assert_eq!(flags.under, BTreeSet::from(["A01".to_string()]));
        assert_eq!(flags.over, BTreeSet::from(["C01".to_string()]));
    }

    #[test]
    fn panel_axis_catches_missing_and_duplicate_tiles() {
        let table = tokenize(
            &names(&[
                ("A01", 0, "GFP", 1),
                ("A01", 0, "GFP", 2),
                ("B01", 0, "GFP", 1),
                ("B01", 0, "GFP", 2),
                ("B01", 0, "GFP", 2),
            ]),
            TokenStandard::Robo3,
        )
        .unwrap();
        let expected = space(&["A01", "B01"], &[0], &["GFP"], 2);
        let flags = check_panels(&table, &expected);
        assert!(flags.under.is_empty());
        assert_eq!(flags.over, BTreeSet::from(["B01".to_string()]));
    }

    #[test]
    fn timepoint_axis_counts_distinct_timepoints() {
        let table = tokenize(
            &names(&[
                ("A01", 0, "GFP", 1),
                ("A01", 0, "GFP", 1),
                ("A01", 1, "GFP", 1),
                ("B01", 0, "GFP", 1),
            ]),
            TokenStandard::Robo3,
        )
        .unwrap();
        let expected = space(&["A01", "B01"], &[0, 1], &["GFP"], 1);
        let flags = check_timepoints(&table, &expected);
        assert_eq!(flags.under, BTreeSet::from(["B01".to_string()]));
        assert!(flags.over.is_empty());
    }

    #[test]
    fn channel_axis_catches_missing_channel() {
        let table = tokenize(
            &names(&[
                ("A01", 0, "GFP", 1),
                ("A01", 0, "RFP", 1),
                ("B01", 0, "GFP", 1),
            ]),
            TokenStandard::Robo3,
        )
        .unwrap();
        let expected = space(&["A01", "B01"], &[0], &["GFP", "RFP"], 1);
        let flags = check_channels(&table, &expected);
        assert_eq!(flags.under, BTreeSet::from(["B01".to_string()]));
    }

    #[test]
    fn complete_table_flags_nothing() {
        let mut specs = Vec::new();
        for well in ["A01", "B01"] {
            for tp in [0, 1] {
                for channel in ["GFP", "RFP"] {
                    for panel in 1..=4 {
                        specs.push((well, tp, channel, panel));
                    }
                }
            }
        }
        let table = tokenize(&names(&specs), TokenStandard::Robo3).unwrap();
        let expected = space(&["A01", "B01"], &[0, 1], &["GFP", "RFP"], 4);
        let classification = classify(&table, &expected);
        assert!(classification.incomplete_wells.is_empty());
        assert!(classification.extra_wells.is_empty());
        assert!(classification.status("A01").is_complete());
    }

    #[test]
    fn opposite_defects_flag_both_sets() {
        let table = tokenize(
            &names(&[
                ("A01", 0, "GFP", 1),
                ("A01", 0, "GFP", 1),
                ("A01", 0, "GFP", 2),
                ("A01", 1, "GFP", 1),
            ]),
            TokenStandard::Robo3,
        )
        .unwrap();
        let expected = space(&["A01"], &[0, 1], &["GFP"], 2);
        let status = classify(&table, &expected).status("A01");
        assert!(status.incomplete);
        assert!(status.has_extras);
        assert!(!status.is_complete());
    }

    #[test]
    fn absent_timepoint_is_recorded_as_absent_cell() {
        let table = tokenize(
            &names(&[("A01", 0, "GFP", 1), ("A01", 0, "GFP", 2)]),
            TokenStandard::Robo3,
        )
        .unwrap();
        let expected = space(&["A01"], &[0, 1], &["GFP"], 2);
        let report = assemble_report(
            ReportKind::Missing,
            &table,
            &BTreeSet::from(["A01".to_string()]),
            &expected,
        );
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].cells[0], TileCell::Missing(vec![]));
        assert_eq!(report.rows[0].cells[1], TileCell::Absent);
    }
}
