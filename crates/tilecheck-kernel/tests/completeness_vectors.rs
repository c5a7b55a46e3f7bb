//! Integration tests: synthetic acquisitions run through the full pipeline.
//!
//! Each dataset is generated as Robo3 filenames
//! (`PID_Expt_T<k>_<hours>_<well>_<panel>_<channel>.tif`), optionally with
//! tiles removed or duplicated, then checked end to end.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tilecheck_kernel::{
    CheckError, CheckOutcome, DatasetError, GridDims, ReportKind, RunConfig, Selection, TileCell,
    TokenStandard, Toggle, run_check, tokenize, validate,
};

const WELLS: [&str; 2] = ["A01", "B02"];
const TIMEPOINTS: [u32; 2] = [0, 1];
const CHANNELS: [&str; 2] = ["GFP", "RFP"];
const TILES: u32 = 4;

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "tilecheck-kernel-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn filename(well: &str, tp: u32, channel: &str, panel: u32) -> String {
    format!("PID20230514_Survival_T{tp}_{}_{well}_{panel}_{channel}.tif", tp * 24)
}

fn complete_dataset() -> Vec<String> {
    let mut names = Vec::new();
    for well in WELLS {
        for tp in TIMEPOINTS {
            for channel in CHANNELS {
                for panel in 1..=TILES {
                    names.push(filename(well, tp, channel, panel));
                }
            }
        }
    }
    names
}

fn without(names: Vec<String>, drop: impl Fn(&str) -> bool) -> Vec<String> {
    names.into_iter().filter(|n| !drop(n)).collect()
}

fn expect_dataset_error(result: Result<CheckOutcome, CheckError>) -> DatasetError {
    match result {
        Err(CheckError::Dataset(err)) => err,
        Err(other) => panic!("expected dataset error, got {other}"),
        Ok(_) => panic!("expected dataset error, run succeeded"),
    }
}

#[test]
fn robo0_filename_round_trips_core_fields() {
    let table = tokenize(
        &["PID1_Expt_T2_2-1_A01_3_GFP_0_1_0.tif"],
        TokenStandard::Robo0,
    )
    .expect("robo0 filename should tokenize");
    let record = &table.records()[0];
    assert_eq!(record.timepoint, 2);
    assert_eq!(record.well, "A01");
    assert_eq!(record.panel, 3);
    assert_eq!(record.channel, "GFP");
}

#[test]
fn complete_dataset_passes_without_reports() {
    let out = TempDirGuard::new("complete");
    let names = complete_dataset();
    let outcome = run_check(&names, &RunConfig::default(), out.path())
        .expect("complete dataset should pass");

    let report = outcome.report.expect("check_data defaults to on");
    assert!(report.is_complete());
    assert!(report.wells.iter().all(|w| w.is_complete()));
    assert_eq!(outcome.analyzed_files.len(), names.len());
    assert_eq!(outcome.plan.grid, GridDims { rows: 2, cols: 2 });
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn missing_tile_is_listed_and_written() {
    let out = TempDirGuard::new("missing");
    let names = without(complete_dataset(), |n| n == filename("A01", 1, "GFP", 3));
    let err = expect_dataset_error(run_check(&names, &RunConfig::default(), out.path()));

    let DatasetError::Incomplete { report, extra } = err else {
        panic!("expected incomplete error");
    };
    assert!(extra.is_none());
    assert_eq!(report.kind, ReportKind::Missing);
    let gfp = report
        .rows
        .iter()
        .find(|r| r.well == "A01" && r.channel == "GFP")
        .expect("A01/GFP row");
    assert_eq!(gfp.cells[1].render(TILES), "3");
    assert_eq!(gfp.cells[0].render(TILES), "");

    let csv = fs::read_to_string(out.path().join("Survival_missing-images.csv"))
        .expect("missing report should be written");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Well,Channel,T0_missing-tiles,T1_missing-tiles")
    );
    assert!(csv.contains("A01,GFP,,3"));
}

#[test]
fn duplicate_tile_records_multiplicity() {
    let out = TempDirGuard::new("duplicate");
    let mut names = complete_dataset();
    names.push(filename("B02", 0, "RFP", 1));

    let err = expect_dataset_error(run_check(&names, &RunConfig::default(), out.path()));
    let DatasetError::ExtraTiles { report } = err else {
        panic!("expected extra-tiles error");
    };
    let rfp = report
        .rows
        .iter()
        .find(|r| r.well == "B02" && r.channel == "RFP")
        .expect("B02/RFP row");
    assert_eq!(rfp.cells[0], TileCell::Duplicated(vec![(1, 2)]));
    insta::assert_json_snapshot!(report.rendered_rows(), @r###"
    [
      [
        "B02",
        "GFP",
        "",
        ""
      ],
      [
        "B02",
        "RFP",
        "1:2",
        ""
      ]
    ]
    "###);
    assert!(out.path().join("Survival_extra-images.csv").exists());
    assert!(!out.path().join("Survival_missing-images.csv").exists());
}

#[test]
fn missing_timepoint_is_flagged_by_timepoint_axis() {
    let names = without(complete_dataset(), |n| {
        n.contains("_T1_") && n.contains("_B02_")
    });
    let table = tokenize(&names, TokenStandard::Robo3).unwrap();
    let expected = tilecheck_kernel::ExpectedSpace {
        wells: WELLS.iter().map(|w| w.to_string()).collect(),
        timepoints: TIMEPOINTS.into_iter().collect(),
        channels: CHANNELS.iter().map(|c| c.to_string()).collect(),
        tiles_per_well: TILES,
    };
    let report = validate(&table, &expected);

    let timepoint_axis = &report.classification.axes[1];
    assert_eq!(timepoint_axis.axis, tilecheck_kernel::Axis::Timepoint);
    assert_eq!(timepoint_axis.under, BTreeSet::from(["B02".to_string()]));
    assert!(report.classification.incomplete_wells.contains("B02"));

    for row in &report.incomplete.rows {
        assert_eq!(row.well, "B02");
        assert_eq!(row.cells[1], TileCell::Absent);
        assert_eq!(row.cells[1].render(TILES), "1,2,3,4");
    }
}

#[test]
fn well_flagged_by_several_axes_appears_once_per_channel() {
    // Drop every RFP tile of A01 at T0: timepoint and channel axes both fire.
    let names = without(complete_dataset(), |n| {
        n.contains("_T0_") && n.contains("_A01_") && n.ends_with("_RFP.tif")
    });
    let table = tokenize(&names, TokenStandard::Robo3).unwrap();
    let expected = tilecheck_kernel::ExpectedSpace {
        wells: WELLS.iter().map(|w| w.to_string()).collect(),
        timepoints: TIMEPOINTS.into_iter().collect(),
        channels: CHANNELS.iter().map(|c| c.to_string()).collect(),
        tiles_per_well: TILES,
    };
    let report = validate(&table, &expected);

    let flagged_by: Vec<_> = report
        .classification
        .axes
        .iter()
        .filter(|axis| axis.under.contains("A01"))
        .map(|axis| axis.axis)
        .collect();
    assert!(flagged_by.len() >= 2);
    assert_eq!(
        report.classification.incomplete_wells,
        BTreeSet::from(["A01".to_string()])
    );
    let rows: Vec<_> = report
        .incomplete
        .rows
        .iter()
        .map(|r| (r.well.as_str(), r.channel.as_str()))
        .collect();
    assert_eq!(rows, vec![("A01", "GFP"), ("A01", "RFP")]);
}

#[test]
fn both_reports_are_written_when_both_defects_occur() {
    let out = TempDirGuard::new("both");
    let mut names = without(complete_dataset(), |n| n == filename("A01", 0, "GFP", 2));
    names.push(filename("B02", 1, "GFP", 4));

    let err = expect_dataset_error(run_check(&names, &RunConfig::default(), out.path()));
    assert!(matches!(err, DatasetError::Incomplete { extra: Some(_), .. }));
    let message = err.to_string();
    assert!(message.starts_with("dataset is missing images"));
    assert!(message.contains("T0_missing-tiles"));
    assert!(message.contains("dataset has extra tiles"));
    assert!(message.contains("T1_extra-tiles"));
    assert!(out.path().join("Survival_missing-images.csv").exists());
    assert!(out.path().join("Survival_extra-images.csv").exists());
}

#[test]
fn extra_report_fills_timepoints_with_no_rows() {
    let out = TempDirGuard::new("extra-absent");
    let mut names = without(complete_dataset(), |n| {
        n.contains("_T1_") && n.contains("_B02_") && n.ends_with("_RFP.tif")
    });
    names.push(filename("B02", 0, "RFP", 1));

    let err = expect_dataset_error(run_check(&names, &RunConfig::default(), out.path()));
    let DatasetError::Incomplete {
        extra: Some(extra), ..
    } = err
    else {
        panic!("expected incomplete error carrying the extra report");
    };
    let rfp = extra
        .rows
        .iter()
        .find(|r| r.well == "B02" && r.channel == "RFP")
        .expect("B02/RFP row");
    assert_eq!(rfp.cells[0], TileCell::Duplicated(vec![(1, 2)]));
    assert_eq!(rfp.cells[1], TileCell::Absent);
    assert_eq!(rfp.cells[1].render(TILES), "1,2,3,4");

    let csv = fs::read_to_string(out.path().join("Survival_extra-images.csv"))
        .expect("extra report should be written");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Well,Channel,T0_extra-tiles,T1_extra-tiles"));
    assert!(csv.lines().any(|line| line == "B02,RFP,1:2,\"1,2,3,4\""));
    assert!(csv.lines().any(|line| line == "B02,GFP,,"));
}

#[test]
fn excluded_well_is_not_validated() {
    let out = TempDirGuard::new("exclude");
    let names = without(complete_dataset(), |n| n == filename("A01", 0, "GFP", 1));
    let config = RunConfig {
        wells: Selection::new(Toggle::Exclude, "A01"),
        ..RunConfig::default()
    };
    let outcome = run_check(&names, &config, out.path()).expect("B02 alone is complete");
    assert!(outcome.analyzed_files.iter().all(|n| n.contains("_B02_")));
}

#[test]
fn skipped_check_returns_plan_only() {
    let out = TempDirGuard::new("skip");
    let names = without(complete_dataset(), |n| n == filename("A01", 0, "GFP", 1));
    let config = RunConfig {
        check_data: false,
        ..RunConfig::default()
    };
    let outcome = run_check(&names, &config, out.path()).expect("check disabled");
    assert!(outcome.report.is_none());
}

#[test]
fn non_square_panel_count_needs_explicit_grid() {
    let out = TempDirGuard::new("grid");
    let names: Vec<String> = (1..=6).map(|p| filename("A01", 0, "GFP", p)).collect();
    let err = run_check(&names, &RunConfig::default(), out.path()).unwrap_err();
    assert!(matches!(err, CheckError::Grid(_)));

    let config = RunConfig {
        grid: Some(GridDims { rows: 2, cols: 3 }),
        ..RunConfig::default()
    };
    let outcome = run_check(&names, &config, out.path()).expect("2x3 grid is complete");
    assert_eq!(outcome.plan.expected.tiles_per_well, 6);
}

#[test]
fn mixed_token_counts_are_a_schema_mismatch() {
    let out = TempDirGuard::new("schema");
    let names = vec![
        filename("A01", 0, "GFP", 1),
        "PID1_Expt_T0_0-0_A01_1_GFP_0_1_0.tif".to_string(),
    ];
    let err = run_check(&names, &RunConfig::default(), out.path()).unwrap_err();
    assert!(matches!(
        err,
        CheckError::Token(tilecheck_kernel::TokenError::SchemaMismatch { .. })
    ));
}
