use crate::cli::ToggleArg;
use crate::support::{
    existing_dir_or_exit, image_basenames_or_exit, join_display, load_config_or_exit,
    print_json_or_exit, read_log_heads,
};
use serde_json::{Value, json};
use std::path::Path;
use tilecheck_kernel::{
    CheckError, CheckOutcome, DatasetError, GridDims, RunConfig, Selection, TimepointHours,
    elapsed_hours_for, run_check, timepoint_hours,
};

const CHECK_KIND: &str = "tilecheck.dataset_check.v1";

pub struct Args {
    pub input_dir: String,
    pub output_dir: String,
    pub config: Option<String>,
    pub robo: Option<i64>,
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub wells_toggle: ToggleArg,
    pub wells: Option<String>,
    pub timepoints_toggle: ToggleArg,
    pub timepoints: Option<String>,
    pub channels_toggle: ToggleArg,
    pub channels: Option<String>,
    pub morphology_channel: Option<String>,
    pub experiment: Option<String>,
    pub skip_check: bool,
    pub json: bool,
}

/// Config file values, overridden by whichever flags were given.
fn merged_config(args: &Args) -> RunConfig {
    let mut config = load_config_or_exit(args.config.as_deref());
    if let Some(code) = args.robo {
        config.standard = code;
    }
    if let (Some(rows), Some(cols)) = (args.rows, args.cols) {
        config.grid = Some(GridDims { rows, cols });
    }
    if let Some(items) = &args.wells {
        config.wells = Selection::new(args.wells_toggle.into(), items.as_str());
    }
    if let Some(items) = &args.timepoints {
        config.timepoints = Selection::new(args.timepoints_toggle.into(), items.as_str());
    }
    if let Some(items) = &args.channels {
        config.channels = Selection::new(args.channels_toggle.into(), items.as_str());
    }
    if args.morphology_channel.is_some() {
        config.morphology_channel = args.morphology_channel.clone();
    }
    if args.experiment.is_some() {
        config.experiment = args.experiment.clone();
    }
    if args.skip_check {
        config.check_data = false;
    }
    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
    config
}

/// Elapsed hours are informational; unreadable logs only produce a warning.
fn acquisition_hours(input_dir: &Path) -> Vec<TimepointHours> {
    let heads = match read_log_heads(input_dir) {
        Ok(heads) => heads,
        Err(e) => {
            tracing::warn!(error = %e, "could not read acquisition logs");
            return Vec::new();
        }
    };
    timepoint_hours(&heads).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not derive elapsed hours");
        Vec::new()
    })
}

fn accepted_payload(outcome: &CheckOutcome, hours: &[TimepointHours]) -> Value {
    let plan = &outcome.plan;
    json!({
        "schema": 1,
        "checkKind": CHECK_KIND,
        "result": "accepted",
        "standard": plan.inventory.standard,
        "experiment": plan.experiment,
        "wells": plan.axes.wells,
        "timepoints": plan.axes.timepoints,
        "channels": plan.axes.channels,
        "morphologyChannel": plan.axes.morphology_channel,
        "grid": plan.grid,
        "tilesPerWell": plan.expected.tiles_per_well,
        "analyzedFileCount": outcome.analyzed_files.len(),
        "checked": outcome.report.is_some(),
        "digest": outcome.report.as_ref().map(|r| r.digest()),
        "elapsedHours": elapsed_hours_for(hours, &plan.axes.timepoints),
        "timepointHours": hours,
    })
}

fn rejected_payload(error: &CheckError) -> Value {
    let (missing, extra) = match error {
        CheckError::Dataset(DatasetError::Incomplete { report, extra }) => {
            (Some(report), extra.as_ref())
        }
        CheckError::Dataset(DatasetError::ExtraTiles { report }) => (None, Some(report)),
        _ => (None, None),
    };
    json!({
        "schema": 1,
        "checkKind": CHECK_KIND,
        "result": "rejected",
        "error": error.to_string(),
        "missing": missing.map(|r| json!({ "headers": r.headers(), "rows": r.rendered_rows() })),
        "extra": extra.map(|r| json!({ "headers": r.headers(), "rows": r.rendered_rows() })),
    })
}

fn print_accepted(outcome: &CheckOutcome, hours: &[TimepointHours]) {
    let plan = &outcome.plan;
    let verdict = if outcome.report.is_some() {
        "OK"
    } else {
        "SKIPPED"
    };
    println!("[tilecheck] {verdict} ({})", plan.experiment);
    println!("  Standard: {}", plan.inventory.standard);
    println!("  Wells: {}", join_display(&plan.axes.wells));
    println!(
        "  Timepoints: {}",
        join_display(plan.axes.timepoints.iter().map(|tp| format!("T{tp}")))
    );
    println!("  Channels: {}", join_display(&plan.axes.channels));
    if let Some(channel) = &plan.axes.morphology_channel {
        println!("  Morphology channel: {channel}");
    }
    println!(
        "  Grid: {}x{} ({} tiles per well)",
        plan.grid.rows, plan.grid.cols, plan.expected.tiles_per_well
    );
    println!("  Analyzed files: {}", outcome.analyzed_files.len());
    let elapsed = elapsed_hours_for(hours, &plan.axes.timepoints);
    if !elapsed.is_empty() {
        println!("  Elapsed hours: {}", join_display(elapsed));
        for row in hours {
            println!(
                "    T{:<3} {:>6.1}h  {} {}  {}",
                row.timepoint, row.elapsed_hours, row.start_date, row.start_time, row.first_image
            );
        }
    }
    if let Some(report) = &outcome.report {
        println!("  Digest: {}", report.digest());
    }
}

pub fn run(args: Args) {
    let config = merged_config(&args);
    let input_dir = existing_dir_or_exit(&args.input_dir, "input");
    let output_dir = existing_dir_or_exit(&args.output_dir, "output");
    let filenames = image_basenames_or_exit(&input_dir);
    tracing::info!(files = filenames.len(), input = %input_dir.display(), "scanned input folder");

    match run_check(&filenames, &config, &output_dir) {
        Ok(outcome) => {
            let hours = acquisition_hours(&input_dir);
            if args.json {
                print_json_or_exit(&accepted_payload(&outcome, &hours), "check");
            } else {
                print_accepted(&outcome, &hours);
            }
        }
        Err(e) => {
            if args.json {
                print_json_or_exit(&rejected_payload(&e), "check");
            } else {
                eprintln!("error: {e}");
            }
            std::process::exit(1);
        }
    }
}
