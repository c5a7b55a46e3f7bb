//! End-to-end check: filenames + configuration → validated file list or a
//! fatal, report-carrying error.
//!
//! ```text
//! filenames ─tokenize→ FileTable ─inventory→ DatasetInventory
//!                          │                     │ select (RunConfig)
//!                          └──restrict──→ analyzed table + ExpectedSpace
//!                                              │ validate
//!                                       CompletenessReport ─enforce→ CSVs / error
//! ```

use crate::completeness::validate;
use crate::config::RunConfig;
use crate::error::{CheckError, SelectionError};
use crate::inventory::DatasetInventory;
use crate::report::CompletenessReport;
use crate::selection::SelectedAxes;
use crate::space::{ExpectedSpace, GridDims};
use crate::token::{FileTable, tokenize};
use serde::Serialize;
use std::path::Path;

/// Everything resolved before validation runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPlan {
    pub experiment: String,
    pub inventory: DatasetInventory,
    pub axes: SelectedAxes,
    pub grid: GridDims,
    pub expected: ExpectedSpace,
    #[serde(skip)]
    pub analyzed: FileTable,
}

impl CheckPlan {
    pub fn build<S: AsRef<str>>(filenames: &[S], config: &RunConfig) -> Result<Self, CheckError> {
        let standard = config.selector()?.resolve(filenames)?;
        let table = tokenize(filenames, standard)?;
        let inventory = DatasetInventory::from_table(&table);
        let experiment = config
            .experiment
            .clone()
            .unwrap_or_else(|| inventory.experiment.clone());

        let grid = GridDims::resolve(config.grid, inventory.max_panel)?;
        let axes = SelectedAxes::resolve(&inventory, config)?;
        let analyzed = table
            .restrict(&axes.wells, &axes.timepoints)
            .restrict_channels(&axes.channels);
        if analyzed.is_empty() {
            return Err(SelectionError::NoMatchingFiles.into());
        }
        let expected = ExpectedSpace::new(&axes, grid);

        Ok(Self {
            experiment,
            inventory,
            axes,
            grid,
            expected,
            analyzed,
        })
    }

    /// Basenames of the files that survive selection.
    pub fn analyzed_files(&self) -> Vec<String> {
        self.analyzed.iter().map(|r| r.filename.clone()).collect()
    }

    pub fn validate(&self) -> CompletenessReport {
        let table = self
            .analyzed
            .restrict(&self.expected.wells, &self.expected.timepoints);
        validate(&table, &self.expected)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub plan: CheckPlan,
    pub analyzed_files: Vec<String>,
    /// `None` when the completeness check was disabled.
    pub report: Option<CompletenessReport>,
}

/// Run the whole pipeline. Report CSVs are written into `output_dir` before
/// a completeness failure is returned.
pub fn run_check<S: AsRef<str>>(
    filenames: &[S],
    config: &RunConfig,
    output_dir: &Path,
) -> Result<CheckOutcome, CheckError> {
    let plan = CheckPlan::build(filenames, config)?;
    let analyzed_files = plan.analyzed_files();
    let report = if config.check_data {
        let report = plan.validate().enforce(output_dir, &plan.experiment)?;
        tracing::info!(digest = %report.digest(), "dataset is complete");
        Some(report)
    } else {
        tracing::info!("completeness check skipped");
        None
    };
    Ok(CheckOutcome {
        plan,
        analyzed_files,
        report,
    })
}

