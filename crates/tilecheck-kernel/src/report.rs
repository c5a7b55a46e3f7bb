//! Missing/extra tile reports: rendering, CSV output and the fatal
//! enforcement step.

use crate::completeness::{Classification, WellStatus};
use crate::error::DatasetError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const COLUMN_GAP: &str = "  ";

/// Which report a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Missing,
    Extra,
}

impl ReportKind {
    /// Suffix of the timepoint columns (`T3_missing-tiles`).
    pub fn column_suffix(self) -> &'static str {
        match self {
            Self::Missing => "missing-tiles",
            Self::Extra => "extra-tiles",
        }
    }

    /// Suffix of the CSV file name (`<experiment>_missing-images.csv`).
    pub fn file_suffix(self) -> &'static str {
        match self {
            Self::Missing => "missing-images",
            Self::Extra => "extra-images",
        }
    }
}

/// One (well, channel, timepoint) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileCell {
    /// Tile indices in `1..=tiles` not observed; empty when all present.
    Missing(Vec<u32>),
    /// Tile indices observed more than once, with their multiplicity.
    Duplicated(Vec<(u32, usize)>),
    /// No row reached this cell. Rendered as every tile index, which also
    /// covers cells emptied by an earlier filter.
    Absent,
}

impl TileCell {
    pub fn observed(kind: ReportKind, panels: &[u32], tiles: u32) -> Self {
        match kind {
            ReportKind::Missing => {
                Self::Missing((1..=tiles).filter(|i| !panels.contains(i)).collect())
            }
            ReportKind::Extra => {
                let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
                for &panel in panels {
                    *counts.entry(panel).or_insert(0) += 1;
                }
                Self::Duplicated(counts.into_iter().filter(|&(_, n)| n > 1).collect())
            }
        }
    }

    /// Comma-joined rendering used in both CSV and table output.
    pub fn render(&self, tiles: u32) -> String {
        match self {
            Self::Missing(indices) => join_indices(indices.iter().copied()),
            Self::Duplicated(counts) => counts
                .iter()
                .map(|(tile, n)| format!("{tile}:{n}"))
                .collect::<Vec<_>>()
                .join(","),
            Self::Absent => join_indices(1..=tiles),
        }
    }
}

fn join_indices(indices: impl Iterator<Item = u32>) -> String {
    indices.map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileReportRow {
    pub well: String,
    pub channel: String,
    /// One cell per report timepoint, in order.
    pub cells: Vec<TileCell>,
}

/// A `Well, Channel, T<k>_…` table for one defect kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileReport {
    pub kind: ReportKind,
    pub tiles_per_well: u32,
    pub timepoints: Vec<u32>,
    pub rows: Vec<TileReportRow>,
}

impl TileReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Well".to_string(), "Channel".to_string()];
        headers.extend(
            self.timepoints
                .iter()
                .map(|tp| format!("T{tp}_{}", self.kind.column_suffix())),
        );
        headers
    }

    pub fn rendered_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut out = vec![row.well.clone(), row.channel.clone()];
                out.extend(row.cells.iter().map(|c| c.render(self.tiles_per_well)));
                out
            })
            .collect()
    }

    /// Fixed-width, right-aligned table used in error messages.
    pub fn render_table(&self) -> String {
        let headers = self.headers();
        let rows = self.rendered_rows();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:>w$}"))
                .collect::<Vec<_>>()
                .join(COLUMN_GAP)
        };
        let mut lines = vec![line(&headers)];
        lines.extend(rows.iter().map(|r| line(r)));
        lines.join("\n")
    }

    pub fn file_name(&self, experiment: &str) -> String {
        format!("{experiment}_{}.csv", self.kind.file_suffix())
    }

    /// Write the report as CSV into `output_dir`, returning its path.
    pub fn write_csv(&self, output_dir: &Path, experiment: &str) -> Result<PathBuf, DatasetError> {
        let path = output_dir.join(self.file_name(experiment));
        self.write_csv_to(&path)
            .map_err(|source| DatasetError::WriteReport {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "wrote tile report");
        Ok(path)
    }

    fn write_csv_to(&self, path: &Path) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.headers())?;
        for row in self.rendered_rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Outcome of validating one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub tiles_per_well: u32,
    pub wells: Vec<WellStatus>,
    pub classification: Classification,
    pub incomplete: TileReport,
    pub extra: TileReport,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty() && self.extra.is_empty()
    }

    /// Deterministic digest of the canonical JSON form.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("completeness report serializes to json");
        let hash = Sha256::digest(&bytes);
        let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
        format!("sha256:{hex}")
    }

    /// Write each non-empty report to `output_dir`.
    pub fn write_reports(
        &self,
        output_dir: &Path,
        experiment: &str,
    ) -> Result<Vec<PathBuf>, DatasetError> {
        [&self.incomplete, &self.extra]
            .into_iter()
            .filter(|report| !report.is_empty())
            .map(|report| report.write_csv(output_dir, experiment))
            .collect()
    }

    /// Fail on any defect. Missing tiles take precedence; the extra report,
    /// when also present, travels with the error.
    pub fn into_result(self) -> Result<Self, DatasetError> {
        if !self.incomplete.is_empty() {
            let extra = (!self.extra.is_empty()).then(|| self.extra.clone());
            return Err(DatasetError::Incomplete {
                report: self.incomplete,
                extra,
            });
        }
        if !self.extra.is_empty() {
            return Err(DatasetError::ExtraTiles { report: self.extra });
        }
        Ok(self)
    }

    /// Write every non-empty report, then fail if any was written.
    pub fn enforce(self, output_dir: &Path, experiment: &str) -> Result<Self, DatasetError> {
        self.write_reports(output_dir, experiment)?;
        self.into_result()
    }
}
