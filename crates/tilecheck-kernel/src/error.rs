//! Error types for tilecheck kernel operations.
//!
//! Every error here is terminal for a run: there is no partial-success
//! mode, the caller fixes the dataset or the configuration and re-runs.

use crate::report::TileReport;
use crate::standard::TokenStandard;
use std::path::PathBuf;

/// Failures while splitting filenames into typed records.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// No filenames were supplied, so there is nothing to detect or parse.
    #[error("no files to process")]
    EmptyInput,

    /// The robo code does not name a known token standard.
    #[error("unknown token standard code {0} (expected 0, 1 for auto-detect, 3, or 4)")]
    UnknownStandardCode(i64),

    /// Auto-detection only accepts 7, 10, or 13 tokens.
    #[error(
        "auto-detect token standard requires filenames have either 7, 10, or 13 tokens; \
         `{filename}` has {actual}"
    )]
    UndetectableTokenCount { filename: String, actual: usize },

    #[error("schema mismatch: `{filename}` has {actual} tokens but {standard} expects {expected}")]
    SchemaMismatch {
        filename: String,
        standard: TokenStandard,
        expected: usize,
        actual: usize,
    },

    #[error("token parse error: field `{field}` of `{filename}` has non-numeric value `{raw}`")]
    TokenParse {
        filename: String,
        field: &'static str,
        raw: String,
    },
}

/// Failures while applying user include/exclude lists.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("confirm that the selected wells ({0}) exist in the dataset")]
    UnknownWells(String),

    #[error("confirm that the selected timepoints ({0}) exist within the dataset")]
    UnknownTimepoints(String),

    #[error("no channel matches `{fragment}` (available: {available})")]
    UnknownChannel { fragment: String, available: String },

    #[error("channel `{fragment}` is ambiguous: matches {matches}")]
    AmbiguousChannel { fragment: String, matches: String },

    #[error("malformed {kind} selection item `{item}`")]
    MalformedSelection { kind: &'static str, item: String },

    #[error("the morphology channel ({channel}) was not found within the selected channels ({selected})")]
    MorphologyChannelNotSelected { channel: String, selected: String },

    #[error("no image files match the selected include/exclude criteria")]
    NoMatchingFiles,
}

/// Failures while deriving the tile-grid size.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("array size {0} is not square; enter the array dimensions explicitly")]
    NotPerfectSquare(u32),

    #[error("grid dimensions must be non-zero (rows={rows}, cols={cols})")]
    ZeroDimension { rows: u32, cols: u32 },

    #[error("grid of {rows}x{cols} tiles exceeds the supported tile count")]
    TooLarge { rows: u32, cols: u32 },

    #[error("cannot infer array size: no panels were observed")]
    NoPanels,
}

/// Failures while loading a run configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures while reading acquisition log first lines.
#[derive(Debug, thiserror::Error)]
pub enum HoursError {
    #[error("log `{log}` first line is missing the ` -- ` separator")]
    MissingSeparator { log: String },

    #[error("log `{log}` has unparseable start timestamp `{raw}`: {source}")]
    Timestamp {
        log: String,
        raw: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Completeness failures. Both validation variants carry the full report so
/// the caller does not need to re-read the CSV written to disk.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("{}", incomplete_message(report, extra.as_ref()))]
    Incomplete {
        report: TileReport,
        /// Extra-tile report from the same run, written alongside.
        extra: Option<TileReport>,
    },

    #[error("{}", extra_message(report))]
    ExtraTiles { report: TileReport },

    #[error("failed to write report {}: {source}", path.display())]
    WriteReport {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn incomplete_message(report: &TileReport, extra: Option<&TileReport>) -> String {
    let mut message = format!(
        "dataset is missing images (also saved as csv in output directory):\n\n{}",
        report.render_table()
    );
    if let Some(extra) = extra {
        message.push_str("\n\n");
        message.push_str(&extra_message(extra));
    }
    message
}

fn extra_message(report: &TileReport) -> String {
    format!(
        "dataset has extra tiles (also saved as csv in output directory):\n\n{}",
        report.render_table()
    )
}

/// Any failure of the end-to-end check pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
