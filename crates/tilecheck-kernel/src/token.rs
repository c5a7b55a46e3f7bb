//! Filename tokenizer.
//!
//! Splits each filename on `_` into the positional layout of one
//! [`TokenStandard`] and parses the numeric fields. One record is produced
//! per input filename; nothing is dropped silently.

use crate::error::TokenError;
use crate::standard::{TOKEN_DELIMITER, TokenStandard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Secondary delimiter inside the Robo0 hours token (`<hours>-<burst>`).
const BURST_DELIMITER: char = '-';

const IMAGE_EXTENSIONS: [&str; 2] = [".tiff", ".tif"];

/// Depth position of a z-stack image.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Index(u32),
    /// `ZMAX` maximum-intensity projection.
    MaxProjection,
    /// `ZAVG` average-intensity projection.
    AvgProjection,
}

impl Depth {
    fn parse(filename: &str, raw: &str) -> Result<Self, TokenError> {
        match raw {
            "ZMAX" => Ok(Self::MaxProjection),
            "ZAVG" => Ok(Self::AvgProjection),
            _ => parse_number(filename, "depth_index", raw).map(Self::Index),
        }
    }
}

impl std::fmt::Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::MaxProjection => f.write_str("ZMAX"),
            Self::AvgProjection => f.write_str("ZAVG"),
        }
    }
}

/// One tokenized filename.
///
/// The validator only reads `well`, `timepoint`, `channel` and `panel`; the
/// remaining fields are retained for inventory and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub filename: String,
    pub plate_id: String,
    pub experiment: String,
    pub timepoint: u32,
    pub hours: String,
    pub well: String,
    pub panel: u32,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Depth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_increment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
}

impl TokenStandard {
    /// Parse one filename under this layout.
    pub fn parse(self, filename: &str) -> Result<FileRecord, TokenError> {
        let tokens = split_tokens(filename);
        if tokens.len() != self.token_count() {
            return Err(TokenError::SchemaMismatch {
                filename: filename.to_string(),
                standard: self,
                expected: self.token_count(),
                actual: tokens.len(),
            });
        }

        let timepoint = parse_timepoint(filename, tokens[2])?;
        let panel = parse_number(filename, "panel", tokens[5])?;
        let mut record = FileRecord {
            filename: filename.to_string(),
            plate_id: tokens[0].to_string(),
            experiment: tokens[1].to_string(),
            timepoint,
            hours: tokens[3].to_string(),
            well: tokens[4].to_string(),
            panel,
            channel: tokens[self.channel_token_index()].to_string(),
            burst_index: None,
            burst_interval: None,
            filters: Vec::new(),
            depth: None,
            depth_increment: None,
            camera: None,
        };

        match self {
            Self::Robo3 => {}
            Self::Robo0 => {
                let (hours, burst) = tokens[3].split_once(BURST_DELIMITER).ok_or_else(|| {
                    TokenError::TokenParse {
                        filename: filename.to_string(),
                        field: "burst_index",
                        raw: tokens[3].to_string(),
                    }
                })?;
                record.hours = hours.to_string();
                record.burst_index = Some(parse_number(filename, "burst_index", burst)?);
                record.burst_interval = Some(tokens[7].to_string());
                record.depth = Some(Depth::parse(filename, tokens[8])?);
                record.depth_increment = Some(tokens[9].to_string());
            }
            Self::Robo4 => {
                record.filters = tokens[6..9].iter().map(|t| t.to_string()).collect();
                record.depth = Some(Depth::parse(filename, tokens[10])?);
                record.depth_increment = Some(tokens[11].to_string());
                record.camera = Some(tokens[12].to_string());
            }
        }
        Ok(record)
    }
}

/// Split a filename into tokens, stripping the image extension from the
/// final token exactly once.
fn split_tokens(filename: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = filename.split(TOKEN_DELIMITER).collect();
    if let Some(last) = tokens.last_mut() {
        *last = strip_image_extension(last);
    }
    tokens
}

/// Remove a trailing `.tif`/`.tiff` (any case).
pub fn strip_image_extension(token: &str) -> &str {
    let lower = token.to_ascii_lowercase();
    for ext in IMAGE_EXTENSIONS {
        if lower.ends_with(ext) {
            return &token[..token.len() - ext.len()];
        }
    }
    token
}

/// Whether a filename carries one of the recognised image extensions.
pub fn has_image_extension(filename: &str) -> bool {
    strip_image_extension(filename).len() != filename.len()
}

fn parse_timepoint(filename: &str, raw: &str) -> Result<u32, TokenError> {
    let digits = raw.strip_prefix('T').unwrap_or(raw);
    parse_number(filename, "timepoint", digits)
}

fn parse_number(filename: &str, field: &'static str, raw: &str) -> Result<u32, TokenError> {
    raw.parse::<u32>().map_err(|_| TokenError::TokenParse {
        filename: filename.to_string(),
        field,
        raw: raw.to_string(),
    })
}

/// A tokenized dataset: one record per filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTable {
    standard: TokenStandard,
    records: Vec<FileRecord>,
}

impl FileTable {
    pub fn new(standard: TokenStandard, records: Vec<FileRecord>) -> Self {
        Self { standard, records }
    }

    pub fn standard(&self) -> TokenStandard {
        self.standard
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest panel index in the table.
    pub fn max_panel(&self) -> Option<u32> {
        self.records.iter().map(|r| r.panel).max()
    }

    /// Keep only records whose well and timepoint were selected.
    pub fn restrict(&self, wells: &BTreeSet<String>, timepoints: &BTreeSet<u32>) -> Self {
        self.filter(|r| wells.contains(&r.well) && timepoints.contains(&r.timepoint))
    }

    /// Keep only records whose channel was selected.
    pub fn restrict_channels(&self, channels: &BTreeSet<String>) -> Self {
        self.filter(|r| channels.contains(&r.channel))
    }

    /// Keep only records belonging to the given wells.
    pub fn restrict_wells(&self, wells: &BTreeSet<String>) -> Self {
        self.filter(|r| wells.contains(&r.well))
    }

    fn filter(&self, keep: impl Fn(&FileRecord) -> bool) -> Self {
        Self {
            standard: self.standard,
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// Tokenize every filename under `standard`.
///
/// The first malformed filename aborts the whole table.
pub fn tokenize<S: AsRef<str>>(
    filenames: &[S],
    standard: TokenStandard,
) -> Result<FileTable, TokenError> {
    let records = filenames
        .iter()
        .map(|name| standard.parse(name.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(%standard, records = records.len(), "tokenized filenames");
    Ok(FileTable::new(standard, records))
}
