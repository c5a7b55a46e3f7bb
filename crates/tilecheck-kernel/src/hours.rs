//! Elapsed acquisition hours per timepoint, read from the first line of
//! each timepoint's acquisition log.
//!
//! Log files are named `...-T<k>.log`; their first line looks like
//! `23 05 14 09:30:00 -- PID1_Expt_T0_0_A01_1_GFP.tif`.

use crate::error::HoursError;
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;

const LINE_SEPARATOR: &str = " -- ";
const TIMESTAMP_FORMAT: &str = "%y %m %d %H:%M:%S";
const IGNORED_LOG_MARKER: &str = "ImageStart";

fn log_timepoint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-T(\d{1,2})\.log$").expect("log timepoint regex must compile"))
}

/// Timepoint encoded in a log file name, if it is a timepoint log.
pub fn log_timepoint(name: &str) -> Option<u32> {
    if name.contains(IGNORED_LOG_MARKER) {
        return None;
    }
    log_timepoint_re()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First line of one acquisition log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHead {
    pub name: String,
    pub first_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimepointHours {
    pub timepoint: u32,
    pub elapsed_hours: f64,
    pub start_date: String,
    pub start_time: String,
    pub first_image: String,
}

/// Build the timepoint/elapsed-hours table, relative to the earliest
/// timepoint log. Non-timepoint logs are skipped.
pub fn timepoint_hours(logs: &[LogHead]) -> Result<Vec<TimepointHours>, HoursError> {
    let mut parsed = Vec::new();
    for log in logs {
        let Some(timepoint) = log_timepoint(&log.name) else {
            tracing::debug!(log = %log.name, "skipping non-timepoint log");
            continue;
        };
        let line = log.first_line.trim_end();
        let (stamp, image) =
            line.split_once(LINE_SEPARATOR)
                .ok_or_else(|| HoursError::MissingSeparator {
                    log: log.name.clone(),
                })?;
        let start = NaiveDateTime::parse_from_str(stamp.trim(), TIMESTAMP_FORMAT).map_err(
            |source| HoursError::Timestamp {
                log: log.name.clone(),
                raw: stamp.to_string(),
                source,
            },
        )?;
        parsed.push((timepoint, start, image.trim().to_string()));
    }
    parsed.sort_by_key(|(timepoint, _, _)| *timepoint);

    let Some(&(_, origin, _)) = parsed.first() else {
        return Ok(Vec::new());
    };
    Ok(parsed
        .into_iter()
        .map(|(timepoint, start, first_image)| {
            let seconds = (start - origin).num_seconds() as f64;
            TimepointHours {
                timepoint,
                elapsed_hours: (seconds / 3600.0 * 10.0).round() / 10.0,
                start_date: start.format("%y-%m-%d").to_string(),
                start_time: start.format("%H:%M:%S").to_string(),
                first_image,
            }
        })
        .collect())
}

/// Elapsed hours for the selected timepoints, in timepoint order.
pub fn elapsed_hours_for(rows: &[TimepointHours], selected: &BTreeSet<u32>) -> Vec<f64> {
    rows.iter()
        .filter(|row| selected.contains(&row.timepoint))
        .map(|row| row.elapsed_hours)
        .collect()
}
