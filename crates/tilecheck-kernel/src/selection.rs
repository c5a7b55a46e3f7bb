//! User include/exclude lists over wells, timepoints and channels.
//!
//! Selections are parsed from short comma-separated strings such as
//! `A01-A04,B07` or `T0-T3`. An empty item list keeps everything.

use crate::config::RunConfig;
use crate::error::SelectionError;
use crate::inventory::DatasetInventory;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

const RANGE_DELIMITER: char = '-';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    #[default]
    Include,
    Exclude,
}

/// One include/exclude list as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub toggle: Toggle,
    #[serde(default)]
    pub items: String,
}

impl Selection {
    pub fn new(toggle: Toggle, items: impl Into<String>) -> Self {
        Self {
            toggle,
            items: items.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.trim().is_empty()
    }

    fn raw_items(&self) -> impl Iterator<Item = &str> {
        self.items.split(',').map(str::trim).filter(|s| !s.is_empty())
    }
}

fn well_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)(\d+)$").expect("well regex must compile"))
}

fn timepoint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[Tt]?(\d+)$").expect("timepoint regex must compile"))
}

fn malformed(kind: &'static str, item: &str) -> SelectionError {
    SelectionError::MalformedSelection {
        kind,
        item: item.to_string(),
    }
}

fn split_well(item: &str) -> Option<(&str, &str)> {
    let caps = well_re().captures(item)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Expand a well list. Ranges stay within one row and keep the zero
/// padding of their first endpoint (`A01-A03` → `A01,A02,A03`).
pub fn parse_well_items(selection: &Selection) -> Result<Vec<String>, SelectionError> {
    let mut out = Vec::new();
    for item in selection.raw_items() {
        let Some((start, end)) = item.split_once(RANGE_DELIMITER) else {
            split_well(item).ok_or_else(|| malformed("well", item))?;
            out.push(item.to_string());
            continue;
        };
        let (row, first) = split_well(start.trim()).ok_or_else(|| malformed("well", item))?;
        let (end_row, last) = split_well(end.trim()).ok_or_else(|| malformed("well", item))?;
        let width = first.len();
        let first: u32 = first.parse().map_err(|_| malformed("well", item))?;
        let last: u32 = last.parse().map_err(|_| malformed("well", item))?;
        if row != end_row || first > last {
            return Err(malformed("well", item));
        }
        out.extend((first..=last).map(|col| format!("{row}{col:0width$}")));
    }
    Ok(out)
}

fn parse_timepoint(item: &str, whole: &str) -> Result<u32, SelectionError> {
    timepoint_re()
        .captures(item.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| malformed("timepoint", whole))
}

/// Expand a timepoint list (`T0-T2,T5` or `0-2,5`).
pub fn parse_timepoint_items(selection: &Selection) -> Result<Vec<u32>, SelectionError> {
    let mut out = Vec::new();
    for item in selection.raw_items() {
        match item.split_once(RANGE_DELIMITER) {
            None => out.push(parse_timepoint(item, item)?),
            Some((start, end)) => {
                let first = parse_timepoint(start, item)?;
                let last = parse_timepoint(end, item)?;
                if first > last {
                    return Err(malformed("timepoint", item));
                }
                out.extend(first..=last);
            }
        }
    }
    Ok(out)
}

/// Resolve a channel name or unique fragment against the dataset channels.
pub fn resolve_channel(
    fragment: &str,
    channels: &BTreeSet<String>,
) -> Result<String, SelectionError> {
    let fragment = fragment.trim();
    if channels.contains(fragment) {
        return Ok(fragment.to_string());
    }
    let matches: Vec<&String> = channels
        .iter()
        .filter(|channel| channel.contains(fragment))
        .collect();
    match matches.as_slice() {
        [only] => Ok((*only).clone()),
        [] => Err(SelectionError::UnknownChannel {
            fragment: fragment.to_string(),
            available: join(channels.iter()),
        }),
        _ => Err(SelectionError::AmbiguousChannel {
            fragment: fragment.to_string(),
            matches: join(matches.into_iter()),
        }),
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn apply<T: Ord + Clone>(
    available: &BTreeSet<T>,
    toggle: Toggle,
    chosen: Vec<T>,
) -> Result<BTreeSet<T>, Vec<T>> {
    let chosen: BTreeSet<T> = chosen.into_iter().collect();
    match toggle {
        Toggle::Exclude => Ok(available.difference(&chosen).cloned().collect()),
        Toggle::Include => {
            let unknown: Vec<T> = chosen.difference(available).cloned().collect();
            if unknown.is_empty() {
                Ok(chosen)
            } else {
                Err(unknown)
            }
        }
    }
}

pub fn select_wells(
    available: &BTreeSet<String>,
    selection: &Selection,
) -> Result<BTreeSet<String>, SelectionError> {
    if selection.is_empty() {
        return Ok(available.clone());
    }
    let chosen = parse_well_items(selection)?;
    apply(available, selection.toggle, chosen)
        .map_err(|unknown| SelectionError::UnknownWells(join(unknown.iter())))
}

pub fn select_timepoints(
    available: &BTreeSet<u32>,
    selection: &Selection,
) -> Result<BTreeSet<u32>, SelectionError> {
    if selection.is_empty() {
        return Ok(available.clone());
    }
    let chosen = parse_timepoint_items(selection)?;
    apply(available, selection.toggle, chosen).map_err(|unknown| {
        SelectionError::UnknownTimepoints(join(unknown.iter().map(|t| format!("T{t}"))))
    })
}

pub fn select_channels(
    available: &BTreeSet<String>,
    selection: &Selection,
) -> Result<BTreeSet<String>, SelectionError> {
    if selection.is_empty() {
        return Ok(available.clone());
    }
    let chosen = selection
        .raw_items()
        .map(|fragment| resolve_channel(fragment, available))
        .collect::<Result<Vec<_>, _>>()?;
    apply(available, selection.toggle, chosen).map_err(|unknown| {
        SelectionError::UnknownChannel {
            fragment: join(unknown.iter()),
            available: join(available.iter()),
        }
    })
}

/// The wells, timepoints and channels a run analyzes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAxes {
    pub wells: BTreeSet<String>,
    pub timepoints: BTreeSet<u32>,
    pub channels: BTreeSet<String>,
    pub morphology_channel: Option<String>,
}

impl SelectedAxes {
    pub fn resolve(
        inventory: &DatasetInventory,
        config: &RunConfig,
    ) -> Result<Self, SelectionError> {
        let wells = select_wells(&inventory.wells, &config.wells)?;
        let timepoints = select_timepoints(&inventory.timepoints, &config.timepoints)?;
        let channels = select_channels(&inventory.channels, &config.channels)?;

        let morphology_channel = match config.morphology_channel.as_deref() {
            None => None,
            Some(fragment) => {
                let channel = resolve_channel(fragment, &inventory.channels)?;
                if !channels.contains(&channel) {
                    return Err(SelectionError::MorphologyChannelNotSelected {
                        channel,
                        selected: join(channels.iter()),
                    });
                }
                Some(channel)
            }
        };

        tracing::info!(
            wells = %join(wells.iter()),
            timepoints = %join(timepoints.iter().map(|t| format!("T{t}"))),
            channels = %join(channels.iter()),
            "selected acquisition axes"
        );
        Ok(Self {
            wells,
            timepoints,
            channels,
            morphology_channel,
        })
    }
}
