//! What a tokenized dataset actually contains.

use crate::standard::TokenStandard;
use crate::token::{Depth, FileTable};
use serde::Serialize;
use std::collections::BTreeSet;

/// Distinct acquisition parameters observed across a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInventory {
    pub standard: TokenStandard,
    pub experiment: String,
    pub plate_ids: BTreeSet<String>,
    pub wells: BTreeSet<String>,
    pub timepoints: BTreeSet<u32>,
    pub channels: BTreeSet<String>,
    pub burst_indices: BTreeSet<u32>,
    pub depths: BTreeSet<Depth>,
    pub max_panel: Option<u32>,
    pub file_count: usize,
}

impl DatasetInventory {
    /// Collect the inventory. The experiment name is taken from the first
    /// record, matching how acquisitions are named on disk.
    pub fn from_table(table: &FileTable) -> Self {
        let mut inventory = Self {
            standard: table.standard(),
            experiment: table
                .records()
                .first()
                .map(|r| r.experiment.clone())
                .unwrap_or_default(),
            plate_ids: BTreeSet::new(),
            wells: BTreeSet::new(),
            timepoints: BTreeSet::new(),
            channels: BTreeSet::new(),
            burst_indices: BTreeSet::new(),
            depths: BTreeSet::new(),
            max_panel: table.max_panel(),
            file_count: table.len(),
        };
        for record in table.iter() {
            inventory.plate_ids.insert(record.plate_id.clone());
            inventory.wells.insert(record.well.clone());
            inventory.timepoints.insert(record.timepoint);
            inventory.channels.insert(record.channel.clone());
            if let Some(burst) = record.burst_index {
                inventory.burst_indices.insert(burst);
            }
            if let Some(depth) = &record.depth {
                inventory.depths.insert(depth.clone());
            }
        }
        tracing::info!(
            standard = %inventory.standard,
            experiment = %inventory.experiment,
            wells = inventory.wells.len(),
            timepoints = inventory.timepoints.len(),
            channels = inventory.channels.len(),
            "collected dataset inventory"
        );
        inventory
    }
}
