//! The expected combinatorial space of an acquisition.

use crate::error::GridError;
use crate::selection::SelectedAxes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Montage grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub rows: u32,
    pub cols: u32,
}

impl GridDims {
    /// Use explicit dimensions when given, otherwise infer a square grid
    /// from the largest observed panel index.
    pub fn resolve(explicit: Option<GridDims>, max_panel: Option<u32>) -> Result<Self, GridError> {
        let dims = match explicit {
            Some(dims) => dims.checked()?,
            None => {
                let array_size = max_panel.ok_or(GridError::NoPanels)?;
                let side = perfect_square_root(array_size)
                    .ok_or(GridError::NotPerfectSquare(array_size))?;
                Self {
                    rows: side,
                    cols: side,
                }
            }
        };
        tracing::info!(rows = dims.rows, cols = dims.cols, "array size");
        Ok(dims)
    }

    /// Reject zero dimensions and grids whose tile count overflows `u32`.
    pub fn checked(self) -> Result<Self, GridError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridError::ZeroDimension {
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.rows
            .checked_mul(self.cols)
            .ok_or(GridError::TooLarge {
                rows: self.rows,
                cols: self.cols,
            })?;
        Ok(self)
    }

    /// Tile count; saturates for dimensions that did not go through
    /// [`GridDims::checked`].
    pub fn tiles(self) -> u32 {
        self.rows.saturating_mul(self.cols)
    }
}

fn perfect_square_root(n: u32) -> Option<u32> {
    if n == 0 {
        return None;
    }
    let root = (n as f64).sqrt().round() as u32;
    (root.checked_mul(root) == Some(n)).then_some(root)
}

/// Everything a complete dataset must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedSpace {
    pub wells: BTreeSet<String>,
    pub timepoints: BTreeSet<u32>,
    pub channels: BTreeSet<String>,
    pub tiles_per_well: u32,
}

impl ExpectedSpace {
    pub fn new(axes: &SelectedAxes, grid: GridDims) -> Self {
        Self {
            wells: axes.wells.clone(),
            timepoints: axes.timepoints.clone(),
            channels: axes.channels.clone(),
            tiles_per_well: grid.tiles(),
        }
    }
}
