//! # Tilecheck Kernel
//!
//! Reconstructs the intended design of a montaged microscopy acquisition
//! (wells × timepoints × channels × tiles) from its image filenames and
//! verifies that the files present match that design exactly.
//!
//! ## Architecture
//!
//! ```text
//! TokenStandard         ← Closed set of filename layouts (Robo0/3/4)
//!     │
//! FileTable             ← One FileRecord per filename
//!     │
//! DatasetInventory      ← Distinct wells, timepoints, channels, panels
//!     │
//! SelectedAxes + Grid   ← RunConfig include/exclude lists, tile grid
//!     │
//! ExpectedSpace         ← What a complete dataset must contain
//!     │
//! CompletenessReport    ← Panel / timepoint / channel axes, tile reports
//! ```

pub mod completeness;
pub mod config;
pub mod error;
pub mod hours;
pub mod inventory;
pub mod pipeline;
pub mod report;
pub mod selection;
pub mod space;
pub mod standard;
pub mod token;

pub use completeness::{Axis, AxisFlags, Classification, WellStatus, classify, validate};
pub use config::RunConfig;
pub use error::{
    CheckError, ConfigError, DatasetError, GridError, HoursError, SelectionError, TokenError,
};
pub use hours::{LogHead, TimepointHours, elapsed_hours_for, timepoint_hours};
pub use inventory::DatasetInventory;
pub use pipeline::{CheckOutcome, CheckPlan, run_check};
pub use report::{CompletenessReport, ReportKind, TileCell, TileReport, TileReportRow};
pub use selection::{SelectedAxes, Selection, Toggle};
pub use space::{ExpectedSpace, GridDims};
pub use standard::{StandardSelector, TokenStandard};
pub use token::{Depth, FileRecord, FileTable, tokenize};
