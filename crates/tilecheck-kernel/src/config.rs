//! Run configuration.
//!
//! A run is fully described by one immutable [`RunConfig`] value that is
//! passed explicitly to selection, grid resolution and validation. It can be
//! loaded from TOML:
//!
//! ```toml
//! standard = 1                 # robo code; 1 auto-detects
//! morphology_channel = "GFP"
//! check_data = true
//!
//! [wells]
//! toggle = "exclude"
//! items = "A01-A03"
//!
//! [grid]
//! rows = 4
//! cols = 4
//! ```

use crate::error::{ConfigError, TokenError};
use crate::selection::Selection;
use crate::space::GridDims;
use crate::standard::{AUTO_DETECT_CODE, StandardSelector};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Robo code of the token standard (`1` auto-detects).
    pub standard: i64,
    /// Overrides the experiment name taken from the filenames.
    pub experiment: Option<String>,
    pub wells: Selection,
    pub timepoints: Selection,
    pub channels: Selection,
    pub morphology_channel: Option<String>,
    /// Explicit montage grid; inferred from the largest panel when absent.
    pub grid: Option<GridDims>,
    /// Run the completeness check (otherwise only inventory/selection).
    pub check_data: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            standard: AUTO_DETECT_CODE,
            experiment: None,
            wells: Selection::default(),
            timepoints: Selection::default(),
            channels: Selection::default(),
            morphology_channel: None,
            grid: None,
            check_data: true,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let Some(grid) = self.grid {
            grid.checked().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if let Some(name) = &self.experiment
            && name.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "experiment name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn selector(&self) -> Result<StandardSelector, TokenError> {
        StandardSelector::from_code(self.standard)
    }
}
