//! Token standards: the positional layouts used to encode acquisition
//! metadata into image filenames.
//!
//! The set is closed. Each standard is selected by its integer robo code or
//! auto-detected from the `_`-delimited token count of the first filename:
//!
//! ```text
//! Robo0  PID_Expt_T<k>_Hours-Burst_Well_Panel_Channel_BurstInterval_Depth_DepthIncrement.tif
//! Robo3  PID_Expt_T<k>_Hours_Well_Panel_Channel.tif
//! Robo4  PID_Expt_T<k>_Hours_Well_Panel_FD1_FD2_FD3_Channel_Depth_DepthIncrement_Camera.tif
//! ```

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary delimiter between filename tokens.
pub const TOKEN_DELIMITER: char = '_';

/// Robo code that requests auto-detection.
pub const AUTO_DETECT_CODE: i64 = 1;

/// A known filename layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStandard {
    /// Burst/depth acquisitions, 10 tokens.
    Robo0,
    /// Plain montage acquisitions, 7 tokens.
    Robo3,
    /// Confocal acquisitions with filter/detector tokens, 13 tokens.
    Robo4,
}

impl TokenStandard {
    pub const ALL: [TokenStandard; 3] = [Self::Robo0, Self::Robo3, Self::Robo4];

    pub fn code(self) -> i64 {
        match self {
            Self::Robo0 => 0,
            Self::Robo3 => 3,
            Self::Robo4 => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Exact number of `_`-delimited tokens a filename must have.
    pub fn token_count(self) -> usize {
        match self {
            Self::Robo0 => 10,
            Self::Robo3 => 7,
            Self::Robo4 => 13,
        }
    }

    pub fn from_token_count(count: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.token_count() == count)
    }

    /// Position of the channel token.
    pub fn channel_token_index(self) -> usize {
        match self {
            Self::Robo0 | Self::Robo3 => 6,
            Self::Robo4 => 9,
        }
    }
}

impl fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Robo{}", self.code())
    }
}

/// How the token standard for a run is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardSelector {
    Auto,
    Explicit(TokenStandard),
}

impl StandardSelector {
    pub fn from_code(code: i64) -> Result<Self, TokenError> {
        if code == AUTO_DETECT_CODE {
            return Ok(Self::Auto);
        }
        TokenStandard::from_code(code)
            .map(Self::Explicit)
            .ok_or(TokenError::UnknownStandardCode(code))
    }

    /// Pick the standard for `filenames`.
    ///
    /// Auto-detection only inspects the first filename; every filename is
    /// checked against the chosen layout later, during tokenization.
    pub fn resolve<S: AsRef<str>>(self, filenames: &[S]) -> Result<TokenStandard, TokenError> {
        match self {
            Self::Explicit(standard) => Ok(standard),
            Self::Auto => {
                let first = filenames.first().ok_or(TokenError::EmptyInput)?.as_ref();
                let actual = first.split(TOKEN_DELIMITER).count();
                let standard = TokenStandard::from_token_count(actual).ok_or_else(|| {
                    TokenError::UndetectableTokenCount {
                        filename: first.to_string(),
                        actual,
                    }
                })?;
                tracing::info!(tokens = actual, %standard, "auto-detected token standard");
                Ok(standard)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_selector() {
        assert_eq!(StandardSelector::from_code(1).unwrap(), StandardSelector::Auto);
        for standard in TokenStandard::ALL {
            assert_eq!(
                StandardSelector::from_code(standard.code()).unwrap(),
                StandardSelector::Explicit(standard)
            );
        }
        assert!(matches!(
            StandardSelector::from_code(2),
            Err(TokenError::UnknownStandardCode(2))
        ));
    }

    #[test]
    fn auto_detect_uses_token_count() {
        let seven = ["PID1_Expt_T0_0_A01_1_GFP.tif"];
        let ten = ["PID1_Expt_T0_0-1_A01_1_GFP_0_1_0.tif"];
        let thirteen = ["PID1_Expt_T0_0_A01_1_FD1_FD2_FD3_GFP_1_0_Cam1.tif"];
        assert_eq!(StandardSelector::Auto.resolve(&seven).unwrap(), TokenStandard::Robo3);
        assert_eq!(StandardSelector::Auto.resolve(&ten).unwrap(), TokenStandard::Robo0);
        assert_eq!(
            StandardSelector::Auto.resolve(&thirteen).unwrap(),
            TokenStandard::Robo4
        );
    }

    #[test]
    fn auto_detect_rejects_other_counts() {
        let eight = ["PID1_Expt_T0_0_A01_1_GFP_x.tif"];
        match StandardSelector::Auto.resolve(&eight) {
            Err(TokenError::UndetectableTokenCount { actual, .. }) => assert_eq!(actual, 8),
            other => panic!("expected undetectable count, got {other:?}"),
        }
        let empty: [&str; 0] = [];
        assert!(matches!(
            StandardSelector::Auto.resolve(&empty),
            Err(TokenError::EmptyInput)
        ));
    }

    #[test]
    fn display_names_robo_code() {
        assert_eq!(TokenStandard::Robo0.to_string(), "Robo0");
        assert_eq!(TokenStandard::Robo4.channel_token_index(), 9);
    }
}
