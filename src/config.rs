//! Code for the configuration of the transform.

use std::path::Path;

use anyhow::{Context, Result};
use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::scan::BedSize;

const DEFAULT_X_OFFSET: f64 = 10.0;
const DEFAULT_PURGE_DISTANCE: f64 = 30.0;

/// The configuration of the transform.
#[derive(Default, Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Config {
    /// Where and how the purge happens.
    #[serde(default)]
    pub purge: PurgeConfig,
    /// Bed size assumed until a `;BED_LIMITS` line says otherwise.
    #[serde(default)]
    pub bed: BedSize,
}

impl Config {
    /// Parse a configuration from a toml file.
    pub fn from_file(file: &Path) -> Result<Self> {
        let config =
            std::fs::read_to_string(file).with_context(|| format!("failed to read config {}", file.display()))?;
        Self::from_str(&config)
    }

    /// Parse a configuration from a toml string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }

    /// Check every value is in range before running a transform.
    pub fn validate(&self) -> crate::Result<()> {
        self.purge.validate()?;
        if self.bed.x.is_nan() || self.bed.x <= 0.0 || self.bed.y.is_nan() || self.bed.y <= 0.0 {
            return Err(crate::Error::InvalidConfig(format!(
                "bed size must be positive, got {}x{}",
                self.bed.x, self.bed.y
            )));
        }
        Ok(())
    }
}

/// Purge settings.
///
/// `Fixed` always purges 10mm left of the first layer and only emits the
/// purge coordinates. `Configurable` exposes the offset and also emits the
/// purge distance and shape for the firmware macro to consume.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum PurgeConfig {
    /// Offset fixed at 10mm, no distance or shape variables.
    Fixed,

    /// User-tunable purge.
    Configurable {
        /// Distance to the left of the first layer (mm).
        #[serde(default = "default_x_offset")]
        x_offset: f64,

        /// Length of the purge line or triangle sides (mm).
        #[serde(default = "default_purge_distance")]
        purge_distance: f64,

        /// Purge geometry.
        #[serde(default)]
        purge_shape: PurgeShape,
    },
}

fn default_x_offset() -> f64 {
    DEFAULT_X_OFFSET
}

fn default_purge_distance() -> f64 {
    DEFAULT_PURGE_DISTANCE
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self::Configurable {
            x_offset: DEFAULT_X_OFFSET,
            purge_distance: DEFAULT_PURGE_DISTANCE,
            purge_shape: PurgeShape::default(),
        }
    }
}

impl PurgeConfig {
    /// How far left of the model the purge starts.
    pub fn x_offset(&self) -> f64 {
        match self {
            Self::Fixed => DEFAULT_X_OFFSET,
            Self::Configurable { x_offset, .. } => *x_offset,
        }
    }

    /// Distance and shape to emit, if this variant emits them at all.
    pub fn pattern(&self) -> Option<PurgePattern> {
        match self {
            Self::Fixed => None,
            Self::Configurable {
                purge_distance,
                purge_shape,
                ..
            } => Some(PurgePattern {
                distance: *purge_distance,
                shape: *purge_shape,
            }),
        }
    }

    /// Reject offsets below zero and non-positive purge distances.
    pub fn validate(&self) -> crate::Result<()> {
        if let Self::Configurable {
            x_offset,
            purge_distance,
            ..
        } = self
        {
            if x_offset.is_nan() || *x_offset < 0.0 {
                return Err(crate::Error::InvalidConfig(format!(
                    "x_offset must be non-negative, got {}",
                    x_offset
                )));
            }
            if purge_distance.is_nan() || *purge_distance <= 0.0 {
                return Err(crate::Error::InvalidConfig(format!(
                    "purge_distance must be positive, got {}",
                    purge_distance
                )));
            }
        }
        Ok(())
    }
}

/// Purge distance and shape handed to the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PurgePattern {
    /// Length of the purge line or triangle sides (mm).
    pub distance: f64,
    /// Purge geometry.
    pub shape: PurgeShape,
}

/// Geometry of the purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, FromStr, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum PurgeShape {
    /// A single straight line.
    #[default]
    Line,
    /// A triangle.
    Triangle,
}

impl PurgeShape {
    /// Map a host setting string to a shape. Only `"Triangle"` selects the
    /// triangle; anything else, including an empty value, is a line.
    pub fn from_setting(value: &str) -> Self {
        if value == "Triangle" {
            Self::Triangle
        } else {
            Self::Line
        }
    }

    /// Numeric code stored in `global.purge_shape`.
    pub fn code(&self) -> u8 {
        match self {
            Self::Line => 0,
            Self::Triangle => 1,
        }
    }
}

impl From<String> for PurgeShape {
    fn from(value: String) -> Self {
        Self::from_setting(&value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_config_from_str_empty() -> TestResult {
        let config = Config::from_str("")?;
        assert_eq!(config.purge, PurgeConfig::default());
        assert_eq!(config.purge.x_offset(), 10.0);
        assert_eq!(
            config.purge.pattern(),
            Some(PurgePattern {
                distance: 30.0,
                shape: PurgeShape::Line
            })
        );
        assert_eq!(config.bed, BedSize { x: 300.0, y: 300.0 });
        Ok(())
    }

    #[test]
    fn test_config_from_str_configurable() -> TestResult {
        let config = r#"
            [purge]
            type = "Configurable"
            x_offset = 4.5
            purge_shape = "Triangle"

            [bed]
            x = 235.0
            y = 235.0
        "#;
        let config = Config::from_str(config)?;
        assert_eq!(config.purge.x_offset(), 4.5);
        assert_eq!(
            config.purge.pattern(),
            Some(PurgePattern {
                distance: 30.0,
                shape: PurgeShape::Triangle
            })
        );
        assert_eq!(config.bed, BedSize { x: 235.0, y: 235.0 });
        Ok(())
    }

    #[test]
    fn test_config_from_str_fixed() -> TestResult {
        let config = Config::from_str("[purge]\ntype = \"Fixed\"\n")?;
        assert_eq!(config.purge, PurgeConfig::Fixed);
        assert_eq!(config.purge.x_offset(), 10.0);
        assert_eq!(config.purge.pattern(), None);
        Ok(())
    }

    #[test]
    fn test_unknown_shape_is_line() -> TestResult {
        let config = Config::from_str("[purge]\ntype = \"Configurable\"\npurge_shape = \"Spiral\"\n")?;
        assert_eq!(config.purge.pattern().map(|p| p.shape), Some(PurgeShape::Line));
        Ok(())
    }

    #[test]
    fn test_shape_codes() {
        assert_eq!(PurgeShape::from_setting("Triangle").code(), 1);
        assert_eq!(PurgeShape::from_setting("Line").code(), 0);
        assert_eq!(PurgeShape::from_setting("triangle").code(), 0);
        assert_eq!(PurgeShape::from_setting("").code(), 0);
        assert_eq!(PurgeShape::Triangle.to_string(), "Triangle");
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        assert!(PurgeConfig::Fixed.validate().is_ok());

        let negative = PurgeConfig::Configurable {
            x_offset: -1.0,
            purge_distance: 30.0,
            purge_shape: PurgeShape::Line,
        };
        assert!(negative.validate().is_err());

        let zero_distance = PurgeConfig::Configurable {
            x_offset: 0.0,
            purge_distance: 0.0,
            purge_shape: PurgeShape::Line,
        };
        assert!(zero_distance.validate().is_err());

        let bad_bed = Config {
            bed: BedSize { x: 0.0, y: 200.0 },
            ..Default::default()
        };
        assert!(bad_bed.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_bed() -> TestResult {
        for bed in [BedSize { x: f64::NAN, y: 200.0 }, BedSize { x: 200.0, y: f64::NAN }] {
            let config = Config {
                bed,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(crate::Error::InvalidConfig(_))));
        }

        // toml spells it `nan`.
        let config = Config::from_str("[bed]\nx = nan\ny = 235.0\n")?;
        assert!(config.validate().is_err());
        Ok(())
    }
}
