//! Flight generation settings.
//!
//! Stored as pretty-printed JSON. Fields missing from a file take their
//! default values, so a config only needs the settings it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{CameraPathBuilder, InterpolationMode, ProjectionError, ViewRegion, DEFAULT_SMOOTHING};
use crate::flight_file::DEFAULT_SIMULATION_LABEL;
use crate::interpolation::{SnapshotInterpolator, DEFAULT_MIN_DM_MASS};
use crate::snapshots::ScaleFactorTable;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Region(#[from] ProjectionError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub mode: InterpolationMode,
    /// Roughness penalty for position splines
    pub smoothing: f64,
    /// Galaxies lighter than this (solar masses of dark matter) are not shown
    pub min_mass_dm: f64,
    /// Side of the periodic simulation box. When set, galaxies crossing a
    /// face between snapshots are interpolated the short way round.
    pub box_size: Option<f64>,
    pub region: ViewRegion,
    pub simulation_label: String,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            mode: InterpolationMode::Spline,
            smoothing: DEFAULT_SMOOTHING,
            min_mass_dm: DEFAULT_MIN_DM_MASS,
            box_size: None,
            region: ViewRegion {
                width: 16.0,
                height: 9.0,
                depth: 25.0,
            },
            simulation_label: DEFAULT_SIMULATION_LABEL.to_string(),
        }
    }
}

impl FlightConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.smoothing.is_finite() && self.smoothing >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "smoothing must be non-negative, got {}",
                self.smoothing
            )));
        }
        if !self.min_mass_dm.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "min_mass_dm must be finite, got {}",
                self.min_mass_dm
            )));
        }
        if let Some(size) = self.box_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "box_size must be positive, got {size}"
                )));
            }
        }
        self.region.validate()?;
        Ok(())
    }

    pub fn path_builder(&self) -> CameraPathBuilder {
        CameraPathBuilder::new(self.mode, self.smoothing)
    }

    pub fn interpolator(&self) -> SnapshotInterpolator {
        SnapshotInterpolator::new(ScaleFactorTable::new())
            .with_min_mass(self.min_mass_dm)
            .with_periodic_box(self.box_size)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file and validate
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: FlightConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FlightConfig::default();
        config.validate().unwrap();
        assert_eq!(config.simulation_label, "RefL0025N0376");
        assert_eq!(config.path_builder(), CameraPathBuilder::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = FlightConfig {
            mode: InterpolationMode::Linear,
            box_size: Some(25.0),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"mode\": \"linear\""));
        assert_eq!(FlightConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "smoothing": 0.5 }"#).unwrap();

        let config = FlightConfig::load_from_file(&path).unwrap();
        assert_eq!(config.smoothing, 0.5);
        assert_eq!(config.min_mass_dm, DEFAULT_MIN_DM_MASS);
        assert_eq!(config.mode, InterpolationMode::Spline);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            FlightConfig {
                smoothing: -1.0,
                ..Default::default()
            },
            FlightConfig {
                box_size: Some(0.0),
                ..Default::default()
            },
            FlightConfig {
                region: ViewRegion {
                    width: 16.0,
                    height: 0.0,
                    depth: 25.0,
                },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }
}
