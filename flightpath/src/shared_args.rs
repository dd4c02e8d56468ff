use crate::camera::{InterpolationMode, ViewRegion};
use crate::catalog::GalaxyCatalog;
use crate::config::{ConfigError, FlightConfig};
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Parse a view region string in format "width,height,depth"
pub fn parse_region(s: &str) -> Result<ViewRegion, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err("Region must be in format 'width,height,depth'".to_string());
    }

    let value = |idx: usize, name: &str| -> Result<f64, String> {
        parts[idx]
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid {} value: {}", name, parts[idx]))
    };

    ViewRegion::new(value(0, "width")?, value(1, "height")?, value(2, "depth")?)
        .map_err(|e| format!("Invalid region: {}", e))
}

/// Default region string, a 16:9 frame 25 box units deep
pub const DEFAULT_REGION: &str = "16,9,25";

/// Settings shared by every subcommand that builds or views a flight
#[derive(Parser, Debug, Clone, Default)]
pub struct SharedFlightArgs {
    /// JSON config file (see the `config` subcommand for the defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the interpolation mode from the config
    #[arg(long, value_enum)]
    pub mode: Option<InterpolationMode>,

    /// Override the minimum dark matter mass, in solar masses
    #[arg(long)]
    pub min_mass: Option<f64>,

    /// Periodic box side; interpolate galaxies across box faces the short way
    #[arg(long)]
    pub box_size: Option<f64>,

    /// View region (format: "width,height,depth")
    #[arg(long, value_parser = parse_region)]
    pub region: Option<ViewRegion>,
}

impl SharedFlightArgs {
    /// Load the config file, if any, then apply command line overrides.
    pub fn resolve_config(&self) -> Result<FlightConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                FlightConfig::load_from_file(path)?
            }
            None => FlightConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(min_mass) = self.min_mass {
            config.min_mass_dm = min_mass;
        }
        if self.box_size.is_some() {
            config.box_size = self.box_size;
        }
        if let Some(region) = self.region {
            config.region = region;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load a galaxy catalog from the specified path
///
/// Wraps [`GalaxyCatalog::load_from_file`] with the path in the error message.
///
/// # Example
/// ```no_run
/// use flightpath::shared_args::load_catalog;
/// use std::path::PathBuf;
///
/// let catalog = load_catalog(&PathBuf::from("RefL0025N0376.txt"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_catalog(catalog_path: &PathBuf) -> Result<GalaxyCatalog, Box<dyn std::error::Error>> {
    info!("Loading catalog from: {}", catalog_path.display());

    let catalog = GalaxyCatalog::load_from_file(catalog_path).map_err(|e| {
        format!(
            "Failed to load catalog from '{}': {}",
            catalog_path.display(),
            e
        )
    })?;

    info!("Loaded catalog with {} galaxy records", catalog.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_region_matches_config() {
        let parsed = parse_region(DEFAULT_REGION).expect("Default region string should be valid");
        assert_eq!(parsed, FlightConfig::default().region);
    }

    #[test]
    fn test_region_parsing() {
        let region = parse_region(" 4, 3 ,100.5").unwrap();
        assert_eq!(region.width, 4.0);
        assert_eq!(region.height, 3.0);
        assert_eq!(region.depth, 100.5);

        assert!(parse_region("16,9").is_err());
        assert!(parse_region("16,nine,25").is_err());
        assert!(parse_region("16,9,-25").is_err());
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        FlightConfig {
            smoothing: 1.5,
            ..Default::default()
        }
        .save_to_file(&path)
        .unwrap();

        let args = SharedFlightArgs {
            config: Some(path),
            mode: Some(InterpolationMode::Linear),
            box_size: Some(25.0),
            ..Default::default()
        };
        let config = args.resolve_config().unwrap();

        assert_eq!(config.smoothing, 1.5);
        assert_eq!(config.mode, InterpolationMode::Linear);
        assert_eq!(config.box_size, Some(25.0));
        assert_eq!(config.min_mass_dm, FlightConfig::default().min_mass_dm);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = SharedFlightArgs {
            min_mass: Some(f64::NAN),
            ..Default::default()
        };
        assert!(args.resolve_config().is_err());
    }
}
