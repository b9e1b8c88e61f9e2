use std::path::{Path, PathBuf};

use serde_derive::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::observation;
use crate::parameters::Parameters;
use crate::scoring::Metric;
use crate::snapshots::SeriesLocation;

/// Where the environmental layers are read from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LayerSources {
    /// Defines the study area; required
    pub elevation: PathBuf,
    #[serde(default)]
    pub suitability: Option<PathBuf>,
    pub vegetation: SeriesLocation,
    #[serde(default)]
    pub suitability_series: Option<SeriesLocation>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Output {
    pub write: bool,
    pub arrival_times: PathBuf,
}

/**
Everything needed for one run, as read from a JSON file.

The model parameters are all required. The remaining sections describe inputs
and outputs and fall back to defaults where that is meaningful.
 */
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub parameters: Parameters,
    pub layers: LayerSources,
    pub output: Output,
    #[serde(default)]
    pub control_points: Option<PathBuf>,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub observation: observation::Settings,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.parameters.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_json(&text)
    }

    /// Enough steps to simulate every year from start to stop.
    pub fn max_steps(&self) -> u32 {
        let p = &self.parameters;
        (i64::from(p.start_year) - i64::from(p.stop_year)).abs() as u32 + 1
    }
}
