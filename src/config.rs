//! Pipeline configuration

use crate::regression::LinearModelSpec;
use serde::{Deserialize, Serialize};

/// Default number of pulses shown per recording in scatter series
pub const DEFAULT_SCATTER_LIMIT: usize = 15;

/// Tunables for parsing and series extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Field delimiter of the recordings table
    pub delimiter: char,
    /// Number of leading pulses kept per recording in scatter series
    pub scatter_limit: usize,
    /// Priors attached to regression observations
    pub model: LinearModelSpec,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            scatter_limit: DEFAULT_SCATTER_LIMIT,
            model: LinearModelSpec::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
