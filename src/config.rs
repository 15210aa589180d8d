use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::chart::{ChartId, ChartStyle, StyleOverride};
use crate::error::StatsError;
use crate::normalize::DuplicateLabels;

/// Tunables for a refresh. Built-in defaults, then the config file, then CLI flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Codec chart keeps this many entries.
    pub codec_top_n: usize,
    /// Storage chart keeps this many entries.
    pub storage_top_n: usize,
    /// Top-anime panels show at most this many entries.
    pub top_entities_limit: usize,
    /// Append `" (P%)"` to distribution labels.
    pub percentage_labels: bool,
    pub duplicate_labels: DuplicateLabels,
    /// Codec names longer than this are truncated.
    pub codec_label_max: usize,
    pub charts: HashMap<ChartId, StyleOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            codec_top_n: 5,
            storage_top_n: 5,
            top_entities_limit: 10,
            percentage_labels: false,
            duplicate_labels: DuplicateLabels::Merge,
            codec_label_max: 15,
            charts: HashMap::new(),
        }
    }
}

impl Config {
    /// `<config_dir>/mediastats/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mediastats").join("config.json"))
    }

    /// Load from `path`, or from the default location when it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file just means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, StatsError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.is_file() => p,
                _ => {
                    debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = fs::read_to_string(&path)
            .map_err(|e| StatsError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&text)
            .map_err(|e| StatsError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn chart_style(&self, id: ChartId) -> ChartStyle {
        ChartStyle::resolve(id, self.charts.get(&id))
    }
}
