use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(n) => n,
    None => unreachable!(),
};

/// What to write into the results file for a batch the service rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Leave the batch out; the file only holds successful responses
    #[default]
    Skip,
    /// Write `null` at the batch position so file index == batch index
    Placeholder,
}

/// Which matchings of a response contribute to the matched path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// Every matching of every batch, in encounter order
    #[default]
    All,
    /// Only the first matching of each batch
    First,
    /// The matching with the highest `confidence` in each batch
    BestConfidence,
}

/// Run configuration shared by the fit and visualize pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackFitConfig {
    /// Base URL of the OSRM-compatible matching service
    pub matching_endpoint: String,
    /// Routing profile used in the request path
    pub profile: String,
    /// Maximum number of points per request
    pub batch_size: NonZeroUsize,
    /// Maximum number of requests in flight
    pub concurrency: NonZeroUsize,
    /// Per-request timeout in seconds, `None` waits forever
    pub request_timeout_secs: Option<u64>,
    /// Semicolon-delimited trajectory file
    pub input_path: PathBuf,
    /// Optional `key: value` metadata file
    pub metadata_path: Option<PathBuf>,
    /// JSON file receiving the raw matching responses
    pub results_path: PathBuf,
    /// Static plot output (PNG, or SVG by extension)
    pub plot_path: PathBuf,
    /// Interactive HTML map output
    pub map_path: PathBuf,
    pub drop_policy: DropPolicy,
    pub geometry_policy: GeometryPolicy,
    /// Initial zoom level of the HTML map
    pub map_zoom: u8,
    /// Static plot size in pixels (width, height)
    pub plot_size: (u32, u32),
    /// TrueType font used for plot text
    pub plot_font: Option<PathBuf>,
    pub show_progress: bool,
}

impl Default for TrackFitConfig {
    fn default() -> Self {
        Self {
            matching_endpoint: "http://127.0.0.1:5000".to_string(),
            profile: "driving".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: NonZeroUsize::MIN,
            request_timeout_secs: Some(60),
            input_path: PathBuf::from("trajectory.csv"),
            metadata_path: None,
            results_path: PathBuf::from("matched_results.json"),
            plot_path: PathBuf::from("trajectory_plot.png"),
            map_path: PathBuf::from("trajectory_map.html"),
            drop_policy: DropPolicy::default(),
            geometry_policy: GeometryPolicy::default(),
            map_zoom: 14,
            plot_size: (1000, 600),
            plot_font: None,
            show_progress: true,
        }
    }
}

impl TrackFitConfig {
    /// Load a JSON configuration file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = serde_json::from_str(&data).map_err(|e| Error::json(path, e))?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = self.matching_endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "matching_endpoint must be an http(s) URL, got {:?}",
                self.matching_endpoint
            )));
        }
        if self.profile.is_empty() || self.profile.contains('/') {
            return Err(Error::InvalidConfig(format!(
                "invalid routing profile {:?}",
                self.profile
            )));
        }
        if self.plot_size.0 == 0 || self.plot_size.1 == 0 {
            return Err(Error::InvalidConfig("plot_size must be non-zero".to_string()));
        }
        if self.map_zoom > 20 {
            return Err(Error::InvalidConfig(format!(
                "map_zoom {} is outside 0..=20",
                self.map_zoom
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
