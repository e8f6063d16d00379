//! Send GPS trajectories to an OSRM-compatible `/match` service in batches,
//! store the raw responses, and compare the original and matched paths on a
//! static plot and an interactive map.

pub mod config;
pub mod error;
pub mod fit;
pub mod io;
pub mod osrm;
pub mod plot;
pub mod results;
pub mod trajectory;
pub mod visualizer;
pub mod web_map;

pub use config::{DropPolicy, GeometryPolicy, TrackFitConfig};
pub use error::{Error, Result};
pub use fit::{FitReport, match_trajectory, run_fit};
pub use osrm::MatchingClient;
pub use trajectory::{Batch, Trajectory, TrajectoryPoint};
pub use visualizer::{Comparison, run_visualize};
