use geo_types::Point;
use log::info;

use crate::config::TrackFitConfig;
use crate::error::{Error, Result};
use crate::io::read_coordinates;
use crate::plot::draw_trajectory_plot;
use crate::results::{load_matched_results, matched_coordinates};
use crate::trajectory::path_length_meters;
use crate::web_map::write_interactive_map;

/// Original and matched paths ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub original: Vec<Point<f64>>,
    pub matched: Vec<Point<f64>>,
}

impl Comparison {
    /// Load the input trajectory and the stored matching results
    pub fn load(config: &TrackFitConfig) -> Result<Self> {
        let original = read_coordinates(&config.input_path)?;
        let results = load_matched_results(&config.results_path)?;
        let matched = matched_coordinates(&results, config.geometry_policy);
        info!(
            "Original trajectory: {} points, matched trajectory: {} points from {} results",
            original.len(),
            matched.len(),
            results.len()
        );
        Ok(Self { original, matched })
    }

    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.original.is_empty() {
            return Err(Error::EmptyTrajectory("original"));
        }
        if self.matched.is_empty() {
            return Err(Error::EmptyTrajectory("matched"));
        }
        Ok(())
    }

    pub fn render(&self, config: &TrackFitConfig) -> Result<()> {
        self.ensure_not_empty()?;
        info!(
            "Path length: original {:.0} m, matched {:.0} m",
            path_length_meters(&self.original),
            path_length_meters(&self.matched)
        );

        draw_trajectory_plot(
            &self.original,
            &self.matched,
            &config.plot_path,
            config.plot_size,
            config.plot_font.as_deref(),
        )?;
        info!("Static plot saved as {}", config.plot_path.display());

        write_interactive_map(&self.original, &self.matched, &config.map_path, config.map_zoom)?;
        info!("Interactive map saved as {}", config.map_path.display());
        Ok(())
    }
}

pub fn run_visualize(config: &TrackFitConfig) -> Result<Comparison> {
    let comparison = Comparison::load(config)?;
    comparison.render(config)?;
    Ok(comparison)
}
