use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

use anyhow::Context;
use geo_types::Point;
use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::error::{Error, Result};

const TITLE: &str = "Trajectory Before and After Matching";
const FONT_FAMILY: &str = "sans-serif";

static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

static FONTS: LazyLock<Mutex<FontRegistry>> = LazyLock::new(|| Mutex::new(FontRegistry::default()));

#[derive(Debug, Clone, PartialEq, Eq)]
enum FontSource {
    Bundled,
    File(PathBuf),
}

/// Fonts plotters has accepted, and the one currently serving `sans-serif`
#[derive(Default)]
struct FontRegistry {
    active: Option<FontSource>,
    loaded: HashMap<PathBuf, &'static [u8]>,
}

impl FontRegistry {
    fn activate(&mut self, preferred: Option<&Path>) -> Result<()> {
        if let Some(path) = preferred {
            match self.activate_file(path) {
                Ok(()) => return Ok(()),
                Err(reason) => warn!(
                    "Ignoring font {}: {}, using bundled font",
                    path.display(),
                    reason
                ),
            }
        }
        if self.active != Some(FontSource::Bundled) {
            register_font(FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT)
                .map_err(|_| Error::Plot("bundled font is not a usable TrueType font".to_string()))?;
            self.active = Some(FontSource::Bundled);
        }
        Ok(())
    }

    fn activate_file(&mut self, path: &Path) -> std::result::Result<(), String> {
        let source = FontSource::File(path.to_path_buf());
        if self.active.as_ref() == Some(&source) {
            return Ok(());
        }
        let bytes = match self.loaded.get(path) {
            Some(bytes) => *bytes,
            None => {
                let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
                // plotters keeps registered fonts for the lifetime of the process
                Box::leak(bytes.into_boxed_slice())
            }
        };
        register_font(FONT_FAMILY, FontStyle::Normal, bytes)
            .map_err(|_| "not a usable TrueType font".to_string())?;
        self.loaded.insert(path.to_path_buf(), bytes);
        debug!("Using plot font {}", path.display());
        self.active = Some(source);
        Ok(())
    }
}

/// Make `preferred` (or the bundled font) the plot font. The returned guard
/// keeps other plots from swapping the font until drawing is done.
fn select_font(preferred: Option<&Path>) -> Result<MutexGuard<'static, FontRegistry>> {
    let mut fonts = FONTS.lock().unwrap_or_else(|e| e.into_inner());
    fonts.activate(preferred)?;
    Ok(fonts)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartKind {
    Png,
    Svg,
}

impl ChartKind {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartKind::Svg,
            _ => ChartKind::Png,
        }
    }
}

/// Draw the original and matched paths as two overlaid line series,
/// longitude on X and latitude on Y.
pub fn draw_trajectory_plot(
    original: &[Point<f64>],
    matched: &[Point<f64>],
    path: &Path,
    size: (u32, u32),
    font: Option<&Path>,
) -> Result<()> {
    if original.is_empty() {
        return Err(Error::EmptyTrajectory("original"));
    }
    if matched.is_empty() {
        return Err(Error::EmptyTrajectory("matched"));
    }

    let _font = select_font(font)?;
    let drawn = match ChartKind::from_path(path) {
        ChartKind::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_chart(root, original, matched)
        }
        ChartKind::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_chart(root, original, matched)
        }
    };
    drawn.map_err(|e| Error::Plot(format!("{}: {:#}", path.display(), e)))?;
    debug!("Plot written to {}", path.display());
    Ok(())
}

fn draw_chart<DB>(
    root: DrawingArea<DB, Shift>,
    original: &[Point<f64>],
    matched: &[Point<f64>],
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (x_range, y_range) = bounds(original.iter().chain(matched));

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(TITLE, (FONT_FAMILY, 24))
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .x_label_formatter(&|v| format!("{:.4}", v))
        .y_label_formatter(&|v| format!("{:.4}", v))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            original.iter().map(|p| (p.x(), p.y())),
            BLUE.stroke_width(2),
        ))?
        .label("Original Trajectory")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart.draw_series(
        original
            .iter()
            .map(|p| Circle::new((p.x(), p.y()), 3, BLUE.filled())),
    )?;

    chart
        .draw_series(DashedLineSeries::new(
            matched.iter().map(|p| (p.x(), p.y())),
            6,
            4,
            RED.stroke_width(1),
        ))?
        .label("Matched Trajectory")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart.draw_series(
        matched
            .iter()
            .map(|p| Cross::new((p.x(), p.y()), 4, RED)),
    )?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT_FAMILY, 14))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present().context("cannot write plot")?;
    Ok(())
}

/// Bounding ranges of all points, padded so single points stay visible
fn bounds<'a>(points: impl Iterator<Item = &'a Point<f64>>) -> (Range<f64>, Range<f64>) {
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x());
        max_x = max_x.max(p.x());
        min_y = min_y.min(p.y());
        max_y = max_y.max(p.y());
    }
    (pad(min_x, max_x), pad(min_y, max_y))
}

fn pad(min: f64, max: f64) -> Range<f64> {
    let margin = ((max - min) * 0.05).max(1e-4);
    (min - margin)..(max + margin)
}
