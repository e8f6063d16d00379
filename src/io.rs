use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use geo_types::Point;
use log::{debug, error};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::trajectory::{Trajectory, TrajectoryPoint};

pub type Metadata = HashMap<String, String>;

#[derive(Debug, Deserialize)]
struct CoordinateRecord {
    latitude: f64,
    longitude: f64,
}

/// Read a `;`-delimited trajectory file with `latitude`, `longitude` and
/// `datetime` (epoch ms) columns.
pub fn read_trajectory(path: impl AsRef<Path>) -> Result<Trajectory> {
    let path = path.as_ref();
    let points: Vec<TrajectoryPoint> = read_records(path)?;
    debug!("Read {} trajectory points from {}", points.len(), path.display());
    Ok(Trajectory::from_points(&points))
}

/// Read only the coordinate columns of a trajectory file
pub fn read_coordinates(path: impl AsRef<Path>) -> Result<Vec<Point<f64>>> {
    let records: Vec<CoordinateRecord> = read_records(path.as_ref())?;
    Ok(records
        .into_iter()
        .map(|r| Point::new(r.longitude, r.latitude))
        .collect())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row.map_err(|e| csv_error(path, e))?);
    }
    Ok(records)
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    let line = err.position().map_or(0, |p| p.line());
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::io(path, source),
        _ => Error::Parse {
            path: path.to_path_buf(),
            line,
            message,
        },
    }
}

/// Best-effort read of a `key: value` file.
///
/// Each line is split on its first `:`; lines without one are skipped.
/// Failures are logged and reported as `None`.
pub fn read_metadata(path: impl AsRef<Path>) -> Option<Metadata> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => Some(parse_metadata(&contents)),
        Err(e) => {
            error!("Error reading metadata from {}: {}", path.display(), e);
            None
        }
    }
}

pub fn parse_metadata(contents: &str) -> Metadata {
    contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
