use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use geo::{Haversine, algorithm::Distance};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One row of the input file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Epoch milliseconds
    #[serde(rename = "datetime")]
    pub timestamp: i64,
}

/// A recorded GPS trace held as parallel coordinate and timestamp sequences.
///
/// Points use geo's convention: x is longitude, y is latitude.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    coordinates: Vec<Point<f64>>,
    timestamps: Vec<i64>,
}

impl Trajectory {
    pub fn new(coordinates: Vec<Point<f64>>, timestamps: Vec<i64>) -> Result<Self> {
        if coordinates.len() != timestamps.len() {
            return Err(Error::LengthMismatch {
                coordinates: coordinates.len(),
                timestamps: timestamps.len(),
            });
        }
        Ok(Self {
            coordinates,
            timestamps,
        })
    }

    pub fn from_points(points: &[TrajectoryPoint]) -> Self {
        Self {
            coordinates: points
                .iter()
                .map(|p| Point::new(p.longitude, p.latitude))
                .collect(),
            timestamps: points.iter().map(|p| p.timestamp).collect(),
        }
    }

    pub fn coordinates(&self) -> &[Point<f64>] {
        &self.coordinates
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Split into consecutive batches of at most `max` points
    pub fn batches(&self, max: NonZeroUsize) -> impl Iterator<Item = Batch<'_>> {
        self.coordinates
            .chunks(max.get())
            .zip(self.timestamps.chunks(max.get()))
            .enumerate()
            .map(|(index, (coordinates, timestamps))| Batch {
                index,
                coordinates,
                timestamps,
            })
    }

    /// First and last timestamp, if both are valid instants
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = DateTime::from_timestamp_millis(*self.timestamps.first()?)?;
        let last = DateTime::from_timestamp_millis(*self.timestamps.last()?)?;
        Some((first, last))
    }

    /// Great-circle length of the trace in meters
    pub fn length_meters(&self) -> f64 {
        path_length_meters(&self.coordinates)
    }
}

pub fn path_length_meters(points: &[Point<f64>]) -> f64 {
    points
        .windows(2)
        .map(|w| Haversine.distance(w[0], w[1]))
        .sum()
}

/// A contiguous slice of a trajectory sent as one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch<'a> {
    pub index: usize,
    pub coordinates: &'a [Point<f64>],
    pub timestamps: &'a [i64],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
