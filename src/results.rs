use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use geo_types::Point;
use log::{debug, trace};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::config::GeometryPolicy;
use crate::error::{Error, Result};

/// Write per-batch responses as a JSON array indented by four spaces.
/// An existing file is replaced.
pub fn save_matched_results(results: &[Value], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        results
            .serialize(&mut serializer)
            .map_err(|e| Error::json(path, e))?;
    }
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(path, e))?;
    debug!("Wrote {} results to {}", results.len(), path.display());
    Ok(())
}

pub fn load_matched_results(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::json(path, e))
}

/// Flatten `matchings[*].geometry.coordinates[*]` of every batch into one
/// path. Stored pairs are `[lon, lat]`; `null` batches and malformed
/// coordinates are skipped.
pub fn matched_coordinates(results: &[Value], policy: GeometryPolicy) -> Vec<Point<f64>> {
    let mut path = Vec::new();
    for (batch, result) in results.iter().enumerate() {
        let matchings = match result.get("matchings").and_then(Value::as_array) {
            Some(m) => m,
            None => {
                trace!("Result {} has no matchings", batch);
                continue;
            }
        };
        for matching in select_matchings(matchings, policy) {
            path.extend(geometry_points(matching));
        }
    }
    path
}

fn select_matchings(matchings: &[Value], policy: GeometryPolicy) -> Vec<&Value> {
    match policy {
        GeometryPolicy::All => matchings.iter().collect(),
        GeometryPolicy::First => matchings.first().into_iter().collect(),
        GeometryPolicy::BestConfidence => matchings
            .iter()
            .max_by(|a, b| confidence(a).total_cmp(&confidence(b)))
            .into_iter()
            .collect(),
    }
}

fn confidence(matching: &Value) -> f64 {
    matching
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(f64::NEG_INFINITY)
}

fn geometry_points(matching: &Value) -> impl Iterator<Item = Point<f64>> + '_ {
    matching
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|coord| {
            let pair = coord.as_array()?;
            let lon = pair.first()?.as_f64()?;
            let lat = pair.get(1)?.as_f64()?;
            Some(Point::new(lon, lat))
        })
}
