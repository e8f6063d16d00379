use geo_types::Point;
use log::{debug, trace};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::TrackFitConfig;
use crate::error::{Error, Result};
use crate::trajectory::Batch;

/// Longest slice of an error body kept in a protocol error
const MAX_ERROR_BODY: usize = 200;

/// Client for the `/match` service of an OSRM-compatible server
#[derive(Debug, Clone)]
pub struct MatchingClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl MatchingClient {
    pub fn new(config: &TrackFitConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.matching_endpoint.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    /// Request path for a set of points, without the query string
    pub fn match_url(&self, coordinates: &[Point<f64>]) -> String {
        format!(
            "{}/match/v1/{}/{}",
            self.base_url,
            self.profile,
            format_coordinates(coordinates)
        )
    }

    /// Send one batch and return the service's JSON body untouched
    pub async fn match_batch(&self, batch: &Batch<'_>) -> Result<Value> {
        let url = self.match_url(batch.coordinates);
        let timestamps = format_timestamps(batch.timestamps);
        debug!(
            "Batch {}: {} points, query length {}",
            batch.index,
            batch.len(),
            url.len() + "?timestamps=".len() + timestamps.len()
        );
        trace!("Batch {} coordinates: {}", batch.index, url);
        trace!("Batch {} timestamps: {}", batch.index, timestamps);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("steps", "true"),
                ("geometries", "geojson"),
                ("timestamps", timestamps.as_str()),
            ])
            .send()
            .await
            .map_err(|e| protocol_error(batch.index, format!("request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(protocol_error(
                batch.index,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| protocol_error(batch.index, format!("malformed response: {}", e)))?;

        if let Some(code) = body.get("code").and_then(Value::as_str) {
            debug!("Batch {} answered with code {}", batch.index, code);
        }
        Ok(body)
    }
}

fn protocol_error(batch: usize, reason: String) -> Error {
    Error::Protocol { batch, reason }
}

/// `lon,lat;lon,lat;...`, the coordinate order the match service expects
pub fn format_coordinates(coordinates: &[Point<f64>]) -> String {
    coordinates
        .iter()
        .map(|p| format!("{},{}", p.x(), p.y()))
        .collect::<Vec<_>>()
        .join(";")
}

/// Millisecond timestamps as `;`-joined whole seconds
pub fn format_timestamps(timestamps: &[i64]) -> String {
    timestamps
        .iter()
        .map(|&ms| millis_to_seconds(ms).to_string())
        .collect::<Vec<_>>()
        .join(";")
}

pub fn millis_to_seconds(ms: i64) -> i64 {
    ms.div_euclid(1000)
}
