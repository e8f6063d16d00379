use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde_json::Value;

use crate::config::{DropPolicy, TrackFitConfig};
use crate::error::Result;
use crate::io::{read_metadata, read_trajectory};
use crate::osrm::MatchingClient;
use crate::results::save_matched_results;
use crate::trajectory::Trajectory;

/// Outcome of sending a trajectory to the matching service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FitReport {
    pub batches_sent: usize,
    pub succeeded: usize,
    /// Indices of batches whose response was dropped
    pub dropped: Vec<usize>,
}

impl FitReport {
    pub fn summary(&self) -> String {
        format!(
            "matched {} of {} batches ({} dropped)",
            self.succeeded,
            self.batches_sent,
            self.dropped.len()
        )
    }
}

/// Send every batch of `trajectory` and gather the responses in batch order.
///
/// A failed batch never aborts the run; it is recorded in the report and
/// handled according to the configured drop policy.
pub async fn match_trajectory(
    client: &MatchingClient,
    trajectory: &Trajectory,
    config: &TrackFitConfig,
) -> (Vec<Value>, FitReport) {
    let batch_count = trajectory.len().div_ceil(config.batch_size.get());
    let pb = if config.show_progress {
        ProgressBar::new(batch_count as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) - Matching batches")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    // `buffered` yields in submission order, whatever order requests finish in
    let responses: Vec<_> = futures::stream::iter(trajectory.batches(config.batch_size))
        .map(|batch| async move { (batch.index, client.match_batch(&batch).await) })
        .buffered(config.concurrency.get())
        .inspect(|_| pb.inc(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut report = FitReport {
        batches_sent: responses.len(),
        ..Default::default()
    };
    let mut results = Vec::with_capacity(responses.len());

    for (index, response) in responses {
        match response {
            Ok(body) => {
                report.succeeded += 1;
                results.push(body);
            }
            Err(e) => {
                warn!("Dropping batch {}: {}", index, e);
                report.dropped.push(index);
                if config.drop_policy == DropPolicy::Placeholder {
                    results.push(Value::Null);
                }
            }
        }
    }

    (results, report)
}

/// Read the configured trajectory, match it and store the responses
pub async fn run_fit(config: &TrackFitConfig) -> Result<FitReport> {
    if let Some(meta_path) = &config.metadata_path {
        if let Some(metadata) = read_metadata(meta_path) {
            info!("Loaded {} metadata entries", metadata.len());
            for (key, value) in &metadata {
                debug!("  {}: {}", key, value);
            }
        }
    }

    let trajectory = read_trajectory(&config.input_path)?;
    info!(
        "Loaded {} points from {}",
        trajectory.len(),
        config.input_path.display()
    );
    if trajectory.is_empty() {
        warn!("Trajectory is empty, nothing will be sent");
    }
    if let Some((start, end)) = trajectory.time_span() {
        info!(
            "Trajectory spans {} to {} ({:.0} m)",
            start,
            end,
            trajectory.length_meters()
        );
    }

    let client = MatchingClient::new(config)?;
    let (results, report) = match_trajectory(&client, &trajectory, config).await;

    save_matched_results(&results, &config.results_path)?;
    info!("Matched results saved to {}", config.results_path.display());

    if report.dropped.is_empty() {
        info!("{}", report.summary());
    } else {
        warn!("{}; dropped batches: {:?}", report.summary(), report.dropped);
    }
    Ok(report)
}
