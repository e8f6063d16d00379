use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use trackfit::{DropPolicy, GeometryPolicy, TrackFitConfig, run_fit, run_visualize};

#[derive(Parser)]
#[command(name = "trackfit")]
#[command(about = "Map-match GPS trajectories against an OSRM service and visualize the result", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file, flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send the trajectory to the matching service and store the responses
    Fit {
        /// Semicolon-delimited trajectory file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Optional `key: value` metadata file
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Where to write the matched results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL of the matching service
        #[arg(long)]
        endpoint: Option<String>,

        /// Routing profile (driving, walking, cycling, ...)
        #[arg(long)]
        profile: Option<String>,

        /// Maximum points per request
        #[arg(long)]
        batch_size: Option<NonZeroUsize>,

        /// Maximum requests in flight
        #[arg(long)]
        concurrency: Option<NonZeroUsize>,

        /// Request timeout in seconds
        #[arg(long, conflicts_with = "no_timeout")]
        timeout: Option<u64>,

        /// Wait for responses indefinitely
        #[arg(long)]
        no_timeout: bool,

        /// How rejected batches appear in the results file
        #[arg(long, value_enum)]
        drop_policy: Option<DropPolicy>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Plot the original trajectory against the stored matches
    Visualize {
        /// Semicolon-delimited trajectory file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Matched results written by `fit`
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Static plot output (.png or .svg)
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Interactive map output
        #[arg(long)]
        map: Option<PathBuf>,

        /// Which matchings form the matched path
        #[arg(long, value_enum)]
        geometry_policy: Option<GeometryPolicy>,

        /// Initial map zoom
        #[arg(long)]
        zoom: Option<u8>,

        /// TrueType font for plot text
        #[arg(long)]
        font: Option<PathBuf>,
    },
}

fn apply_overrides(config: &mut TrackFitConfig, command: Commands) {
    match command {
        Commands::Fit {
            input,
            metadata,
            output,
            endpoint,
            profile,
            batch_size,
            concurrency,
            timeout,
            no_timeout,
            drop_policy,
            no_progress,
        } => {
            if let Some(v) = input {
                config.input_path = v;
            }
            if metadata.is_some() {
                config.metadata_path = metadata;
            }
            if let Some(v) = output {
                config.results_path = v;
            }
            if let Some(v) = endpoint {
                config.matching_endpoint = v;
            }
            if let Some(v) = profile {
                config.profile = v;
            }
            if let Some(v) = batch_size {
                config.batch_size = v;
            }
            if let Some(v) = concurrency {
                config.concurrency = v;
            }
            if timeout.is_some() {
                config.request_timeout_secs = timeout;
            }
            if no_timeout {
                config.request_timeout_secs = None;
            }
            if let Some(v) = drop_policy {
                config.drop_policy = v;
            }
            if no_progress {
                config.show_progress = false;
            }
        }
        Commands::Visualize {
            input,
            results,
            plot,
            map,
            geometry_policy,
            zoom,
            font,
        } => {
            if let Some(v) = input {
                config.input_path = v;
            }
            if let Some(v) = results {
                config.results_path = v;
            }
            if let Some(v) = plot {
                config.plot_path = v;
            }
            if let Some(v) = map {
                config.map_path = v;
            }
            if let Some(v) = geometry_policy {
                config.geometry_policy = v;
            }
            if let Some(v) = zoom {
                config.map_zoom = v;
            }
            if font.is_some() {
                config.plot_font = font;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => TrackFitConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => TrackFitConfig::default(),
    };

    match cli.command {
        command @ Commands::Fit { .. } => {
            apply_overrides(&mut config, command);
            config.validate()?;
            info!("Starting fit against {}", config.matching_endpoint);
            let report = run_fit(&config).await.context("fit failed")?;
            println!("{}", report.summary());
        }
        command @ Commands::Visualize { .. } => {
            apply_overrides(&mut config, command);
            config.validate()?;
            info!("Starting visualization");
            run_visualize(&config).context("visualization failed")?;
        }
    }

    Ok(())
}
