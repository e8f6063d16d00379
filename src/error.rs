use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {path} (line {line}): {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("batch {batch}: {reason}")]
    Protocol { batch: usize, reason: String },

    #[error("coordinate/timestamp count mismatch: {coordinates} coordinates, {timestamps} timestamps")]
    LengthMismatch {
        coordinates: usize,
        timestamps: usize,
    },

    #[error("{0} trajectory is empty")]
    EmptyTrajectory(&'static str),

    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("plotting failed: {0}")]
    Plot(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
