use std::io;
use std::path::PathBuf;

/// Errors surfaced by the playback controller and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("media not found: {}", .0.display())]
    MediaNotFound(PathBuf),

    #[error("no media selected")]
    NoMediaSelected,

    #[error("no active playback process")]
    NoActiveProcess,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("duration probe failed: {0}")]
    ProbeFailed(String),

    #[error("image conversion failed: {0}")]
    ConversionFailed(String),

    #[error("{0} is not supported by this process")]
    NotSupported(&'static str),

    #[error("failed to signal process: {0}")]
    Signal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = PlayerError> = std::result::Result<T, E>;
