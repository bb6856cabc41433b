use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Invalid schema: {0}")]
    SchemaInvalid(String),

    #[error("Engine not ready: training artifacts have not been loaded")]
    EngineNotReady,

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map an error raised while opening an artifact file.
    ///
    /// A missing file is reported as [`Error::ArtifactMissing`]; anything else
    /// stays an I/O error.
    pub fn from_artifact_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::ArtifactMissing(path.into())
        } else {
            Error::Io(err)
        }
    }

    /// True for errors that keep the engine from leaving the uninitialized state.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Error::ArtifactMissing(_) | Error::SchemaInvalid(_) | Error::Io(_)
        )
    }
}
