// THEORY:
// One error enum for the whole library. The variants split into two families:
// fatal input errors (`Discovery`, `InvalidStrength`, `UnrecognizedKind`) that
// stop a run before any worker starts, and per-file errors (`Decode`, `Encode`,
// `Worker`) that the scheduler records in its report while sibling files keep
// going.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum DaltonizeError {
    #[error("cannot read directory {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid strength {input:?}: expected an integer between 0 and 100")]
    InvalidStrength { input: String },

    #[error("unrecognized deficiency {input:?}: expected Protanopia, Deuteranopia or Tritanopia")]
    UnrecognizedKind { input: String },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("worker for group {group} stopped unexpectedly: {reason}")]
    Worker { group: usize, reason: String },
}

impl DaltonizeError {
    /// True for errors that only affect a single file of a batch.
    #[cfg(test)]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DaltonizeError::Decode { .. }
                | DaltonizeError::Encode { .. }
                | DaltonizeError::Worker { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DaltonizeError>;
