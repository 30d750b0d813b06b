use std::fmt;

use shared::error::StudioError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateImage,
    ConvertTo3d,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GenerateImage => f.write_str("image generation"),
            Operation::ConvertTo3d => f.write_str("3D conversion"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} is already in progress")]
    Busy(Operation),
    #[error("{operation} failed: {source}")]
    Request {
        operation: Operation,
        #[source]
        source: StudioError,
    },
}
