//! Errors that end an import pass

use std::path::PathBuf;
use thiserror::Error;

use crate::infrastructure::api_error::ApiError;

#[derive(Error, Debug)]
pub enum ImportError {
    /// Input file missing or not in the expected shape.
    #[error("Cannot read input {path:?}: {message}")]
    Input { path: PathBuf, message: String },

    /// A remote call the whole pass depends on failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Interrupted by the operator.
    #[error("Pass cancelled")]
    Cancelled,
}

impl ImportError {
    pub fn input(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Input {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
