//! Infrastructure-level errors (wraps application errors)

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::application::ApplicationError;

/// Errors raised at the process boundary: everything the application layer
/// reports, plus file operations done outside of a service.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("cannot {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InfraError {
    /// Wrap a failed file operation on `path`.
    pub fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type InfraResult<T> = Result<T, InfraError>;
