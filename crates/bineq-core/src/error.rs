use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures that can occur while turning a path into `ArtifactMetadata`.
///
/// This is the only fallible boundary of the comparator. Every stage after
/// introspection is total, so a comparison either carries these errors into
/// its assessment or produces full diff tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactError {
    /// The locator could not resolve the artifact (path absent).
    #[error("artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but is not a recognised container, or its tables
    /// could not be enumerated.
    #[error("artifact unreadable: {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// Introspection exceeded the per-artifact deadline.
    #[error("artifact introspection timed out after {}s: {}", timeout.as_secs(), path.display())]
    TimedOut { path: PathBuf, timeout: Duration },
}

impl ArtifactError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound { path }
            | Self::Unreadable { path, .. }
            | Self::TimedOut { path, .. } => path,
        }
    }

    /// Stable machine-readable tag used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Unreadable { .. } => "unreadable",
            Self::TimedOut { .. } => "timed_out",
        }
    }
}
