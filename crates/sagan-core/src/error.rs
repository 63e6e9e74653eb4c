//! Error types for Sagan Core
//!
//! Provides error handling for:
//! - Repository port failures
//! - Mission start rejection and illegal state transitions
//! - Configuration loading

use crate::state::MissionState;
use crate::types::ChangeId;
use std::path::PathBuf;

/// Repository port errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// No change with this id
    #[error("unknown change: {0}")]
    UnknownChange(ChangeId),

    /// Change has no file with this name
    #[error("change {change} has no file named '{file}'")]
    UnknownFile {
        /// Change being edited
        change: ChangeId,
        /// Requested file name
        file: String,
    },

    /// Change was merged already
    #[error("change {0} is already merged")]
    AlreadyMerged(ChangeId),

    /// Two files of a new change share a name
    #[error("duplicate file name '{0}' in change")]
    DuplicateFile(String),
}

/// Mission errors
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    /// Mission requested for a change the repository does not know
    #[error("unknown change: {0}")]
    UnknownChange(ChangeId),

    /// Another mission is already running against this change
    #[error("a mission is already in progress for change {0}")]
    MissionInProgress(ChangeId),

    /// Repository failed mid-mission
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Internal state machine violation
    #[error("illegal mission transition: {from} -> {to}")]
    IllegalTransition {
        /// State before the attempted transition
        from: MissionState,
        /// Requested state
        to: MissionState,
    },
}

impl MissionError {
    /// Check if the mission was refused before doing any work
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UnknownChange(_) | Self::MissionInProgress(_))
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the expected shape
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
