//! Sagan Core - security review missions over a change
//!
//! The mission controller:
//! - Detects vulnerability labels in every file of a change
//! - Fails the security check and annotates offending files
//! - Remediates, writes fixed content back and generates test stubs
//! - Re-verifies and merges only when nothing survives
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sagan_core::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(InMemoryRepository::new());
//! let change = repository
//!     .create_change("Add login", vec![SourceFile::new("app.py", "password = \"x\"", "python")])
//!     .await?;
//!
//! let controller = MissionController::new(
//!     Arc::new(PatternLibrary::builtin()?),
//!     repository,
//!     Arc::new(TracingSink),
//! );
//! let result = controller.run(change.id).await?;
//! assert_eq!(result.outcome, MissionOutcome::Passed);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod mission;
pub mod progress;
pub mod repository;
pub mod state;
pub mod status;
pub mod types;

// Re-exports for convenience
pub use config::{MissionConfig, RemediationScope, DEFAULT_SECURITY_CHECK};
pub use error::{ConfigError, MissionError, RepositoryError};
pub use mission::MissionController;
pub use progress::{ChannelSink, NullSink, ProgressEvent, ProgressSink, TracingSink};
pub use repository::{InMemoryRepository, MissionRegistry, RepositoryPort};
pub use state::{allowed_transitions, validate_transition, MissionState};
pub use status::{MissionSnapshot, StatusBoard};
pub use types::{
    Change, ChangeId, ChangeState, CheckResult, MissionId, MissionOutcome, MissionResult,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running missions
    pub use crate::{
        Change, ChangeId, CheckResult, InMemoryRepository, MissionConfig, MissionController,
        MissionOutcome, MissionResult, ProgressSink, RepositoryPort, TracingSink,
    };
    pub use sagan_patterns::{Language, PatternLibrary, SourceFile, VulnerabilityLabel};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
