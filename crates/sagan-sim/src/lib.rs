//! Sagan Sim - fixture-driven review simulations
//!
//! Generates changes mixing one vulnerable file with safe ones, submits them
//! to an in-memory repository and runs a security mission over each.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod factory;
pub mod simulation;

pub use factory::{safe_files, vulnerable_file_name, vulnerable_snippets, VulnerabilityFactory};
pub use simulation::{Simulation, SimulationConfig, SimulationError, SimulationReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
