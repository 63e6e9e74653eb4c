//! Simulation runner
//!
//! Opens a change built from factory fixtures, runs one mission over it and
//! mirrors progress onto a [`StatusBoard`]. At most one simulation runs at a
//! time per [`Simulation`].

use crate::factory::VulnerabilityFactory;
use sagan_core::{
    ChangeId, ChangeState, ChannelSink, ConfigError, InMemoryRepository, MissionConfig,
    MissionController, MissionError, MissionOutcome, MissionResult, RepositoryError,
    RepositoryPort, StatusBoard, TracingSink,
};
use sagan_patterns::{Language, PatternError, PatternLibrary, SourceFile};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Simulation errors
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Simulation already running")]
    AlreadyRunning,

    #[error("Pattern library error: {0}")]
    Pattern(#[from] PatternError),

    #[error("Mission error: {0}")]
    Mission(#[from] MissionError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Language of the generated change
    pub language: Language,
    /// Fixture seed; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Controller settings
    pub mission: MissionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            language: Language::python(),
            seed: None,
            mission: MissionConfig::default(),
        }
    }
}

impl SimulationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<Language>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_mission(mut self, mission: MissionConfig) -> Self {
        self.mission = mission;
        self
    }

    /// Parse from TOML text; mission settings live under `[mission]`
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Outcome of one simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub title: String,
    pub language: Language,
    pub change: ChangeId,
    /// Files as submitted, before remediation
    pub submitted: Vec<SourceFile>,
    pub result: MissionResult,
    pub merged: bool,
    pub logs: Vec<String>,
}

impl SimulationReport {
    /// Whether the change ended secure
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result.is_secure()
    }

    /// Human readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Security Review Simulation ===");
        let _ = writeln!(out, "Change #{}: {}", self.change, self.title);
        let _ = writeln!(out, "Language: {}", self.language);
        let _ = writeln!(out, "Mission: {}", self.result.mission);
        let _ = writeln!(out, "Outcome: {}", self.result.outcome);
        let _ = writeln!(out, "Merged: {}", self.merged);
        out.push('\n');

        if self.result.triggered_labels.is_empty() {
            out.push_str("No vulnerabilities detected\n");
        } else {
            out.push_str("Vulnerabilities:\n");
            for label in &self.result.triggered_labels {
                let _ = writeln!(out, "  - {label}");
            }
        }

        if !self.result.remaining_labels.is_empty() {
            out.push_str("Still active after remediation:\n");
            for label in &self.result.remaining_labels {
                let _ = writeln!(out, "  - {label}");
            }
        }

        if self.result.outcome != MissionOutcome::Clean {
            out.push_str("\nFixed files:\n");
            for (name, content) in &self.result.fixed_files {
                let _ = writeln!(out, "--- {name}");
                let _ = writeln!(out, "{content}");
            }
            let _ = writeln!(out, "\nGenerated tests: {}", self.result.generated_tests.len());
            for test in &self.result.generated_tests {
                out.push_str(test);
            }
        }

        out.push_str("\nLog:\n");
        for line in &self.logs {
            let _ = writeln!(out, "  {line}");
        }
        out
    }
}

/// Clears the running flag when dropped
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Host for fixture-driven missions
pub struct Simulation {
    config: SimulationConfig,
    library: Arc<PatternLibrary>,
    repository: Arc<InMemoryRepository>,
    board: Arc<StatusBoard>,
    running: Arc<AtomicBool>,
}

impl Simulation {
    /// Create a simulation over the built-in rule set
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        Ok(Self::with_library(config, Arc::new(PatternLibrary::builtin()?)))
    }

    #[must_use]
    pub fn with_library(config: SimulationConfig, library: Arc<PatternLibrary>) -> Self {
        Self {
            config,
            library,
            repository: Arc::new(InMemoryRepository::new()),
            board: Arc::new(StatusBoard::new()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Live status of the latest mission
    #[must_use]
    pub fn board(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.board)
    }

    #[must_use]
    pub fn repository(&self) -> Arc<InMemoryRepository> {
        Arc::clone(&self.repository)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run with the configured language and seed
    pub async fn run(&self) -> Result<SimulationReport, SimulationError> {
        let guard = self.claim()?;
        let files = self.generate_files();
        self.execute(guard, &self.config.language, files).await
    }

    /// Claim the run slot, then run in a spawned task
    ///
    /// A second start while a run is active fails immediately.
    pub fn start(
        self: &Arc<Self>,
    ) -> Result<JoinHandle<Result<SimulationReport, SimulationError>>, SimulationError> {
        let guard = self.claim()?;
        let simulation = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let files = simulation.generate_files();
            let language = simulation.config.language.clone();
            simulation.execute(guard, &language, files).await
        }))
    }

    /// Submit `files` as a new change and run one mission over it
    pub async fn run_with_files(
        &self,
        language: &Language,
        files: Vec<SourceFile>,
    ) -> Result<SimulationReport, SimulationError> {
        let guard = self.claim()?;
        self.execute(guard, language, files).await
    }

    fn claim(&self) -> Result<RunGuard, SimulationError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SimulationError::AlreadyRunning)?;
        Ok(RunGuard(Arc::clone(&self.running)))
    }

    fn generate_files(&self) -> Vec<SourceFile> {
        let mut factory = match self.config.seed {
            Some(seed) => VulnerabilityFactory::new(seed),
            None => VulnerabilityFactory::from_os_rng(),
        };
        factory.generate_change_files(&self.config.language)
    }

    async fn execute(
        &self,
        _guard: RunGuard,
        language: &Language,
        files: Vec<SourceFile>,
    ) -> Result<SimulationReport, SimulationError> {
        let title = format!("Feature: Update {language} service");
        let change = self.repository.create_change(&title, files.clone()).await?;
        tracing::info!(change = %change.id, %language, files = files.len(), "change opened");

        let (sink, receiver) = ChannelSink::new();
        let listener = self.board.listen(receiver);
        let controller = MissionController::new(
            Arc::clone(&self.library),
            self.repository.clone(),
            Arc::new((sink, TracingSink)),
        )
        .with_config(self.config.mission.clone());

        let outcome = controller.run(change.id).await;
        // The listener drains until the controller's sender is gone
        drop(controller);
        if let Err(err) = listener.await {
            tracing::warn!(error = %err, "status listener ended abnormally");
        }
        let result = outcome?;

        self.board.publish_result(result.clone());
        let merged = self
            .repository
            .get_change(change.id)
            .await
            .is_some_and(|c| c.state == ChangeState::Merged);

        if merged {
            tracing::info!(change = %change.id, "simulation merged change");
        } else if result.is_secure() {
            tracing::info!(change = %change.id, "change left open");
        } else {
            tracing::warn!(change = %change.id, "merge rejected by security check");
        }

        Ok(SimulationReport {
            title,
            language: language.clone(),
            change: change.id,
            submitted: files,
            result,
            merged,
            logs: self.board.snapshot().logs,
        })
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
