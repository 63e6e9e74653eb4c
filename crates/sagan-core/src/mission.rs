//! Mission controller
//!
//! Runs one detect, remediate, re-verify pass over a change:
//! - Detecting: every file through the detector, labels unioned
//! - Clean: nothing found, check passes, no remediation
//! - Triggered: check fails, one annotation per (file, label)
//! - Remediating: content threaded through the remediator and written back
//! - Verifying: detector re-run on files fetched fresh from the repository
//! - Passed / Failed: check updated, change merged only on Passed
//!
//! A mission is a single pass; surviving labels are reported, not retried.

use crate::config::{MissionConfig, RemediationScope};
use crate::error::{MissionError, RepositoryError};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::repository::RepositoryPort;
use crate::state::{validate_transition, MissionState};
use crate::types::{Change, ChangeId, CheckResult, MissionId, MissionOutcome, MissionResult};
use sagan_patterns::{Detector, LabelSet, PatternLibrary, Remediator, VulnerabilityLabel};
use std::sync::Arc;

/// Orchestrates missions against a repository
///
/// Cheap to clone; clones share the repository and the sink. Mission
/// claims live in the repository's [`MissionRegistry`], so independent
/// controllers over one repository exclude each other as well.
///
/// [`MissionRegistry`]: crate::repository::MissionRegistry
#[derive(Clone)]
pub struct MissionController {
    detector: Detector,
    remediator: Remediator,
    repository: Arc<dyn RepositoryPort>,
    sink: Arc<dyn ProgressSink>,
    config: MissionConfig,
}

impl MissionController {
    /// Create controller with default configuration
    #[must_use]
    pub fn new(
        library: Arc<PatternLibrary>,
        repository: Arc<dyn RepositoryPort>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            detector: Detector::new(Arc::clone(&library)),
            remediator: Remediator::new(library),
            repository,
            sink,
            config: MissionConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: MissionConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Check if a mission is running against `change`
    #[must_use]
    pub fn is_running(&self, change: ChangeId) -> bool {
        self.repository.missions().holder(change).is_some()
    }

    /// Run a full mission against a change
    ///
    /// # Errors
    /// - `MissionError::UnknownChange` if the repository has no such change;
    ///   nothing is emitted or written
    /// - `MissionError::MissionInProgress` if another mission holds the change
    /// - `MissionError::Repository` if the repository fails mid-mission
    pub async fn run(&self, change_id: ChangeId) -> Result<MissionResult, MissionError> {
        let change = self
            .repository
            .get_change(change_id)
            .await
            .ok_or(MissionError::UnknownChange(change_id))?;

        let mission = MissionId::new();
        let _guard = self.claim(change_id, mission)?;

        tracing::info!(%mission, change = %change_id, files = change.files.len(), "mission started");
        let mut run = Run {
            controller: self,
            result: MissionResult::new(mission, change_id),
            state: MissionState::Start,
        };
        let result = run.execute(change).await;

        match &result {
            Ok(r) => tracing::info!(%mission, change = %change_id, outcome = %r.outcome, "mission finished"),
            Err(e) => tracing::error!(%mission, change = %change_id, error = %e, "mission aborted"),
        }
        result
    }

    fn claim(&self, change: ChangeId, mission: MissionId) -> Result<MissionGuard, MissionError> {
        match self.repository.missions().try_claim(change, mission) {
            Ok(()) => Ok(MissionGuard {
                repository: Arc::clone(&self.repository),
                change,
                mission,
            }),
            Err(holder) => {
                tracing::warn!(change = %change, %holder, "mission rejected, another is in progress");
                Err(MissionError::MissionInProgress(change))
            }
        }
    }
}

impl std::fmt::Debug for MissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MissionController")
            .field("config", &self.config)
            .field("active_missions", &self.repository.missions().len())
            .finish_non_exhaustive()
    }
}

/// Releases the per-change mission slot on drop
struct MissionGuard {
    repository: Arc<dyn RepositoryPort>,
    change: ChangeId,
    mission: MissionId,
}

impl Drop for MissionGuard {
    fn drop(&mut self) {
        self.repository.missions().release(self.change, self.mission);
    }
}

/// State of one mission in flight
struct Run<'a> {
    controller: &'a MissionController,
    result: MissionResult,
    state: MissionState,
}

impl Run<'_> {
    async fn execute(&mut self, change: Change) -> Result<MissionResult, MissionError> {
        let per_file = self.detect(&change)?;

        if self.result.triggered_labels.is_empty() {
            self.clean(&change).await?;
        } else {
            self.trigger(&change, &per_file).await?;
            self.remediate(&change, &per_file).await?;
            self.verify().await?;
        }

        self.transition(MissionState::Done)?;
        self.emit(format!("mission complete: {}", self.result.outcome));
        Ok(self.result.clone())
    }

    /// Labels per file, in file order
    fn detect(&mut self, change: &Change) -> Result<Vec<LabelSet>, MissionError> {
        self.transition(MissionState::Detecting)?;
        self.emit(format!(
            "dispatching detector over {} file(s)",
            change.files.len()
        ));

        let controller = self.controller;
        let detector = &controller.detector;
        let mut per_file = Vec::with_capacity(change.files.len());
        for file in &change.files {
            let labels = detector.detect(file);
            if labels.is_empty() {
                self.emit(format!("{}: no exploits found", file.name()));
            } else {
                self.emit(format!("{}: found {}", file.name(), join(&labels)));
            }
            self.result.triggered_labels.extend(labels.iter().cloned());
            per_file.push(labels);
        }
        Ok(per_file)
    }

    async fn clean(&mut self, change: &Change) -> Result<(), MissionError> {
        self.transition(MissionState::Clean)?;
        let id = self.result.change;
        let controller = self.controller;
        let repository = &controller.repository;

        repository
            .set_check_result(id, &controller.config.security_check, CheckResult::Pass)
            .await?;
        self.emit("system is secure, no action needed");

        if controller.config.merge_on_clean && !change.is_merged() {
            repository.merge_change(id).await?;
            self.emit("change merged");
        }
        self.result.outcome = MissionOutcome::Clean;
        Ok(())
    }

    async fn trigger(&mut self, change: &Change, per_file: &[LabelSet]) -> Result<(), MissionError> {
        self.transition(MissionState::Triggered)?;
        let id = self.result.change;
        let controller = self.controller;
        let repository = &controller.repository;
        let check = &controller.config.security_check;

        for (file, labels) in change.files.iter().zip(per_file) {
            if labels.is_empty() {
                continue;
            }
            repository.set_check_result(id, check, CheckResult::Fail).await?;
            for label in labels {
                repository
                    .add_annotation(id, format!("{label} detected in {}", file.name()))
                    .await?;
            }
        }
        self.emit(format!(
            "security check failed: {}",
            join(&self.result.triggered_labels)
        ));
        Ok(())
    }

    async fn remediate(&mut self, change: &Change, per_file: &[LabelSet]) -> Result<(), MissionError> {
        self.transition(MissionState::Remediating)?;
        self.emit("dispatching remediator");

        let controller = self.controller;
        let global = self.result.triggered_labels.clone();

        for (file, own) in change.files.iter().zip(per_file) {
            let labels: &LabelSet = match controller.config.remediation_scope {
                RemediationScope::Global => &global,
                RemediationScope::PerFile => own,
            };

            let mut content = file.content().to_string();
            for label in labels {
                self.emit(format!("patching {label} in {}", file.name()));
                content = controller
                    .remediator
                    .remediate_content(file.language(), &content, label);

                let test = controller
                    .remediator
                    .generate_verification_test(label, file.language());
                self.result.generated_tests.push(test);
                self.emit(format!("generated security test for {label}"));
            }

            if content != file.content() {
                controller
                    .repository
                    .update_file_content(self.result.change, file.name(), content.clone())
                    .await?;
            }
            self.result
                .fixed_files
                .insert(file.name().to_string(), content);
        }
        Ok(())
    }

    async fn verify(&mut self) -> Result<(), MissionError> {
        self.transition(MissionState::Verifying)?;
        self.emit("dispatching detector for re-verification");

        let id = self.result.change;
        let controller = self.controller;
        let repository = &controller.repository;
        let check = &controller.config.security_check;

        let fresh = repository
            .get_change(id)
            .await
            .ok_or(RepositoryError::UnknownChange(id))?;
        let remaining = controller.detector.detect_all(&fresh.files);

        if remaining.is_empty() {
            self.transition(MissionState::Passed)?;
            repository.set_check_result(id, check, CheckResult::Pass).await?;
            self.emit("all vulnerabilities eliminated");
            if !fresh.is_merged() {
                repository.merge_change(id).await?;
            }
            self.emit("change merged");
            self.result.outcome = MissionOutcome::Passed;
        } else {
            self.transition(MissionState::Failed)?;
            repository.set_check_result(id, check, CheckResult::Fail).await?;
            tracing::warn!(
                mission = %self.result.mission,
                change = %id,
                remaining = %join(&remaining),
                "vulnerabilities survived remediation"
            );
            self.emit(format!("exploits still active: {}", join(&remaining)));
            self.result.outcome = MissionOutcome::Failed;
            self.result.remaining_labels = remaining;
        }
        Ok(())
    }

    fn transition(&mut self, to: MissionState) -> Result<(), MissionError> {
        validate_transition(self.state, to)?;
        tracing::debug!(mission = %self.result.mission, from = %self.state, %to, "mission transition");
        self.state = to;
        Ok(())
    }

    fn emit(&self, message: impl Into<String>) {
        self.controller.sink.notify(ProgressEvent::new(
            self.result.mission,
            self.result.change,
            self.state,
            message,
        ));
    }
}

fn join(labels: &LabelSet) -> String {
    labels
        .iter()
        .map(VulnerabilityLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
