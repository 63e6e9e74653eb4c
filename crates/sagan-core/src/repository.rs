//! Repository port and an in-memory implementation
//!
//! The mission controller only ever talks to a repository through
//! [`RepositoryPort`]; a code host integration implements the same trait.

use crate::error::RepositoryError;
use crate::types::{Change, ChangeId, ChangeState, CheckResult, MissionId};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sagan_patterns::SourceFile;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Missions in flight, at most one per change
///
/// Owned by the repository so that every controller working against it
/// sees the same claims.
#[derive(Debug, Default)]
pub struct MissionRegistry {
    active: DashMap<ChangeId, MissionId>,
}

impl MissionRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `change` for `mission`
    ///
    /// # Errors
    /// Returns the mission currently holding the change.
    pub fn try_claim(&self, change: ChangeId, mission: MissionId) -> Result<(), MissionId> {
        match self.active.entry(change) {
            Entry::Occupied(holder) => Err(*holder.get()),
            Entry::Vacant(slot) => {
                slot.insert(mission);
                Ok(())
            }
        }
    }

    /// Release `change` if `mission` holds it
    pub fn release(&self, change: ChangeId, mission: MissionId) -> bool {
        self.active
            .remove_if(&change, |_, holder| *holder == mission)
            .is_some()
    }

    /// Mission currently holding `change`
    #[must_use]
    pub fn holder(&self, change: ChangeId) -> Option<MissionId> {
        self.active.get(&change).map(|e| *e.value())
    }

    /// Number of claimed changes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Operations the mission controller needs from a code host
#[async_trait]
pub trait RepositoryPort: Send + Sync {
    /// Register a new open change
    ///
    /// File names within a change are unique; a duplicate is rejected with
    /// `RepositoryError::DuplicateFile`.
    async fn create_change(
        &self,
        title: &str,
        files: Vec<SourceFile>,
    ) -> Result<Change, RepositoryError>;

    /// Fetch a snapshot of a change
    async fn get_change(&self, id: ChangeId) -> Option<Change>;

    /// Replace one file's content
    async fn update_file_content(
        &self,
        id: ChangeId,
        filename: &str,
        content: String,
    ) -> Result<(), RepositoryError>;

    /// Set a named check result
    async fn set_check_result(
        &self,
        id: ChangeId,
        check: &str,
        result: CheckResult,
    ) -> Result<(), RepositoryError>;

    /// Append an annotation
    async fn add_annotation(&self, id: ChangeId, text: String) -> Result<(), RepositoryError>;

    /// Merge an open change
    async fn merge_change(&self, id: ChangeId) -> Result<(), RepositoryError>;

    /// Missions currently running against this repository's changes
    fn missions(&self) -> &MissionRegistry;
}

/// Change store backed by a concurrent map
///
/// Ids are assigned sequentially from 1.
#[derive(Debug)]
pub struct InMemoryRepository {
    changes: DashMap<ChangeId, Change>,
    next_id: AtomicU64,
    missions: MissionRegistry,
}

impl InMemoryRepository {
    /// Create empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            changes: DashMap::new(),
            next_id: AtomicU64::new(1),
            missions: MissionRegistry::new(),
        }
    }

    /// Number of stored changes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Check if repository holds no changes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Snapshot of every change, ordered by id
    #[must_use]
    pub fn changes(&self) -> Vec<Change> {
        let mut all: Vec<Change> = self.changes.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|c| c.id);
        all
    }

    fn with_change<T>(
        &self,
        id: ChangeId,
        f: impl FnOnce(&mut Change) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut entry = self
            .changes
            .get_mut(&id)
            .ok_or(RepositoryError::UnknownChange(id))?;
        f(entry.value_mut())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryPort for InMemoryRepository {
    async fn create_change(
        &self,
        title: &str,
        files: Vec<SourceFile>,
    ) -> Result<Change, RepositoryError> {
        let mut seen = HashSet::with_capacity(files.len());
        if let Some(dup) = files.iter().find(|f| !seen.insert(f.name())) {
            return Err(RepositoryError::DuplicateFile(dup.name().to_string()));
        }

        let id = ChangeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let change = Change::new(id, title, files);
        self.changes.insert(id, change.clone());
        tracing::info!(change = %id, title, files = change.files.len(), "change created");
        Ok(change)
    }

    async fn get_change(&self, id: ChangeId) -> Option<Change> {
        self.changes.get(&id).map(|e| e.value().clone())
    }

    async fn update_file_content(
        &self,
        id: ChangeId,
        filename: &str,
        content: String,
    ) -> Result<(), RepositoryError> {
        self.with_change(id, |change| {
            let file = change
                .files
                .iter_mut()
                .find(|f| f.name() == filename)
                .ok_or_else(|| RepositoryError::UnknownFile {
                    change: id,
                    file: filename.to_string(),
                })?;
            file.replace_content(content);
            Ok(())
        })
    }

    async fn set_check_result(
        &self,
        id: ChangeId,
        check: &str,
        result: CheckResult,
    ) -> Result<(), RepositoryError> {
        self.with_change(id, |change| {
            change.checks.insert(check.to_string(), result);
            Ok(())
        })
    }

    async fn add_annotation(&self, id: ChangeId, text: String) -> Result<(), RepositoryError> {
        self.with_change(id, |change| {
            change.annotations.push(text);
            Ok(())
        })
    }

    async fn merge_change(&self, id: ChangeId) -> Result<(), RepositoryError> {
        self.with_change(id, |change| {
            if change.is_merged() {
                return Err(RepositoryError::AlreadyMerged(id));
            }
            change.state = ChangeState::Merged;
            tracing::info!(change = %id, "change merged");
            Ok(())
        })
    }

    fn missions(&self) -> &MissionRegistry {
        &self.missions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("app.py", "password = \"x\"", "python"),
            SourceFile::new("utils.py", "import json", "python"),
        ]
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let repo = InMemoryRepository::new();
        let first = repo.create_change("one", files()).await.unwrap();
        let second = repo.create_change("two", Vec::new()).await.unwrap();

        assert_eq!(first.id, ChangeId(1));
        assert_eq!(second.id, ChangeId(2));
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn get_returns_snapshot() {
        let repo = InMemoryRepository::new();
        let change = repo.create_change("t", files()).await.unwrap();

        let mut snapshot = repo.get_change(change.id).await.unwrap();
        snapshot.title = "edited locally".to_string();

        assert_eq!(repo.get_change(change.id).await.unwrap().title, "t");
        assert!(repo.get_change(ChangeId(99)).await.is_none());
    }

    #[tokio::test]
    async fn update_file_content_replaces_named_file() {
        let repo = InMemoryRepository::new();
        let id = repo.create_change("t", files()).await.unwrap().id;

        repo.update_file_content(id, "app.py", "fixed".to_string())
            .await
            .unwrap();
        let change = repo.get_change(id).await.unwrap();
        assert_eq!(change.file("app.py").unwrap().content(), "fixed");
        assert_eq!(change.file("utils.py").unwrap().content(), "import json");
    }

    #[tokio::test]
    async fn update_unknown_file_fails() {
        let repo = InMemoryRepository::new();
        let id = repo.create_change("t", files()).await.unwrap().id;

        let err = repo
            .update_file_content(id, "missing.py", String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UnknownFile { .. }));
    }

    #[tokio::test]
    async fn mutations_on_unknown_change_fail() {
        let repo = InMemoryRepository::new();
        let id = ChangeId(5);

        assert_eq!(
            repo.add_annotation(id, "x".to_string()).await,
            Err(RepositoryError::UnknownChange(id))
        );
        assert_eq!(
            repo.set_check_result(id, "Security", CheckResult::Pass).await,
            Err(RepositoryError::UnknownChange(id))
        );
        assert_eq!(repo.merge_change(id).await, Err(RepositoryError::UnknownChange(id)));
    }

    #[tokio::test]
    async fn checks_are_overwritten() {
        let repo = InMemoryRepository::new();
        let id = repo.create_change("t", files()).await.unwrap().id;

        repo.set_check_result(id, "Security", CheckResult::Fail).await.unwrap();
        repo.set_check_result(id, "Security", CheckResult::Pass).await.unwrap();

        let change = repo.get_change(id).await.unwrap();
        assert_eq!(change.check("Security"), Some(CheckResult::Pass));
    }

    #[tokio::test]
    async fn merge_happens_once() {
        let repo = InMemoryRepository::new();
        let id = repo.create_change("t", files()).await.unwrap().id;

        repo.merge_change(id).await.unwrap();
        assert!(repo.get_change(id).await.unwrap().is_merged());
        assert_eq!(repo.merge_change(id).await, Err(RepositoryError::AlreadyMerged(id)));
    }

    #[tokio::test]
    async fn changes_listed_by_id() {
        let repo = InMemoryRepository::new();
        repo.create_change("a", Vec::new()).await.unwrap();
        repo.create_change("b", Vec::new()).await.unwrap();

        let titles: Vec<String> = repo.changes().into_iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn duplicate_file_names_are_rejected() {
        let repo = InMemoryRepository::new();
        let mut duplicated = files();
        duplicated.push(SourceFile::new("app.py", "eval(x)", "python"));

        let err = repo.create_change("dup", duplicated).await.unwrap_err();
        assert_eq!(err, RepositoryError::DuplicateFile("app.py".to_string()));
        assert!(repo.is_empty());
    }

    #[test]
    fn registry_holds_one_mission_per_change() {
        let registry = MissionRegistry::new();
        let (first, second) = (MissionId::new(), MissionId::new());

        assert!(registry.try_claim(ChangeId(1), first).is_ok());
        assert_eq!(registry.try_claim(ChangeId(1), second), Err(first));
        assert!(registry.try_claim(ChangeId(2), second).is_ok());

        assert!(!registry.release(ChangeId(1), second));
        assert_eq!(registry.holder(ChangeId(1)), Some(first));
        assert!(registry.release(ChangeId(1), first));
        assert!(registry.holder(ChangeId(1)).is_none());
        assert_eq!(registry.len(), 1);
    }
}
