//! Testing utilities for Sagan workspace
//!
//! Shared test helpers, fixtures, and a recording progress sink.

#![allow(missing_docs)]

use parking_lot::Mutex;
use sagan_core::{
    ChangeId, InMemoryRepository, MissionController, MissionState, ProgressEvent, ProgressSink,
    RepositoryPort,
};
use sagan_patterns::{PatternLibrary, SourceFile};
use std::sync::Arc;

/// Progress sink that keeps every event for later assertions
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Phases in emission order with consecutive duplicates collapsed
    pub fn phases(&self) -> Vec<MissionState> {
        let mut phases: Vec<MissionState> = self.events.lock().iter().map(|e| e.phase).collect();
        phases.dedup();
        phases
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events.lock().iter().any(|e| e.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ProgressSink for RecordingSink {
    fn notify(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}

pub fn python_file(name: &str, content: &str) -> SourceFile {
    SourceFile::new(name, content, "python")
}

pub fn vulnerable_python() -> SourceFile {
    python_file("app.py", "def connect():\n    password = \"supersecret\"\n    return password")
}

pub fn safe_python() -> SourceFile {
    python_file("utils.py", "import json\n\ndef dump(data):\n    return json.dumps(data)")
}

pub fn builtin_library() -> Arc<PatternLibrary> {
    Arc::new(PatternLibrary::builtin().unwrap())
}

/// Repository holding one change with `files`
pub async fn setup_repository_with(files: Vec<SourceFile>) -> (Arc<InMemoryRepository>, ChangeId) {
    let repository = Arc::new(InMemoryRepository::new());
    let id = repository.create_change("Test change", files).await.unwrap().id;
    (repository, id)
}

pub fn setup_controller(
    repository: Arc<InMemoryRepository>,
    sink: Arc<RecordingSink>,
) -> MissionController {
    MissionController::new(builtin_library(), repository, sink)
}
