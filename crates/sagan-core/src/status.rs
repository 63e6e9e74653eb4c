//! Status board: a versioned snapshot of the latest mission for polling hosts
//!
//! Events arrive over a channel and are folded into a [`MissionSnapshot`];
//! readers always see a whole snapshot, never a half-applied event. A
//! snapshot may show detection messages before the result is published.

use crate::progress::ProgressEvent;
use crate::state::MissionState;
use crate::types::{ChangeId, MissionId, MissionResult};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Point-in-time view of the most recent mission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSnapshot {
    /// Incremented on every applied update
    pub version: u64,
    /// Mission the snapshot describes
    pub mission: Option<MissionId>,
    /// Change under review
    pub change: Option<ChangeId>,
    /// Phase of the last event
    pub phase: Option<MissionState>,
    /// Every message in emission order
    pub logs: Vec<String>,
    /// Final result once published
    pub result: Option<MissionResult>,
    /// Time of the last update
    pub updated_at: Option<DateTime<Utc>>,
}

impl MissionSnapshot {
    /// Check if a mission is underway
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase.is_some_and(|p| !p.is_terminal())
    }
}

/// Shared holder of the current [`MissionSnapshot`]
#[derive(Debug, Default)]
pub struct StatusBoard {
    snapshot: RwLock<MissionSnapshot>,
}

impl StatusBoard {
    /// Create empty board
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current snapshot
    #[must_use]
    pub fn snapshot(&self) -> MissionSnapshot {
        self.snapshot.read().clone()
    }

    /// Current version
    #[must_use]
    pub fn version(&self) -> u64 {
        self.snapshot.read().version
    }

    /// Fold one event into the snapshot
    ///
    /// An event from a different mission starts a fresh snapshot.
    pub fn apply(&self, event: &ProgressEvent) {
        let mut snapshot = self.snapshot.write();
        if snapshot.mission != Some(event.mission) {
            let version = snapshot.version;
            *snapshot = MissionSnapshot {
                version,
                mission: Some(event.mission),
                change: Some(event.change),
                ..MissionSnapshot::default()
            };
        }
        snapshot.phase = Some(event.phase);
        snapshot.logs.push(event.message.clone());
        snapshot.updated_at = Some(event.timestamp);
        snapshot.version += 1;
    }

    /// Attach the final result
    pub fn publish_result(&self, result: MissionResult) {
        let mut snapshot = self.snapshot.write();
        if snapshot.mission != Some(result.mission) {
            let version = snapshot.version;
            *snapshot = MissionSnapshot {
                version,
                mission: Some(result.mission),
                change: Some(result.change),
                phase: Some(MissionState::Done),
                ..MissionSnapshot::default()
            };
        }
        snapshot.result = Some(result);
        snapshot.updated_at = Some(Utc::now());
        snapshot.version += 1;
    }

    /// Apply events from `receiver` until every sender is dropped
    pub fn listen(
        self: &Arc<Self>,
        mut receiver: mpsc::UnboundedReceiver<ProgressEvent>,
    ) -> JoinHandle<()> {
        let board = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                board.apply(&event);
            }
            tracing::debug!(version = board.version(), "status board listener closed");
        })
    }
}
