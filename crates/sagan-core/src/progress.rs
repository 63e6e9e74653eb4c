//! Progress reporting
//!
//! The controller emits one [`ProgressEvent`] per human-readable step. Sinks
//! must preserve emission order; they never influence the mission.

use crate::state::MissionState;
use crate::types::{ChangeId, MissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One progress message from a running mission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Emitting mission
    pub mission: MissionId,
    /// Change under review
    pub change: ChangeId,
    /// Phase the mission was in when the event was emitted
    pub phase: MissionState,
    /// Human readable message
    pub message: String,
    /// Emission time
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create event stamped with the current time
    #[must_use]
    pub fn new(
        mission: MissionId,
        change: ChangeId,
        phase: MissionState,
        message: impl Into<String>,
    ) -> Self {
        Self {
            mission,
            change,
            phase,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of mission progress
pub trait ProgressSink: Send + Sync {
    /// Deliver one event
    fn notify(&self, event: ProgressEvent);
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn notify(&self, event: ProgressEvent) {
        (**self).notify(event);
    }
}

/// Deliver to both sinks, first then second
impl<A: ProgressSink, B: ProgressSink> ProgressSink for (A, B) {
    fn notify(&self, event: ProgressEvent) {
        self.0.notify(event.clone());
        self.1.notify(event);
    }
}

/// Sink that logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn notify(&self, event: ProgressEvent) {
        tracing::info!(
            mission = %event.mission,
            change = %event.change,
            phase = %event.phase,
            "{}",
            event.message
        );
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: ProgressEvent) {}
}

/// Sink forwarding events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Create sink and the receiving end of its channel
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Wrap an existing sender
    #[inline]
    #[must_use]
    pub fn from_sender(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn notify(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("progress receiver dropped, event discarded");
        }
    }
}
