//! Event system for Halo Trace
//!
//! Provides workflow event definitions and the EventBus used to observe a
//! session from outside the controller (CLI progress output, UIs, tests).

mod workflow_types;

pub use workflow_types::Stage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Workflow event types
///
/// Every event carries the `session_id` of the session that produced it.
/// A reset starts a new session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// Stage transition applied to the session
    StageChanged {
        session_id: Uuid,
        old_stage: Stage,
        new_stage: Stage,
        timestamp: DateTime<Utc>,
    },

    /// User-facing status line changed
    StatusChanged {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Preview for the staged image is available
    PreviewReady {
        session_id: Uuid,
        /// Length of the data URL in bytes
        size: usize,
        timestamp: DateTime<Utc>,
    },

    /// Session returned to its initial value
    SessionReset {
        /// Session id before the reset
        previous_session_id: Uuid,
        /// Fresh session id
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// A response arrived for a request that is no longer current and was dropped
    StaleResponseDiscarded {
        session_id: Uuid,
        /// Operation that produced the response ("extract", "resolve", "preview")
        operation: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// Event type name (matches the serde tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::StageChanged { .. } => "StageChanged",
            WorkflowEvent::StatusChanged { .. } => "StatusChanged",
            WorkflowEvent::PreviewReady { .. } => "PreviewReady",
            WorkflowEvent::SessionReset { .. } => "SessionReset",
            WorkflowEvent::StaleResponseDiscarded { .. } => "StaleResponseDiscarded",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the controller)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use halo_common::events::{EventBus, Stage, WorkflowEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(WorkflowEvent::StageChanged {
///     session_id: uuid::Uuid::new_v4(),
///     old_stage: Stage::Idle,
///     new_stage: Stage::CategorySelected,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before the oldest are
    /// dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WorkflowEvent,
    ) -> Result<usize, broadcast::error::SendError<WorkflowEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
