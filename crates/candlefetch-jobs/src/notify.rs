//! Job state notifications.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::JobRecord;

/// Receives a snapshot of a job after each persisted transition.
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Publishes a job snapshot. Must not block.
    fn publish(&self, job: &JobRecord);
}

/// A job snapshot published on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEvent {
    /// The job as persisted after the transition.
    pub job: JobRecord,
}

impl JobEvent {
    /// Event name used when forwarding to external subscribers.
    pub const NAME: &'static str = "job_update";
}

/// Broadcast-backed [`NotificationSink`].
///
/// Subscribers only see events published after they subscribe. A subscriber
/// that falls more than the channel capacity behind receives
/// `RecvError::Lagged` with the number of skipped events.
#[derive(Debug, Clone)]
pub struct JobEventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl JobEventBus {
    /// Default channel capacity.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for JobEventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl NotificationSink for JobEventBus {
    fn publish(&self, job: &JobRecord) {
        // Sending only fails when nobody is listening.
        if self.sender.send(JobEvent { job: job.clone() }).is_err() {
            trace!(job_id = %job.job_id, "no subscribers for job event");
        }
    }
}
