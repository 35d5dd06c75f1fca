// # Confirmation Dispatcher Trait
//
// The boundary to whatever queue/worker infrastructure delivers confirmation
// notifications.
//
// ## Contract
//
// - `dispatch()` hands a record over and returns immediately
// - the lifecycle never waits for, or inspects, delivery
// - delivery may complete after the signup call has returned
//
// ## Implementations
//
// - Queue-backed: `QueueDispatcher` (bounded tokio channel)

use chrono::{DateTime, Utc};

use crate::subscriber::Subscriber;

/// Why a confirmation was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchReason {
    /// First signup for this address
    Created,
    /// Re-signup of a previously removed address
    Restored,
}

/// Unit of work handed to the confirmation worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationJob {
    /// The created or restored record
    pub subscriber: Subscriber,
    /// The transition that triggered this job
    pub reason: DispatchReason,
    /// When the job was handed over
    pub queued_at: DateTime<Utc>,
}

impl ConfirmationJob {
    /// Create a job queued now
    pub fn new(subscriber: Subscriber, reason: DispatchReason) -> Self {
        Self {
            subscriber,
            reason,
            queued_at: Utc::now(),
        }
    }
}

/// Trait for confirmation dispatchers
///
/// # Fire-and-forget
///
/// Implementations must not block on delivery and must not report delivery
/// outcome back to the caller. Failures to enqueue are logged by the
/// implementation.
pub trait ConfirmationDispatcher: Send + Sync {
    /// Schedule a confirmation notification
    fn dispatch(&self, job: ConfirmationJob);
}
