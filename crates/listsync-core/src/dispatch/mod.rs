//! Queue-backed confirmation dispatch
//!
//! [`QueueDispatcher`] hands [`ConfirmationJob`]s to a bounded tokio channel
//! and returns immediately. A worker owned by the embedding application
//! drains the paired [`ConfirmationQueue`] and performs delivery.
//!
//! ```text
//! SubscriberLifecycle ── dispatch() ──▶ [ bounded channel ] ──▶ worker
//! ```
//!
//! When the channel is full or the worker is gone, the job is dropped with a
//! warning. The signup that scheduled it is never affected.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::traits::{ConfirmationDispatcher, ConfirmationJob};

/// Fire-and-forget dispatcher backed by a bounded channel
#[derive(Debug, Clone)]
pub struct QueueDispatcher {
    jobs_tx: mpsc::Sender<ConfirmationJob>,
}

/// Receiving end of a [`QueueDispatcher`]
#[derive(Debug)]
pub struct ConfirmationQueue {
    jobs_rx: mpsc::Receiver<ConfirmationJob>,
}

impl QueueDispatcher {
    /// Create a dispatcher and its queue
    ///
    /// # Returns
    ///
    /// A tuple of (dispatcher, queue) where the queue yields dispatched jobs
    pub fn new(capacity: usize) -> (Self, ConfirmationQueue) {
        let (jobs_tx, jobs_rx) = mpsc::channel(capacity.max(1));
        (Self { jobs_tx }, ConfirmationQueue { jobs_rx })
    }

    /// Create a dispatcher sized from configuration
    pub fn from_config(config: &DispatchConfig) -> (Self, ConfirmationQueue) {
        Self::new(config.queue_capacity)
    }
}

impl ConfirmationDispatcher for QueueDispatcher {
    fn dispatch(&self, job: ConfirmationJob) {
        let id = job.subscriber.id;
        match self.jobs_tx.try_send(job) {
            Ok(()) => debug!("Queued confirmation for subscriber {}", id),
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Confirmation queue full, dropping confirmation for subscriber {}. \
                    Consider increasing queue_capacity.",
                    id
                );
            }
            Err(TrySendError::Closed(_)) => {
                warn!(
                    "Confirmation worker has stopped, dropping confirmation for subscriber {}",
                    id
                );
            }
        }
    }
}

impl ConfirmationQueue {
    /// Wait for the next job; `None` once every dispatcher is dropped
    pub async fn recv(&mut self) -> Option<ConfirmationJob> {
        self.jobs_rx.recv().await
    }

    /// Take a job if one is ready
    pub fn try_recv(&mut self) -> Option<ConfirmationJob> {
        self.jobs_rx.try_recv().ok()
    }

    /// Consume the queue as a stream of jobs
    pub fn into_stream(self) -> ReceiverStream<ConfirmationJob> {
        ReceiverStream::new(self.jobs_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::{Subscriber, SubscriberEmail};
    use crate::traits::DispatchReason;
    use tokio_stream::StreamExt;

    fn job(raw: &str) -> ConfirmationJob {
        let subscriber = Subscriber::new(SubscriberEmail::parse(raw).unwrap());
        ConfirmationJob::new(subscriber, DispatchReason::Created)
    }

    #[tokio::test]
    async fn test_dispatched_jobs_arrive_in_order() {
        let (dispatcher, mut queue) = QueueDispatcher::new(4);

        dispatcher.dispatch(job("a@example.com"));
        dispatcher.dispatch(job("b@example.com"));

        let first = queue.recv().await.unwrap();
        let second = queue.recv().await.unwrap();
        assert_eq!(first.subscriber.email.as_ref(), "a@example.com");
        assert_eq!(second.subscriber.email.as_ref(), "b@example.com");
        assert!(queue.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (dispatcher, mut queue) = QueueDispatcher::new(1);

        dispatcher.dispatch(job("a@example.com"));
        dispatcher.dispatch(job("b@example.com"));

        assert_eq!(
            queue.recv().await.unwrap().subscriber.email.as_ref(),
            "a@example.com"
        );
        assert!(queue.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_after_worker_stopped_is_silent() {
        let (dispatcher, queue) = QueueDispatcher::new(1);
        drop(queue);

        dispatcher.dispatch(job("a@example.com"));
    }

    #[tokio::test]
    async fn test_queue_as_stream_ends_with_dispatchers() {
        let (dispatcher, queue) = QueueDispatcher::from_config(&DispatchConfig::default());
        dispatcher.dispatch(job("a@example.com"));
        drop(dispatcher);

        let jobs: Vec<ConfirmationJob> = queue.into_stream().collect().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].reason, DispatchReason::Created);
    }
}
