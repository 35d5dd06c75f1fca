//! Subscriber lifecycle
//!
//! [`SubscriberLifecycle`] decides, for one signup, whether the local record
//! must be created, restored, or left alone, and schedules exactly one
//! confirmation for each state change.
//!
//! ## State Machine
//!
//! | Current state        | Action  | Next state | Side effect            |
//! |----------------------|---------|------------|------------------------|
//! | no record            | create  | active     | dispatch confirmation  |
//! | active record        | no-op   | active     | none                   |
//! | soft-removed record  | restore | active     | dispatch confirmation  |
//!
//! ## Concurrency
//!
//! The lifecycle holds no locks of its own. Racing signups for the same
//! address are serialized by the store: `insert` refuses a second record and
//! `restore` only succeeds for the caller that actually clears the marker.
//! The loser of either race observes an active record and does nothing.
//!
//! Remote list membership is not touched here; callers sync it through
//! [`crate::ListClient`] independently.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::subscriber::{Subscriber, SubscriberEmail};
use crate::traits::{ConfirmationDispatcher, ConfirmationJob, DispatchReason, SubscriberStore};

/// Result of a signup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// A new record was created and a confirmation scheduled
    Created(Subscriber),
    /// A soft-removed record was reactivated and a confirmation scheduled
    Restored(Subscriber),
    /// The address was already active; nothing changed
    AlreadyActive(Subscriber),
}

impl SignupOutcome {
    /// The record after the signup
    pub fn subscriber(&self) -> &Subscriber {
        match self {
            Self::Created(subscriber)
            | Self::Restored(subscriber)
            | Self::AlreadyActive(subscriber) => subscriber,
        }
    }

    /// Whether the signup changed local state
    pub fn changed_state(&self) -> bool {
        !matches!(self, Self::AlreadyActive(_))
    }
}

/// Idempotent signup orchestration over a store and a dispatcher
pub struct SubscriberLifecycle {
    store: Box<dyn SubscriberStore>,
    dispatcher: Box<dyn ConfirmationDispatcher>,
}

impl SubscriberLifecycle {
    /// Create a new lifecycle
    pub fn new(
        store: Box<dyn SubscriberStore>,
        dispatcher: Box<dyn ConfirmationDispatcher>,
    ) -> Self {
        Self { store, dispatcher }
    }

    /// The underlying store
    pub fn store(&self) -> &dyn SubscriberStore {
        self.store.as_ref()
    }

    /// Handle one signup request
    ///
    /// Re-submitting an active address is not an error.
    ///
    /// # Returns
    ///
    /// - `Ok(SignupOutcome)`: The resulting transition
    /// - `Err(Error::InvalidEmail)`: The address is not a valid email
    /// - `Err(Error)`: Store failure
    pub async fn handle_signup(&self, email: &str) -> Result<SignupOutcome> {
        let email = SubscriberEmail::parse(email)?;

        match self.store.find_with_removed(&email).await? {
            None => self.create(&email).await,
            Some(existing) if existing.is_removed() => self.restore(existing).await,
            Some(existing) => {
                debug!("Signup for {} ignored: already active", email);
                Ok(SignupOutcome::AlreadyActive(existing))
            }
        }
    }

    /// Soft-remove the record for an address
    ///
    /// Returns whether anything changed: `false` for unknown or already
    /// removed addresses.
    pub async fn handle_removal(&self, email: &str) -> Result<bool> {
        let email = SubscriberEmail::parse(email)?;

        match self.store.soft_remove(&email).await? {
            Some(removed) => {
                info!("Subscriber {} removed", removed.id);
                Ok(true)
            }
            None => {
                debug!("Removal for {} ignored: no active record", email);
                Ok(false)
            }
        }
    }

    async fn create(&self, email: &SubscriberEmail) -> Result<SignupOutcome> {
        match self.store.insert(email).await {
            Ok(created) => {
                info!("Subscriber {} created", created.id);
                self.schedule_confirmation(&created, DispatchReason::Created);
                Ok(SignupOutcome::Created(created))
            }
            Err(Error::DuplicateSubscriber(_)) => {
                // Another signup inserted first
                let winner = self.store.find_with_removed(email).await?.ok_or_else(|| {
                    Error::subscriber_store(format!(
                        "Record for {} vanished after a duplicate insert",
                        email
                    ))
                })?;

                if winner.is_removed() {
                    self.restore(winner).await
                } else {
                    debug!("Signup for {} lost the create race: already active", email);
                    Ok(SignupOutcome::AlreadyActive(winner))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn restore(&self, removed: Subscriber) -> Result<SignupOutcome> {
        match self.store.restore(removed.id).await? {
            Some(restored) => {
                info!("Subscriber {} restored", restored.id);
                self.schedule_confirmation(&restored, DispatchReason::Restored);
                Ok(SignupOutcome::Restored(restored))
            }
            None => {
                // Another signup restored it first
                let current = self
                    .store
                    .find_with_removed(&removed.email)
                    .await?
                    .unwrap_or(removed);
                debug!("Signup for {} lost the restore race: already active", current.email);
                Ok(SignupOutcome::AlreadyActive(current))
            }
        }
    }

    fn schedule_confirmation(&self, subscriber: &Subscriber, reason: DispatchReason) {
        self.dispatcher
            .dispatch(ConfirmationJob::new(subscriber.clone(), reason));
    }
}
