// # Subscriber Store Trait
//
// Defines the interface for local subscriber persistence.
//
// ## Purpose
//
// The store is the single source of truth for the local lifecycle state of
// each email address:
// - at most one record per normalized email (active or soft-removed)
// - soft-removed records are retained so a re-signup restores them
//
// ## Implementations
//
// - In-memory: `MemorySubscriberStore`
// - JSON file: `FileSubscriberStore`
// - Future: SQL databases with a unique index on the normalized email

use async_trait::async_trait;
use uuid::Uuid;

use crate::subscriber::{Subscriber, SubscriberEmail};

/// Trait for subscriber store implementations
///
/// # Atomicity
///
/// `insert` and `restore` are the two state-changing writes of the signup
/// flow and each must be atomic with respect to concurrent callers:
/// - `insert` fails with [`crate::Error::DuplicateSubscriber`] when a record
///   already exists for the normalized email, so two racing signups cannot
///   both create
/// - `restore` clears the removal marker only if it is set, returning `None`
///   when another caller got there first
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Look up a record by email, including soft-removed records
    ///
    /// Lookup is case-insensitive.
    async fn find_with_removed(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, crate::Error>;

    /// Create a new active record
    ///
    /// # Returns
    ///
    /// - `Ok(Subscriber)`: The created record
    /// - `Err(Error::DuplicateSubscriber)`: A record already exists for this email
    /// - `Err(Error)`: Storage error
    async fn insert(&self, email: &SubscriberEmail) -> Result<Subscriber, crate::Error>;

    /// Clear the removal marker of a record
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Subscriber))`: The record was removed and is now active
    /// - `Ok(None)`: The record was already active
    /// - `Err(Error)`: Unknown id or storage error
    async fn restore(&self, id: Uuid) -> Result<Option<Subscriber>, crate::Error>;

    /// Soft-remove the record for an email
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Subscriber))`: The record was active and is now removed
    /// - `Ok(None)`: No record, or already removed
    /// - `Err(Error)`: Storage error
    async fn soft_remove(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, crate::Error>;

    /// List all active records
    async fn list_active(&self) -> Result<Vec<Subscriber>, crate::Error>;

    /// Count all records, including soft-removed ones
    async fn count_with_removed(&self) -> Result<usize, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
