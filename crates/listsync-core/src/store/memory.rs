// # Memory Subscriber Store
//
// In-memory implementation of SubscriberStore.
//
// ## Purpose
//
// Fast store for tests and for embedding applications that keep subscriber
// state elsewhere. Nothing survives a restart.
//
// ## Atomicity
//
// Every check-then-write (`insert`, `restore`, `soft_remove`) happens under a
// single write lock, so racing signups for the same address serialize.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::Error;
use crate::subscriber::{Subscriber, SubscriberEmail};
use crate::traits::SubscriberStore;

/// In-memory subscriber store
///
/// Records are keyed by normalized email. Cloning the store shares the
/// underlying map.
///
/// # Example
///
/// ```rust
/// use listsync_core::store::MemorySubscriberStore;
/// use listsync_core::subscriber::SubscriberEmail;
/// use listsync_core::traits::SubscriberStore;
///
/// # tokio_test::block_on(async {
/// let store = MemorySubscriberStore::new();
/// let email = SubscriberEmail::parse("ursula@example.com").unwrap();
///
/// let created = store.insert(&email).await.unwrap();
/// let found = store.find_with_removed(&email).await.unwrap();
/// assert_eq!(found.map(|s| s.id), Some(created.id));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySubscriberStore {
    inner: Arc<RwLock<HashMap<String, Subscriber>>>,
}

impl MemorySubscriberStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, including soft-removed ones
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop every record
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn find_with_removed(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(&email.normalized()).cloned())
    }

    async fn insert(&self, email: &SubscriberEmail) -> Result<Subscriber, Error> {
        let mut guard = self.inner.write().await;
        insert_record(&mut guard, email)
    }

    async fn restore(&self, id: Uuid) -> Result<Option<Subscriber>, Error> {
        let mut guard = self.inner.write().await;
        restore_record(&mut guard, id)
    }

    async fn soft_remove(&self, email: &SubscriberEmail) -> Result<Option<Subscriber>, Error> {
        let mut guard = self.inner.write().await;
        Ok(remove_record(&mut guard, email))
    }

    async fn list_active(&self) -> Result<Vec<Subscriber>, Error> {
        let guard = self.inner.read().await;
        Ok(active_records(&guard))
    }

    async fn count_with_removed(&self) -> Result<usize, Error> {
        Ok(self.inner.read().await.len())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing to persist
        Ok(())
    }
}

/// Create a record unless one exists for the normalized email
pub(crate) fn insert_record(
    records: &mut HashMap<String, Subscriber>,
    email: &SubscriberEmail,
) -> Result<Subscriber, Error> {
    let key = email.normalized();
    if records.contains_key(&key) {
        return Err(Error::duplicate_subscriber(key));
    }

    let subscriber = Subscriber::new(email.clone());
    records.insert(key, subscriber.clone());
    Ok(subscriber)
}

/// Clear the removal marker of the record with this id, if it is set
pub(crate) fn restore_record(
    records: &mut HashMap<String, Subscriber>,
    id: Uuid,
) -> Result<Option<Subscriber>, Error> {
    let subscriber = records
        .values_mut()
        .find(|subscriber| subscriber.id == id)
        .ok_or_else(|| Error::subscriber_store(format!("No subscriber with id {}", id)))?;

    if !subscriber.is_removed() {
        return Ok(None);
    }

    subscriber.mark_restored();
    Ok(Some(subscriber.clone()))
}

/// Set the removal marker of an active record
pub(crate) fn remove_record(
    records: &mut HashMap<String, Subscriber>,
    email: &SubscriberEmail,
) -> Option<Subscriber> {
    let subscriber = records.get_mut(&email.normalized())?;
    if subscriber.is_removed() {
        return None;
    }

    subscriber.mark_removed();
    Some(subscriber.clone())
}

/// Active records, oldest first
pub(crate) fn active_records(records: &HashMap<String, Subscriber>) -> Vec<Subscriber> {
    let mut active: Vec<Subscriber> = records
        .values()
        .filter(|subscriber| !subscriber.is_removed())
        .cloned()
        .collect();
    active.sort_by_key(|subscriber| subscriber.created_at);
    active
}
