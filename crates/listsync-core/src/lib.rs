// # listsync-core
//
// Core library for keeping local email signups and a remote mailing-list
// provider in sync.
//
// ## Architecture Overview
//
// - **SubscriberLifecycle**: Idempotent signup state machine (create / restore / no-op)
// - **ListDirectory**: Logical list name → remote list identifier
// - **ListClient**: Member and tag operations against a named remote list
// - **ProviderClient**: Trait for the generic HTTP capability of a provider
// - **SubscriberStore**: Trait for local subscriber persistence
// - **ConfirmationDispatcher**: Trait for fire-and-forget confirmation scheduling
//
// ## Design Principles
//
// 1. **Local state is authoritative**: At most one record per normalized email
// 2. **Exactly one confirmation per state change**: None for repeat signups
// 3. **Per-call outcomes**: Provider rejections are values, never shared flags
// 4. **Decoupled sync**: Local persistence and remote membership are independent

pub mod client;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod store;
pub mod subscriber;
pub mod traits;

// Re-export core types for convenience
pub use client::{Fields, ListClient};
pub use config::{DispatchConfig, ListsConfig, ProviderConfig, StoreConfig, SyncConfig};
pub use directory::{ListDirectory, SubscriptionList};
pub use dispatch::{ConfirmationQueue, QueueDispatcher};
pub use error::{Error, Result};
pub use lifecycle::{SignupOutcome, SubscriberLifecycle};
pub use store::{FileSubscriberStore, MemorySubscriberStore, open_store};
pub use subscriber::{Subscriber, SubscriberEmail};
pub use traits::{
    ConfirmationDispatcher, ConfirmationJob, DispatchReason, ProviderClient,
    ProviderClientFactory, ProviderResponse, SubscriberStore,
};
