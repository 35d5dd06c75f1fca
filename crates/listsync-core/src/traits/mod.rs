//! Core traits for the listsync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ProviderClient`]: Generic HTTP capability against the remote list provider
//! - [`SubscriberStore`]: Local subscriber persistence
//! - [`ConfirmationDispatcher`]: Fire-and-forget confirmation scheduling

pub mod dispatcher;
pub mod provider_client;
pub mod subscriber_store;

pub use dispatcher::{ConfirmationDispatcher, ConfirmationJob, DispatchReason};
pub use provider_client::{ProviderClient, ProviderClientFactory, ProviderResponse};
pub use subscriber_store::SubscriberStore;
