//! Configuration types for the listsync system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main listsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Named lists and the default list name
    pub lists: ListsConfig,

    /// Remote provider configuration
    pub provider: ProviderConfig,

    /// Subscriber store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Confirmation dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl SyncConfig {
    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let config: SyncConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.lists.validate()?;
        self.provider.validate()?;
        self.dispatch.validate()?;

        Ok(())
    }
}

/// Named list configuration
///
/// ```json
/// {
///   "subscribers": { "waitlist": { "id": "a1b2c3" } },
///   "default_list_name": "waitlist"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListsConfig {
    /// List name → remote list properties
    #[serde(default)]
    pub subscribers: BTreeMap<String, ListEntryConfig>,

    /// Name of the list used when a caller passes an empty name
    #[serde(default)]
    pub default_list_name: String,
}

impl ListsConfig {
    /// Create an empty list configuration with the given default name
    pub fn new(default_list_name: impl Into<String>) -> Self {
        Self {
            subscribers: BTreeMap::new(),
            default_list_name: default_list_name.into(),
        }
    }

    /// Register a list
    pub fn with_list(mut self, name: impl Into<String>, remote_id: impl Into<String>) -> Self {
        self.subscribers.insert(
            name.into(),
            ListEntryConfig {
                id: remote_id.into(),
            },
        );
        self
    }

    /// Validate the list configuration
    ///
    /// An unregistered default name is tolerated here; it is reported when
    /// an empty name is resolved.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.subscribers.is_empty() {
            return Err(crate::Error::config("No lists configured"));
        }

        for (name, entry) in &self.subscribers {
            if name.is_empty() {
                return Err(crate::Error::config("List names cannot be empty"));
            }
            if entry.id.is_empty() {
                return Err(crate::Error::config(format!(
                    "List `{}` has an empty remote id",
                    name
                )));
            }
        }

        if !self.subscribers.contains_key(&self.default_list_name) {
            tracing::warn!(
                "Default list `{}` is not registered; resolving an empty list name will fail",
                self.default_list_name
            );
        }

        Ok(())
    }
}

/// Properties of one remote list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntryConfig {
    /// Opaque provider list identifier
    pub id: String,
}

/// Remote provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Mailchimp Marketing API
    Mailchimp {
        /// API key (`<key>-<dc>`)
        api_key: String,
        /// Override for the API root (defaults to the key's data center)
        #[serde(default)]
        base_url: Option<String>,
        /// Per-request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Mailchimp {
                api_key,
                timeout_secs,
                ..
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("Mailchimp API key cannot be empty"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Provider timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Mailchimp { .. } => "mailchimp",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// The API key must never reach logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Mailchimp {
                base_url,
                timeout_secs,
                ..
            } => f
                .debug_struct("Mailchimp")
                .field("api_key", &"<REDACTED>")
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Subscriber store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-based subscriber store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory subscriber store (not persistent)
    #[default]
    Memory,
}

/// Confirmation dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Capacity of the confirmation queue
    ///
    /// When full, new confirmations are dropped with a warning log.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl DispatchConfig {
    /// Validate the dispatch configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.queue_capacity == 0 {
            return Err(crate::Error::config("Dispatch queue capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    1000
}
