//! Named list directory
//!
//! The directory maps logical list names to remote list identifiers. It is
//! built once from configuration and is read-only afterwards, so it can be
//! shared behind an `Arc` without locking.
//!
//! ## Usage
//!
//! ```rust
//! use listsync_core::ListDirectory;
//! use listsync_core::config::ListsConfig;
//!
//! let config = ListsConfig::new("waitlist")
//!     .with_list("waitlist", "a1b2c3")
//!     .with_list("beta", "d4e5f6");
//! let directory = ListDirectory::from_config(&config);
//!
//! // Empty name resolves to the default list
//! assert_eq!(directory.resolve("").unwrap().remote_id(), "a1b2c3");
//! assert_eq!(directory.resolve("beta").unwrap().remote_id(), "d4e5f6");
//! assert!(directory.resolve("missing").is_err());
//! ```

use crate::config::ListsConfig;
use crate::error::{Error, Result};

/// One remote list, addressed by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionList {
    name: String,
    remote_id: String,
}

impl SubscriptionList {
    /// Create a list entry
    pub fn new(name: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_id: remote_id.into(),
        }
    }

    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque provider identifier
    pub fn remote_id(&self) -> &str {
        &self.remote_id
    }
}

/// Immutable registry of named lists
#[derive(Debug, Clone, Default)]
pub struct ListDirectory {
    lists: Vec<SubscriptionList>,
    default_list_name: String,
}

impl ListDirectory {
    /// Create a directory from explicit entries
    pub fn new(lists: Vec<SubscriptionList>, default_list_name: impl Into<String>) -> Self {
        Self {
            lists,
            default_list_name: default_list_name.into(),
        }
    }

    /// Build a directory from configuration
    pub fn from_config(config: &ListsConfig) -> Self {
        let lists = config
            .subscribers
            .iter()
            .map(|(name, entry)| SubscriptionList::new(name.clone(), entry.id.clone()))
            .collect();

        Self::new(lists, config.default_list_name.clone())
    }

    /// Resolve a list by name
    ///
    /// An empty name resolves to the configured default. Any other name must
    /// match a registered list exactly (case-sensitive).
    ///
    /// # Returns
    ///
    /// - `Ok(&SubscriptionList)`: The resolved list
    /// - `Err(Error::ListNotFound)`: Non-empty name with no match
    /// - `Err(Error::DefaultListMisconfigured)`: Empty name, default not registered
    pub fn resolve(&self, name: &str) -> Result<&SubscriptionList> {
        if name.is_empty() {
            return self.default_list();
        }

        self.find(name).ok_or_else(|| {
            tracing::debug!("No list registered under `{}`", name);
            Error::list_not_found(name)
        })
    }

    /// Resolve the configured default list
    pub fn default_list(&self) -> Result<&SubscriptionList> {
        self.find(&self.default_list_name).ok_or_else(|| {
            tracing::error!(
                "Default list `{}` is not registered",
                self.default_list_name
            );
            Error::default_list_misconfigured(self.default_list_name.clone())
        })
    }

    /// Name of the default list
    pub fn default_list_name(&self) -> &str {
        &self.default_list_name
    }

    /// Names of all registered lists
    pub fn names(&self) -> Vec<&str> {
        self.lists.iter().map(|list| list.name()).collect()
    }

    /// Check if a list is registered
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Number of registered lists
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Whether the directory has no lists
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    fn find(&self, name: &str) -> Option<&SubscriptionList> {
        self.lists.iter().find(|list| list.name == name)
    }
}
