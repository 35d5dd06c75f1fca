//! Error types for the listsync system
//!
//! Only local failures are errors. A remote provider rejecting a call is an
//! ordinary value (see [`crate::traits::ProviderResponse`]), never an `Error`.

use thiserror::Error;

/// Result type alias for listsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the listsync system
#[derive(Error, Debug)]
pub enum Error {
    /// A non-empty list name has no registered entry
    #[error("There is no list named `{0}`.")]
    ListNotFound(String),

    /// An empty list name was requested but the default is not registered
    #[error("Could not find a default list named `{0}`.")]
    DefaultListMisconfigured(String),

    /// The supplied address is not a syntactically valid email
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// A record already exists for this normalized email
    #[error("Subscriber already exists: {0}")]
    DuplicateSubscriber(String),

    /// Subscriber store errors
    #[error("Subscriber store error: {0}")]
    SubscriberStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-specific local failure (client construction, bad config)
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "list not found" error
    pub fn list_not_found(name: impl Into<String>) -> Self {
        Self::ListNotFound(name.into())
    }

    /// Create a "default list misconfigured" error
    pub fn default_list_misconfigured(default_name: impl Into<String>) -> Self {
        Self::DefaultListMisconfigured(default_name.into())
    }

    /// Create an invalid email error
    pub fn invalid_email(msg: impl Into<String>) -> Self {
        Self::InvalidEmail(msg.into())
    }

    /// Create a duplicate subscriber error
    pub fn duplicate_subscriber(email: impl Into<String>) -> Self {
        Self::DuplicateSubscriber(email.into())
    }

    /// Create a subscriber store error
    pub fn subscriber_store(msg: impl Into<String>) -> Self {
        Self::SubscriberStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error comes from list resolution (local misconfiguration)
    pub fn is_list_resolution(&self) -> bool {
        matches!(self, Self::ListNotFound(_) | Self::DefaultListMisconfigured(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
