// # Provider Client Trait
//
// Defines the generic HTTP capability the list client talks to.
//
// ## Implementations
//
// - Mailchimp: `listsync-provider-mailchimp` crate
//
// ## Usage
//
// ```rust,ignore
// use listsync_core::ProviderClient;
//
// let response = client.get("subscribers/abc123/members", &serde_json::json!({})).await;
// if response.succeeded() {
//     println!("{}", response.body());
// } else {
//     println!("rejected: {:?}", response.error());
// }
// ```

use async_trait::async_trait;
use serde_json::Value;

/// Outcome of a single provider call
///
/// Each call carries its own success flag, so a caller never has to consult
/// shared state after the fact to learn whether "its" call worked.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    /// The provider answered with a 2xx status
    Success {
        /// HTTP status code
        status: u16,
        /// Decoded response body (`Value::Null` when empty)
        body: Value,
    },
    /// Non-2xx answer or transport failure
    Failure {
        /// HTTP status code, absent for transport failures
        status: Option<u16>,
        /// Decoded response body (`Value::Null` when empty or unreadable)
        body: Value,
        /// Human-readable reason, as reported by the provider when possible
        error: String,
    },
}

impl ProviderResponse {
    /// Build a success response
    pub fn success(status: u16, body: Value) -> Self {
        Self::Success { status, body }
    }

    /// Build a failure response
    pub fn failure(status: Option<u16>, body: Value, error: impl Into<String>) -> Self {
        Self::Failure {
            status,
            body,
            error: error.into(),
        }
    }

    /// Build a failure for a call that never reached the provider
    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self::failure(None, Value::Null, error)
    }

    /// Whether the call succeeded
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// HTTP status, if the provider answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { status, .. } => *status,
        }
    }

    /// Response body
    pub fn body(&self) -> &Value {
        match self {
            Self::Success { body, .. } | Self::Failure { body, .. } => body,
        }
    }

    /// Consume the response, keeping the body
    pub fn into_body(self) -> Value {
        match self {
            Self::Success { body, .. } | Self::Failure { body, .. } => body,
        }
    }

    /// Failure reason, `None` on success
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.as_str()),
        }
    }
}

/// Trait for provider HTTP clients
///
/// Paths are relative to the provider's API root and follow
/// `subscribers/{listId}/members[/{memberHash}[/activity|/tags]]`.
///
/// # Single-shot
///
/// Every method performs exactly one request. Implementations must not retry,
/// back off, or cache; a failed call is reported as
/// [`ProviderResponse::Failure`] and the caller decides what to do.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Read a resource; `parameters` is sent as the query string
    async fn get(&self, path: &str, parameters: &Value) -> ProviderResponse;

    /// Create a resource
    async fn post(&self, path: &str, payload: &Value) -> ProviderResponse;

    /// Create or replace a resource
    async fn put(&self, path: &str, payload: &Value) -> ProviderResponse;

    /// Partially update a resource
    async fn patch(&self, path: &str, payload: &Value) -> ProviderResponse;

    /// Remove a resource
    async fn delete(&self, path: &str) -> ProviderResponse;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing provider clients from configuration
pub trait ProviderClientFactory: Send + Sync {
    /// Create a ProviderClient instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ProviderClient>, crate::Error>;
}
