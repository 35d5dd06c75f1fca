// # Mailchimp Provider Client
//
// This crate provides the Mailchimp Marketing API v3 implementation of
// `ProviderClient` for the listsync system.
//
// ## Behavior
//
// - One HTTP request per call, no retries, no backoff, no caching
// - Non-2xx answers become `ProviderResponse::Failure` carrying the status and
//   the provider's problem-document `detail` (or `title`)
// - Transport errors (DNS, connect, timeout) become `Failure` with no status
// - JSON request bodies; GET parameters are sent as the query string
//
// ## Security
//
// - The API key is sent as HTTP basic auth (`apikey:<key>`) and never logged
// - `Debug` output redacts the key
//
// ## API Reference
//
// - Root: `https://<dc>.api.mailchimp.com/3.0`, where `<dc>` is the suffix of
//   the API key after the last `-`
// - Errors: RFC 7807 problem documents (`type`, `title`, `status`, `detail`)

use async_trait::async_trait;
use listsync_core::config::ProviderConfig;
use listsync_core::traits::{ProviderClient, ProviderClientFactory, ProviderResponse};
use listsync_core::{Error, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Default HTTP timeout for API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER_NAME: &str = "mailchimp";

/// Mailchimp Marketing API client
///
/// Stateless apart from the pooled HTTP connection; safe to share across
/// tasks.
pub struct MailchimpClient {
    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API root without a trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for MailchimpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailchimpClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl MailchimpClient {
    /// Create a new Mailchimp client
    ///
    /// # Parameters
    ///
    /// - `api_key`: Mailchimp API key, usually `<key>-<dc>`
    /// - `base_url`: API root override; when `None` it is derived from the
    ///   key's data center
    /// - `timeout`: Per-request timeout
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the key is empty, or has no data center suffix
    ///   and no `base_url` is given
    /// - `Error::Provider` if the HTTP client cannot be built
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Mailchimp API key cannot be empty"));
        }

        let base_url = match base_url {
            Some(url) => url,
            None => default_base_url(&api_key)?,
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::provider(PROVIDER_NAME, format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.client
            .request(method, url)
            .basic_auth("apikey", Some(&self.api_key))
    }

    /// Send one request and classify the answer
    async fn execute(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> ProviderResponse {
        tracing::debug!("Mailchimp {} {}", method, path);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Mailchimp {} {} failed before a response: {}", method, path, e);
                return ProviderResponse::transport_failure(format!("HTTP request failed: {}", e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(text) => decode_body(text),
            Err(e) => {
                tracing::warn!("Unable to read Mailchimp response body: {}", e);
                Value::Null
            }
        };

        if status.is_success() {
            tracing::debug!("Mailchimp {} {} -> {}", method, path, status);
            return ProviderResponse::success(status.as_u16(), body);
        }

        let reason = describe_failure(status, &body);
        tracing::warn!("Mailchimp {} {} -> {}: {}", method, path, status, reason);
        ProviderResponse::failure(Some(status.as_u16()), body, reason)
    }
}

#[async_trait]
impl ProviderClient for MailchimpClient {
    async fn get(&self, path: &str, parameters: &Value) -> ProviderResponse {
        let mut request = self.request(Method::GET, path);
        if parameters.as_object().is_some_and(|map| !map.is_empty()) {
            request = request.query(parameters);
        }
        self.execute(Method::GET, path, request).await
    }

    async fn post(&self, path: &str, payload: &Value) -> ProviderResponse {
        let request = self.request(Method::POST, path).json(payload);
        self.execute(Method::POST, path, request).await
    }

    async fn put(&self, path: &str, payload: &Value) -> ProviderResponse {
        let request = self.request(Method::PUT, path).json(payload);
        self.execute(Method::PUT, path, request).await
    }

    async fn patch(&self, path: &str, payload: &Value) -> ProviderResponse {
        let request = self.request(Method::PATCH, path).json(payload);
        self.execute(Method::PATCH, path, request).await
    }

    async fn delete(&self, path: &str) -> ProviderResponse {
        let request = self.request(Method::DELETE, path);
        self.execute(Method::DELETE, path, request).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Mailchimp clients
pub struct MailchimpFactory;

impl ProviderClientFactory for MailchimpFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ProviderClient>> {
        match config {
            ProviderConfig::Mailchimp {
                api_key,
                base_url,
                timeout_secs,
            } => {
                let client = MailchimpClient::new(
                    api_key.clone(),
                    base_url.clone(),
                    Duration::from_secs(*timeout_secs),
                )?;
                tracing::info!("Mailchimp client ready for {}", client.base_url());
                Ok(Box::new(client))
            }
            other => Err(Error::config(format!(
                "MailchimpFactory cannot build a `{}` provider",
                other.type_name()
            ))),
        }
    }
}

/// `https://<dc>.api.mailchimp.com/3.0` for a `<key>-<dc>` API key
fn default_base_url(api_key: &str) -> Result<String> {
    match api_key.rsplit_once('-') {
        Some((_, dc)) if !dc.is_empty() => Ok(format!("https://{}.api.mailchimp.com/3.0", dc)),
        _ => Err(Error::config(
            "Mailchimp API key has no data center suffix (`<key>-<dc>`); set base_url explicitly",
        )),
    }
}

/// Parse a response body; empty bodies are `Null`, non-JSON is kept as text
fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(_) => Value::String(text),
    }
}

/// Failure reason, preferring the provider's own problem description
fn describe_failure(status: StatusCode, body: &Value) -> String {
    let reported = body
        .get("detail")
        .and_then(Value::as_str)
        .filter(|detail| !detail.is_empty())
        .or_else(|| body.get("title").and_then(Value::as_str));
    if let Some(reason) = reported {
        return reason.to_string();
    }

    match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: invalid API key or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Resource not found. Status: {}", status),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!("Mailchimp server error (transient). Status: {}", status),
        _ => format!("Request failed. Status: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{any, body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API_KEY: &str = "0123456789abcdef-us6";
    // base64("apikey:0123456789abcdef-us6")
    const AUTHORIZATION: &str = "Basic YXBpa2V5OjAxMjM0NTY3ODlhYmNkZWYtdXM2";

    fn client_for(server: &MockServer) -> MailchimpClient {
        MailchimpClient::new(API_KEY, Some(server.uri()), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_base_url_from_data_center() {
        let client = MailchimpClient::new(API_KEY, None, DEFAULT_HTTP_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "https://us6.api.mailchimp.com/3.0");
    }

    #[test]
    fn test_key_without_data_center_needs_base_url() {
        let err = MailchimpClient::new("nodatacenter", None, DEFAULT_HTTP_TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let client = MailchimpClient::new(
            "nodatacenter",
            Some("http://localhost:9999/3.0/".to_string()),
            DEFAULT_HTTP_TIMEOUT,
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999/3.0");
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = MailchimpClient::new("  ", None, DEFAULT_HTTP_TIMEOUT).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = MailchimpClient::new(API_KEY, None, DEFAULT_HTTP_TIMEOUT).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("<REDACTED>"));
    }

    #[test]
    fn test_factory_builds_from_config() {
        let config = ProviderConfig::Mailchimp {
            api_key: API_KEY.to_string(),
            base_url: None,
            timeout_secs: 5,
        };
        let client = MailchimpFactory.create(&config).unwrap();
        assert_eq!(client.provider_name(), "mailchimp");

        let custom = ProviderConfig::Custom {
            factory: "sendgrid".to_string(),
            config: json!({}),
        };
        assert!(MailchimpFactory.create(&custom).is_err());
    }

    #[tokio::test]
    async fn test_post_sends_json_with_basic_auth() {
        let server = MockServer::start().await;
        let payload = json!({ "email": "a@b.com", "status": "subscribed" });

        Mock::given(method("POST"))
            .and(path("/subscribers/abc123/members"))
            .and(header("Authorization", AUTHORIZATION))
            .and(header("Content-Type", "application/json"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x" })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .post("subscribers/abc123/members", &payload)
            .await;

        assert!(response.succeeded());
        assert_eq!(response.status(), Some(200));
        assert_eq!(response.body(), &json!({ "id": "x" }));
    }

    #[tokio::test]
    async fn test_get_sends_parameters_as_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/subscribers/abc123/members"))
            .and(query_param("count", "10"))
            .and(query_param("status", "subscribed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "members": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .get(
                "subscribers/abc123/members",
                &json!({ "count": 10, "status": "subscribed" }),
            )
            .await;

        assert!(response.succeeded());
    }

    #[tokio::test]
    async fn test_rejection_carries_problem_detail() {
        let server = MockServer::start().await;
        let problem = json!({
            "type": "https://mailchimp.com/developer/marketing/docs/errors/",
            "title": "Member Exists",
            "status": 400,
            "detail": "a@b.com is already a list member.",
        });

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(problem.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .post("subscribers/abc123/members", &json!({}))
            .await;

        assert!(!response.succeeded());
        assert_eq!(response.status(), Some(400));
        assert_eq!(response.error(), Some("a@b.com is already a list member."));
        // The echoed body is still available
        assert_eq!(response.body(), &problem);
    }

    #[tokio::test]
    async fn test_rejection_without_body_uses_status() {
        let server = MockServer::start().await;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).delete("subscribers/abc123/members/x").await;

        assert_eq!(response.status(), Some(503));
        assert_eq!(response.body(), &Value::Null);
        assert!(response.error().unwrap().contains("transient"));
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_failure() {
        let server = MockServer::start().await;
        let client = MailchimpClient::new(
            API_KEY,
            Some(server.uri()),
            Duration::from_millis(100),
        )
        .unwrap();

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;

        let response = client
            .patch("subscribers/abc123/members/x", &json!({ "status": "unsubscribed" }))
            .await;

        assert!(!response.succeeded());
        assert_eq!(response.status(), None);
    }

    #[tokio::test]
    async fn test_no_retry_on_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .put("subscribers/abc123/members/x", &json!({}))
            .await;
        assert!(!response.succeeded());
        // `expect(1)` is verified when the server drops
    }
}
