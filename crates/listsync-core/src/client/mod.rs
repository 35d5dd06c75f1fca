//! Remote list client
//!
//! [`ListClient`] performs member operations against named lists through a
//! [`ProviderClient`]. Every operation resolves its list through the shared
//! [`ListDirectory`] first; resolution failures are the only errors it
//! returns. Provider rejections come back as values:
//!
//! - the mutating member operations (`subscribe`, `subscribe_pending`,
//!   `subscribe_or_update`, `unsubscribe`) return `Ok(None)` as the failure
//!   sentinel, so an echoed payload from a rejected call is never mistaken
//!   for success
//! - every other operation returns the raw [`ProviderResponse`]
//!
//! All calls are single-shot. There is no retry in this component.
//!
//! ## Member keys
//!
//! Members are addressed by [`ListClient::subscriber_hash`], the MD5 hex
//! digest of the lowercased address.

use md5::{Digest, Md5};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::directory::{ListDirectory, SubscriptionList};
use crate::error::Result;
use crate::subscriber::normalize_email;
use crate::traits::{ProviderClient, ProviderResponse};

/// Key/value map used for merge fields and caller options
pub type Fields = Map<String, Value>;

/// Status values understood by the provider
pub mod status {
    pub const SUBSCRIBED: &str = "subscribed";
    pub const PENDING: &str = "pending";
    pub const UNSUBSCRIBED: &str = "unsubscribed";
}

/// Outcome of the most recent provider call, kept for compatibility callers
#[derive(Debug, Clone, Default)]
struct LastCall {
    succeeded: bool,
    error: Option<String>,
}

/// Client for member operations on named remote lists
pub struct ListClient {
    /// Shared, read-only list directory
    directory: Arc<ListDirectory>,

    /// Provider HTTP capability
    provider: Box<dyn ProviderClient>,

    /// Outcome of the most recent call through this client
    last_call: Mutex<LastCall>,
}

impl std::fmt::Debug for ListClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListClient")
            .field("directory", &self.directory)
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

impl ListClient {
    /// Create a new list client
    pub fn new(directory: Arc<ListDirectory>, provider: Box<dyn ProviderClient>) -> Self {
        Self {
            directory,
            provider,
            last_call: Mutex::new(LastCall::default()),
        }
    }

    /// The directory this client resolves lists against
    pub fn directory(&self) -> &ListDirectory {
        &self.directory
    }

    /// The underlying provider client
    pub fn provider(&self) -> &dyn ProviderClient {
        self.provider.as_ref()
    }

    /// Subscribe an address to a list
    ///
    /// The payload starts from `{email, status: "subscribed", email_type: "html"}`,
    /// adds `merge_fields` when non-empty, then applies `options` on top.
    /// Keys in `options` win over every default.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(body))`: The provider accepted the member
    /// - `Ok(None)`: The provider rejected the call
    /// - `Err(Error)`: The list name did not resolve
    pub async fn subscribe(
        &self,
        email: &str,
        merge_fields: &Fields,
        list_name: &str,
        options: &Fields,
    ) -> Result<Option<Value>> {
        let list = self.directory.resolve(list_name)?;
        let payload = subscription_payload(email, merge_fields, options);
        let path = members_path(list);

        debug!("Subscribing {} to list `{}`", email, list.name());
        let response = self.provider.post(&path, &payload).await;

        Ok(self.accept(response, "subscribe", list))
    }

    /// Subscribe an address with double opt-in (`status: "pending"`)
    ///
    /// `pending` is written into the options before the regular merge, so a
    /// `status` key supplied by the caller in `options` still takes precedence.
    pub async fn subscribe_pending(
        &self,
        email: &str,
        merge_fields: &Fields,
        list_name: &str,
        options: &Fields,
    ) -> Result<Option<Value>> {
        let options = pending_options(options);
        self.subscribe(email, merge_fields, list_name, &options).await
    }

    /// Create or replace a member, keyed by the address's subscriber hash
    ///
    /// Same payload as [`ListClient::subscribe`]; issued as an upsert, so
    /// repeating it is safe.
    pub async fn subscribe_or_update(
        &self,
        email: &str,
        merge_fields: &Fields,
        list_name: &str,
        options: &Fields,
    ) -> Result<Option<Value>> {
        let list = self.directory.resolve(list_name)?;
        let payload = subscription_payload(email, merge_fields, options);
        let path = member_path(list, email);

        debug!("Upserting {} on list `{}`", email, list.name());
        let response = self.provider.put(&path, &payload).await;

        Ok(self.accept(response, "subscribe_or_update", list))
    }

    /// List members of a list; `parameters` become query parameters
    pub async fn get_members(
        &self,
        list_name: &str,
        parameters: &Value,
    ) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let response = self.provider.get(&members_path(list), parameters).await;
        Ok(self.record(response))
    }

    /// Fetch one member
    pub async fn get_member(&self, email: &str, list_name: &str) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let response = self
            .provider
            .get(&member_path(list, email), &empty_parameters())
            .await;
        Ok(self.record(response))
    }

    /// Fetch one member's recent activity
    pub async fn get_member_activity(
        &self,
        email: &str,
        list_name: &str,
    ) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let path = format!("{}/activity", member_path(list, email));
        let response = self.provider.get(&path, &empty_parameters()).await;
        Ok(self.record(response))
    }

    /// Whether the list has a member with this address
    ///
    /// True only when the lookup succeeds and the returned `email` matches
    /// the query case-insensitively.
    pub async fn has_member(&self, email: &str, list_name: &str) -> Result<bool> {
        let response = self.get_member(email, list_name).await?;
        if !response.succeeded() {
            return Ok(false);
        }

        let found = response
            .body()
            .get("email")
            .and_then(Value::as_str)
            .is_some_and(|remote| normalize_email(remote) == normalize_email(email));

        Ok(found)
    }

    /// Whether the member's remote status is exactly `subscribed`
    pub async fn is_subscribed(&self, email: &str, list_name: &str) -> Result<bool> {
        let response = self.get_member(email, list_name).await?;
        if !response.succeeded() {
            return Ok(false);
        }

        let subscribed = response
            .body()
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|remote| remote == status::SUBSCRIBED);

        Ok(subscribed)
    }

    /// Transition a member to `unsubscribed`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(body))`: The provider accepted the change
    /// - `Ok(None)`: The provider rejected the call
    /// - `Err(Error)`: The list name did not resolve
    pub async fn unsubscribe(&self, email: &str, list_name: &str) -> Result<Option<Value>> {
        let list = self.directory.resolve(list_name)?;
        let payload = json!({ "status": status::UNSUBSCRIBED });

        debug!("Unsubscribing {} from list `{}`", email, list.name());
        let response = self.provider.patch(&member_path(list, email), &payload).await;

        Ok(self.accept(response, "unsubscribe", list))
    }

    /// Change a member's address; the member is keyed by the current address
    pub async fn update_email_address(
        &self,
        current_email: &str,
        new_email: &str,
        list_name: &str,
    ) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let payload = json!({ "email": new_email });
        let response = self
            .provider
            .patch(&member_path(list, current_email), &payload)
            .await;
        Ok(self.record(response))
    }

    /// Remove a member from the list entirely
    pub async fn delete(&self, email: &str, list_name: &str) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let response = self.provider.delete(&member_path(list, email)).await;
        Ok(self.record(response))
    }

    /// Fetch a member's tags
    pub async fn get_tags(&self, email: &str, list_name: &str) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let path = tags_path(list, email);
        let response = self.provider.get(&path, &empty_parameters()).await;
        Ok(self.record(response))
    }

    /// Mark every listed tag active on a member
    pub async fn add_tags<S: AsRef<str> + Sync>(
        &self,
        tags: &[S],
        email: &str,
        list_name: &str,
    ) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let payload = tags_payload(tags, "active");
        let response = self.provider.post(&tags_path(list, email), &payload).await;
        Ok(self.record(response))
    }

    /// Mark every listed tag inactive on a member
    ///
    /// The provider's tag endpoint is patch-style per tag; "removing" a tag
    /// is flipping it to inactive.
    pub async fn remove_tags<S: AsRef<str> + Sync>(
        &self,
        tags: &[S],
        email: &str,
        list_name: &str,
    ) -> Result<ProviderResponse> {
        let list = self.directory.resolve(list_name)?;
        let payload = tags_payload(tags, "inactive");
        let response = self.provider.post(&tags_path(list, email), &payload).await;
        Ok(self.record(response))
    }

    /// Provider member key for an address
    ///
    /// MD5 hex digest of the trimmed, lowercased address.
    pub fn subscriber_hash(email: &str) -> String {
        hex::encode(Md5::digest(normalize_email(email).as_bytes()))
    }

    /// Whether the most recent call through this client succeeded
    pub fn last_action_succeeded(&self) -> bool {
        self.last_call().succeeded
    }

    /// Failure reason of the most recent call, if it failed
    pub fn last_error(&self) -> Option<String> {
        self.last_call().error
    }

    fn last_call(&self) -> LastCall {
        self.last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Remember the outcome of a call and hand the response back
    fn record(&self, response: ProviderResponse) -> ProviderResponse {
        let mut last_call = self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        last_call.succeeded = response.succeeded();
        last_call.error = response.error().map(str::to_string);
        response
    }

    /// Turn a mutating call's response into the body-or-sentinel contract
    fn accept(
        &self,
        response: ProviderResponse,
        operation: &str,
        list: &SubscriptionList,
    ) -> Option<Value> {
        match self.record(response) {
            ProviderResponse::Success { body, .. } => {
                info!("{} on list `{}` succeeded", operation, list.name());
                Some(body)
            }
            ProviderResponse::Failure { status, error, .. } => {
                warn!(
                    "{} on list `{}` rejected by {} (status: {:?}): {}",
                    operation,
                    list.name(),
                    self.provider.provider_name(),
                    status,
                    error
                );
                None
            }
        }
    }
}

/// Build a subscription payload; `options` win over every default
pub fn subscription_payload(email: &str, merge_fields: &Fields, options: &Fields) -> Value {
    let mut payload = Fields::new();
    payload.insert("email".to_string(), json!(email));
    payload.insert("status".to_string(), json!(status::SUBSCRIBED));
    payload.insert("email_type".to_string(), json!("html"));

    if !merge_fields.is_empty() {
        payload.insert(
            "merge_fields".to_string(),
            Value::Object(merge_fields.clone()),
        );
    }

    for (key, value) in options {
        payload.insert(key.clone(), value.clone());
    }

    Value::Object(payload)
}

/// Options for a double opt-in subscription; a caller `status` is kept
fn pending_options(options: &Fields) -> Fields {
    let mut pending = Fields::new();
    pending.insert("status".to_string(), json!(status::PENDING));
    for (key, value) in options {
        pending.insert(key.clone(), value.clone());
    }
    pending
}

fn tags_payload<S: AsRef<str>>(tags: &[S], tag_status: &str) -> Value {
    let tags: Vec<Value> = tags
        .iter()
        .map(|tag| json!({ "name": tag.as_ref(), "status": tag_status }))
        .collect();
    json!({ "tags": tags })
}

fn members_path(list: &SubscriptionList) -> String {
    format!("subscribers/{}/members", list.remote_id())
}

fn member_path(list: &SubscriptionList, email: &str) -> String {
    format!("{}/{}", members_path(list), ListClient::subscriber_hash(email))
}

fn tags_path(list: &SubscriptionList, email: &str) -> String {
    format!("{}/tags", member_path(list, email))
}

fn empty_parameters() -> Value {
    Value::Object(Fields::new())
}
