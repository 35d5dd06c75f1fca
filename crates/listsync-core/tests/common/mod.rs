//! Test doubles and common utilities for contract tests
//!
//! The doubles record what the core asked of its collaborators so tests can
//! assert on calls and payloads without a network or a worker.

#![allow(dead_code)]

use listsync_core::traits::{
    ConfirmationDispatcher, ConfirmationJob, ProviderClient, ProviderResponse,
};
use listsync_core::{ListClient, ListDirectory, ListsConfig};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// HTTP method of a recorded provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// One call made against the recording provider
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    /// Payload for writes, parameters for reads, `Null` for deletes
    pub body: Value,
}

/// A ProviderClient that records calls and replays scripted responses
///
/// Responses are consumed in order; once the script is exhausted every call
/// succeeds with an empty object.
#[derive(Clone, Default)]
pub struct RecordingProviderClient {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    script: Arc<Mutex<VecDeque<ProviderResponse>>>,
}

impl RecordingProviderClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response for the next unanswered call
    pub fn respond_with(&self, response: ProviderResponse) -> &Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Queue a 200 with the given body
    pub fn respond_ok(&self, body: Value) -> &Self {
        self.respond_with(ProviderResponse::success(200, body))
    }

    /// Queue a provider rejection that still echoes a body
    pub fn respond_rejected(&self, status: u16, detail: &str) -> &Self {
        self.respond_with(ProviderResponse::failure(
            Some(status),
            json!({ "status": status, "detail": detail }),
            detail,
        ))
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The most recent call
    pub fn last_call(&self) -> RecordedCall {
        self.calls()
            .last()
            .cloned()
            .expect("at least one provider call")
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, method: Method, path: &str, body: &Value) -> ProviderResponse {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body: body.clone(),
        });

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ProviderResponse::success(200, json!({})))
    }
}

#[async_trait::async_trait]
impl ProviderClient for RecordingProviderClient {
    async fn get(&self, path: &str, parameters: &Value) -> ProviderResponse {
        self.record(Method::Get, path, parameters)
    }

    async fn post(&self, path: &str, payload: &Value) -> ProviderResponse {
        self.record(Method::Post, path, payload)
    }

    async fn put(&self, path: &str, payload: &Value) -> ProviderResponse {
        self.record(Method::Put, path, payload)
    }

    async fn patch(&self, path: &str, payload: &Value) -> ProviderResponse {
        self.record(Method::Patch, path, payload)
    }

    async fn delete(&self, path: &str) -> ProviderResponse {
        self.record(Method::Delete, path, &Value::Null)
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A ConfirmationDispatcher that counts and keeps every job
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    dispatch_count: Arc<AtomicUsize>,
    jobs: Arc<Mutex<Vec<ConfirmationJob>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            dispatch_count: Arc::clone(&other.dispatch_count),
            jobs: Arc::clone(&other.jobs),
        }
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatch_count.load(Ordering::SeqCst)
    }

    pub fn jobs(&self) -> Vec<ConfirmationJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl ConfirmationDispatcher for RecordingDispatcher {
    fn dispatch(&self, job: ConfirmationJob) {
        self.dispatch_count.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job);
    }
}

/// Remote id of the default `waitlist` list
pub const WAITLIST_ID: &str = "abc123";

/// Remote id of the `beta` list
pub const BETA_ID: &str = "def456";

/// Directory with `waitlist` (default) and `beta`
pub fn test_directory() -> Arc<ListDirectory> {
    let config = ListsConfig::new("waitlist")
        .with_list("waitlist", WAITLIST_ID)
        .with_list("beta", BETA_ID);
    Arc::new(ListDirectory::from_config(&config))
}

/// A ListClient over the test directory and a fresh recording provider
pub fn test_client() -> (ListClient, RecordingProviderClient) {
    let provider = RecordingProviderClient::new();
    let client = ListClient::new(test_directory(), Box::new(provider.clone()));
    (client, provider)
}
