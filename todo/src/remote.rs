//! Remote to-do source.
//!
//! Fetches a list of externally hosted to-do-like records and maps them into
//! [`Todo`] entities ready for merging. The reducer only sees the
//! [`RemoteTodoSource`] trait; tests use [`MockRemoteSource`].

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::types::{Todo, TodoId};
use checkmark_core::environment::Clock;
use chrono::{NaiveDate, NaiveTime};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Public placeholder API returning 200 to-do records
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/todos";

/// A record as served by the remote endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTodo {
    /// Remote integer id
    pub id: i64,
    /// Becomes the to-do name
    pub title: String,
    /// Completion flag
    pub completed: bool,
    /// Owner on the remote side; not kept locally
    #[serde(default)]
    pub user_id: i64,
}

impl RemoteTodo {
    /// Maps the record into a local to-do due at midnight of `fetched_on`
    ///
    /// Remote records have no description, so the result carries an empty
    /// one.
    #[must_use]
    pub fn into_todo(self, fetched_on: NaiveDate) -> Todo {
        Todo {
            id: TodoId::new(self.id.to_string()),
            name: self.title,
            description: String::new(),
            due_date: fetched_on,
            due_time: NaiveTime::MIN,
            completed: self.completed,
        }
    }
}

/// Source of remote to-dos
pub trait RemoteTodoSource: Send + Sync {
    /// Fetch the remote list, already mapped into local to-dos
    fn fetch_todos(&self) -> BoxFuture<'static, Result<Vec<Todo>, RemoteError>>;
}

/// [`RemoteTodoSource`] backed by an HTTP endpoint
#[derive(Clone)]
pub struct HttpRemoteSource {
    client: Client,
    endpoint: String,
    limit: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl HttpRemoteSource {
    /// Create a source for `endpoint` with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Client`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            limit: None,
            clock,
        })
    }

    /// Create a source from configuration
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &RemoteConfig, clock: Arc<dyn Clock>) -> Result<Self, RemoteError> {
        Ok(Self::new(config.endpoint.clone(), config.timeout(), clock)?.with_limit(config.limit))
    }

    /// Keep at most `limit` records per fetch
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Fetch the raw remote records
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success statuses, or
    /// malformed bodies.
    pub async fn fetch_records(&self) -> Result<Vec<RemoteTodo>, RemoteError> {
        tracing::debug!(endpoint = %self.endpoint, "Fetching remote todos");

        let response = self
            .client
            .get(&self.endpoint)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut records = response
            .json::<Vec<RemoteTodo>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        if let Some(limit) = self.limit {
            records.truncate(limit);
        }

        tracing::debug!(count = records.len(), "Fetched remote todos");
        Ok(records)
    }
}

impl std::fmt::Debug for HttpRemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteSource")
            .field("endpoint", &self.endpoint)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl RemoteTodoSource for HttpRemoteSource {
    fn fetch_todos(&self) -> BoxFuture<'static, Result<Vec<Todo>, RemoteError>> {
        let source = self.clone();
        Box::pin(async move {
            let records = source.fetch_records().await?;
            let today = source.clock.now().date_naive();
            Ok(records.into_iter().map(|r| r.into_todo(today)).collect())
        })
    }
}

/// Canned [`RemoteTodoSource`] for tests and offline use
#[derive(Debug, Clone)]
pub struct MockRemoteSource {
    outcome: Result<Vec<Todo>, RemoteError>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockRemoteSource {
    /// Always returns `todos`
    #[must_use]
    pub fn succeeding(todos: Vec<Todo>) -> Self {
        Self {
            outcome: Ok(todos),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fails with `error`
    #[must_use]
    pub fn failing(error: RemoteError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep before answering
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches started so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteTodoSource for MockRemoteSource {
    fn fetch_todos(&self) -> BoxFuture<'static, Result<Vec<Todo>, RemoteError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.clone();
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            outcome
        })
    }
}
