//! Reactive user store — an observed collection plus one network
//! reconciliation operation.
//!
//! Observers receive the full current collection on every mutation
//! (replace-whole-value, not diffs). Callbacks run under the store's
//! internal lock: keep them short and do not call back into the store.
//!
//! The store is an explicitly constructed value — build one from the
//! resolved [`Config`] and pass it by reference to whatever needs it.

use std::collections::BTreeMap;
use std::sync::Mutex;

use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::AppError;
use crate::model::{User, UserId, UserPatch};
use crate::token::TokenFile;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure modes of [`UserStore::load_users`].
///
/// A failed load never touches the in-memory collection and never notifies
/// observers; callers wanting fire-and-forget semantics just discard the
/// result.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Network unreachable, DNS failure, connection reset.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Non-2xx response status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Body not parseable, or parseable but missing a `users` sequence.
    #[error("malformed response body: {0}")]
    Decode(String),
}

// ── Subscriptions ─────────────────────────────────────────────────────────────

/// Deregistration handle returned by [`UserStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(&[User]) + Send>;

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct UserStore {
    client: Client,
    api_base_url: String,
    token: TokenFile,
    inner: Mutex<Inner>,
}

struct Inner {
    users: Vec<User>,
    observers: BTreeMap<SubscriptionId, Observer>,
    next_subscription: u64,
}

impl UserStore {
    /// Build a store over the resolved configuration. The collection starts
    /// empty.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        // No client timeout: the transport's defaults govern request life.
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            token: TokenFile::new(&config.storage_dir),
            inner: Mutex::new(Inner {
                users: Vec::new(),
                observers: BTreeMap::new(),
                next_subscription: 0,
            }),
        })
    }

    // ── Observation ──────────────────────────────────────────────────────────

    /// Register `observer` and invoke it immediately with the current
    /// collection. Returns the handle for [`UserStore::unsubscribe`].
    pub fn subscribe(&self, observer: impl Fn(&[User]) + Send + 'static) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        observer(&inner.users);
        inner.observers.insert(id, Box::new(observer));
        id
    }

    /// Remove a previously registered observer. Returns `false` when the
    /// handle was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().observers.remove(&id).is_some()
    }

    /// Snapshot of the current collection.
    pub fn users(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    /// Replace the entire collection atomically. One notification.
    pub fn set_users(&self, users: Vec<User>) {
        let mut inner = self.lock();
        inner.users = users;
        inner.notify();
    }

    /// Append one record to the end of the collection. One notification.
    pub fn add_user(&self, user: User) {
        let mut inner = self.lock();
        inner.users.push(user);
        inner.notify();
    }

    /// Shallow-merge `patch` into every record matching `id`, preserving
    /// positions. An unknown `id` mutates nothing and notifies nobody;
    /// otherwise one notification.
    pub fn update_user(&self, id: UserId, patch: UserPatch) {
        let mut inner = self.lock();
        let mut matched = false;
        for user in inner.users.iter_mut().filter(|u| u.id == id) {
            patch.apply(user);
            matched = true;
        }
        if matched {
            inner.notify();
        }
    }

    /// Remove every record matching `id` (normally zero or one). One
    /// notification, whether or not anything matched.
    pub fn remove_user(&self, id: UserId) {
        let mut inner = self.lock();
        inner.users.retain(|u| u.id != id);
        inner.notify();
    }

    // ── Reconciliation ────────────────────────────────────────────────────────

    /// Fetch the remote collection from `{api_base_url}/users` and replace
    /// the local one with it, returning the number of records applied.
    ///
    /// The bearer token is re-read from storage on every call. No lock is
    /// held while the request is in flight; overlapping calls are not
    /// serialized and the last response applied wins. On any failure the
    /// collection is left untouched and no observer fires.
    pub async fn load_users(&self) -> Result<usize, LoadError> {
        let url = format!("{}/users", self.api_base_url);
        debug!(%url, "fetching users");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.token.bearer())
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, "users request failed (transport)");
                LoadError::Transport(e.to_string())
            })?;

        let response = check_status(response).await?;

        let envelope = response.json::<UsersEnvelope>().await.map_err(|e| {
            error!(error = %e, "failed to decode users response");
            LoadError::Decode(e.to_string())
        })?;

        let count = envelope.users.len();
        debug!(count, "applying fetched users");
        self.set_users(envelope.users);
        Ok(count)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    /// Invoke every observer with the full current collection.
    fn notify(&self) {
        for observer in self.observers.values() {
            observer(&self.users);
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    users: Vec<User>,
}

/// Server error envelope — used for diagnostics only.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LoadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error,
        Err(_) => body,
    };

    error!(%status, %message, "users request returned HTTP error");
    Err(LoadError::Status {
        status: status.as_u16(),
        message,
    })
}
