//! Bearer token holder.
//!
//! Holds at most one token for the lifetime of the client. There is no
//! logout, expiry check or refresh: once a token is set it stays until the
//! client is dropped or another token replaces it. Concurrent writers race and
//! the last write wins.

use crate::error::ClientError;
use crate::store::TokenStore;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;

/// Session credentials plus the store that persists them.
pub(crate) struct Credentials {
    token: RwLock<Option<String>>,
    store: Arc<dyn TokenStore>,
}

impl Credentials {
    /// Creates an unauthenticated holder backed by `store`.
    pub(crate) fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            token: RwLock::new(None),
            store,
        }
    }

    /// Loads a previously persisted token, if the store has one.
    pub(crate) fn restore(&self) -> Result<bool, ClientError> {
        match self.store.load()? {
            Some(token) => {
                tracing::debug!("Restored token from store");
                self.set(token);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Records a freshly issued token: durable store first, then memory.
    ///
    /// If the store rejects the write, the held token is left untouched.
    pub(crate) fn accept(&self, token: String) -> Result<(), ClientError> {
        self.store.save(&token)?;
        self.set(token);
        Ok(())
    }

    /// Replaces the in-memory token without touching the store.
    pub(crate) fn set(&self, token: String) {
        *self.token.write() = Some(token);
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Headers for JSON requests that need no credentials.
    pub(crate) fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// JSON content type, plus `Authorization: Bearer <token>` when a token
    /// is held.
    pub(crate) fn headers(&self) -> HeaderMap {
        let mut headers = Self::json_headers();
        if let Some(ref token) = *self.token.read() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    tracing::warn!("Held token is not a valid header value; sending without it");
                }
            }
        }
        headers
    }
}
