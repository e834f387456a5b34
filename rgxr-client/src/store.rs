//! Durable token storage.

use crate::error::ClientError;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "token";

/// Storage that keeps the bearer token across client restarts.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    fn load(&self) -> Result<Option<String>, ClientError>;

    /// Replaces the stored token.
    fn save(&self, token: &str) -> Result<(), ClientError>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }
}

/// JSON key-value file, e.g. `{"token": "..."}`.
///
/// Unknown keys already present in the file are preserved on save.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, ClientError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ClientError::TokenStore(format!(
                    "cannot read {:?}: {}",
                    self.path, e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            ClientError::TokenStore(format!("cannot parse {:?}: {}", self.path, e))
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ClientError::TokenStore(format!(
                "{:?} does not hold a JSON object",
                self.path
            ))),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            tracing::warn!("Overwriting unusable token file: {}", e);
            Map::new()
        });
        entries.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::TokenStore(format!("cannot create {:?}: {}", parent, e))
            })?;
        }

        let content = serde_json::to_string_pretty(&Value::Object(entries))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ClientError::TokenStore(format!("cannot write {:?}: {}", self.path, e)))?;

        tracing::debug!("Token persisted to {}", self.path.display());
        Ok(())
    }
}
