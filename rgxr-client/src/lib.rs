//! # rgxr-client
//!
//! Client library for the rgxr automaton services.
//!
//! This crate provides:
//! - Async HTTP client for the conversion service and the PostgREST store
//! - Bearer token login with optional on-disk persistence
//! - Render-then-persist workflows for saving and updating automata
//! - Optional TLS settings for HTTPS deployments
//!
//! No operation is retried or timed out by the client.

mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod tls;
pub mod transport;
mod workflow;

pub use client::Client;
pub use config::{ClientConfig, ConfigError, TlsClientConfig};
pub use error::ClientError;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use rgxr_protocol::{Fa, FaRecord, RenderResult, RunResult, Transition};
