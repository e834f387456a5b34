//! # rgxr-protocol
//!
//! Wire contract shared by the rgxr client and CLI.
//!
//! This crate provides:
//! - The finite automaton shape and its persisted record
//! - Request and response payloads for the conversion service
//! - Row payloads for the PostgREST persistence service
//! - Endpoint paths and operation names

pub mod endpoint;
pub mod fa;
pub mod message;

pub use fa::{Fa, FaRecord, Transition, EPSILON, VOID};
pub use message::{FaSource, Operation, RenderResult, RunResult, DEAD_STATE};
