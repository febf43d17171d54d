//! PortWatch Core Library
//!
//! Cross-platform library for port inventory and container attribution.
//! Provides functionality to:
//! - Enumerate TCP and UDP port bindings on the host
//! - Enumerate ports published by running containers
//! - Reconcile both into a per-port view over a port range, free ports included
//! - Terminate processes and stop or restart containers
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `engine`: Snapshot state, polling loops and actions
//!
//! # Platform Support
//! - Host bindings come from the OS socket table, with `ss` (Linux),
//!   `lsof` (macOS and other Unix) or `netstat` (Windows) as fallback
//! - Container mappings come from the Docker API, with the `docker` CLI as
//!   fallback

// Hexagonal architecture layers
pub mod adapters;
pub mod domain;
pub mod ports;

pub mod config;
pub mod context;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    reconcile, ContainerIndex, ContainerPortMapping, PortBinding, PortViewRecord, Protocol,
    RangeQuery, ScanSummary,
};

// Re-export other commonly used types
pub use config::{Config, ConfigStore};
pub use context::ScanContext;
pub use engine::{DefaultEngine, PollingHandle, PortWatchEngine};
pub use error::{ActionError, ActionResult, Error, Result};
