//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with one external system: the OS
//! socket table, platform command-line tools, or the container daemon.

pub mod command;
pub mod docker;
pub mod host;
pub mod killer;

// Re-export main types for convenience
pub use docker::{ContainerBackend, DockerPorts};
pub use host::{HostBackend, HostPortScanner};
pub use killer::ProcessKiller;
