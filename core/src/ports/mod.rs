//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the engine uses to interact
//! with external systems. Implementations live in `adapters`.

mod containers;
mod killer;
mod scanner;

pub use containers::{ContainerControlPort, ContainerScannerPort};
pub use killer::ProcessKillerPort;
pub use scanner::HostScannerPort;
