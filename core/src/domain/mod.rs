//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod binding;
pub(crate) mod container;
pub mod reconcile;
mod view;

// Re-export all domain types
pub use binding::{pid_placeholder, PortBinding, Protocol};
pub use container::{short_id, ContainerIndex, ContainerPortMapping, SHORT_ID_LEN};
pub use reconcile::{reconcile, RangeQuery};
pub use view::{PortViewRecord, ScanSummary, FREE_STATE};
