//! Domain layer - Report entities, selectors, zone rules and port definitions
//!
//! This module defines the core traits (ports) that cluster adapters
//! implement, following hexagonal architecture principles.

pub mod ports;
pub mod report;
pub mod selector;
pub mod zone;

pub use ports::*;
pub use report::*;
pub use selector::*;
pub use zone::*;
