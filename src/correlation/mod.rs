//! Correlation Module
//!
//! Joins pods with the zones of their nodes and persistent volumes:
//! - Zone lookup: re-exported from the domain zone rules
//! - Volume resolver: claim → volume → zone
//! - Pod correlator: node zone plus every claim-backed volume
//! - Report builder: the full pod selection, in listing order

pub mod builder;
pub mod correlator;
pub mod guard;
pub mod resolver;

pub use builder::*;
pub use correlator::*;
pub use guard::*;
pub use resolver::*;

pub use crate::domain::zone::{zone_of, zones_match, ZONE_LABEL};
