//! Cluster Adapters
//!
//! Provides [`ClusterReader`](crate::domain::ports::ClusterReader) adapters:
//! - Kubernetes: live reads through the kube client
//! - In-memory: recorded state for tests and benchmarks

pub mod kubernetes;
pub mod memory;

pub use kubernetes::*;
pub use memory::*;
