//! Domain Ports - Read-only view of the cluster control plane
//!
//! The correlation logic never talks to the Kubernetes API directly. It reads
//! plain records through [`ClusterReader`], which adapters implement.

use crate::domain::selector::LabelSelector;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Cluster Records
// =============================================================================

/// A pod as returned by a selector listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodRecord {
    /// Pod name
    pub name: String,
    /// Namespace the pod lives in
    pub namespace: String,
    /// Node the pod is bound to, empty while unscheduled
    pub node_name: String,
    /// Pod labels
    pub labels: BTreeMap<String, String>,
    /// Volumes in declaration order
    pub volumes: Vec<PodVolume>,
}

impl PodRecord {
    /// Claim names of all claim-backed volumes, in declaration order
    pub fn claim_names(&self) -> impl Iterator<Item = &str> {
        self.volumes.iter().filter_map(|v| match &v.source {
            VolumeSource::Claim { claim_name } => Some(claim_name.as_str()),
            VolumeSource::Other => None,
        })
    }
}

/// A volume declared in a pod spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodVolume {
    /// Volume name within the pod
    pub name: String,
    /// What backs the volume
    pub source: VolumeSource,
}

impl PodVolume {
    /// A volume backed by a persistent volume claim
    pub fn claim(name: impl Into<String>, claim_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::Claim {
                claim_name: claim_name.into(),
            },
        }
    }

    /// A config, secret, or ephemeral volume
    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::Other,
        }
    }
}

/// Backing source of a pod volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    Claim { claim_name: String },
    Other,
}

/// A cluster node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

/// A persistent volume claim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimRecord {
    pub name: String,
    pub namespace: String,
    /// Bound volume name, empty while the claim is pending
    pub volume_name: String,
}

/// A persistent volume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeRecord {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

// =============================================================================
// Cluster Reader Port
// =============================================================================

/// Port for the four read operations the report needs
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// List pods matching a selector
    async fn list_pods(&self, selector: &LabelSelector) -> Result<Vec<PodRecord>>;

    /// Fetch a node by name
    async fn get_node(&self, name: &str) -> Result<NodeRecord>;

    /// Fetch a claim by namespace and name
    async fn get_claim(&self, namespace: &str, name: &str) -> Result<ClaimRecord>;

    /// Fetch a persistent volume by name
    async fn get_volume(&self, name: &str) -> Result<VolumeRecord>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type ClusterReaderRef = Arc<dyn ClusterReader>;
