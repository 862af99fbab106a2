//! Report entities
//!
//! [`PodInfo`] rows are immutable once built and their zone verdict is always
//! derived from the volumes they carry, including after deserialization.

use crate::domain::zone::zones_match;
use serde::{Deserialize, Serialize};

// =============================================================================
// Volume Details
// =============================================================================

/// One claim-backed volume on a pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PVDetails {
    #[serde(rename = "PVCName")]
    pub claim_name: String,
    /// Empty when the claim is unbound
    #[serde(rename = "PVName")]
    pub volume_name: String,
    /// Empty when unbound or unlabeled
    #[serde(rename = "PVZone")]
    pub volume_zone: String,
}

impl PVDetails {
    /// Details for a claim that has not been bound to a volume yet
    pub fn unbound(claim_name: impl Into<String>) -> Self {
        Self {
            claim_name: claim_name.into(),
            ..Default::default()
        }
    }

    pub fn is_bound(&self) -> bool {
        !self.volume_name.is_empty()
    }
}

// =============================================================================
// Pod Info
// =============================================================================

/// One row per matched pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PodInfoRepr")]
pub struct PodInfo {
    #[serde(rename = "PodName")]
    pod_name: String,
    #[serde(rename = "NodeName")]
    node_name: String,
    #[serde(rename = "NodeZone")]
    node_zone: String,
    #[serde(rename = "PVInfo")]
    volumes: Vec<PVDetails>,
    #[serde(rename = "ZoneMatched")]
    zone_matched: bool,
}

impl PodInfo {
    /// Build a row, deriving the zone verdict from `volumes`
    pub fn new(
        pod_name: impl Into<String>,
        node_name: impl Into<String>,
        node_zone: impl Into<String>,
        volumes: Vec<PVDetails>,
    ) -> Self {
        let node_zone = node_zone.into();
        let zone_matched = volumes
            .iter()
            .any(|v| zones_match(&node_zone, &v.volume_zone));

        Self {
            pod_name: pod_name.into(),
            node_name: node_name.into(),
            node_zone,
            volumes,
            zone_matched,
        }
    }

    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn node_zone(&self) -> &str {
        &self.node_zone
    }

    pub fn volumes(&self) -> &[PVDetails] {
        &self.volumes
    }

    /// True iff at least one volume shares the node's non-empty zone
    pub fn zone_matched(&self) -> bool {
        self.zone_matched
    }
}

/// Wire shape used to rebuild a [`PodInfo`] through [`PodInfo::new`]
#[derive(Deserialize)]
struct PodInfoRepr {
    #[serde(rename = "PodName")]
    pod_name: String,
    #[serde(rename = "NodeName", default)]
    node_name: String,
    #[serde(rename = "NodeZone", default)]
    node_zone: String,
    #[serde(rename = "PVInfo", default)]
    volumes: Option<Vec<PVDetails>>,
}

impl From<PodInfoRepr> for PodInfo {
    fn from(repr: PodInfoRepr) -> Self {
        PodInfo::new(
            repr.pod_name,
            repr.node_name,
            repr.node_zone,
            repr.volumes.unwrap_or_default(),
        )
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// A pod whose correlation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodFailure {
    pub pod_name: String,
    pub namespace: String,
    pub reason: String,
}

/// Result of correlating a single pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodOutcome {
    Ready(PodInfo),
    Failed(PodFailure),
}

/// The outcome of one report-building pass, in pod listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    outcomes: Vec<PodOutcome>,
}

impl Report {
    pub fn new(outcomes: Vec<PodOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[PodOutcome] {
        &self.outcomes
    }

    /// Successfully correlated pods, in listing order
    pub fn pods(&self) -> Vec<PodInfo> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PodOutcome::Ready(info) => Some(info.clone()),
                PodOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PodFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            PodOutcome::Failed(f) => Some(f),
            PodOutcome::Ready(_) => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}
