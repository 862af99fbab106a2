//! In-memory cluster
//!
//! A [`ClusterReader`] backed by plain maps. Records every call it receives
//! and supports injected faults and latency, which makes it the collaborator
//! of choice for tests and benchmarks.

use crate::domain::ports::{
    ClaimRecord, ClusterReader, NodeRecord, PodRecord, PodVolume, VolumeRecord,
};
use crate::domain::selector::LabelSelector;
use crate::domain::zone::ZONE_LABEL;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;

/// A call received by the in-memory cluster
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClusterCall {
    ListPods(String),
    GetNode(String),
    GetClaim { namespace: String, name: String },
    GetVolume(String),
}

/// Failure to inject for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    NotFound,
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
struct FaultPlan {
    fault: Fault,
    /// `None` fails forever
    remaining: Option<u32>,
}

/// Cluster state held in memory
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    pods: Vec<PodRecord>,
    nodes: BTreeMap<String, NodeRecord>,
    claims: BTreeMap<(String, String), ClaimRecord>,
    volumes: BTreeMap<String, VolumeRecord>,
    latency: Option<Duration>,
    call_latency: BTreeMap<ClusterCall, Duration>,
    faults: Mutex<BTreeMap<ClusterCall, FaultPlan>>,
    calls: Mutex<Vec<ClusterCall>>,
}

fn zone_labels(zone: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    if !zone.is_empty() {
        labels.insert(ZONE_LABEL.to_string(), zone.to_string());
    }
    labels
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(mut self, pod: PodRecord) -> Self {
        self.pods.push(pod);
        self
    }

    /// Add a pod labelled `app=<app>` mounting the given claims
    pub fn with_app_pod(
        self,
        app: &str,
        namespace: &str,
        name: &str,
        node_name: &str,
        claims: &[&str],
    ) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), app.to_string());

        let mut volumes = vec![PodVolume::other("kube-api-access")];
        volumes.extend(claims.iter().map(|claim| PodVolume::claim(*claim, *claim)));

        self.with_pod(PodRecord {
            name: name.to_string(),
            namespace: namespace.to_string(),
            node_name: node_name.to_string(),
            labels,
            volumes,
        })
    }

    /// Add a node, an empty zone leaves the zone label off
    pub fn with_node(mut self, name: &str, zone: &str) -> Self {
        self.nodes.insert(
            name.to_string(),
            NodeRecord {
                name: name.to_string(),
                labels: zone_labels(zone),
            },
        );
        self
    }

    /// Add a claim, an empty volume name leaves it pending
    pub fn with_claim(mut self, namespace: &str, name: &str, volume_name: &str) -> Self {
        self.claims.insert(
            (namespace.to_string(), name.to_string()),
            ClaimRecord {
                name: name.to_string(),
                namespace: namespace.to_string(),
                volume_name: volume_name.to_string(),
            },
        );
        self
    }

    /// Add a persistent volume, an empty zone leaves the zone label off
    pub fn with_volume(mut self, name: &str, zone: &str) -> Self {
        self.volumes.insert(
            name.to_string(),
            VolumeRecord {
                name: name.to_string(),
                labels: zone_labels(zone),
            },
        );
        self
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay one specific call, overriding the cluster-wide latency
    pub fn with_call_latency(mut self, call: ClusterCall, latency: Duration) -> Self {
        self.call_latency.insert(call, latency);
        self
    }

    /// Fail every matching call
    pub fn with_fault(self, call: ClusterCall, fault: Fault) -> Self {
        self.faults.lock().insert(
            call,
            FaultPlan {
                fault,
                remaining: None,
            },
        );
        self
    }

    /// Fail the first `times` matching calls
    pub fn with_fault_times(self, call: ClusterCall, fault: Fault, times: u32) -> Self {
        self.faults.lock().insert(
            call,
            FaultPlan {
                fault,
                remaining: Some(times),
            },
        );
        self
    }

    pub fn pods(&self) -> &[PodRecord] {
        &self.pods
    }

    /// Calls received so far, in arrival order
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.lock().clone()
    }

    async fn enter(&self, call: ClusterCall, kind: &str, name: &str, operation: &str) -> Result<()> {
        self.calls.lock().push(call.clone());

        if let Some(latency) = self.call_latency.get(&call).copied().or(self.latency) {
            tokio::time::sleep(latency).await;
        }

        let fault = {
            let mut faults = self.faults.lock();
            match faults.get_mut(&call) {
                Some(plan) => match plan.remaining.as_mut() {
                    None => Some(plan.fault),
                    Some(0) => None,
                    Some(n) => {
                        *n -= 1;
                        Some(plan.fault)
                    }
                },
                None => None,
            }
        };

        match fault {
            Some(Fault::NotFound) => Err(Error::not_found(kind, name)),
            Some(Fault::Unavailable) => Err(Error::unavailable(operation, "injected fault")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterReader for InMemoryCluster {
    async fn list_pods(&self, selector: &LabelSelector) -> Result<Vec<PodRecord>> {
        let rendered = selector.to_string();
        self.enter(ClusterCall::ListPods(rendered.clone()), "Pod", &rendered, "list_pods")
            .await?;

        Ok(self
            .pods
            .iter()
            .filter(|p| selector.matches(&p.labels))
            .cloned()
            .collect())
    }

    async fn get_node(&self, name: &str) -> Result<NodeRecord> {
        self.enter(ClusterCall::GetNode(name.to_string()), "Node", name, "get_node")
            .await?;
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("Node", name))
    }

    async fn get_claim(&self, namespace: &str, name: &str) -> Result<ClaimRecord> {
        let qualified = format!("{}/{}", namespace, name);
        let call = ClusterCall::GetClaim {
            namespace: namespace.to_string(),
            name: name.to_string(),
        };
        self.enter(call, "PersistentVolumeClaim", &qualified, "get_claim")
            .await?;
        self.claims
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found("PersistentVolumeClaim", qualified))
    }

    async fn get_volume(&self, name: &str) -> Result<VolumeRecord> {
        self.enter(ClusterCall::GetVolume(name.to_string()), "PersistentVolume", name, "get_volume")
            .await?;
        self.volumes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("PersistentVolume", name))
    }
}
