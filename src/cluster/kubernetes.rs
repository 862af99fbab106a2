//! Kubernetes cluster reader
//!
//! Reads pods, nodes, claims and volumes through the kube client and converts
//! them into plain domain records.

use crate::domain::ports::{
    ClaimRecord, ClusterReader, NodeRecord, PodRecord, PodVolume, VolumeRecord,
};
use crate::domain::selector::LabelSelector;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, PersistentVolume, PersistentVolumeClaim, Pod};
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Kubernetes reader
#[derive(Debug, Clone)]
pub struct KubeReaderConfig {
    /// Namespace to list pods in, all namespaces when `None`
    pub namespace: Option<String>,
    /// Page size for pod listings
    pub page_size: u32,
}

impl Default for KubeReaderConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            page_size: 500,
        }
    }
}

// =============================================================================
// Kube Cluster Reader
// =============================================================================

/// [`ClusterReader`] backed by the Kubernetes API
pub struct KubeClusterReader {
    config: KubeReaderConfig,
    client: Client,
}

impl KubeClusterReader {
    pub fn new(client: Client, config: KubeReaderConfig) -> Self {
        Self { config, client }
    }

    /// Connect using the ambient kubeconfig or in-cluster service account
    pub async fn try_default(config: KubeReaderConfig) -> Result<Self> {
        let client = Client::try_default().await?;
        info!(
            namespace = config.namespace.as_deref().unwrap_or("<all>"),
            "Connected to Kubernetes"
        );
        Ok(Self::new(client, config))
    }

    fn pods_api(&self) -> Api<Pod> {
        match &self.config.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }
}

/// Map a failed `get` into the error taxonomy
fn get_error(err: kube::Error, kind: &str, name: &str, operation: &str) -> Error {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => Error::not_found(kind, name),
        other => Error::unavailable(operation, other),
    }
}

/// Map a failed pod listing into the error taxonomy
fn list_error(err: kube::Error, selector: &LabelSelector) -> Error {
    match err {
        kube::Error::Api(resp) if resp.code == 400 || resp.code == 422 => {
            Error::SelectorInvalid {
                selector: selector.to_string(),
                reason: resp.message,
            }
        }
        other => Error::unavailable("list_pods", other),
    }
}

#[async_trait]
impl ClusterReader for KubeClusterReader {
    async fn list_pods(&self, selector: &LabelSelector) -> Result<Vec<PodRecord>> {
        let api = self.pods_api();
        let base = ListParams::default()
            .labels(&selector.to_string())
            .limit(self.config.page_size);

        let mut pods = Vec::new();
        let mut continue_token: Option<String> = None;
        loop {
            let params = match &continue_token {
                Some(token) => base.clone().continue_token(token),
                None => base.clone(),
            };
            let page = api
                .list(&params)
                .await
                .map_err(|e| list_error(e, selector))?;

            pods.extend(page.items.into_iter().map(PodRecord::from));

            continue_token = page.metadata.continue_.filter(|t| !t.is_empty());
            if continue_token.is_none() {
                break;
            }
            debug!(fetched = pods.len(), "Fetching next pod page");
        }

        Ok(pods)
    }

    async fn get_node(&self, name: &str) -> Result<NodeRecord> {
        let api: Api<Node> = Api::all(self.client.clone());
        let node = api
            .get(name)
            .await
            .map_err(|e| get_error(e, "Node", name, "get_node"))?;
        Ok(node.into())
    }

    async fn get_claim(&self, namespace: &str, name: &str) -> Result<ClaimRecord> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        let claim = api.get(name).await.map_err(|e| {
            get_error(
                e,
                "PersistentVolumeClaim",
                &format!("{}/{}", namespace, name),
                "get_claim",
            )
        })?;
        Ok(claim.into())
    }

    async fn get_volume(&self, name: &str) -> Result<VolumeRecord> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        let volume = api
            .get(name)
            .await
            .map_err(|e| get_error(e, "PersistentVolume", name, "get_volume"))?;
        Ok(volume.into())
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<Pod> for PodRecord {
    fn from(pod: Pod) -> Self {
        let spec = pod.spec.unwrap_or_default();
        let volumes = spec
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| match v.persistent_volume_claim {
                Some(source) => PodVolume::claim(v.name, source.claim_name),
                None => PodVolume::other(v.name),
            })
            .collect();

        PodRecord {
            name: pod.metadata.name.unwrap_or_default(),
            namespace: pod.metadata.namespace.unwrap_or_default(),
            node_name: spec.node_name.unwrap_or_default(),
            labels: pod.metadata.labels.unwrap_or_default(),
            volumes,
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        NodeRecord {
            name: node.metadata.name.unwrap_or_default(),
            labels: node.metadata.labels.unwrap_or_default(),
        }
    }
}

impl From<PersistentVolumeClaim> for ClaimRecord {
    fn from(claim: PersistentVolumeClaim) -> Self {
        ClaimRecord {
            name: claim.metadata.name.unwrap_or_default(),
            namespace: claim.metadata.namespace.unwrap_or_default(),
            volume_name: claim
                .spec
                .and_then(|s| s.volume_name)
                .unwrap_or_default(),
        }
    }
}

impl From<PersistentVolume> for VolumeRecord {
    fn from(volume: PersistentVolume) -> Self {
        VolumeRecord {
            name: volume.metadata.name.unwrap_or_default(),
            labels: volume.metadata.labels.unwrap_or_default(),
        }
    }
}
