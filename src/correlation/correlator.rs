//! Pod Correlator
//!
//! Joins one pod with its node's zone and the zones of every claim-backed
//! volume it mounts.

use crate::correlation::guard::CallGuard;
use crate::correlation::resolver::VolumeResolver;
use crate::domain::zone::zone_of;
use crate::domain::ports::{ClusterReaderRef, PodRecord};
use crate::domain::report::PodInfo;
use crate::error::Result;
use futures::future::try_join_all;
use tracing::debug;

/// Builds a [`PodInfo`] for a single pod
#[derive(Clone)]
pub struct PodCorrelator {
    reader: ClusterReaderRef,
    guard: CallGuard,
    resolver: VolumeResolver,
}

impl PodCorrelator {
    pub fn new(reader: ClusterReaderRef, guard: CallGuard) -> Self {
        let resolver = VolumeResolver::new(reader.clone(), guard.clone());
        Self {
            reader,
            guard,
            resolver,
        }
    }

    #[tracing::instrument(skip(self, pod), fields(pod = %pod.name, namespace = %pod.namespace))]
    pub async fn correlate(&self, pod: &PodRecord) -> Result<PodInfo> {
        let node_zone = self.node_zone(&pod.node_name).await?;

        // Resolved concurrently, collected in declaration order
        let volumes = try_join_all(
            pod.claim_names()
                .map(|claim| self.resolver.resolve(&pod.namespace, claim)),
        )
        .await?;

        let info = PodInfo::new(&pod.name, &pod.node_name, node_zone, volumes);

        debug!(
            node = %info.node_name(),
            node_zone = %info.node_zone(),
            volumes = info.volumes().len(),
            zone_matched = info.zone_matched(),
            "Correlated pod"
        );

        Ok(info)
    }

    async fn node_zone(&self, node_name: &str) -> Result<String> {
        if node_name.is_empty() {
            debug!("Pod is not scheduled, node zone unknown");
            return Ok(String::new());
        }

        let node = self
            .guard
            .call("get_node", || self.reader.get_node(node_name))
            .await?;
        Ok(zone_of(&node.labels))
    }
}
