//! Volume Resolver
//!
//! Follows a pod's claim to its bound persistent volume and reads the
//! volume's zone.

use crate::correlation::guard::CallGuard;
use crate::domain::zone::zone_of;
use crate::domain::ports::ClusterReaderRef;
use crate::domain::report::PVDetails;
use crate::error::Result;
use tracing::debug;

/// Resolves claim → volume → zone
#[derive(Clone)]
pub struct VolumeResolver {
    reader: ClusterReaderRef,
    guard: CallGuard,
}

impl VolumeResolver {
    pub fn new(reader: ClusterReaderRef, guard: CallGuard) -> Self {
        Self { reader, guard }
    }

    /// Resolve one claim in `namespace`
    ///
    /// A pending claim is a valid terminal state and yields empty volume
    /// name and zone rather than an error.
    pub async fn resolve(&self, namespace: &str, claim_name: &str) -> Result<PVDetails> {
        let claim = self
            .guard
            .call("get_claim", || self.reader.get_claim(namespace, claim_name))
            .await?;

        if claim.volume_name.is_empty() {
            debug!(namespace, claim = claim_name, "Claim is not bound to a volume");
            return Ok(PVDetails::unbound(claim_name));
        }

        let volume = self
            .guard
            .call("get_volume", || self.reader.get_volume(&claim.volume_name))
            .await?;
        let volume_zone = zone_of(&volume.labels);

        debug!(
            namespace,
            claim = claim_name,
            volume = %claim.volume_name,
            zone = %volume_zone,
            "Resolved claim"
        );

        Ok(PVDetails {
            claim_name: claim_name.to_string(),
            volume_name: claim.volume_name,
            volume_zone,
        })
    }
}
