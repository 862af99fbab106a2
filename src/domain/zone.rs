//! Topology zone lookup

use std::collections::BTreeMap;

/// Well-known label carrying a node's or volume's availability zone
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";

/// Zone label value, or an empty string when the label is absent
pub fn zone_of(labels: &BTreeMap<String, String>) -> String {
    labels.get(ZONE_LABEL).cloned().unwrap_or_default()
}

/// Exact, case-sensitive comparison; an unknown zone never matches anything
pub fn zones_match(node_zone: &str, volume_zone: &str) -> bool {
    !volume_zone.is_empty() && volume_zone == node_zone
}
