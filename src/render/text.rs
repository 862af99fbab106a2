//! Plain text renderer

use crate::domain::report::PodInfo;
use crate::error::Result;
use std::io::Write;

/// Write one summary line per pod
pub fn render<W: Write>(pods: &[PodInfo], out: &mut W) -> Result<()> {
    for info in pods {
        writeln!(
            out,
            "Pod: {}, Node: {}, Node Zone: {}, Zone Matched: {}",
            info.pod_name(),
            info.node_name(),
            info.node_zone(),
            info.zone_matched()
        )?;
    }
    Ok(())
}
