//! Tabular renderer

use crate::domain::report::PodInfo;
use crate::error::Result;
use std::io::Write;
use tabwriter::TabWriter;

/// Column headers, stable for scripting consumers
pub const HEADERS: [&str; 7] = [
    "POD",
    "NODE",
    "NODE ZONE",
    "ZONE MATCHED",
    "PVC",
    "PV",
    "PV ZONE",
];

const NONE: &str = "<none>";

/// Write one row per (pod, volume) pair
///
/// A pod without claims produces no row unless `show_empty` is set, in which
/// case it gets a single row with `<none>` volume columns.
pub fn render<W: Write>(pods: &[PodInfo], show_empty: bool, out: &mut W) -> Result<()> {
    let mut tw = TabWriter::new(out).padding(3);
    writeln!(tw, "{}", HEADERS.join("\t"))?;

    for info in pods {
        if info.volumes().is_empty() {
            if show_empty {
                writeln!(
                    tw,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    info.pod_name(),
                    info.node_name(),
                    info.node_zone(),
                    info.zone_matched(),
                    NONE,
                    NONE,
                    NONE
                )?;
            }
            continue;
        }

        for pv in info.volumes() {
            writeln!(
                tw,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                info.pod_name(),
                info.node_name(),
                info.node_zone(),
                info.zone_matched(),
                pv.claim_name,
                pv.volume_name,
                pv.volume_zone
            )?;
        }
    }

    tw.flush()?;
    Ok(())
}
