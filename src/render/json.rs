//! JSON renderer

use crate::domain::report::PodInfo;
use crate::error::Result;
use std::io::Write;

/// Write the full sequence as a pretty-printed JSON array
pub fn render<W: Write>(pods: &[PodInfo], out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, pods)?;
    writeln!(out)?;
    Ok(())
}
