//! Report Renderers
//!
//! Stateless encoders from a [`PodInfo`] sequence to an output stream:
//! - Table: one row per (pod, volume) pair
//! - Text: one line per pod
//! - JSON: the full sequence, pretty-printed

pub mod json;
pub mod table;
pub mod text;

use crate::domain::report::PodInfo;
use crate::error::Result;
use std::io::Write;

/// Output encodings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Run-scoped rendering options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Emit a `<none>` table row for pods without claims instead of
    /// leaving them out
    pub show_empty: bool,
}

/// Render `pods` with the encoder selected by `options`
pub fn render<W: Write>(pods: &[PodInfo], options: &RenderOptions, out: &mut W) -> Result<()> {
    match options.format {
        OutputFormat::Table => table::render(pods, options.show_empty, out),
        OutputFormat::Json => json::render(pods, out),
        OutputFormat::Text => text::render(pods, out),
    }
}

/// Render into an in-memory buffer
pub fn render_to_vec(pods: &[PodInfo], options: &RenderOptions) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    render(pods, options, &mut buffer)?;
    Ok(buffer)
}
