//! PV Zone Inspector - Compute/Storage Co-location Report
//!
//! Inventories the pods matched by a label selector and reports, per pod and
//! per persistent volume, whether the volume lives in the same availability
//! zone as the node the pod runs on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              Report Builder                                 │
//! │             (bounded fan-out over pods, listing order preserved)            │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────┐      ┌─────────────────────────────────┐   │
//! │  │       Pod Correlator        │─────▶│        Volume Resolver          │   │
//! │  │   (node → zone, verdict)    │      │   (claim → volume → zone)       │   │
//! │  └──────────────┬──────────────┘      └────────────────┬────────────────┘   │
//! │                 └──────────────┬───────────────────────┘                    │
//! │                    ┌───────────┴───────────┐                                │
//! │                    │      Call Guard       │                                │
//! │                    │ cancel/timeout/retry  │                                │
//! │                    └───────────┬───────────┘                                │
//! ├────────────────────────────────┼────────────────────────────────────────────┤
//! │                        Cluster Reader Port                                  │
//! │  ┌─────────────────────────────┐      ┌─────────────────────────────────┐   │
//! │  │        Kubernetes           │      │          In-memory              │   │
//! │  └─────────────────────────────┘      └─────────────────────────────────┘   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                    Renderers: table │ text │ json                           │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`correlation`]: Zone lookup, volume resolution, pod correlation and report building
//! - [`cluster`]: Cluster reader adapters
//! - [`render`]: Output encoders
//! - [`domain`]: Report entities, label selectors and ports
//! - [`error`]: Error types and handling

pub mod cluster;
pub mod correlation;
pub mod domain;
pub mod error;
pub mod render;

// Re-export commonly used types
pub use cluster::{ClusterCall, Fault, InMemoryCluster, KubeClusterReader, KubeReaderConfig};

pub use correlation::{
    zone_of, zones_match, CallGuard, FailurePolicy, PodCorrelator, ReportBuilder, ReportConfig,
    VolumeResolver, ZONE_LABEL,
};

pub use domain::{
    ClaimRecord, ClusterReader, ClusterReaderRef, LabelSelector, NodeRecord, PVDetails,
    PodFailure, PodInfo, PodOutcome, PodRecord, PodVolume, Report, VolumeRecord, VolumeSource,
};

pub use error::{Error, ErrorAction, Result};

pub use render::{render, render_to_vec, OutputFormat, RenderOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
