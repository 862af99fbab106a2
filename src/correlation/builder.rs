//! Report Builder
//!
//! Drives the pod correlator over a full pod selection. Pods are correlated
//! concurrently up to a bound and collected in listing order.

use crate::correlation::correlator::PodCorrelator;
use crate::correlation::guard::{CallGuard, DEFAULT_CALL_TIMEOUT, DEFAULT_INITIAL_BACKOFF};
use crate::domain::ports::{ClusterReaderRef, PodRecord};
use crate::domain::report::{PodFailure, PodOutcome, Report};
use crate::domain::selector::LabelSelector;
use crate::error::{Error, Result};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// What to do when a single pod cannot be correlated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the whole report on the first failed pod
    #[default]
    Abort,
    /// Record the failure and keep correlating the remaining pods
    Isolate,
}

/// Run-scoped configuration for the report builder
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Label selector picking the pods to inspect
    pub selector: String,
    /// Maximum number of pods correlated at once
    pub concurrency: usize,
    /// Timeout applied to each cluster call
    pub call_timeout: Duration,
    /// Retries per call for transient failures
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            selector: String::new(),
            concurrency: 8,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_retries: 0,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

impl ReportConfig {
    /// Validate the configuration, returning the parsed selector
    pub fn validate(&self) -> Result<LabelSelector> {
        if self.concurrency == 0 {
            return Err(Error::Configuration("concurrency must be at least 1".into()));
        }
        if self.call_timeout.is_zero() {
            return Err(Error::Configuration("call timeout must be positive".into()));
        }
        LabelSelector::parse(&self.selector)
    }
}

// =============================================================================
// Report Builder
// =============================================================================

/// Builds a fresh [`Report`] per invocation
pub struct ReportBuilder {
    config: ReportConfig,
    reader: ClusterReaderRef,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig, reader: ClusterReaderRef) -> Self {
        Self { config, reader }
    }

    /// Validate the selector, list matching pods and correlate them
    pub async fn collect(&self, cancel: CancellationToken) -> Result<Report> {
        let selector = self.config.validate()?;
        let guard = self.guard(cancel);

        let pods = guard
            .call("list_pods", || self.reader.list_pods(&selector))
            .await?;
        info!(selector = %selector, pods = pods.len(), "Listed pods");

        self.correlate_all(&guard, &pods).await
    }

    /// Correlate an already listed pod selection
    pub async fn build(&self, pods: &[PodRecord], cancel: CancellationToken) -> Result<Report> {
        let guard = self.guard(cancel);
        self.correlate_all(&guard, pods).await
    }

    fn guard(&self, cancel: CancellationToken) -> CallGuard {
        CallGuard::new(self.config.call_timeout, self.config.max_retries, cancel)
            .with_initial_backoff(self.config.initial_backoff)
    }

    async fn correlate_all(&self, guard: &CallGuard, pods: &[PodRecord]) -> Result<Report> {
        let correlator = PodCorrelator::new(self.reader.clone(), guard.clone());
        let correlator = &correlator;

        // `buffered` yields in input order, so the first error seen is the
        // first failing pod in listing order. Dropping the stream drops any
        // lookups still in flight.
        let mut results = stream::iter(pods)
            .map(|pod| async move { (pod, correlator.correlate(pod).await) })
            .buffered(self.config.concurrency.max(1));

        let mut outcomes = Vec::with_capacity(pods.len());
        while let Some((pod, result)) = results.next().await {
            match result {
                Ok(info) => outcomes.push(PodOutcome::Ready(info)),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        error!(pod = %pod.name, namespace = %pod.namespace, "Correlation failed: {}", err);
                        return Err(err);
                    }
                    FailurePolicy::Isolate => {
                        warn!(pod = %pod.name, namespace = %pod.namespace, "Skipping pod: {}", err);
                        outcomes.push(PodOutcome::Failed(PodFailure {
                            pod_name: pod.name.clone(),
                            namespace: pod.namespace.clone(),
                            reason: err.to_string(),
                        }));
                    }
                },
            }
        }

        // Pods that need no cluster calls still finish after cancellation
        if guard.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let report = Report::new(outcomes);
        info!(
            pods = report.outcomes().len(),
            failed = report.failures().count(),
            "Report built"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::{ClusterCall, Fault, InMemoryCluster};
    use crate::domain::report::PVDetails;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn config(selector: &str) -> ReportConfig {
        ReportConfig {
            selector: selector.into(),
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        }
    }

    /// Two zones, four pods: aligned, misaligned, unscheduled, unbound claim
    fn zonal_cluster() -> InMemoryCluster {
        InMemoryCluster::new()
            .with_node("n1", "us-east-1a")
            .with_node("n2", "us-east-1b")
            .with_app_pod("db", "prod", "pod-a", "n1", &["data-a"])
            .with_app_pod("db", "prod", "pod-b", "n2", &["data-b"])
            .with_app_pod("db", "prod", "pod-c", "", &["data-c"])
            .with_app_pod("db", "prod", "pod-d", "n1", &["data-d"])
            .with_app_pod("web", "prod", "web-0", "n1", &[])
            .with_claim("prod", "data-a", "pv-a")
            .with_claim("prod", "data-b", "pv-b")
            .with_claim("prod", "data-c", "pv-c")
            .with_claim("prod", "data-d", "")
            .with_volume("pv-a", "us-east-1a")
            .with_volume("pv-b", "us-east-1a")
            .with_volume("pv-c", "us-east-1a")
    }

    #[tokio::test]
    async fn test_end_to_end_zone_report() {
        let cluster = Arc::new(zonal_cluster());
        let builder = ReportBuilder::new(config("app=db"), cluster.clone());

        let report = builder.collect(CancellationToken::new()).await.unwrap();
        assert!(report.is_complete());

        let pods = report.pods();
        let names: Vec<_> = pods.iter().map(|p| p.pod_name()).collect();
        assert_eq!(names, vec!["pod-a", "pod-b", "pod-c", "pod-d"]);

        // Aligned
        assert_eq!(pods[0].node_zone(), "us-east-1a");
        assert!(pods[0].zone_matched());
        assert_eq!(pods[0].volumes().len(), 1);

        // Misaligned, zones kept verbatim
        assert_eq!(pods[1].node_zone(), "us-east-1b");
        assert_eq!(pods[1].volumes()[0].volume_zone, "us-east-1a");
        assert!(!pods[1].zone_matched());

        // Unscheduled
        assert_eq!(pods[2].node_name(), "");
        assert_eq!(pods[2].node_zone(), "");
        assert!(!pods[2].zone_matched());

        // Unbound claim
        assert_eq!(pods[3].volumes(), &[PVDetails::unbound("data-d")]);
        assert!(!pods[3].zone_matched());

        let node_lookups: Vec<_> = cluster
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::GetNode(name) => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(node_lookups.len(), 3);
        assert!(node_lookups.iter().all(|n| !n.is_empty()));
    }

    #[tokio::test]
    async fn test_sequential_matches_concurrent() {
        let cluster: Arc<InMemoryCluster> = Arc::new(zonal_cluster());

        let sequential = ReportBuilder::new(
            ReportConfig {
                concurrency: 1,
                ..config("app in (db,web)")
            },
            cluster.clone(),
        )
        .collect(CancellationToken::new())
        .await
        .unwrap();

        let concurrent = ReportBuilder::new(
            ReportConfig {
                concurrency: 16,
                ..config("app in (db,web)")
            },
            cluster,
        )
        .collect(CancellationToken::new())
        .await
        .unwrap();

        assert_eq!(sequential, concurrent);
        assert_eq!(sequential.pods().len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_selector_rejected_before_listing() {
        let cluster = Arc::new(zonal_cluster());
        let builder = ReportBuilder::new(config(""), cluster.clone());

        let result = builder.collect(CancellationToken::new()).await;
        assert_matches!(result, Err(Error::SelectorInvalid { .. }));
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_concurrency() {
        let cluster = Arc::new(zonal_cluster());
        let builder = ReportBuilder::new(
            ReportConfig {
                concurrency: 0,
                ..config("app=db")
            },
            cluster,
        );
        let result = builder.collect(CancellationToken::new()).await;
        assert_matches!(result, Err(Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_abort_on_missing_node() {
        let cluster = Arc::new(
            zonal_cluster().with_fault(ClusterCall::GetNode("n2".into()), Fault::NotFound),
        );
        let builder = ReportBuilder::new(config("app=db"), cluster);

        let result = builder.collect(CancellationToken::new()).await;
        assert_matches!(
            result,
            Err(Error::ResourceNotFound { kind, name }) if kind == "Node" && name == "n2"
        );
    }

    #[tokio::test]
    async fn test_abort_returns_first_failure_in_listing_order() {
        // The later pod fails first, the earlier one only after a delay
        let cluster = Arc::new(
            InMemoryCluster::new()
                .with_node("n1", "us-east-1a")
                .with_app_pod("db", "prod", "p0", "n1", &[])
                .with_app_pod("db", "prod", "p1", "gone-a", &[])
                .with_app_pod("db", "prod", "p2", "gone-b", &[])
                .with_call_latency(ClusterCall::GetNode("gone-a".into()), Duration::from_millis(50))
                .with_fault(ClusterCall::GetNode("gone-b".into()), Fault::Unavailable),
        );
        let builder = ReportBuilder::new(
            ReportConfig {
                concurrency: 16,
                ..config("app=db")
            },
            cluster,
        );

        let result = builder.collect(CancellationToken::new()).await;
        assert_matches!(
            result,
            Err(Error::ResourceNotFound { kind, name }) if kind == "Node" && name == "gone-a"
        );
    }

    #[tokio::test]
    async fn test_isolate_keeps_other_pods() {
        let cluster = Arc::new(
            zonal_cluster().with_fault(ClusterCall::GetNode("n2".into()), Fault::NotFound),
        );
        let builder = ReportBuilder::new(
            ReportConfig {
                failure_policy: FailurePolicy::Isolate,
                ..config("app=db")
            },
            cluster,
        );

        let report = builder.collect(CancellationToken::new()).await.unwrap();
        assert_eq!(report.outcomes().len(), 4);
        assert_matches!(&report.outcomes()[1], PodOutcome::Failed(f) if f.pod_name == "pod-b");

        let names: Vec<_> = report.pods().iter().map(|p| p.pod_name().to_string()).collect();
        assert_eq!(names, vec!["pod-a", "pod-c", "pod-d"]);
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let cluster = Arc::new(zonal_cluster().with_fault_times(
            ClusterCall::GetVolume("pv-a".into()),
            Fault::Unavailable,
            2,
        ));
        let builder = ReportBuilder::new(
            ReportConfig {
                max_retries: 2,
                ..config("app=db")
            },
            cluster,
        );

        let report = builder.collect(CancellationToken::new()).await.unwrap();
        assert!(report.pods()[0].zone_matched());
    }

    #[tokio::test]
    async fn test_list_failure() {
        let cluster = Arc::new(
            zonal_cluster().with_fault(ClusterCall::ListPods("app=db".into()), Fault::Unavailable),
        );
        let builder = ReportBuilder::new(config("app=db"), cluster);

        let result = builder.collect(CancellationToken::new()).await;
        assert_matches!(result, Err(Error::CollaboratorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_timeout_reported_as_unavailable() {
        let cluster = Arc::new(zonal_cluster().with_latency(Duration::from_millis(500)));
        let builder = ReportBuilder::new(
            ReportConfig {
                call_timeout: Duration::from_millis(20),
                ..config("app=db")
            },
            cluster,
        );

        let result = builder.collect(CancellationToken::new()).await;
        assert_matches!(result, Err(Error::CollaboratorUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_run_discards_results() {
        let cluster = Arc::new(zonal_cluster());
        let builder = ReportBuilder::new(
            ReportConfig {
                failure_policy: FailurePolicy::Isolate,
                ..config("app=db")
            },
            cluster.clone(),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = builder.collect(cancel).await;
        assert_matches!(result, Err(Error::Cancelled));
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_build_without_cluster_calls() {
        let idle = |name: &str| PodRecord {
            name: name.into(),
            namespace: "prod".into(),
            ..Default::default()
        };
        let cluster = Arc::new(InMemoryCluster::new());
        let builder = ReportBuilder::new(config("app=db"), cluster.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = builder.build(&[idle("idle-0"), idle("idle-1")], cancel).await;
        assert_matches!(result, Err(Error::Cancelled));
        assert!(cluster.calls().is_empty());
    }

    #[tokio::test]
    async fn test_build_from_records() {
        let cluster = Arc::new(zonal_cluster());
        let pods = cluster.pods().to_vec();
        let builder = ReportBuilder::new(config("app=db"), cluster);

        let report = builder.build(&pods, CancellationToken::new()).await.unwrap();
        assert_eq!(report.pods().len(), pods.len());
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let cluster = Arc::new(zonal_cluster());
        let builder = ReportBuilder::new(config("app=cache"), cluster);

        let report = builder.collect(CancellationToken::new()).await.unwrap();
        assert!(report.outcomes().is_empty());
    }
}
