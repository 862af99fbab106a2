//! Benchmark for report building and rendering
//!
//! Target: 1K pods correlated and rendered well under a second

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pv_zone_inspector::{
    render_to_vec, InMemoryCluster, OutputFormat, PVDetails, PodInfo, RenderOptions,
    ReportBuilder, ReportConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const ZONES: [&str; 3] = ["us-east-1a", "us-east-1b", "us-east-1c"];

fn sample_pods(count: usize) -> Vec<PodInfo> {
    (0..count)
        .map(|i| {
            PodInfo::new(
                format!("pod-{:04}", i),
                format!("node-{:02}", i % 50),
                ZONES[i % 3],
                vec![PVDetails {
                    claim_name: format!("data-pod-{:04}", i),
                    volume_name: format!("pv-{:04}", i),
                    volume_zone: ZONES[(i / 3) % 3].to_string(),
                }],
            )
        })
        .collect()
}

fn sample_cluster(count: usize) -> InMemoryCluster {
    let mut cluster = InMemoryCluster::new();
    for n in 0..50 {
        cluster = cluster.with_node(&format!("node-{:02}", n), ZONES[n % 3]);
    }
    for i in 0..count {
        let claim = format!("data-pod-{:04}", i);
        let volume = format!("pv-{:04}", i);
        cluster = cluster
            .with_app_pod(
                "db",
                "prod",
                &format!("pod-{:04}", i),
                &format!("node-{:02}", i % 50),
                &[claim.as_str()],
            )
            .with_claim("prod", &claim, &volume)
            .with_volume(&volume, ZONES[(i / 3) % 3]);
    }
    cluster
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let pods = sample_pods(1000);
    group.throughput(Throughput::Elements(pods.len() as u64));

    for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Text] {
        let options = RenderOptions {
            format,
            show_empty: false,
        };
        group.bench_function(format.to_string(), |b| {
            b.iter(|| render_to_vec(black_box(&pods), &options).unwrap());
        });
    }

    group.finish();
}

fn bench_build_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_builder");
    group.throughput(Throughput::Elements(1000));

    let cluster = Arc::new(sample_cluster(1000));
    let rt = tokio::runtime::Runtime::new().unwrap();

    for concurrency in [1, 16] {
        let builder = ReportBuilder::new(
            ReportConfig {
                selector: "app=db".into(),
                concurrency,
                ..Default::default()
            },
            cluster.clone(),
        );

        group.bench_function(format!("collect_1000_pods_c{}", concurrency), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let report = builder.collect(CancellationToken::new()).await.unwrap();
                    black_box(report);
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_build_report);
criterion_main!(benches);
