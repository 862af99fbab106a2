//! PV Zone Inspector
//!
//! Reports whether the persistent volumes of the pods matched by a label
//! selector live in the same availability zone as the pods' nodes.
//!
//! The rendered report goes to stdout, logs go to stderr.

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pv_zone_inspector::{
    render, FailurePolicy, KubeClusterReader, KubeReaderConfig, OutputFormat, RenderOptions,
    ReportBuilder, ReportConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// PV Zone Inspector - Checks pod/volume availability zone alignment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Label selector picking the pods to inspect (e.g. app=db)
    #[arg(short = 'l', long = "label", env = "LABEL_SELECTOR")]
    label: String,

    /// Output format
    #[arg(short = 'o', long, env = "OUTPUT_FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Only inspect pods in this namespace (default: all namespaces)
    #[arg(short = 'n', long, env = "TARGET_NAMESPACE")]
    namespace: Option<String>,

    /// Maximum number of pods correlated at once
    #[arg(long, env = "CONCURRENCY", default_value = "8")]
    concurrency: usize,

    /// Timeout for each cluster API call in seconds
    #[arg(long, env = "CALL_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,

    /// Retries per cluster API call on transient failures
    #[arg(long, env = "RETRIES", default_value = "0")]
    retries: u32,

    /// Report pods that could not be inspected instead of failing the run
    #[arg(long, env = "KEEP_GOING")]
    keep_going: bool,

    /// Show pods without persistent volume claims in table output
    #[arg(long, env = "SHOW_EMPTY")]
    show_empty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn report_config(&self) -> ReportConfig {
        ReportConfig {
            selector: self.label.clone(),
            concurrency: self.concurrency,
            call_timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.retries,
            failure_policy: if self.keep_going {
                FailurePolicy::Isolate
            } else {
                FailurePolicy::Abort
            },
            ..Default::default()
        }
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            format: self.output,
            show_empty: self.show_empty,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = args.report_config();
    let selector = config.validate()?;

    info!("Starting PV Zone Inspector");
    info!("  Version: {}", pv_zone_inspector::VERSION);
    info!("  Selector: {}", selector);
    info!("  Output: {}", args.output);
    info!("  Concurrency: {}", config.concurrency);

    let reader = KubeClusterReader::try_default(KubeReaderConfig {
        namespace: args.namespace.clone(),
        ..Default::default()
    })
    .await
    .context("failed to create Kubernetes client")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling report");
            on_signal.cancel();
        }
    });

    let builder = ReportBuilder::new(config, Arc::new(reader));
    let report = builder.collect(cancel).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&report.pods(), &args.render_options(), &mut out)?;
    out.flush()?;

    for failure in report.failures() {
        eprintln!(
            "warning: skipped pod {}/{}: {}",
            failure.namespace, failure.pod_name, failure.reason
        );
    }

    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},kube=warn,hyper=warn,tower=warn",
            level.as_str().to_lowercase()
        ))
    });

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
