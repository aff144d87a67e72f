//! cf-teardown: CloudFront distribution decommissioning
//!
//! Unbinds origin access control and the web ACL from a distribution, waits
//! for each change to deploy, then deletes it. Meant to run after (or instead
//! of) the provisioning tool's destroy step in acceptance tests.

#![recursion_limit = "256"]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use cf_teardown::aws::{AwsContext, CloudFrontClient, FromAwsContext};
use cf_teardown::config::{HarnessConfig, TeardownConfig};
use cf_teardown::teardown::{
    TeardownOrchestrator, TeardownReport, read_distribution, strip, write_test_records,
};
use cf_teardown::wait::WaitConfig;
use cf_teardown_common::DistributionId;
use cf_teardown_common::defaults::{
    DEFAULT_CLOUDFRONT_REGION, DEFAULT_CONFLICT_RETRIES, DEFAULT_HTML_PATH,
    DEFAULT_POLL_INITIAL_DELAY_SECS, DEFAULT_POLL_MAX_DELAY_SECS,
    DEFAULT_PROPAGATION_MAX_ATTEMPTS, DEFAULT_PROPAGATION_TIMEOUT_SECS, DEFAULT_READ_RETRIES,
    DEFAULT_REPORT_PATH,
};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cf-teardown")]
#[command(about = "Safely decommission CloudFront distributions")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the teardown command
#[derive(clap::Args, Debug)]
struct TeardownArgs {
    /// Distribution ID or ARN
    #[arg(short, long, env = "CF_TEARDOWN_DISTRIBUTION")]
    distribution: DistributionId,

    /// AWS region for the CloudFront control plane
    #[arg(long, default_value = DEFAULT_CLOUDFRONT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Maximum time to wait for each change to deploy, in seconds
    #[arg(long, default_value_t = DEFAULT_PROPAGATION_TIMEOUT_SECS)]
    propagation_timeout: u64,

    /// Initial delay between propagation polls, in seconds
    #[arg(long, default_value_t = DEFAULT_POLL_INITIAL_DELAY_SECS)]
    poll_interval: u64,

    /// Cap on the delay between propagation polls, in seconds
    #[arg(long, default_value_t = DEFAULT_POLL_MAX_DELAY_SECS)]
    max_poll_interval: u64,

    /// Maximum propagation polls per wait
    #[arg(long, default_value_t = DEFAULT_PROPAGATION_MAX_ATTEMPTS)]
    max_polls: u32,

    /// Retries for reads that fail with throttling or network errors
    #[arg(long, default_value_t = DEFAULT_READ_RETRIES)]
    read_retries: usize,

    /// Re-read-and-retry attempts after a concurrency conflict
    #[arg(long, default_value_t = DEFAULT_CONFLICT_RETRIES)]
    conflict_retries: u32,

    /// Disable the distribution and wait for it before deleting
    #[arg(long)]
    disable: bool,

    /// Write a JSON test report
    #[arg(long)]
    report: bool,

    /// JSON report path
    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    report_file: PathBuf,

    /// HTML report path (rendered by the report sink)
    #[arg(long, default_value = DEFAULT_HTML_PATH)]
    html_file: PathBuf,
}

impl TeardownArgs {
    fn teardown_config(&self) -> TeardownConfig {
        TeardownConfig {
            wait: WaitConfig {
                initial_delay: Duration::from_secs(self.poll_interval),
                max_delay: Duration::from_secs(self.max_poll_interval),
                timeout: Duration::from_secs(self.propagation_timeout),
                max_attempts: self.max_polls,
                jitter: true,
            },
            read_retries: self.read_retries,
            conflict_retries: self.conflict_retries,
            disable_before_delete: self.disable,
        }
    }

    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            generate_report: self.report,
            report_path: self.report_file.clone(),
            html_path: self.html_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unbind, wait for propagation, and delete a distribution
    Teardown(Box<TeardownArgs>),

    /// Show a distribution's bindings and propagation status
    Inspect {
        /// Distribution ID or ARN
        #[arg(short, long, env = "CF_TEARDOWN_DISTRIBUTION")]
        distribution: DistributionId,

        /// AWS region for the CloudFront control plane
        #[arg(long, default_value = DEFAULT_CLOUDFRONT_REGION)]
        region: String,

        /// AWS profile to use (overrides AWS_PROFILE env var)
        #[arg(long)]
        aws_profile: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                // Reduce noise from AWS SDK (show only warnings and errors)
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?)
                .add_directive("aws_sdk_cloudfront=warn".parse()?),
        )
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    match args.command {
        Command::Teardown(teardown_args) => handle_teardown(*teardown_args).await?,
        Command::Inspect {
            distribution,
            region,
            aws_profile,
            format,
        } => handle_inspect(distribution, region, aws_profile, format).await?,
    }

    Ok(())
}

/// Handle the teardown command.
///
/// Teardown failures are reported, never turned into a non-zero exit: the
/// provisioning tool's destroy remains the authoritative cleanup path.
async fn handle_teardown(args: TeardownArgs) -> Result<()> {
    let harness = args.harness_config();
    harness.validate()?;

    if let Some(profile) = &args.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }
    let aws = AwsContext::with_profile(&args.region, args.aws_profile.as_deref()).await;
    let cloudfront = CloudFrontClient::from_context(&aws);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping at the next step boundary");
                cancel.cancel();
            }
        });
    }

    let report = TeardownOrchestrator::new(&cloudfront, args.teardown_config())
        .with_cancellation(cancel)
        .run(&args.distribution)
        .await;

    print_report_summary(&report);

    if harness.generate_report {
        let record = report.to_test_record("distribution-teardown");
        write_test_records(&harness.report_path, &[record])?;
    }

    Ok(())
}

fn print_report_summary(report: &TeardownReport) {
    println!("\n=== Teardown {} ===\n", report.distribution_id);
    println!("Final state:    {}", report.final_state());
    println!("Delete outcome: {}", report.delete_outcome);
    println!(
        "Tokens:         {}",
        report
            .tokens
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    println!("Duration:       {:.1}s", report.duration().as_secs_f64());

    if !report.failures.is_empty() {
        println!("\nFailures:");
        for failure in &report.failures {
            println!("  {:<14} {}", failure.stage, failure.error);
        }
    }
}

/// Handle the inspect command
async fn handle_inspect(
    distribution: DistributionId,
    region: String,
    aws_profile: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let aws = AwsContext::with_profile(&region, aws_profile.as_deref()).await;
    let cloudfront = CloudFrontClient::from_context(&aws);

    let snapshot = read_distribution(&cloudfront, &distribution, DEFAULT_READ_RETRIES).await?;
    let resource = &snapshot.resource;
    let needs_strip = strip(resource).changed;

    match format {
        OutputFormat::Json => {
            let origins: Vec<_> = resource
                .origins
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "id": o.id,
                        "access_control": o.access_control_binding_ref,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "id": resource.id,
                "status": resource.status,
                "enabled": resource.enabled,
                "token": snapshot.token,
                "firewall": resource.firewall_binding().to_string(),
                "firewall_policy_ref": resource.firewall_policy_ref,
                "origins": origins,
                "bindings_to_strip": needs_strip,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![Cell::new("Field"), Cell::new("Value")]);
            table.add_row(vec![Cell::new("Distribution"), Cell::new(&resource.id)]);
            table.add_row(vec![Cell::new("Status"), Cell::new(resource.status)]);
            table.add_row(vec![Cell::new("Enabled"), Cell::new(resource.enabled)]);
            table.add_row(vec![Cell::new("ETag"), Cell::new(&snapshot.token)]);
            table.add_row(vec![
                Cell::new("Web ACL"),
                Cell::new(resource.firewall_binding()),
            ]);
            table.add_row(vec![
                Cell::new("Bindings to strip"),
                Cell::new(if needs_strip { "yes" } else { "no" }),
            ]);
            println!("{table}");

            let mut origins = Table::new();
            origins
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![Cell::new("Origin"), Cell::new("Origin access control")]);
            for origin in &resource.origins {
                let binding = match origin.access_control_binding_ref.as_deref() {
                    None => "never set",
                    Some("") => "cleared",
                    Some(binding) => binding,
                };
                origins.add_row(vec![Cell::new(&origin.id), Cell::new(binding)]);
            }
            println!("{origins}");
        }
    }

    Ok(())
}
