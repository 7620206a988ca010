//! # HRCTL CLI
//!
//! Command-line interface for inspecting HelmRelease resources.
//!
//! ## Usage
//!
//! ```bash
//! # Recompute the Ready condition of a HelmRelease manifest
//! hrctl summarize --file podinfo.yaml
//!
//! # Show status of a HelmRelease
//! hrctl status --namespace apps --name podinfo
//!
//! # Print the HelmRelease CustomResourceDefinition
//! hrctl crd
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use helm_release_controller::observability::logging::init_tracing;
use helm_release_controller::reconcile::summarize;
use helm_release_controller::HelmRelease;
use kube::{Api, Client, CustomResourceExt};
use std::io::Read;
use std::path::{Path, PathBuf};

/// HelmRelease controller CLI
#[derive(Debug, Parser)]
#[command(name = "hrctl")]
#[command(about = "HelmRelease controller CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Recompute the Ready condition of a HelmRelease manifest
    Summarize {
        /// Path to the HelmRelease manifest; `-` reads from stdin
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show status of a HelmRelease resource
    Status {
        /// Name of the HelmRelease resource
        #[arg(long)]
        name: String,

        /// Namespace of the HelmRelease resource
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
    /// Print the HelmRelease CustomResourceDefinition
    Crd,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Summarize { file } => summarize_command(&file),
        Commands::Status { name, namespace } => status_command(&name, &namespace).await,
        Commands::Crd => crd_command(),
    }
}

/// Print the conditions of a manifest after recomputing Ready
fn summarize_command(file: &Path) -> Result<()> {
    let manifest = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read HelmRelease from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?
    };

    let mut obj: HelmRelease = serde_yaml::from_str(&manifest)
        .with_context(|| format!("Failed to parse HelmRelease from {}", file.display()))?;
    summarize(&mut obj);

    let conditions = obj.status.map(|s| s.conditions).unwrap_or_default();
    print!(
        "{}",
        serde_yaml::to_string(&conditions).context("Failed to serialize conditions")?
    );
    Ok(())
}

/// Show detailed status of a HelmRelease resource
async fn status_command(name: &str, namespace: &str) -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {e:?}"))?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    let api: Api<HelmRelease> = Api::namespaced(client, namespace);
    let obj = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get HelmRelease '{namespace}/{name}'"))?;

    println!("Status for HelmRelease '{namespace}/{name}':\n");
    println!("Release:");
    println!("  Name: {}", obj.release_name());
    println!("  Namespace: {}", obj.release_namespace());
    println!("  Storage Namespace: {}", obj.storage_namespace());
    match obj.spec.chart.version.as_deref() {
        Some(version) => println!("  Chart: {}@{}", obj.spec.chart.name, version),
        None => println!("  Chart: {}", obj.spec.chart.name),
    }

    let Some(status) = obj.status else {
        println!("\nStatus: No status available (resource may not have been reconciled yet)");
        return Ok(());
    };

    println!("\nStatus:");
    println!("  Observed Generation: {}", status.observed_generation);
    if let Some(action) = status.last_attempted_release_action {
        println!("  Last Attempted Action: {action}");
    }
    println!("  Failures: {}", status.failures);
    println!("  Install Failures: {}", status.install_failures);
    println!("  Upgrade Failures: {}", status.upgrade_failures);

    if !status.history.is_empty() {
        println!("\nHistory:");
        for snapshot in status.history.iter().rev() {
            println!(
                "  {} {} ({})",
                snapshot.full_release_name(),
                snapshot.versioned_chart_name(),
                snapshot.status
            );
        }
    }

    if !status.conditions.is_empty() {
        println!("\nConditions:");
        for condition in &status.conditions {
            println!("  {}: {}", condition.r#type, condition.status);
            println!("    Reason: {}", condition.reason);
            println!("    Message: {}", condition.message);
            if let Some(ref time) = condition.last_transition_time {
                println!("    Last Transition: {time}");
            }
        }
    }

    Ok(())
}

/// Print the CustomResourceDefinition as YAML
fn crd_command() -> Result<()> {
    print!(
        "{}",
        serde_yaml::to_string(&HelmRelease::crd()).context("Failed to serialize CRD")?
    );
    Ok(())
}
