//! kubedef CLI - discover Kubernetes schemas and evaluate manifests against them

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;

mod commands;
mod exit_codes;

#[derive(Parser)]
#[command(name = "kubedef")]
#[command(version)]
#[command(about = "Typed packages for every Kubernetes kind, built-in or custom", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    discovery: DiscoveryArgs,
}

/// Where discovered (CRD-backed) packages come from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DiscoveryArgs {
    /// List CRDs from the cluster in the current kubeconfig context
    #[arg(long, global = true)]
    pub cluster: bool,

    /// Read CRD manifests from a file or directory (repeatable)
    #[arg(long = "crds", value_name = "DIR", global = true)]
    pub crds: Vec<PathBuf>,

    /// Configuration file (default: ~/.config/kubedef/config.yaml)
    #[arg(long, global = true, env = "KUBEDEF_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List importable packages and the definitions they export
    Packages {
        /// Only show packages whose path starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Evaluate a manifest and print the structured result
    Eval {
        /// Manifest file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },

    /// Refresh discovered packages periodically until interrupted
    Watch {
        /// Seconds between refreshes (default: refresh.interval from the configuration)
        #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Check whether a kind is known (`v1/Service`, `apps/v1/Deployment`)
    Exists {
        gvk: String,
    },
}

fn init_tracing() {
    let env = std::env::var("KUBEDEF_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_panic_hook();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Packages { prefix } => {
            commands::packages::run(&cli.discovery, prefix.as_deref()).await
        }
        Commands::Eval { file, output } => commands::eval::run(&cli.discovery, &file, output).await,
        Commands::Watch { interval } => {
            commands::watch::run(&cli.discovery, interval.map(Duration::from_secs)).await
        }
        Commands::Exists { gvk } => {
            let known = commands::exists::run(&cli.discovery, &gvk).await?;
            if !known {
                std::process::exit(exit_codes::NOT_FOUND);
            }
            Ok(())
        }
    }
}
