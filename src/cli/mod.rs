//! Command-line interface for running PseudoFlow flows directly,
//! outside the operator's watch loop — useful for local development and
//! CI smoke tests of a flow document.

use crate::config::Config;
use crate::dsl::parse_flow_file;
use crate::engine::Engine;
use crate::model::FlowSpec;
use crate::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "pseudoflow", version, about = "Run PseudoFlow flow documents against a Kubernetes cluster")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a flow document and report errors without executing it.
    Validate {
        /// Path to the flow YAML/JSON file.
        path: PathBuf,
    },
    /// Execute a flow document.
    Run {
        /// Path to the flow YAML/JSON file.
        path: PathBuf,
        /// Namespace the flow acts in (defaults to the operator namespace).
        #[arg(long)]
        namespace: Option<String>,
        /// Run against an in-memory fake cluster instead of a real one.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Main CLI entry point.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            let flow = parse_flow_file(&path)?;
            println!("ok: {} top-level step(s)", flow.steps.len());
            Ok(())
        }
        Commands::Run { path, namespace, dry_run } => run_flow(&path, namespace, dry_run).await,
    }
}

async fn run_flow(path: &std::path::Path, namespace: Option<String>, dry_run: bool) -> Result<()> {
    let flow: FlowSpec = parse_flow_file(path)?;

    let engine = if dry_run {
        Engine::for_testing()
    } else {
        let client = kube::Client::try_default()
            .await
            .map_err(|e| crate::EngineError::internal(format!("failed to build kube client: {e}")))?;
        Engine::new(Arc::new(crate::kube::KubeClusterApi::new(client)), Config::from_env())
    };

    let (result, outcome) = engine.execute_flow(&flow, namespace).await;
    println!("{}", result.summary);

    outcome
}
