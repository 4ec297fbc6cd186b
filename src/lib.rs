//! PseudoFlow - a Kubernetes operator that drives declarative flow
//! documents to completion against a cluster.
//!
//! This library provides:
//! - The flow execution engine: a step dispatcher, control-flow
//!   combinators (sequence, conditional, loop, parallel, retry, error
//!   handler, sub-flow inclusion), and the per-flow variable/templating
//!   model.
//! - A `ClusterApi` abstraction over the Kubernetes API, with a real
//!   client-backed implementation and an in-memory fake for tests.
//! - A reconcile contract translating a run's outcome into the
//!   `PseudoFlow` custom resource's observed status.
//! - A CLI for running flows directly, outside the operator loop.
//!
//! # Example
//!
//! ```rust,no_run
//! use pseudoflow::dsl::parse_flow_file;
//! use pseudoflow::engine::Engine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flow = parse_flow_file("flow.yaml")?;
//!     let engine = Engine::connect().await?;
//!     let (result, outcome) = engine.execute_flow(&flow, None).await;
//!     outcome?;
//!     println!("{}", result.summary);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod kube;
pub mod model;
pub mod reconcile;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use model::{Context, FlowSpec, RunResult, Step};

/// Initialize logging for the application.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pseudoflow=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
