//! Ping Demo
//!
//! Walks through both dispatch paths of the mediator:
//!
//! 1. `Ping` is published to two handlers, `PongA` and `PongB`
//! 2. `Whoami` is sent before and after its handler is registered
//! 3. With `--flaky`, a third `Ping` handler fails and the aggregate
//!    failure is printed
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-demo -- --flaky
//! CONDUIT_LOGGING__LEVEL=debug cargo run --package ping-demo
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use conduit::prelude::*;
use conduit::runtime::ConduitRuntime;
use tracing::{error, info, warn};

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Event)]
struct Ping;

#[derive(Debug, Request)]
#[request(response = Identity)]
struct Whoami;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    id: String,
}

// ============================================================================
// Handlers
// ============================================================================

struct PongA;

#[async_trait]
impl EventHandler<Ping> for PongA {
    async fn handle_event(&self, _: &Ping, _ct: CancellationToken) -> Result<(), BoxError> {
        info!("Pong from A");
        Ok(())
    }
}

struct PongB;

#[async_trait]
impl EventHandler<Ping> for PongB {
    async fn handle_event(&self, _: &Ping, ct: CancellationToken) -> Result<(), BoxError> {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(20)) => {
                info!("Pong from B");
                Ok(())
            }
            _ = ct.cancelled() => Err("pong B cancelled".into()),
        }
    }
}

struct WhoamiHandler;

#[async_trait]
impl RequestHandler<Whoami> for WhoamiHandler {
    async fn handle_request(&self, _: Whoami, _ct: CancellationToken) -> Result<Identity, BoxError> {
        Ok(Identity { id: "abc".into() })
    }
}

// ============================================================================
// Main
// ============================================================================

#[derive(Debug, Parser)]
#[command(about = "Ping/Whoami walkthrough of the Conduit mediator")]
struct Cli {
    /// Configuration file (defaults to ./conduit.toml if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Register a Ping handler that always fails.
    #[arg(long)]
    flaky: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut runtime = ConduitRuntime::builder();
    if let Some(path) = &cli.config {
        runtime = runtime.config_file(path);
    }
    let runtime = runtime.build()?;
    runtime.init_logging()?;

    // Whoami before any handler is registered.
    let bare = runtime.registry_builder().build();
    let mediator = bare
        .mediator()
        .ok_or_else(|| anyhow::anyhow!("mediator not registered"))?;
    match mediator.send(Whoami).await {
        Ok(identity) => info!(?identity, "Unexpected answer"),
        Err(e) if e.is::<NoHandlerFound>() => warn!("Whoami has no handler yet: {e}"),
        Err(e) => return Err(anyhow::anyhow!(e)),
    }

    let mut builder = runtime
        .registry_builder()
        .add_event_handler::<Ping, _>(PongA)
        .add_event_handler::<Ping, _>(PongB)
        .add_request_handler::<Whoami, _>(WhoamiHandler)?;
    if cli.flaky {
        builder = builder.add_event_handler::<Ping, _>(
            event_handler_fn(|_: Ping, _| async { Err::<(), BoxError>("pong C is down".into()) })
                .named("PongC"),
        );
    }
    let registry = builder.build();
    let mediator = registry
        .mediator()
        .ok_or_else(|| anyhow::anyhow!("mediator not registered"))?;

    match mediator.publish(&Ping).await {
        Ok(()) => info!("Ping delivered to every handler"),
        Err(e) => match e.downcast::<AggregateHandlerFailure>() {
            Ok(aggregate) => {
                for failure in aggregate.failures() {
                    error!(handler = failure.handler(), "Ping handler failed: {}", failure.error());
                }
            }
            Err(e) => return Err(anyhow::anyhow!(e)),
        },
    }

    let identity = mediator.send(Whoami).await.map_err(|e| anyhow::anyhow!(e))?;
    info!(id = %identity.id, "Whoami answered");

    Ok(())
}
