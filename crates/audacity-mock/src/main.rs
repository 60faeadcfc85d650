//! audacity-mock: stand-in for Audacity's scripting pipes
//!
//! Creates the endpoints a client expects and answers commands with canned
//! replies, so scripts can be tried without a running editor.

use anyhow::{Context, Result};
use audacity_core::EndpointPair;
use audacity_mock::{MockServer, MockState};
use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "audacity-mock", version, about = "Serve canned mod-script-pipe replies")]
struct Args {
    /// Directory for the FIFOs (ignored on Windows)
    #[arg(long, env = "AUDACITY_PIPE_DIR", default_value = "/tmp")]
    pipe_dir: PathBuf,

    /// Serve one client, then exit
    #[arg(long)]
    once: bool,

    /// Log wire traffic
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let endpoints = endpoints(&args);
    info!("Starting audacity-mock on {}", endpoints);

    loop {
        let server = MockServer::start(endpoints.clone())
            .await
            .context("Failed to create the mock endpoints")?;

        let mut state = server.subscribe();
        tokio::select! {
            _ = state.wait_for(|s| *s == MockState::Stopped) => {
                server.join().await.context("Mock server failed")?;
                info!("Client disconnected");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, removing endpoints");
                return server.shutdown().await.context("Mock server failed");
            }
        }

        if args.once {
            return Ok(());
        }
    }
}

#[cfg(unix)]
fn endpoints(args: &Args) -> EndpointPair {
    EndpointPair::fifo_for_current_user(&args.pipe_dir)
}

#[cfg(windows)]
fn endpoints(_args: &Args) -> EndpointPair {
    EndpointPair::named_pipes()
}
