//! The Aquae daemon: one accept loop per configured listener, one worker
//! per accepted connection, all listeners on one federation snapshot per
//! metadata file.
//!
//! Usage: `aquaed <configuration-file>`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use aquae_config::DaemonConfig;
use aquaed::listener;

#[derive(Parser)]
#[command(name = "aquaed", about = "An Aquae federation node daemon")]
struct Args {
    /// Path to the daemon configuration file.
    config_file: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Argument misuse exits 1, not clap's default 2.
            let _ = err.print();
            return ExitCode::from(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    eprintln!("aquaed v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("An Aquae federation node daemon");
    eprintln!();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = DaemonConfig::load(&args.config_file)?;
    let bindings = config.resolve()?;

    if bindings.is_empty() {
        anyhow::bail!("configuration declares no listeners");
    }

    let mut handles = Vec::with_capacity(bindings.len());
    for binding in bindings {
        handles.push(tokio::spawn(listener::serve(binding)));
    }

    for handle in handles {
        handle.await.context("listener task panicked")??;
    }
    Ok(())
}
