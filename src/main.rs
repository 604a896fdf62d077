// src/main.rs

// dependencies
use anyhow::Context;
use clap::{CommandFactory, Parser};
use static_serve::cli::CliArgs;
use static_serve::urls::reachable_urls;
use static_serve::{Server, StartupError, StaticServer};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run(CliArgs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(StartupError::IncompleteTls) = err.downcast_ref::<StartupError>() {
                eprintln!("{err}");
                // best effort; we're already exiting with an error
                let _ = CliArgs::command().print_help();
            } else {
                tracing::error!("{err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> anyhow::Result<()> {
    let (serve_config, listen_config) = args.into_configs()?;

    let handler = StaticServer::from_config(serve_config)?;
    tracing::debug!(config = ?handler.config(), "effective configuration");

    let server = Server::bind(handler.clone(), &listen_config).await?;
    let addr = server
        .local_addr()
        .context("couldn't read the bound address")?;

    println!("Serving {}", handler.root_dir().display());
    println!("Available on:");
    for url in reachable_urls(addr, server.is_tls()) {
        println!("  {url}");
    }

    server
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", env!("CARGO_CRATE_NAME"))));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
