//! Drivechain node binary entrypoint.

use anyhow::{anyhow, Result};
use argh::from_env;
use drivechain_common::logging;
use drivechain_config::Config;
use tokio::runtime;
use tracing::info;

use crate::{args::Args, context::init_node_context, errors::InitError, rpc::start_rpc};

mod args;
mod config;
mod context;
mod errors;
mod rpc;

fn main() -> Result<()> {
    let args: Args = from_env();

    let config = config::get_config(&args)
        .map_err(|e| anyhow!("Failed to load configuration: {e}"))?;

    let rt = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("drivechain-rt")
        .build()
        .map_err(InitError::RuntimeBuild)?;

    init_logging(&config);

    let nodectx = init_node_context(config)
        .map_err(|e| anyhow!("Failed to initialize node context: {e}"))?;

    rt.block_on(async {
        let handle = start_rpc(&nodectx).await?;

        tokio::signal::ctrl_c().await?;
        info!("received shutdown signal");

        handle.stop()?;
        handle.stopped().await;
        Ok::<_, anyhow::Error>(())
    })?;

    info!("Exiting drivechain-node");
    Ok(())
}

fn init_logging(config: &Config) {
    logging::init_logging_from_config(logging::LoggingInitConfig {
        service_name: "drivechain-node",
        log_dir: config.logging.log_dir.as_ref(),
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: "drivechain",
    });
}
