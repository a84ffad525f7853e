//! JSON-RPC server of the node.

mod errors;
mod params;
mod server;

use anyhow::{anyhow, Result};
use drivechain_rpc_api::ScdbApiServer;
use jsonrpsee::{
    server::{ServerBuilder, ServerHandle},
    RpcModule,
};
use server::ScdbRpcServer;
use tracing::info;

use crate::context::NodeContext;

/// Starts the RPC server on the configured address and returns its handle.
pub(crate) async fn start_rpc(ctx: &NodeContext) -> Result<ServerHandle> {
    let mut module = RpcModule::new(());

    let scdb_server = ScdbRpcServer::new(
        ctx.consensus.clone(),
        ctx.archive.clone(),
        ctx.config.scdb.network,
        ctx.config.scdb.subsidy_halving_interval,
    );
    module
        .merge(scdb_server.into_rpc())
        .map_err(|e| anyhow!("Failed to merge SCDB RPC module: {e}"))?;

    let addr = format!("{}:{}", ctx.config.client.rpc_host, ctx.config.client.rpc_port);
    let rpc_server = ServerBuilder::new()
        .build(&addr)
        .await
        .map_err(|e| anyhow!("Failed to build RPC server on {addr}: {e}"))?;
    let local_addr = rpc_server.local_addr()?;

    let handle = rpc_server.start(module);
    info!(%local_addr, "rpc: listening");
    Ok(handle)
}
