//! Daemon entry point for the PBMCpedia atlas MCP server.
//!
//! Loads configuration from CLI arguments and the environment, builds the
//! upstream client, and serves the MCP protocol over stdio or streamable HTTP.

mod config;
mod upstream;

use pbmc_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::PbmcConfig;
use crate::upstream::build_control_plane;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = PbmcConfig::from_args()?;

    // stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .with_writer(std::io::stderr)
        .init();

    let control = build_control_plane(&config)?;
    info!(
        api_url = control.urls().api_url(),
        docs_url = control.urls().docs_url(),
        "upstream atlas configured"
    );

    if config.enable_stdio {
        serve_stdio(control).await
    } else {
        let http_config =
            McpHttpServerConfig::new(config.mcp_http_addr).with_stateful_mode(config.mcp_stateful);
        serve_streamable_http(control, http_config).await
    }
}
