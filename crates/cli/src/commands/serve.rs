//! Serve command handler.
//!
//! Runs the MCP server on stdin/stdout until the client closes stdin.

use clap::Args;
use mdatlas_core::{config::AppConfig, AppResult};
use mdatlas_mcp::McpServer;

/// Run the MCP server over stdio
#[derive(Args, Debug)]
pub struct ServeCommand {}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        tracing::debug!("Serving documents under {}", config.base_dir.display());

        let server = McpServer::new(config)?;
        server.serve_stdio().await
    }
}
