//! Recall MCP Server
//!
//! Exposes the Recall semantic memory store to AI agents via MCP protocol.
//!
//! ## Tools
//!
//! - `add_to_memory` - Store text (with optional metadata) in vector memory
//! - `search_memory` - Retrieve similar memories by cosine, euclidean or DTS ranking
//! - `forget_memory` - Remove one memory by id
//! - `clear_memory` - Remove all memories
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "recall": {
//!       "command": "recall-mcp",
//!       "env": { "MEMORY_FILE_PATH": "/home/me/.recall/memory_store.json" }
//!     }
//!   }
//! }
//! ```

use anyhow::{Context as AnyhowContext, Result};
use rmcp::transport::stdio;
use rmcp::ServiceExt;

pub mod config;
mod tools;

pub use config::ServerConfig;
pub use tools::{
    AddToMemoryRequest, ForgetMemoryRequest, MemoryHit, MemoryService, SearchMemoryRequest,
    SearchMethodArg,
};

pub async fn main_entry() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting Recall MCP server");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let store = config.build_store()?;

    let service = MemoryService::new(Box::new(store));
    let server = service.serve(stdio()).await?;

    // Wait for shutdown
    server.waiting().await?;

    log::info!("Recall MCP server stopped");
    Ok(())
}
