//! Model Context Protocol server for mdatlas.
//!
//! Exposes document structure, section content, search, statistics and
//! tables of contents as MCP tools, and every allowed document as a pair of
//! resources, over line-delimited JSON-RPC 2.0.

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use protocol::{JsonRpcRequest, JsonRpcResponse, ToolResult};
pub use server::McpServer;
