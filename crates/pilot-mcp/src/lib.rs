//! MCP (Model Context Protocol) server for backlog-pilot.
//!
//! Exposes the backlog selector to AI assistants as tools over
//! newline-delimited JSON-RPC on stdin/stdout.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod transport;

pub use handlers::ToolHandler;
pub use server::McpServer;
pub use transport::StdioTransport;
