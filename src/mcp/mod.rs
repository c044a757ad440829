//! MCP server
//!
//! Tool dispatch over stdio.

mod server;

pub use server::MacroUtilService;
