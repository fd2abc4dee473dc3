//! MCP OAuth Gateway
//!
//! A Model Context Protocol (MCP) server that is also its own OAuth 2.0
//! authorization server. Agents obtain a bearer token through the
//! authorization-code flow, then call tools over JSON-RPC on `/mcp`.
//!
//! # Features
//!
//! - **Embedded authorization server**: authorize, token, userinfo, revoke, discovery
//! - **Bearer gate**: every non-OAuth path requires a live access token
//! - **Tool dispatch**: `initialize`, `tools/list`, `tools/call`
//! - **Document tools**: passage search over a processed-documents directory
//!
//! # Example
//!
//! ```no_run
//! use mcp_oauth_gateway::{config::Config, server::Gateway, tools::register_all_tools};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let tools = register_all_tools(None)?;
//!
//!     Gateway::new(config, tools).run_http().await
//! }
//! ```

pub mod clock;
pub mod config;
pub mod corpus;
pub mod error;
pub mod models;
pub mod server;
pub mod tools;

pub use config::Config;
pub use error::{CollaboratorError, OAuthError, ToolError};
pub use server::Gateway;
