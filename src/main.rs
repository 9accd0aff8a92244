//! mail-envelope-mcp-rs: read-only MCP server for a local mail envelope index
//!
//! Exposes a desktop mail client's message-index database (an SQLite file the
//! client owns and keeps writing to) as six read-only search tools over the
//! Model Context Protocol on stdio. The table layout varies across client
//! versions and is undocumented, so every query is built against the live
//! catalog at call time.
//!
//! # Architecture
//!
//! - [`main`]: process entry point with env loading and stdio serving
//! - [`config`]: environment-driven configuration, loaded once at startup
//! - [`errors`]: structural errors plus soft per-request diagnostics
//! - [`store`]: read-only connection lifecycle for the envelope database
//! - [`schema`]: live catalog inspection (tables, views, columns, samples)
//! - [`capability`]: per-table column-capability matching
//! - [`query`]: parameterized SELECT construction and row fetching
//! - [`resolver`]: multi-stage identity lookups (sender and subject pipelines)
//! - [`report`]: deterministic text report rendering
//! - [`engine`]: the six tool operations
//! - [`models`]: tool input DTOs and schemas
//! - [`server`]: MCP tool registration and dispatch

mod capability;
mod config;
mod engine;
mod errors;
mod models;
mod query;
mod report;
mod resolver;
mod schema;
mod server;
mod store;

use config::EnvelopeConfig;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

/// Application entry point
///
/// Initializes tracing from environment, loads config, and serves the MCP
/// server over stdio. This process expects to be spawned by an MCP client
/// via the `stdio` transport.
///
/// # Environment Variables
///
/// See [`EnvelopeConfig::load_from_env`] for full configuration options.
///
/// # Example
///
/// ```no_run
/// MAIL_ENVELOPE_MAIL_DIR=/Users/me/Library/Mail \
/// MAIL_ENVELOPE_PRIMARY_ADDRESS=me@example.com \
/// cargo run
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = EnvelopeConfig::load_from_env()?;
    tracing::info!(
        mail_dir = %config.mail_dir.display(),
        primary_address = %config.primary_address,
        "mail envelope MCP server starting"
    );

    let service = server::MailEnvelopeServer::new(config).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
