//! `picoco serve` command implementation.

use crate::config::load_config;
use crate::error::Result;
use crate::relay::{MemoryRelay, spawn_sweeper};
use crate::server::ApiServer;
use std::sync::Arc;

/// Run the serve command.
///
/// Serves the session API from an in-memory relay until the process is
/// killed. Expired sessions are swept in the background.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the address
/// cannot be bound.
pub fn run(bind: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let relay = Arc::new(MemoryRelay::new(&config.relay));
    let _sweeper = spawn_sweeper(&relay, config.server.sweep_interval());

    let addr = bind.unwrap_or(&config.server.bind);
    let server = ApiServer::bind(addr, relay, config.relay.max_payload_bytes)?;
    server.serve();
    Ok(())
}
