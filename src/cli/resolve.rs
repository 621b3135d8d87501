//! `picoco resolve` command implementation.

use crate::cli::open_durable;
use crate::config::load_config;
use crate::error::Result;
use crate::kv::MemoryKv;
use crate::resolver::{HostOutcome, Resolution, Resolver};
use crate::session_client::HttpSessionClient;
use serde_json::{Value, json};
use std::fs;
use std::io::{self, Read};

/// Run the resolve command.
///
/// Walks the fallback chain (session, volatile cache, durable cache) and,
/// if nothing is found, applies the host message when one is given. Prints
/// the outcome as JSON.
///
/// # Errors
///
/// Returns an error if configuration, storage, or the host message file
/// cannot be read.
pub fn run(session_id: Option<&str>, host_message: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let sessions = HttpSessionClient::new(&config.resolver.api_base_url)?;
    // One invocation is one page load; the volatile cache lives that long.
    let volatile = MemoryKv::new();
    let durable = open_durable(&config)?;

    let mut resolver = Resolver::new(
        &sessions,
        &volatile,
        &durable,
        config.resolver.cache_threshold_bytes,
    );

    let message = host_message.map(read_host_message).transpose()?;
    let report = match (resolver.resolve(session_id), message) {
        (Resolution::Resolved(resolved), _) => json!({ "status": "resolved", "image": resolved }),
        (Resolution::AwaitingHost, None) => json!({ "status": "awaiting_host" }),
        (Resolution::AwaitingHost, Some(message)) => match resolver.on_host_message(&message) {
            HostOutcome::Loaded(resolved) => json!({ "status": "resolved", "image": resolved }),
            HostOutcome::Ignored => json!({ "status": "ignored" }),
            HostOutcome::Dropped(reason) => json!({ "status": "dropped", "reason": reason }),
        },
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Read a host message from a file, or stdin for `-`.
fn read_host_message(source: &str) -> Result<Value> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(source)?
    };
    Ok(parse_host_message(&raw))
}

/// JSON if it parses, otherwise the trimmed text as a string.
fn parse_host_message(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.trim().to_string()))
}
