//! Image ingestion: find the photo a learning page should show.
//!
//! Sources are tried in a fixed order (session API, volatile cache, durable
//! cache), then the resolver waits for the host runtime to push an image.

pub mod chain;
pub mod host;

pub use chain::{CacheWrite, ImageSource, Resolution, Resolved, Resolver};
pub use host::{HostBridge, HostOutcome, HostPayload};
