//! picoco - photo-to-vocabulary study core.
//!
//! A photo is relayed between pages through a short-lived session store,
//! resolved on the study page through a fallback chain, sent to an AI
//! analysis endpoint, and turned into vocabulary, phrase, and dialogue
//! cards that can be starred.

pub mod analysis;
pub mod api;
pub mod bookmarks;
pub mod cli;
pub mod config;
pub mod error;
pub mod kv;
pub mod media;
pub mod relay;
pub mod resolver;
pub mod server;
pub mod session_client;

pub use config::Config;
pub use error::{Error, Result};
