//! Ordered fallback chain for page-entry image resolution.

use crate::api::CreateImageBody;
use crate::error::{Error, Result};
use crate::kv::{CURRENT_IMAGE_KEY, KeyValueStore, UPLOADED_IMAGE_KEY};
use crate::media::{self, CanonicalImage};
use crate::resolver::host::{HostBridge, HostOutcome, HostPayload};
use crate::session_client::SessionApi;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Where a resolved image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// Session API lookup.
    Session,
    /// Same-tab volatile cache.
    VolatileCache,
    /// Durable cross-session cache.
    DurableCache,
    /// Host runtime push message.
    HostMessage,
}

/// Outcome of the opportunistic volatile-cache write.
///
/// Never affects whether resolution succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CacheWrite {
    /// Payload copied into the volatile cache.
    Stored,
    /// Payload not eligible (a URL, or over the size threshold).
    Skipped,
    /// The write failed; the cache benefit is lost.
    Failed(String),
    /// This source does not populate the cache.
    NotAttempted,
}

/// A successfully resolved image.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved {
    /// The image.
    pub image: CanonicalImage,
    /// Source that produced it.
    pub source: ImageSource,
    /// Session the image was read from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Best-effort cache result.
    pub cache: CacheWrite,
}

/// Result of running the fallback chain.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// An image is available.
    Resolved(Resolved),
    /// No source had an image; only host messages can supply one now.
    AwaitingHost,
}

/// Per-page image resolver.
///
/// Holds the "already resolved" guard: once an image is set, host messages
/// are ignored until [`Resolver::retake`] clears it.
pub struct Resolver<'a> {
    sessions: &'a dyn SessionApi,
    volatile: &'a dyn KeyValueStore,
    durable: &'a dyn KeyValueStore,
    bridge: Option<&'a dyn HostBridge>,
    cache_threshold_bytes: usize,
    current: Option<Resolved>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the given sources.
    #[must_use]
    pub fn new(
        sessions: &'a dyn SessionApi,
        volatile: &'a dyn KeyValueStore,
        durable: &'a dyn KeyValueStore,
        cache_threshold_bytes: usize,
    ) -> Self {
        Self {
            sessions,
            volatile,
            durable,
            bridge: None,
            cache_threshold_bytes,
            current: None,
        }
    }

    /// Attach the host bridge used by [`Resolver::retake`].
    #[must_use]
    pub fn with_bridge(mut self, bridge: &'a dyn HostBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// The image currently loaded, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Resolved> {
        self.current.as_ref()
    }

    /// Run the fallback chain, stopping at the first source with an image.
    ///
    /// Failures of individual sources are logged and skipped.
    pub fn resolve(&mut self, session_id: Option<&str>) -> Resolution {
        if let Some(current) = &self.current {
            return Resolution::Resolved(current.clone());
        }

        let found = session_id
            .filter(|id| !id.is_empty())
            .and_then(|id| self.from_session(id))
            .or_else(|| self.from_volatile())
            .or_else(|| self.from_durable());

        match found {
            Some(resolved) => {
                info!(source = ?resolved.source, len = resolved.image.len(), "image resolved");
                self.current = Some(resolved.clone());
                Resolution::Resolved(resolved)
            }
            None => {
                info!("no image available, waiting for host message");
                Resolution::AwaitingHost
            }
        }
    }

    /// Apply a message pushed by the host runtime.
    pub fn on_host_message(&mut self, message: &Value) -> HostOutcome {
        if self.current.is_some() {
            debug!("image already loaded, ignoring host message");
            return HostOutcome::Ignored;
        }

        let payload = HostPayload::classify(message);
        let loaded = match payload {
            HostPayload::DataUrl(data)
            | HostPayload::Base64Object(data)
            | HostPayload::RawBase64(data)
            | HostPayload::Lenient(data) => Ok(Resolved {
                image: CanonicalImage::Data(data),
                source: ImageSource::HostMessage,
                session_id: None,
                cache: CacheWrite::NotAttempted,
            }),
            HostPayload::RemoteUrl(url) => self.relay(&CreateImageBody::url(url)),
            HostPayload::FilePath(path) => media::read_file_as_data_url(&path)
                .and_then(|data| self.relay(&CreateImageBody::data(data))),
            HostPayload::Unrecognized(why) => Err(Error::MalformedHostMessage(why)),
        };

        match loaded {
            Ok(resolved) => {
                info!(session_id = ?resolved.session_id, len = resolved.image.len(), "image loaded from host message");
                self.current = Some(resolved.clone());
                HostOutcome::Loaded(resolved)
            }
            Err(e) => {
                warn!(error = %e, "dropping host message");
                HostOutcome::Dropped(e.to_string())
            }
        }
    }

    /// Ask the host for a new photo and reopen the guard.
    ///
    /// # Errors
    ///
    /// Returns `BridgeUnavailable` with no bridge attached, or the bridge's
    /// own error. The current image is kept on failure.
    pub fn retake(&mut self) -> Result<()> {
        let bridge = self.bridge.ok_or(Error::BridgeUnavailable)?;
        bridge.request_capture()?;
        self.current = None;
        if let Err(e) = self.volatile.remove(CURRENT_IMAGE_KEY) {
            warn!(error = %e, "failed to clear volatile image cache");
        }
        Ok(())
    }

    /// Upload through the session API and read back the fresh session.
    fn relay(&self, body: &CreateImageBody) -> Result<Resolved> {
        let session_id = self.sessions.upload(body)?;
        debug!(%session_id, "host image relayed");
        let image = self.sessions.fetch(&session_id)?;
        Ok(Resolved {
            cache: self.cache(&image),
            image,
            source: ImageSource::Session,
            session_id: Some(session_id),
        })
    }

    fn from_session(&self, session_id: &str) -> Option<Resolved> {
        match self.sessions.fetch(session_id) {
            Ok(image) if media::is_accepted_image(image.as_str()) => Some(Resolved {
                cache: self.cache(&image),
                image,
                source: ImageSource::Session,
                session_id: Some(session_id.to_string()),
            }),
            Ok(image) => {
                warn!(%session_id, preview = media::preview(image.as_str(), 30), "session payload has unexpected form");
                None
            }
            Err(e) => {
                warn!(%session_id, error = %e, "session lookup failed");
                None
            }
        }
    }

    fn from_volatile(&self) -> Option<Resolved> {
        match self.volatile.get(CURRENT_IMAGE_KEY) {
            Ok(Some(data)) if media::is_image_data_url(&data) => Some(Resolved {
                image: CanonicalImage::Data(data),
                source: ImageSource::VolatileCache,
                session_id: None,
                cache: CacheWrite::NotAttempted,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "volatile cache read failed");
                None
            }
        }
    }

    fn from_durable(&self) -> Option<Resolved> {
        match self.durable.get(UPLOADED_IMAGE_KEY) {
            Ok(Some(payload)) if !payload.trim().is_empty() => Some(Resolved {
                image: CanonicalImage::from_payload(payload.trim()),
                source: ImageSource::DurableCache,
                session_id: None,
                cache: CacheWrite::NotAttempted,
            }),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "durable cache read failed");
                None
            }
        }
    }

    /// Copy small data payloads into the volatile cache.
    fn cache(&self, image: &CanonicalImage) -> CacheWrite {
        let CanonicalImage::Data(data) = image else {
            return CacheWrite::Skipped;
        };
        if data.len() >= self.cache_threshold_bytes {
            return CacheWrite::Skipped;
        }
        match self.volatile.set(CURRENT_IMAGE_KEY, data) {
            Ok(()) => CacheWrite::Stored,
            Err(e) => {
                debug!(error = %e, "volatile cache write failed");
                CacheWrite::Failed(e.to_string())
            }
        }
    }
}
