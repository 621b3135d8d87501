//! Clients for the session API.

use crate::api::{
    self, ApiRequest, CreateImageBody, CreateImageResponse, GetImageResponse, IMAGE_PATH, Method,
};
use crate::error::{Error, Result};
use crate::media::CanonicalImage;
use crate::relay::RelayStore;
use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

/// Access to the session API, local or remote.
pub trait SessionApi {
    /// Fetch the image stored under `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or expired session, `Upstream` for
    /// any other failure status, or a transport error.
    fn fetch(&self, session_id: &str) -> Result<CanonicalImage>;

    /// Store an image and return its new session identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` when the body carries no image, `Upstream`
    /// for any other failure status, or a transport error.
    fn upload(&self, body: &CreateImageBody) -> Result<String>;
}

/// Map a `GET /api/image` status and body to an image.
///
/// # Errors
///
/// See [`SessionApi::fetch`].
pub fn parse_fetch_response(session_id: &str, status: u16, body: Value) -> Result<CanonicalImage> {
    match status {
        200..=299 => {
            let parsed: GetImageResponse = serde_json::from_value(body)?;
            parsed
                .image_data
                .filter(|s| !s.is_empty())
                .or_else(|| parsed.image_url.filter(|s| !s.is_empty()))
                .map(|payload| CanonicalImage::from_payload(&payload))
                .ok_or_else(|| Error::Upstream("session response carried no image".to_string()))
        }
        404 => Err(Error::NotFound(session_id.to_string())),
        _ => Err(Error::Upstream(format!(
            "session fetch failed ({status}): {}",
            error_message(&body)
        ))),
    }
}

/// Map a `POST /api/image` status and body to a session identifier.
///
/// # Errors
///
/// See [`SessionApi::upload`].
pub fn parse_upload_response(status: u16, body: Value) -> Result<String> {
    match status {
        200..=299 => {
            let parsed: CreateImageResponse = serde_json::from_value(body)?;
            if parsed.success && !parsed.session_id.is_empty() {
                Ok(parsed.session_id)
            } else {
                Err(Error::Upstream("upload response carried no session".to_string()))
            }
        }
        400 => Err(Error::InvalidPayload(error_message(&body))),
        _ => Err(Error::Upstream(format!(
            "image upload failed ({status}): {}",
            error_message(&body)
        ))),
    }
}

fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .map_or_else(|| body.to_string(), str::to_string)
}

/// Session API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    http: Client,
    endpoint: Url,
}

impl HttpSessionClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the URL is invalid, or an HTTP error if the client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join(IMAGE_PATH))
            .map_err(|e| Error::Config(format!("invalid session API url {base_url}: {e}")))?;
        Ok(Self {
            http: Client::builder().build()?,
            endpoint,
        })
    }

    /// URL of the image endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn read_json(response: reqwest::blocking::Response) -> Result<(u16, Value)> {
    let status = response.status().as_u16();
    let text = response.text()?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok((status, body))
}

impl SessionApi for HttpSessionClient {
    fn fetch(&self, session_id: &str) -> Result<CanonicalImage> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("sessionId", session_id)])
            .send()?;
        let (status, body) = read_json(response)?;
        debug!(%session_id, status, "session fetch");
        parse_fetch_response(session_id, status, body)
    }

    fn upload(&self, body: &CreateImageBody) -> Result<String> {
        let response = self.http.post(self.endpoint.clone()).json(body).send()?;
        let (status, body) = read_json(response)?;
        debug!(status, "session upload");
        parse_upload_response(status, body)
    }
}

/// Session API served in-process by [`api::handle`].
pub struct InProcessSessionApi<'a> {
    store: &'a dyn RelayStore,
}

impl<'a> InProcessSessionApi<'a> {
    /// Wrap a relay store.
    #[must_use]
    pub fn new(store: &'a dyn RelayStore) -> Self {
        Self { store }
    }
}

impl SessionApi for InProcessSessionApi<'_> {
    fn fetch(&self, session_id: &str) -> Result<CanonicalImage> {
        let mut request = ApiRequest::new(Method::Get, IMAGE_PATH, None)?;
        request
            .query
            .insert("sessionId".to_string(), session_id.to_string());
        let response = api::handle(&request, self.store);
        parse_fetch_response(
            session_id,
            response.status,
            response.body.unwrap_or(Value::Null),
        )
    }

    fn upload(&self, body: &CreateImageBody) -> Result<String> {
        let request = ApiRequest::new(
            Method::Post,
            IMAGE_PATH,
            Some(serde_json::to_string(body)?),
        )?;
        let response = api::handle(&request, self.store);
        parse_upload_response(response.status, response.body.unwrap_or(Value::Null))
    }
}
