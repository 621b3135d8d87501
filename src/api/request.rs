//! API request parsing.

use crate::error::{Error, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `OPTIONS` (CORS preflight)
    Options,
    /// Anything else.
    Other,
}

impl Method {
    /// Parse a method name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "OPTIONS" => Self::Options,
            _ => Self::Other,
        }
    }
}

/// A request to the session API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Request method.
    pub method: Method,

    /// Path without query string.
    pub path: String,

    /// Decoded query parameters (last value wins).
    pub query: HashMap<String, String>,

    /// Raw request body.
    pub body: Option<String>,
}

impl ApiRequest {
    /// Build a request from a method and a request target such as
    /// `/api/image?sessionId=...`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the target cannot be parsed.
    pub fn new(method: Method, target: &str, body: Option<String>) -> Result<Self> {
        let url = Url::parse("http://localhost")
            .and_then(|base| base.join(target))
            .map_err(|e| Error::InvalidState(format!("bad request target {target}: {e}")))?;
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self {
            method,
            path: url.path().to_string(),
            query,
            body,
        })
    }

    /// A query parameter, ignoring empty values.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Body of `POST /api/image`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageBody {
    /// Data URL or raw base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,

    /// Remote or file URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CreateImageBody {
    /// Body carrying image data.
    #[must_use]
    pub fn data(image_data: impl Into<String>) -> Self {
        Self {
            image_data: Some(image_data.into()),
            image_url: None,
        }
    }

    /// Body carrying an image URL.
    #[must_use]
    pub fn url(image_url: impl Into<String>) -> Self {
        Self {
            image_data: None,
            image_url: Some(image_url.into()),
        }
    }

    /// The payload to store: the URL when present, else the data.
    ///
    /// Empty strings count as absent.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.is_empty())
        }
        non_empty(&self.image_url).or_else(|| non_empty(&self.image_data))
    }
}
