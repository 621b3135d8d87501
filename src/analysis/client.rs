//! Analysis endpoint client.

use crate::analysis::extract::extract;
use crate::analysis::types::LearningContent;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::media::{self, CanonicalImage, PayloadKind};
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form as MultipartForm, Part as MultipartPart};
use serde_json::Value;
use std::fs;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// MIME type the endpoint is told every upload has.
const UPLOAD_MIME: &str = "image/jpeg";

/// Client for the remote image analysis endpoint.
///
/// One POST per call: no retry, no backoff. Failures degrade to empty
/// content through [`AnalysisClient::analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: Client,
    endpoint: String,
    field_name: String,
    file_name: String,
}

impl AnalysisClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an HTTP error if the client cannot be built.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let mut builder = Client::builder();
        // The blocking client defaults to a 30s timeout; unset means none.
        builder = builder.timeout(config.timeout_seconds.map(Duration::from_secs));
        Ok(Self {
            http: builder.build()?,
            endpoint: config.endpoint.clone(),
            field_name: config.field_name.clone(),
            file_name: config.file_name.clone(),
        })
    }

    /// Analyze a data URL, returning empty content on any failure.
    #[must_use]
    pub fn analyze(&self, image_data_url: &str) -> LearningContent {
        self.try_analyze(image_data_url).unwrap_or_else(|e| {
            warn!(error = %e, "analysis failed, no content generated");
            LearningContent::default()
        })
    }

    /// Analyze any canonical image, returning empty content on any failure.
    ///
    /// URLs are downloaded (or read, for `file://`) before upload.
    #[must_use]
    pub fn analyze_image(&self, image: &CanonicalImage) -> LearningContent {
        self.try_analyze_image(image).unwrap_or_else(|e| {
            warn!(error = %e, "analysis failed, no content generated");
            LearningContent::default()
        })
    }

    /// Analyze a data URL, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns a decode error for a malformed data URL, `Upstream` for a
    /// non-2xx reply or a non-JSON body, or a transport error.
    pub fn try_analyze(&self, image_data_url: &str) -> Result<LearningContent> {
        let decoded = media::decode_data_url(image_data_url)?;
        self.analyze_bytes(decoded.bytes)
    }

    /// Analyze any canonical image, surfacing failures.
    ///
    /// # Errors
    ///
    /// See [`AnalysisClient::try_analyze`]; downloads and file reads can fail too.
    pub fn try_analyze_image(&self, image: &CanonicalImage) -> Result<LearningContent> {
        match image {
            CanonicalImage::Data(data) => self.try_analyze(data),
            CanonicalImage::Url(url) if PayloadKind::of(url) == PayloadKind::FileUrl => {
                let path = url.strip_prefix("file://").unwrap_or(url);
                self.analyze_bytes(fs::read(path)?)
            }
            CanonicalImage::Url(url) => {
                let response = self.http.get(url.as_str()).send()?;
                if !response.status().is_success() {
                    return Err(Error::Upstream(format!(
                        "image download failed ({}): {url}",
                        response.status().as_u16()
                    )));
                }
                self.analyze_bytes(response.bytes()?.to_vec())
            }
        }
    }

    /// Upload raw image bytes and extract content from the reply.
    fn analyze_bytes(&self, bytes: Vec<u8>) -> Result<LearningContent> {
        let size = bytes.len();
        let part = MultipartPart::bytes(bytes)
            .file_name(self.file_name.clone())
            .mime_str(UPLOAD_MIME)?;
        let form = MultipartForm::new().part(self.field_name.clone(), part);

        debug!(endpoint = %self.endpoint, size, "uploading image for analysis");
        let response = self.http.post(self.endpoint.as_str()).multipart(form).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        let parsed = parse_analysis_response(status, &body)?;
        let content = extract(&parsed);
        info!(
            vocabulary = content.vocabulary.len(),
            phrases = content.phrases.len(),
            dialogue = content.dialogue.len(),
            "analysis complete"
        );
        Ok(content)
    }
}

/// Check the status and parse the body of an analysis reply.
///
/// # Errors
///
/// Returns `Upstream` for a non-2xx status (the full body is logged) or a
/// body that is not JSON.
pub fn parse_analysis_response(status: u16, body: &str) -> Result<Value> {
    if !(200..300).contains(&status) {
        error!(status, body, "analysis endpoint returned an error");
        return Err(Error::Upstream(format!(
            "analysis request failed ({status})"
        )));
    }
    serde_json::from_str(body)
        .map_err(|e| Error::Upstream(format!("analysis returned invalid JSON: {e}")))
}
