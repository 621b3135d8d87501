//! Session API dispatch.

use crate::api::{
    ApiRequest, ApiResponse, CreateImageBody, CreateImageResponse, GetImageResponse, Method,
};
use crate::error::Error;
use crate::media::{CanonicalImage, preview};
use crate::relay::RelayStore;
use tracing::{debug, error, info, warn};

/// Path served by the session API.
pub const IMAGE_PATH: &str = "/api/image";

/// Dispatch a request against the relay store.
///
/// Never fails: every outcome is a status code and JSON body.
pub fn handle(request: &ApiRequest, store: &dyn RelayStore) -> ApiResponse {
    if request.path != IMAGE_PATH {
        return ApiResponse::error(404, "Not found");
    }
    match request.method {
        Method::Options => ApiResponse::preflight(),
        Method::Post => handle_create(request, store),
        Method::Get => handle_get(request, store),
        Method::Other => ApiResponse::error(405, "Method not allowed"),
    }
}

fn handle_create(request: &ApiRequest, store: &dyn RelayStore) -> ApiResponse {
    let body = match serde_json::from_str::<CreateImageBody>(request.body.as_deref().unwrap_or(""))
    {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "failed to parse image body");
            return ApiResponse::error(500, "Failed to store image");
        }
    };

    let Some(payload) = body.payload() else {
        return ApiResponse::error(400, "No image data or URL provided");
    };

    match store.create(payload) {
        Ok(session_id) => {
            debug!(%session_id, preview = preview(payload, 50), "image session created");
            ApiResponse::json(
                200,
                &CreateImageResponse {
                    session_id,
                    success: true,
                    message: "Image uploaded successfully".to_string(),
                },
            )
        }
        Err(Error::InvalidPayload(_)) => ApiResponse::error(400, "No image data or URL provided"),
        Err(e @ Error::PayloadTooLarge { .. }) => {
            warn!(error = %e, "image payload rejected");
            ApiResponse::error(413, "Image payload too large")
        }
        Err(e) => {
            error!(error = %e, "failed to store image");
            ApiResponse::error(500, "Failed to store image")
        }
    }
}

fn handle_get(request: &ApiRequest, store: &dyn RelayStore) -> ApiResponse {
    let Some(session_id) = request.query_param("sessionId") else {
        return ApiResponse::error(400, "No session ID provided");
    };

    match store.get(session_id) {
        Ok(payload) => {
            let image = CanonicalImage::from_payload(&payload);
            info!(%session_id, len = image.len(), "image retrieved");
            ApiResponse::json(
                200,
                &GetImageResponse {
                    image_data: image.image_data().map(str::to_string),
                    image_url: image.image_url().map(str::to_string),
                    success: true,
                },
            )
        }
        Err(Error::NotFound(_)) => ApiResponse::error(404, "Image not found or expired"),
        Err(e) => {
            error!(error = %e, "failed to retrieve image");
            ApiResponse::error(500, "Failed to retrieve image")
        }
    }
}
