//! API response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Methods",
        "GET, POST, PUT, DELETE, OPTIONS",
    ),
    (
        "Access-Control-Allow-Headers",
        "Content-Type, Authorization",
    ),
];

/// A response from the session API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers.
    pub headers: Vec<(&'static str, &'static str)>,

    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// A JSON response with CORS headers.
    #[must_use]
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        Self {
            status,
            headers: cors_with_content_type(),
            body: Some(body),
        }
    }

    /// An error response `{ "error": message }`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error: message.to_string(),
            },
        )
    }

    /// Empty 200 response to a CORS preflight.
    #[must_use]
    pub fn preflight() -> Self {
        Self {
            status: 200,
            headers: CORS_HEADERS.to_vec(),
            body: None,
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

fn cors_with_content_type() -> Vec<(&'static str, &'static str)> {
    let mut headers = CORS_HEADERS.to_vec();
    headers.push(("Content-Type", "application/json"));
    headers
}

/// Body of a successful `POST /api/image`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageResponse {
    /// New session identifier.
    pub session_id: String,
    /// Always `true`.
    pub success: bool,
    /// Human-readable status.
    pub message: String,
}

/// Body of a successful `GET /api/image`. At most one side is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetImageResponse {
    /// Data URL, if the stored payload is image data.
    pub image_data: Option<String>,
    /// URL, if the stored payload is a URL.
    pub image_url: Option<String>,
    /// Always `true`.
    pub success: bool,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serialization() {
        let response = ApiResponse::error(404, "Image not found or expired");
        assert_eq!(response.status, 404);
        assert_eq!(
            serde_json::to_string(&response.body).unwrap(),
            r#"{"error":"Image not found or expired"}"#
        );
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn preflight_has_no_body() {
        let response = ApiResponse::preflight();
        assert_eq!(response.status, 200);
        assert!(response.body.is_none());
        assert_eq!(
            response.header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert!(response.header("Content-Type").is_none());
    }

    #[test]
    fn get_response_keeps_nulls() {
        let body = GetImageResponse {
            image_data: None,
            image_url: Some("https://x/y.jpg".to_string()),
            success: true,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"imageData":null,"imageUrl":"https://x/y.jpg","success":true}"#
        );
    }

    #[test]
    fn create_response_camel_case() {
        let body = CreateImageResponse {
            session_id: "abc".to_string(),
            success: true,
            message: "Image uploaded successfully".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""sessionId":"abc""#));
    }
}
