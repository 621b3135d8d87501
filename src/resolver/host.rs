//! Host runtime messages.
//!
//! The embedding shell pushes images in whatever shape it likes. Each message
//! is classified once; the resolver decides what to do with the result.

use crate::error::Result;
use crate::media::{self, MIN_RAW_BASE64_LEN};
use serde_json::Value;

/// Outbound capabilities of the host runtime.
pub trait HostBridge {
    /// Ask the host to open its camera for a new photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the request.
    fn request_capture(&self) -> Result<()>;
}

/// A classified host message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPayload {
    /// Already a `data:image/` URL.
    DataUrl(String),
    /// Object with a `base64` field; holds the wrapped data URL.
    Base64Object(String),
    /// Long bare base64 string; holds the wrapped data URL.
    RawBase64(String),
    /// Remote `http(s)://` URL.
    RemoteUrl(String),
    /// Local filesystem path or `file://` URL.
    FilePath(String),
    /// Long string of unknown form, wrapped as base64 as a last resort.
    Lenient(String),
    /// Nothing usable; holds a short description for the log.
    Unrecognized(String),
}

impl HostPayload {
    /// Classify a message.
    ///
    /// Raw base64 is checked before file paths: JPEG base64 starts with `/9j/`.
    #[must_use]
    pub fn classify(message: &Value) -> Self {
        match message {
            Value::String(s) => Self::classify_str(s),
            Value::Object(map) => match map.get("base64").and_then(Value::as_str) {
                Some(b64) if !b64.is_empty() => {
                    Self::Base64Object(media::wrap_raw_base64(b64))
                }
                _ => Self::Unrecognized(format!(
                    "object without base64 field (keys: {})",
                    map.keys().cloned().collect::<Vec<_>>().join(", ")
                )),
            },
            Value::Null => Self::Unrecognized("null".to_string()),
            other => Self::Unrecognized(format!("unsupported JSON {}", json_type(other))),
        }
    }

    fn classify_str(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Self::Unrecognized("empty string".to_string());
        }
        if media::is_image_data_url(s) {
            return Self::DataUrl(s.to_string());
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Self::RemoteUrl(s.to_string());
        }
        if s.starts_with("file://") {
            return Self::FilePath(s.to_string());
        }
        if media::looks_like_raw_base64(s) {
            return Self::RawBase64(media::wrap_raw_base64(s));
        }
        if s.starts_with('/') || s.contains("/Users/") || s.contains("/Downloads/") {
            return Self::FilePath(s.to_string());
        }
        if s.starts_with("data:") {
            let mime = s.split([';', ',']).next().unwrap_or(s);
            return Self::Unrecognized(format!("non-image data URL ({mime})"));
        }
        if s.len() > MIN_RAW_BASE64_LEN {
            return Self::Lenient(media::wrap_raw_base64(s));
        }
        Self::Unrecognized(format!("short string ({} chars)", s.chars().count()))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What became of a host message.
#[derive(Debug, Clone)]
pub enum HostOutcome {
    /// The message supplied the page's image.
    Loaded(crate::resolver::Resolved),
    /// An image was already loaded; the message was not applied.
    Ignored,
    /// The message could not be used; the channel stays open.
    Dropped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_url_string() {
        let payload = HostPayload::classify(&json!("data:image/png;base64,AAAA"));
        assert_eq!(payload, HostPayload::DataUrl("data:image/png;base64,AAAA".to_string()));
    }

    #[test]
    fn base64_object() {
        let payload = HostPayload::classify(&json!({"base64": "QUJDRA==", "width": 10}));
        assert_eq!(
            payload,
            HostPayload::Base64Object("data:image/jpeg;base64,QUJDRA==".to_string())
        );
    }

    #[test]
    fn object_without_base64_unrecognized() {
        let payload = HostPayload::classify(&json!({"uri": "x"}));
        assert!(matches!(payload, HostPayload::Unrecognized(ref why) if why.contains("uri")));
    }

    #[test]
    fn long_base64_string_wrapped() {
        let raw = "A".repeat(150);
        let payload = HostPayload::classify(&Value::String(raw.clone()));
        assert_eq!(payload, HostPayload::RawBase64(format!("data:image/jpeg;base64,{raw}")));
    }

    #[test]
    fn jpeg_base64_not_mistaken_for_path() {
        let raw = format!("/9j/{}", "B".repeat(140));
        let payload = HostPayload::classify(&Value::String(raw));
        assert!(matches!(payload, HostPayload::RawBase64(_)));
    }

    #[test]
    fn file_paths() {
        assert_eq!(
            HostPayload::classify(&json!("/var/mobile/Containers/tmp/photo.jpg")),
            HostPayload::FilePath("/var/mobile/Containers/tmp/photo.jpg".to_string())
        );
        assert_eq!(
            HostPayload::classify(&json!("file:///sdcard/DCIM/1.jpg")),
            HostPayload::FilePath("file:///sdcard/DCIM/1.jpg".to_string())
        );
        assert!(matches!(
            HostPayload::classify(&json!("C:/Users/me/photo.jpg")),
            HostPayload::FilePath(_)
        ));
    }

    #[test]
    fn remote_url() {
        assert_eq!(
            HostPayload::classify(&json!("https://cdn.example.com/a.jpg")),
            HostPayload::RemoteUrl("https://cdn.example.com/a.jpg".to_string())
        );
    }

    #[test]
    fn long_unknown_string_is_lenient() {
        let odd = format!("{}!{}", "x".repeat(60), "y".repeat(60));
        let payload = HostPayload::classify(&Value::String(odd.clone()));
        assert_eq!(payload, HostPayload::Lenient(format!("data:image/jpeg;base64,{odd}")));
    }

    #[test]
    fn long_non_image_data_url_dropped() {
        let html = format!("data:text/html,{}", "<p>hi</p>".repeat(20));
        assert_eq!(
            HostPayload::classify(&Value::String(html)),
            HostPayload::Unrecognized("non-image data URL (data:text/html)".to_string())
        );
    }

    #[test]
    fn unusable_messages() {
        for message in [json!(null), json!(""), json!("hello"), json!(42), json!([1, 2])] {
            assert!(matches!(
                HostPayload::classify(&message),
                HostPayload::Unrecognized(_)
            ));
        }
    }
}
