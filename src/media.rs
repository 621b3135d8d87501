//! Image payload classification and data-URL handling.
//!
//! A payload is a single string: a `data:` URL, an `http(s)://` or `file://`
//! URL, or (legacy) bare base64 that gets wrapped as a JPEG data URL.

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Prefix used when wrapping bare base64.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Prefix every accepted image data URL carries.
pub const IMAGE_DATA_URL_PREFIX: &str = "data:image/";

/// Shortest unprefixed string accepted as raw base64 from an untrusted source.
pub const MIN_RAW_BASE64_LEN: usize = 100;

/// How a payload string was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadKind {
    /// `data:` URL.
    DataUrl,
    /// `http://` or `https://` URL.
    HttpUrl,
    /// `file://` URL.
    FileUrl,
    /// Anything else; treated as bare base64.
    RawBase64,
}

impl PayloadKind {
    /// Classify a payload string.
    #[must_use]
    pub fn of(payload: &str) -> Self {
        if payload.starts_with("data:") {
            Self::DataUrl
        } else if payload.starts_with("http://") || payload.starts_with("https://") {
            Self::HttpUrl
        } else if payload.starts_with("file://") {
            Self::FileUrl
        } else {
            Self::RawBase64
        }
    }
}

/// A payload normalised to exactly one of image data or image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CanonicalImage {
    /// A `data:` URL.
    Data(String),
    /// An `http(s)://` or `file://` URL.
    Url(String),
}

impl CanonicalImage {
    /// Normalise a stored payload, wrapping raw base64 as a JPEG data URL.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        match PayloadKind::of(payload) {
            PayloadKind::DataUrl => Self::Data(payload.to_string()),
            PayloadKind::HttpUrl | PayloadKind::FileUrl => Self::Url(payload.to_string()),
            PayloadKind::RawBase64 => Self::Data(wrap_raw_base64(payload)),
        }
    }

    /// The data URL, if this is image data.
    #[must_use]
    pub fn image_data(&self) -> Option<&str> {
        match self {
            Self::Data(data) => Some(data),
            Self::Url(_) => None,
        }
    }

    /// The URL, if this is a URL.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Data(_) => None,
            Self::Url(url) => Some(url),
        }
    }

    /// The underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Data(s) | Self::Url(s) => s,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Whether the payload string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// Whether a string is a URL the relay hands back by reference.
#[must_use]
pub fn is_url(payload: &str) -> bool {
    matches!(
        PayloadKind::of(payload),
        PayloadKind::HttpUrl | PayloadKind::FileUrl
    )
}

/// Whether a string is a data URL with an image MIME type.
#[must_use]
pub fn is_image_data_url(payload: &str) -> bool {
    payload.starts_with(IMAGE_DATA_URL_PREFIX)
}

/// Whether a string is an acceptable image reference for display.
#[must_use]
pub fn is_accepted_image(payload: &str) -> bool {
    is_image_data_url(payload) || is_url(payload)
}

/// Whether a string consists only of base64 alphabet characters.
#[must_use]
pub fn is_base64_alphabet(s: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9+/=]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

/// Whether an unprefixed string plausibly carries a base64 image.
#[must_use]
pub fn looks_like_raw_base64(s: &str) -> bool {
    s.len() > MIN_RAW_BASE64_LEN && is_base64_alphabet(s)
}

/// Prefix bare base64 as a JPEG data URL.
#[must_use]
pub fn wrap_raw_base64(base64: &str) -> String {
    format!("{JPEG_DATA_URL_PREFIX}{base64}")
}

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// MIME type from the data URL header.
    pub mime: String,
    /// Binary body.
    pub bytes: Vec<u8>,
}

/// Decode the base64 body of a `data:<mime>;base64,<body>` URL.
///
/// # Errors
///
/// Returns `InvalidPayload` if the string is not a base64 data URL, or a
/// decode error if the body is not valid base64.
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidPayload("not a data URL".to_string()))?;
    let (header, body) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidPayload("data URL has no body".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidPayload("data URL is not base64 encoded".to_string()))?;

    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64.decode(body.as_bytes())?;
    Ok(DecodedImage {
        mime: mime.to_string(),
        bytes,
    })
}

/// Encode bytes as a data URL.
#[must_use]
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Image MIME type for a path, by extension. Unknown extensions are JPEG.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}

/// Read an image file into a data URL.
///
/// Accepts plain paths and `file://` URLs.
///
/// # Errors
///
/// Returns a storage error if the file cannot be read.
pub fn read_file_as_data_url(path: &str) -> Result<String> {
    let path = Path::new(path.strip_prefix("file://").unwrap_or(path));
    let bytes = fs::read(path)?;
    Ok(encode_data_url(mime_for_path(path), &bytes))
}

/// First `max` characters of a payload, for logs.
#[must_use]
pub fn preview(payload: &str, max: usize) -> &str {
    match payload.char_indices().nth(max) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn classify_payload_kinds() {
        assert_eq!(PayloadKind::of("data:image/png;base64,AAAA"), PayloadKind::DataUrl);
        assert_eq!(PayloadKind::of("http://x/y.jpg"), PayloadKind::HttpUrl);
        assert_eq!(PayloadKind::of("https://x/y.jpg"), PayloadKind::HttpUrl);
        assert_eq!(PayloadKind::of("file:///tmp/y.jpg"), PayloadKind::FileUrl);
        assert_eq!(PayloadKind::of("QUJDRA=="), PayloadKind::RawBase64);
    }

    #[test]
    fn raw_base64_is_wrapped() {
        let image = CanonicalImage::from_payload("QUJDRA==");
        assert_eq!(image.image_data(), Some("data:image/jpeg;base64,QUJDRA=="));
        assert_eq!(image.image_url(), None);
    }

    #[test]
    fn exactly_one_side_populated() {
        let url = CanonicalImage::from_payload("https://cdn.example.com/a.jpg");
        assert_eq!(url.image_url(), Some("https://cdn.example.com/a.jpg"));
        assert!(url.image_data().is_none());

        let data = CanonicalImage::from_payload("data:image/png;base64,AAAA");
        assert_eq!(data.image_data(), Some("data:image/png;base64,AAAA"));
        assert!(data.image_url().is_none());
    }

    #[test]
    fn accepted_image_prefixes() {
        assert!(is_accepted_image("data:image/webp;base64,AAAA"));
        assert!(is_accepted_image("file:///sdcard/DCIM/1.jpg"));
        assert!(!is_accepted_image("data:text/plain;base64,AAAA"));
        assert!(!is_accepted_image("/sdcard/DCIM/1.jpg"));
    }

    #[test]
    fn base64_alphabet_check() {
        assert!(is_base64_alphabet("/9j/4AAQSkZJRgABAQ=="));
        assert!(!is_base64_alphabet("not base64!"));
        assert!(!is_base64_alphabet(""));
        assert!(!looks_like_raw_base64("QUJDRA=="));
        assert!(looks_like_raw_base64(&"A".repeat(150)));
    }

    #[test]
    fn decode_data_url_body() {
        let decoded = decode_data_url("data:image/png;base64,QUJDRA==").unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, b"ABCD");
    }

    #[test]
    fn decode_rejects_non_base64_data_url() {
        assert!(matches!(
            decode_data_url("data:image/svg+xml,<svg/>"),
            Err(Error::InvalidPayload(_))
        ));
        assert!(matches!(
            decode_data_url("https://example.com/a.jpg"),
            Err(Error::InvalidPayload(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn encode_then_decode_data_url() {
        let url = encode_data_url("image/gif", b"GIF89a");
        assert!(url.starts_with("data:image/gif;base64,"));
        assert_eq!(decode_data_url(&url).unwrap().bytes, b"GIF89a");
    }

    #[test]
    fn read_file_uses_extension_mime() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let url = read_file_as_data_url(&path).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let via_file_url = read_file_as_data_url(&format!("file://{path}")).unwrap();
        assert_eq!(url, via_file_url);
    }

    #[test]
    fn read_missing_file_is_storage_error() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        drop(file);
        assert!(matches!(read_file_as_data_url(&path), Err(Error::Storage(_))));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("램프램프", 2), "램프");
        assert_eq!(preview("abc", 10), "abc");
    }
}
