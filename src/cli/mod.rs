//! CLI command implementations.

pub mod analyze;
pub mod resolve;
pub mod serve;
pub mod star;
pub mod starred;
pub mod upload;

use crate::bookmarks::Category;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::kv::FileKv;
use crate::media::{self, CanonicalImage};

/// Open the durable key-value store under the configured storage path.
///
/// # Errors
///
/// Returns an error if the storage directory cannot be created.
pub fn open_durable(config: &Config) -> Result<FileKv> {
    FileKv::new(config.storage.path.clone())
}

/// Interpret an image argument: a data URL, an `http(s)`/`file://` URL, or a
/// local file path (read and encoded as a data URL).
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn image_argument(arg: &str) -> Result<CanonicalImage> {
    if media::is_image_data_url(arg) {
        return Ok(CanonicalImage::Data(arg.to_string()));
    }
    if media::is_url(arg) {
        return Ok(CanonicalImage::Url(arg.to_string()));
    }
    Ok(CanonicalImage::Data(media::read_file_as_data_url(arg)?))
}

/// Parse a bookmark category name.
///
/// # Errors
///
/// Returns `InvalidPayload` for an unknown name.
pub fn category_argument(name: &str) -> Result<Category> {
    Category::parse(name).ok_or_else(|| {
        Error::InvalidPayload(format!(
            "unknown category '{name}' (expected voca, phrase, or dialogue)"
        ))
    })
}
