//! `picoco upload` command implementation.

use crate::api::CreateImageBody;
use crate::cli::{image_argument, open_durable};
use crate::config::load_config;
use crate::error::Result;
use crate::kv::{KeyValueStore, UPLOADED_IMAGE_KEY};
use crate::media::{self, CanonicalImage, PayloadKind};
use crate::session_client::{HttpSessionClient, SessionApi};
use tracing::warn;

/// Run the upload command.
///
/// Posts the image to the Session API and prints the new session id. The
/// image is also kept as the durable fallback for later `resolve` runs.
///
/// # Errors
///
/// Returns an error if the image cannot be read or the upload fails.
pub fn run(image: &str) -> Result<()> {
    let config = load_config()?;
    let client = HttpSessionClient::new(&config.resolver.api_base_url)?;

    let body = upload_body(image_argument(image)?)?;
    let session_id = client.upload(&body)?;

    if let Some(payload) = body.payload() {
        let stored = open_durable(&config).and_then(|kv| kv.set(UPLOADED_IMAGE_KEY, payload));
        if let Err(e) = stored {
            warn!(error = %e, "failed to keep durable image fallback");
        }
    }

    println!("{session_id}");
    Ok(())
}

/// Build the request body. Local `file://` URLs are sent as data since the
/// server cannot read them.
fn upload_body(image: CanonicalImage) -> Result<CreateImageBody> {
    Ok(match image {
        CanonicalImage::Data(data) => CreateImageBody::data(data),
        CanonicalImage::Url(url) if PayloadKind::of(&url) == PayloadKind::FileUrl => {
            CreateImageBody::data(media::read_file_as_data_url(&url)?)
        }
        CanonicalImage::Url(url) => CreateImageBody::url(url),
    })
}
