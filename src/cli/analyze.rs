//! `picoco analyze` command implementation.

use crate::analysis::AnalysisClient;
use crate::cli::image_argument;
use crate::config::load_config;
use crate::error::Result;

/// Run the analyze command.
///
/// Uploads the image to the analysis endpoint and prints the extracted
/// study cards as JSON. Analysis failures print empty content unless
/// `strict` is set.
///
/// # Errors
///
/// Returns an error if the image cannot be read, or (with `strict`) if the
/// analysis request fails.
pub fn run(image: &str, strict: bool) -> Result<()> {
    let config = load_config()?;
    let client = AnalysisClient::from_config(&config.analysis)?;
    let image = image_argument(image)?;

    let content = if strict {
        client.try_analyze_image(&image)?
    } else {
        client.analyze_image(&image)
    };

    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}
