//! `picoco star` command implementation.

use crate::bookmarks::{BookmarkSet, Category, join_key};
use crate::cli::{category_argument, open_durable};
use crate::config::load_config;
use crate::error::{Error, Result};

/// Run the star command.
///
/// Toggles the bookmark whose composite key is `parts` joined with `|`.
///
/// # Errors
///
/// Returns an error for an unknown category, the wrong number of parts, or
/// a storage failure.
pub fn run(category: &str, parts: &[String]) -> Result<()> {
    let category = category_argument(category)?;
    check_parts(category, parts)?;

    let config = load_config()?;
    let durable = open_durable(&config)?;
    let mut set = BookmarkSet::load(&durable, category);

    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    let key = join_key(&refs);
    if set.toggle(&key)? {
        println!("Starred: {key}");
    } else {
        println!("Unstarred: {key}");
    }
    Ok(())
}

/// Number of key parts each category expects.
fn expected_parts(category: Category) -> usize {
    match category {
        Category::Vocabulary => 2,
        Category::Phrase | Category::Dialogue => 3,
    }
}

fn check_parts(category: Category, parts: &[String]) -> Result<()> {
    let expected = expected_parts(category);
    if parts.len() != expected {
        return Err(Error::InvalidPayload(format!(
            "{} bookmarks take {expected} parts, got {}",
            category.storage_key(),
            parts.len()
        )));
    }
    if parts.iter().any(|p| p.contains('|')) {
        return Err(Error::InvalidPayload("bookmark parts cannot contain '|'".to_string()));
    }
    Ok(())
}
