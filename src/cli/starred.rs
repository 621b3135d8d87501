//! `picoco starred` command implementation.

use crate::bookmarks::{
    BookmarkSet, Category, parse_dialogue_key, parse_phrase_key, parse_vocabulary_key,
};
use crate::cli::{category_argument, open_durable};
use crate::config::load_config;
use crate::error::Result;
use serde_json::Value;

/// Run the starred command.
///
/// Prints the bookmarked items of one category as a JSON array.
///
/// # Errors
///
/// Returns an error for an unknown category or a storage failure.
pub fn run(category: &str) -> Result<()> {
    let category = category_argument(category)?;
    let config = load_config()?;
    let durable = open_durable(&config)?;
    let set = BookmarkSet::load(&durable, category);

    println!("{}", serde_json::to_string_pretty(&items(&set)?)?);
    Ok(())
}

/// Rebuild the bookmarked items from their keys.
fn items(set: &BookmarkSet<'_>) -> Result<Vec<Value>> {
    set.keys()
        .iter()
        .map(|key| -> Result<Value> {
            Ok(match set.category() {
                Category::Vocabulary => serde_json::to_value(parse_vocabulary_key(key))?,
                Category::Phrase => serde_json::to_value(parse_phrase_key(key))?,
                Category::Dialogue => serde_json::to_value(parse_dialogue_key(key))?,
            })
        })
        .collect()
}
