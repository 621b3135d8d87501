//! Starred cards and flip state.
//!
//! Each category keeps an ordered set of composite keys (`word|meaning`,
//! `id|phrase|translation`, `id|message|character`) written through to
//! durable storage as a JSON array on every toggle.

use crate::analysis::{DialogueLine, PhraseItem, Side, VocabularyItem};
use crate::error::Result;
use crate::kv::KeyValueStore;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Separator inside composite keys.
const KEY_SEPARATOR: char = '|';

/// A bookmark category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Vocabulary cards.
    Vocabulary,
    /// Phrase cards.
    Phrase,
    /// Dialogue lines.
    Dialogue,
}

impl Category {
    /// Storage key the set is written to.
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Vocabulary => "starredVocas",
            Self::Phrase => "starredPhrases",
            Self::Dialogue => "starredDialogues",
        }
    }

    /// Older storage key merged in on load.
    #[must_use]
    pub fn legacy_key(self) -> Option<&'static str> {
        match self {
            Self::Vocabulary => Some("starredWords"),
            Self::Phrase => None,
            Self::Dialogue => Some("starredMessages"),
        }
    }

    /// Parse a category name as typed on the command line.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "voca" | "vocab" | "vocabulary" | "word" | "words" => Some(Self::Vocabulary),
            "phrase" | "phrases" => Some(Self::Phrase),
            "dialogue" | "dialogues" | "message" | "messages" => Some(Self::Dialogue),
            _ => None,
        }
    }
}

/// Composite key for a vocabulary card.
#[must_use]
pub fn vocabulary_key(item: &VocabularyItem) -> String {
    join_key(&[&item.word, &item.meaning])
}

/// Composite key for a phrase card.
#[must_use]
pub fn phrase_key(item: &PhraseItem) -> String {
    join_key(&[&item.id, &item.phrase, &item.translation])
}

/// Composite key for a dialogue line.
#[must_use]
pub fn dialogue_key(line: &DialogueLine) -> String {
    join_key(&[&line.id, &line.message, line.character.as_str()])
}

/// Join parts into a composite key.
#[must_use]
pub fn join_key(parts: &[&str]) -> String {
    parts.join(&KEY_SEPARATOR.to_string())
}

fn split_key(key: &str, n: usize) -> Vec<String> {
    let mut parts: Vec<String> = key.splitn(n, KEY_SEPARATOR).map(str::to_string).collect();
    parts.resize(n, String::new());
    parts
}

/// Rebuild a vocabulary card from its key.
#[must_use]
pub fn parse_vocabulary_key(key: &str) -> VocabularyItem {
    let mut parts = split_key(key, 2).into_iter();
    VocabularyItem {
        word: parts.next().unwrap_or_default(),
        meaning: parts.next().unwrap_or_default(),
    }
}

/// Rebuild a phrase card from its key.
#[must_use]
pub fn parse_phrase_key(key: &str) -> PhraseItem {
    let mut parts = split_key(key, 3).into_iter();
    PhraseItem {
        id: parts.next().unwrap_or_default(),
        phrase: parts.next().unwrap_or_default(),
        translation: parts.next().unwrap_or_default(),
        is_dark: false,
    }
}

/// Rebuild a dialogue line from its key. Unknown sides read as left.
#[must_use]
pub fn parse_dialogue_key(key: &str) -> DialogueLine {
    let mut parts = split_key(key, 3).into_iter();
    DialogueLine {
        id: parts.next().unwrap_or_default(),
        message: parts.next().unwrap_or_default(),
        character: parts
            .next()
            .and_then(|s| Side::parse(&s))
            .unwrap_or(Side::Left),
    }
}

/// Starred keys of one category, mirrored in durable storage.
pub struct BookmarkSet<'a> {
    category: Category,
    store: &'a dyn KeyValueStore,
    keys: Vec<String>,
}

impl<'a> BookmarkSet<'a> {
    /// Load a category, merging its legacy key.
    ///
    /// Unreadable or corrupted values load as empty.
    #[must_use]
    pub fn load(store: &'a dyn KeyValueStore, category: Category) -> Self {
        let mut keys = read_keys(store, category.storage_key());
        if let Some(legacy) = category.legacy_key() {
            for key in read_keys(store, legacy) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        Self {
            category,
            store,
            keys,
        }
    }

    /// Category of this set.
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether a key is starred.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Starred keys in the order they were added.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of starred keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is starred.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Star or unstar a key, persisting the whole set. Returns whether the
    /// key is starred afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the set is left unchanged.
    pub fn toggle(&mut self, key: &str) -> Result<bool> {
        let previous = self.keys.clone();
        let starred = if let Some(pos) = self.keys.iter().position(|k| k == key) {
            self.keys.remove(pos);
            false
        } else {
            self.keys.push(key.to_string());
            true
        };

        if let Err(e) = self.persist() {
            self.keys = previous;
            return Err(e);
        }
        debug!(category = ?self.category, starred, "bookmark toggled");
        Ok(starred)
    }

    /// Write the set under the current key and retire the legacy key,
    /// whose entries were merged in on load.
    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.keys)?;
        self.store.set(self.category.storage_key(), &json)?;
        if let Some(legacy) = self.category.legacy_key() {
            self.store.remove(legacy)?;
        }
        Ok(())
    }
}

fn read_keys(store: &dyn KeyValueStore, storage_key: &str) -> Vec<String> {
    let raw = match store.get(storage_key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(key = storage_key, error = %e, "failed to read bookmarks");
            return Vec::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key = storage_key, error = %e, "ignoring corrupted bookmarks");
        Vec::new()
    })
}

/// Which cards are showing their back face. Not persisted.
#[derive(Debug, Default)]
pub struct FlipState {
    words: HashSet<String>,
    phrases: HashSet<String>,
}

impl FlipState {
    /// Create with every card face up.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a vocabulary card; returns whether it is now flipped.
    pub fn toggle_word(&mut self, key: &str) -> bool {
        toggle(&mut self.words, key)
    }

    /// Flip a phrase card; returns whether it is now flipped.
    pub fn toggle_phrase(&mut self, key: &str) -> bool {
        toggle(&mut self.phrases, key)
    }

    /// Whether a vocabulary card is flipped.
    #[must_use]
    pub fn is_word_flipped(&self, key: &str) -> bool {
        self.words.contains(key)
    }

    /// Whether a phrase card is flipped.
    #[must_use]
    pub fn is_phrase_flipped(&self, key: &str) -> bool {
        self.phrases.contains(key)
    }
}

fn toggle(set: &mut HashSet<String>, key: &str) -> bool {
    if set.remove(key) {
        false
    } else {
        set.insert(key.to_string());
        true
    }
}
