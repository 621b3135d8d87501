//! Card extraction from analysis responses of unknown shape.
//!
//! Each category runs an ordered list of strategies and takes the first one
//! that finds an array. Strategies are pure and never fail; an unrecognised
//! response yields empty lists. Elements missing a field get numbered
//! placeholder text instead of being dropped.

use crate::analysis::types::{DialogueLine, LearningContent, PhraseItem, Side, VocabularyItem};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// A single way of locating a category's array.
type Strategy<T> = fn(&Map<String, Value>) -> Option<Vec<T>>;

const VOCABULARY_FIELDS: &[&str] = &["extractedWords", "words", "vocabulary", "vocab", "voca"];
const WORD_KEYS: &[&str] = &["word", "english", "term", "text", "en"];
const MEANING_KEYS: &[&str] = &["meaning", "ko", "korean", "translation", "definition", "kr"];

const PHRASE_FIELDS: &[&str] = &[
    "examples",
    "phrases",
    "exampleSentences",
    "sentences",
    "expressions",
];
const PHRASE_KEYS: &[&str] = &["phrase", "sentence", "example", "expression", "english", "text", "en"];
const TRANSLATION_KEYS: &[&str] = &["translation", "ko", "korean", "meaning", "kr"];

const DIALOGUE_FIELDS: &[&str] = &[
    "dialogue",
    "dialogues",
    "conversation",
    "conversations",
    "messages",
];
const MESSAGE_KEYS: &[&str] = &["message", "text", "line", "utterance", "content", "sentence", "en"];
const SPEAKER_KEYS: &[&str] = &["speaker", "sender", "role", "character", "name"];

/// Minimum length for a bare string to count as free text.
const FREE_TEXT_MIN_LEN: usize = 12;

/// Extract all three categories.
#[must_use]
pub fn extract(response: &Value) -> LearningContent {
    LearningContent {
        vocabulary: extract_vocabulary(response),
        phrases: extract_phrases(response),
        dialogue: extract_dialogue(response),
    }
}

/// Extract vocabulary cards.
#[must_use]
pub fn extract_vocabulary(response: &Value) -> Vec<VocabularyItem> {
    run(response, &[vocabulary_by_name, vocabulary_by_shape])
}

/// Extract phrase cards.
#[must_use]
pub fn extract_phrases(response: &Value) -> Vec<PhraseItem> {
    run(response, &[phrases_by_name, phrases_by_shape])
}

/// Extract dialogue lines. Sides alternate by position, starting left.
#[must_use]
pub fn extract_dialogue(response: &Value) -> Vec<DialogueLine> {
    run(response, &[dialogue_by_name, dialogue_by_shape])
}

fn run<T>(response: &Value, strategies: &[Strategy<T>]) -> Vec<T> {
    let root = root(response);
    let Some(map) = root.as_object() else {
        return Vec::new();
    };
    strategies
        .iter()
        .find_map(|strategy| strategy(map))
        .unwrap_or_default()
}

/// The object holding the arrays: `data` when it is an object (or a JSON
/// string encoding one), otherwise the response itself.
fn root(response: &Value) -> Cow<'_, Value> {
    match response.get("data") {
        Some(data @ Value::Object(_)) => Cow::Borrowed(data),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => Cow::Owned(parsed),
            _ => Cow::Borrowed(response),
        },
        _ => Cow::Borrowed(response),
    }
}

fn named_array<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Vec<Value>> {
    fields
        .iter()
        .filter_map(|field| map.get(*field).and_then(Value::as_array))
        .find(|items| !items.is_empty())
}

fn shaped_array(map: &Map<String, Value>, looks_right: fn(&Value) -> bool) -> Option<&Vec<Value>> {
    map.values()
        .filter_map(Value::as_array)
        .find(|items| items.first().is_some_and(looks_right))
}

fn has_any_key(item: &Value, keys: &[&str]) -> bool {
    item.as_object()
        .is_some_and(|obj| keys.iter().any(|k| obj.contains_key(*k)))
}

/// First non-empty string (or number) among `keys`.
fn field(item: &Value, keys: &[&str]) -> Option<String> {
    let obj = item.as_object()?;
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn bare_text(item: &Value) -> Option<String> {
    item.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_free_text(item: &Value) -> bool {
    item.as_str()
        .is_some_and(|s| s.trim().len() >= FREE_TEXT_MIN_LEN && s.trim().contains(' '))
}

// Vocabulary

fn vocabulary_by_name(map: &Map<String, Value>) -> Option<Vec<VocabularyItem>> {
    named_array(map, VOCABULARY_FIELDS).map(|items| map_vocabulary(items))
}

fn vocabulary_by_shape(map: &Map<String, Value>) -> Option<Vec<VocabularyItem>> {
    shaped_array(map, |item| has_any_key(item, &["word", "english", "meaning"]))
        .map(|items| map_vocabulary(items))
}

fn map_vocabulary(items: &[Value]) -> Vec<VocabularyItem> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let n = idx + 1;
            VocabularyItem {
                word: field(item, WORD_KEYS)
                    .or_else(|| bare_text(item))
                    .unwrap_or_else(|| format!("Word {n}")),
                meaning: field(item, MEANING_KEYS).unwrap_or_else(|| format!("Meaning {n}")),
            }
        })
        .collect()
}

// Phrases

fn phrases_by_name(map: &Map<String, Value>) -> Option<Vec<PhraseItem>> {
    named_array(map, PHRASE_FIELDS).map(|items| map_phrases(items))
}

fn phrases_by_shape(map: &Map<String, Value>) -> Option<Vec<PhraseItem>> {
    shaped_array(map, |item| {
        is_free_text(item) || has_any_key(item, &["phrase", "sentence", "example", "expression"])
    })
    .map(|items| map_phrases(items))
}

fn map_phrases(items: &[Value]) -> Vec<PhraseItem> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let n = idx + 1;
            PhraseItem {
                id: field(item, &["id"]).unwrap_or_else(|| format!("phrase-{n}")),
                phrase: field(item, PHRASE_KEYS)
                    .or_else(|| bare_text(item))
                    .unwrap_or_else(|| format!("Example {n}")),
                translation: field(item, TRANSLATION_KEYS)
                    .unwrap_or_else(|| format!("Translation {n}")),
                is_dark: item.get("isDark").and_then(Value::as_bool).unwrap_or(false),
            }
        })
        .collect()
}

// Dialogue

fn dialogue_by_name(map: &Map<String, Value>) -> Option<Vec<DialogueLine>> {
    named_array(map, DIALOGUE_FIELDS).map(|items| map_dialogue(items))
}

fn dialogue_by_shape(map: &Map<String, Value>) -> Option<Vec<DialogueLine>> {
    shaped_array(map, |item| {
        has_any_key(item, SPEAKER_KEYS) && has_any_key(item, MESSAGE_KEYS)
    })
    .map(|items| map_dialogue(items))
}

fn map_dialogue(items: &[Value]) -> Vec<DialogueLine> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let n = idx + 1;
            DialogueLine {
                id: field(item, &["id"]).unwrap_or_else(|| format!("msg-{n}")),
                message: field(item, MESSAGE_KEYS)
                    .or_else(|| bare_text(item))
                    .unwrap_or_else(|| format!("Message {n}")),
                character: Side::for_index(idx),
            }
        })
        .collect()
}
