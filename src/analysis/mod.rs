//! AI image analysis: upload a photo, turn the reply into study cards.

pub mod client;
pub mod extract;
pub mod types;

pub use client::AnalysisClient;
pub use extract::{extract, extract_dialogue, extract_phrases, extract_vocabulary};
pub use types::{DialogueLine, LearningContent, PhraseItem, Side, VocabularyItem};
