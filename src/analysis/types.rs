//! Study card types.

use serde::{Deserialize, Serialize};

/// A vocabulary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// The word.
    pub word: String,
    /// Its meaning.
    pub meaning: String,
}

/// A phrase card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseItem {
    /// Stable identifier.
    pub id: String,
    /// The phrase.
    pub phrase: String,
    /// Its translation.
    pub translation: String,
    /// Render on the dark card style.
    pub is_dark: bool,
}

/// Which side of the conversation a line sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// First speaker.
    Left,
    /// Second speaker.
    Right,
}

impl Side {
    /// Side for a line at `index`: even indices are left.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 { Self::Left } else { Self::Right }
    }

    /// Lowercase name, as stored in bookmark keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parse a stored side name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// A dialogue line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// Stable identifier.
    pub id: String,
    /// What is said.
    pub message: String,
    /// Speaker side.
    pub character: Side,
}

/// Everything extracted from one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningContent {
    /// Vocabulary cards.
    pub vocabulary: Vec<VocabularyItem>,
    /// Phrase cards.
    pub phrases: Vec<PhraseItem>,
    /// Dialogue lines.
    pub dialogue: Vec<DialogueLine>,
}

impl LearningContent {
    /// Whether nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty() && self.phrases.is_empty() && self.dialogue.is_empty()
    }
}
