use serde::{Deserialize, Serialize};
use std::fmt;

/// Class level a content pool belongs to. Only 1 through 5 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ClassLevel(u8);

impl ClassLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&level)
            .then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = ClassLevel> {
        (Self::MIN..=Self::MAX).map(ClassLevel)
    }
}

impl Default for ClassLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for ClassLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ClassLevel::new(value).ok_or_else(|| {
            format!(
                "class level must be between {} and {}, got {value}",
                ClassLevel::MIN,
                ClassLevel::MAX
            )
        })
    }
}

impl From<ClassLevel> for u8 {
    fn from(level: ClassLevel) -> Self {
        level.0
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Word,
    Sentence,
}

/// A word or sentence the user is asked to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeItem {
    pub text: String,
    pub kind: ItemKind,
}

impl PracticeItem {
    pub fn new(text: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn word(text: impl Into<String>) -> Self {
        Self::new(text, ItemKind::Word)
    }

    pub fn sentence(text: impl Into<String>) -> Self {
        Self::new(text, ItemKind::Sentence)
    }

    /// Placeholder target used when a pool has nothing to offer.
    pub fn empty(kind: ItemKind) -> Self {
        Self::new(String::new(), kind)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Words and sentences for one class level. Static for a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPool {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub sentences: Vec<String>,
}

impl ContentPool {
    pub fn new(words: Vec<String>, sentences: Vec<String>) -> Self {
        Self { words, sentences }
    }

    pub fn of_kind(&self, kind: ItemKind) -> &[String] {
        match kind {
            ItemKind::Word => &self.words,
            ItemKind::Sentence => &self.sentences,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.sentences.is_empty()
    }
}
