use super::pool::{ClassLevel, ContentPool, ItemKind};
use crate::error::ContentError;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

static LEVELS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/content/levels");

/// Supplies the word and sentence pools for each class level.
///
/// An unset or unknown level yields empty sequences rather than an error.
pub trait ContentStore {
    fn pool(&self, level: Option<ClassLevel>) -> ContentPool;

    fn words(&self, level: Option<ClassLevel>) -> Vec<String> {
        self.pool(level).words
    }

    fn sentences(&self, level: Option<ClassLevel>) -> Vec<String> {
        self.pool(level).sentences
    }

    fn items(&self, level: Option<ClassLevel>, kind: ItemKind) -> Vec<String> {
        match kind {
            ItemKind::Word => self.words(level),
            ItemKind::Sentence => self.sentences(level),
        }
    }
}

#[derive(Deserialize)]
struct LevelFile {
    level: u8,
    #[serde(flatten)]
    pool: ContentPool,
}

/// Pools compiled into the binary from `src/content/levels`.
#[derive(Debug, Clone)]
pub struct BundledContent {
    pools: BTreeMap<ClassLevel, ContentPool>,
}

impl BundledContent {
    pub fn new() -> Self {
        let mut pools = BTreeMap::new();
        for level in ClassLevel::all() {
            match read_bundled_level(level) {
                Some(pool) => {
                    pools.insert(level, pool);
                }
                None => tracing::warn!(level = level.get(), "bundled_level_missing"),
            }
        }
        Self { pools }
    }
}

impl Default for BundledContent {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for BundledContent {
    fn pool(&self, level: Option<ClassLevel>) -> ContentPool {
        level
            .and_then(|l| self.pools.get(&l))
            .cloned()
            .unwrap_or_default()
    }
}

fn read_bundled_level(level: ClassLevel) -> Option<ContentPool> {
    let file = LEVELS_DIR.get_file(format!("class{level}.json"))?;
    let contents = file.contents_utf8()?;
    match serde_json::from_str::<LevelFile>(contents) {
        Ok(parsed) if parsed.level == level.get() => Some(parsed.pool),
        Ok(parsed) => {
            tracing::warn!(
                expected = level.get(),
                found = parsed.level,
                "bundled_level_mismatch"
            );
            None
        }
        Err(e) => {
            tracing::warn!(level = level.get(), error = %e, "bundled_level_invalid");
            None
        }
    }
}

#[derive(Deserialize)]
struct ContentFile {
    levels: BTreeMap<String, ContentPool>,
}

/// Pools loaded from a user-supplied JSON file:
/// `{ "levels": { "1": { "words": [...], "sentences": [...] } } }`.
#[derive(Debug, Clone, Default)]
pub struct JsonContentStore {
    pools: BTreeMap<ClassLevel, ContentPool>,
}

impl JsonContentStore {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        let file: ContentFile = serde_json::from_str(text)?;
        let mut pools = BTreeMap::new();
        for (key, pool) in file.levels {
            let level = key
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(ClassLevel::new)
                .ok_or_else(|| ContentError::UnknownLevel(key.clone()))?;
            pools.insert(level, pool);
        }
        Ok(Self { pools })
    }
}

impl ContentStore for JsonContentStore {
    fn pool(&self, level: Option<ClassLevel>) -> ContentPool {
        level
            .and_then(|l| self.pools.get(&l))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_bundled_has_every_level() {
        let store = BundledContent::new();
        for level in ClassLevel::all() {
            let pool = store.pool(Some(level));
            assert!(!pool.words.is_empty(), "class {level} has no words");
            assert!(!pool.sentences.is_empty(), "class {level} has no sentences");
        }
    }

    #[test]
    fn test_bundled_unset_level_is_empty() {
        let store = BundledContent::new();
        assert!(store.words(None).is_empty());
        assert!(store.sentences(None).is_empty());
    }

    #[test]
    fn test_items_by_kind() {
        let store = BundledContent::new();
        let level = ClassLevel::new(1);
        assert!(store.items(level, ItemKind::Word).contains(&"cat".to_string()));
        assert_eq!(
            store.items(level, ItemKind::Sentence),
            store.sentences(level)
        );
    }

    #[test]
    fn test_json_store_from_str() {
        let store = JsonContentStore::from_json(
            r#"{ "levels": { "2": { "words": ["ship", "frog"] } } }"#,
        )
        .unwrap();
        let level = ClassLevel::new(2);
        assert_eq!(store.words(level), vec!["ship", "frog"]);
        assert!(store.sentences(level).is_empty());
        assert!(store.words(ClassLevel::new(1)).is_empty());
    }

    #[test]
    fn test_json_store_rejects_unknown_level() {
        let result = JsonContentStore::from_json(r#"{ "levels": { "7": { "words": [] } } }"#);
        assert_matches!(result, Err(ContentError::UnknownLevel(key)) if key == "7");
    }

    #[test]
    fn test_json_store_rejects_bad_json() {
        let result = JsonContentStore::from_json("{ not json");
        assert_matches!(result, Err(ContentError::Json(_)));
    }

    #[test]
    fn test_json_store_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "levels": {{ "5": {{ "words": ["kangaroo"], "sentences": ["Hop."] }} }} }}"#
        )
        .unwrap();

        let store = JsonContentStore::from_path(file.path()).unwrap();
        let pool = store.pool(ClassLevel::new(5));
        assert_eq!(pool.words, vec!["kangaroo"]);
        assert_eq!(pool.sentences, vec!["Hop."]);
    }

    #[test]
    fn test_json_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonContentStore::from_path(dir.path().join("nope.json"));
        assert_matches!(result, Err(ContentError::Io(_)));
    }
}
