use crate::content::{ClassLevel, ContentStore, ItemKind, PracticeItem};
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle a copy of `pool` and keep the first `min(count, pool.len())` entries.
///
/// The shuffle is a full Fisher-Yates pass, so every permutation of the pool is
/// equally likely and the result never repeats an entry.
pub fn sample<R: Rng + ?Sized>(pool: &[String], count: usize, rng: &mut R) -> Vec<String> {
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(count.min(pool.len()));
    shuffled
}

/// Uniformly pick one entry, or an empty string when there is nothing to pick.
pub fn pick_one<R: Rng + ?Sized>(pool: &[String], rng: &mut R) -> String {
    pool.choose(rng).cloned().unwrap_or_default()
}

/// A pre-shuffled slice of one pool plus a cursor into it.
///
/// The slice is drawn once and stays fixed until [`SamplingSession::regenerate`]
/// is called for a level or mode change.
#[derive(Debug, Clone)]
pub struct SamplingSession {
    level: Option<ClassLevel>,
    kind: ItemKind,
    size: usize,
    drawn: Vec<PracticeItem>,
    cursor: usize,
}

impl SamplingSession {
    pub fn new<S, R>(
        store: &S,
        level: Option<ClassLevel>,
        kind: ItemKind,
        size: usize,
        rng: &mut R,
    ) -> Self
    where
        S: ContentStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut session = Self {
            level,
            kind,
            size,
            drawn: Vec::new(),
            cursor: 0,
        };
        session.regenerate(store, level, kind, rng);
        session
    }

    /// Build a session directly from a list of texts, in the given order.
    pub fn from_items(kind: ItemKind, texts: Vec<String>) -> Self {
        let size = texts.len();
        Self {
            level: None,
            kind,
            size,
            drawn: texts
                .into_iter()
                .map(|text| PracticeItem::new(text, kind))
                .collect(),
            cursor: 0,
        }
    }

    /// Redraw the subset for a new level or kind and rewind the cursor.
    pub fn regenerate<S, R>(
        &mut self,
        store: &S,
        level: Option<ClassLevel>,
        kind: ItemKind,
        rng: &mut R,
    ) where
        S: ContentStore + ?Sized,
        R: Rng + ?Sized,
    {
        let pool = store.items(level, kind);
        self.drawn = sample(&pool, self.size, rng)
            .into_iter()
            .map(|text| PracticeItem::new(text, kind))
            .collect();
        self.level = level;
        self.kind = kind;
        self.cursor = 0;

        if self.drawn.is_empty() {
            tracing::warn!(level = ?level.map(ClassLevel::get), %kind, "empty_content_pool");
        } else {
            tracing::debug!(
                level = ?level.map(ClassLevel::get),
                %kind,
                drawn = self.drawn.len(),
                "sampling_session_regenerated"
            );
        }
    }

    /// The item under the cursor, or an empty placeholder when nothing was drawn.
    pub fn current(&self) -> PracticeItem {
        self.drawn
            .get(self.cursor)
            .cloned()
            .unwrap_or_else(|| PracticeItem::empty(self.kind))
    }

    /// Move the cursor forward one item, wrapping around. Returns the new item.
    pub fn advance(&mut self) -> PracticeItem {
        if !self.drawn.is_empty() {
            self.cursor = (self.cursor + 1) % self.drawn.len();
        }
        self.current()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }

    pub fn items(&self) -> &[PracticeItem] {
        &self.drawn
    }

    pub fn level(&self) -> Option<ClassLevel> {
        self.level
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentPool, JsonContentStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    fn pool_of(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    struct FixedStore(ContentPool);

    impl ContentStore for FixedStore {
        fn pool(&self, level: Option<ClassLevel>) -> ContentPool {
            if level.is_some() {
                self.0.clone()
            } else {
                ContentPool::default()
            }
        }
    }

    #[test]
    fn test_sample_returns_requested_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = pool_of(&["a", "b", "c", "d", "e"]);

        let drawn = sample(&pool, 3, &mut rng);
        assert_eq!(drawn.len(), 3);
        for item in &drawn {
            assert!(pool.contains(item));
        }
        let unique: HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_sample_count_larger_than_pool_is_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool = pool_of(&["a", "b", "c", "d", "e"]);

        let mut drawn = sample(&pool, 50, &mut rng);
        assert_eq!(drawn.len(), pool.len());
        drawn.sort();
        assert_eq!(drawn, pool);
    }

    #[test]
    fn test_sample_empty_pool_and_zero_count() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample(&[], 4, &mut rng).is_empty());
        assert!(sample(&pool_of(&["a"]), 0, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_same_seed_same_order() {
        let pool = pool_of(&["a", "b", "c", "d", "e", "f", "g"]);
        let first = sample(&pool, 7, &mut StdRng::seed_from_u64(42));
        let second = sample(&pool, 7, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_sample_permutations_are_uniform() {
        // 3! = 6 orderings, each should show up about 1/6 of the time.
        let mut rng = StdRng::seed_from_u64(2024);
        let pool = pool_of(&["a", "b", "c"]);
        let trials = 12_000;
        let mut counts: HashMap<Vec<String>, usize> = HashMap::new();

        for _ in 0..trials {
            *counts.entry(sample(&pool, 3, &mut rng)).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 6);
        let expected = trials / 6;
        for (order, count) in counts {
            let diff = (count as i64 - expected as i64).abs();
            assert!(
                diff < (expected as i64) / 10,
                "ordering {order:?} seen {count} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn test_pick_one_uniformity() {
        let mut rng = StdRng::seed_from_u64(99);
        let pool = pool_of(&["a", "b", "c", "d", "e"]);
        let trials = 10_000;
        let mut counts: HashMap<String, usize> = HashMap::new();

        for _ in 0..trials {
            *counts.entry(pick_one(&pool, &mut rng)).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 5);
        for (word, count) in counts {
            let freq = count as f64 / trials as f64;
            assert!(
                (freq - 0.2).abs() < 0.02,
                "{word} picked with frequency {freq}"
            );
        }
    }

    #[test]
    fn test_pick_one_empty_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pick_one(&[], &mut rng), "");
    }

    #[test]
    fn test_session_cursor_wraps() {
        let mut session =
            SamplingSession::from_items(ItemKind::Word, pool_of(&["cat", "dog", "sun"]));

        assert_eq!(session.cursor(), 0);
        assert_eq!(session.current().text, "cat");
        assert_eq!(session.advance().text, "dog");
        assert_eq!(session.advance().text, "sun");
        assert_eq!(session.advance().text, "cat");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_session_empty_yields_placeholder() {
        let mut rng = StdRng::seed_from_u64(5);
        let store = FixedStore(ContentPool::default());
        let mut session =
            SamplingSession::new(&store, ClassLevel::new(1), ItemKind::Word, 10, &mut rng);

        assert!(session.is_empty());
        assert!(session.current().is_empty());
        assert!(session.advance().is_empty());
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_session_draw_is_stable_until_regenerated() {
        let mut rng = StdRng::seed_from_u64(8);
        let store = FixedStore(ContentPool::new(
            pool_of(&["a", "b", "c", "d", "e", "f"]),
            pool_of(&["One.", "Two."]),
        ));
        let mut session =
            SamplingSession::new(&store, ClassLevel::new(1), ItemKind::Word, 4, &mut rng);
        let drawn = session.items().to_vec();
        assert_eq!(drawn.len(), 4);

        for _ in 0..9 {
            session.advance();
        }
        assert_eq!(session.items(), drawn.as_slice());

        session.regenerate(&store, ClassLevel::new(1), ItemKind::Sentence, &mut rng);
        assert_eq!(session.kind(), ItemKind::Sentence);
        assert_eq!(session.len(), 2);
        assert_eq!(session.cursor(), 0);
        assert!(session.items().iter().all(|i| i.kind == ItemKind::Sentence));
    }

    #[test]
    fn test_session_unset_level_is_empty() {
        let mut rng = StdRng::seed_from_u64(8);
        let store = JsonContentStore::default();
        let session = SamplingSession::new(&store, None, ItemKind::Word, 4, &mut rng);
        assert!(session.is_empty());
        assert_eq!(session.level(), None);
    }
}
