use std::collections::HashMap;

use tracing::warn;

use super::store::{KeyValueStore, PersistenceError};

const KEY_PREFIX: &str = "best_score.";

/// Best score per category, persisted through a [`KeyValueStore`] and cached
/// for the lifetime of the process.
///
/// Only the maximum is kept; individual session scores are not recorded.
pub struct ScoreStore<S> {
    store: S,
    cache: HashMap<String, usize>,
}

impl<S: KeyValueStore> ScoreStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a finished session's score and return the resulting best.
    ///
    /// The in-memory best is updated even when persisting fails; the error
    /// is still returned so the caller can report it.
    /// A stored value that is not a score is overwritten.
    pub fn record_score(&mut self, category: &str, score: usize) -> Result<usize, PersistenceError> {
        let stored = match self.read_stored(category) {
            Err(PersistenceError::BadValue { key, value }) => {
                warn!(key = %key, value = %value, "overwriting unreadable best score");
                Ok(None)
            }
            other => other,
        };
        let cached = self.cache.get(category).copied().unwrap_or(0);
        let best = match &stored {
            Ok(Some(value)) => cached.max(*value),
            _ => cached,
        }
        .max(score);
        self.cache.insert(category.to_string(), best);

        if stored? != Some(best) {
            self.store.set(&key_for(category), &best.to_string())?;
        }
        Ok(best)
    }

    /// Best score seen for `category`, or 0. Store failures fall back to the
    /// in-memory value.
    pub fn best_score(&self, category: &str) -> usize {
        let cached = self.cache.get(category).copied().unwrap_or(0);
        match self.read_stored(category) {
            Ok(stored) => stored.unwrap_or(0).max(cached),
            Err(e) => {
                warn!(category, error = %e, "best score unavailable, using cached value");
                cached
            }
        }
    }

    fn read_stored(&self, category: &str) -> Result<Option<usize>, PersistenceError> {
        let key = key_for(category);
        match self.store.get(&key)? {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| PersistenceError::BadValue { key, value }),
        }
    }
}

fn key_for(category: &str) -> String {
    format!("{}{}", KEY_PREFIX, category)
}
