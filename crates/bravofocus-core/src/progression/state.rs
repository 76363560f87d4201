use serde::{Deserialize, Serialize};

use crate::storage::{keys, read_parsed, KeyValueStore};

pub const EXP_PER_LEVEL: u64 = 100;

/// `floor(experience / 100) + 1`
pub fn level_for(experience: u64) -> u32 {
    u32::try_from(experience / EXP_PER_LEVEL)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// Persisted progression: experience, the level derived from it, and the
/// sticker collection.
///
/// Only [`ProgressionTracker`](super::ProgressionTracker) mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    experience: u64,
    level: u32,
    stickers: Vec<String>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            experience: 0,
            level: 1,
            stickers: Vec::new(),
        }
    }
}

impl ProgressionState {
    /// Build from cumulative experience and stickers; the level follows.
    pub fn new(experience: u64, stickers: Vec<String>) -> Self {
        Self {
            experience,
            level: level_for(experience),
            stickers,
        }
    }

    /// Read progression from the store. Missing or corrupt entries fall back
    /// to their initial values; a stored level that disagrees with the
    /// stored experience is replaced by the derived one.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let experience: u64 = read_parsed(store, keys::EXPERIENCE).unwrap_or(0);
        let stickers = match store.get(keys::STICKERS) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring corrupt sticker collection");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read sticker collection");
                Vec::new()
            }
        };

        let state = Self::new(experience, stickers);
        if let Some(stored) = read_parsed::<_, u32>(store, keys::LEVEL) {
            if stored != state.level {
                tracing::warn!(stored, derived = state.level, "stored level out of sync with experience");
            }
        }
        state
    }

    /// The key/value entries that represent this state.
    pub(crate) fn entries(&self) -> Vec<(String, String)> {
        let stickers = serde_json::to_string(&self.stickers).unwrap_or_else(|_| "[]".into());
        vec![
            (keys::EXPERIENCE.to_string(), self.experience.to_string()),
            (keys::LEVEL.to_string(), self.level.to_string()),
            (keys::STICKERS.to_string(), stickers),
        ]
    }

    pub fn experience(&self) -> u64 {
        self.experience
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stickers(&self) -> &[String] {
        &self.stickers
    }

    /// Experience earned inside the current level (0..100).
    pub fn exp_into_level(&self) -> u64 {
        self.experience % EXP_PER_LEVEL
    }

    pub fn exp_to_next_level(&self) -> u64 {
        EXP_PER_LEVEL - self.exp_into_level()
    }

    pub(super) fn gain(&mut self, exp: u64) {
        self.experience = self.experience.saturating_add(exp);
        self.level = level_for(self.experience);
    }

    pub(super) fn award(&mut self, sticker: String) {
        self.stickers.push(sticker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn level_is_derived_from_experience() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(105), 2);
        assert_eq!(level_for(1_250), 13);
    }

    #[test]
    fn empty_store_loads_initial_values() {
        let state = ProgressionState::load(&MemoryStore::new());
        assert_eq!(state, ProgressionState::default());
        assert_eq!(state.level(), 1);
        assert_eq!(state.exp_to_next_level(), 100);
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(keys::EXPERIENCE, "lots").unwrap();
        store.set(keys::STICKERS, "[\"🏆\",").unwrap();
        store.set(keys::LEVEL, "9").unwrap();

        let state = ProgressionState::load(&store);
        assert_eq!(state.experience(), 0);
        assert_eq!(state.level(), 1);
        assert!(state.stickers().is_empty());
    }

    #[test]
    fn stale_level_is_recomputed() {
        let mut store = MemoryStore::new();
        store.set(keys::EXPERIENCE, "230").unwrap();
        store.set(keys::LEVEL, "1").unwrap();
        store.set(keys::STICKERS, r#"["🏆","🚀"]"#).unwrap();

        let state = ProgressionState::load(&store);
        assert_eq!(state.level(), 3);
        assert_eq!(state.stickers(), ["🏆", "🚀"]);
        assert_eq!(state.exp_into_level(), 30);
        assert_eq!(state.exp_to_next_level(), 70);
    }

    #[test]
    fn entries_round_trip_through_store() {
        let state = ProgressionState::new(105, vec!["🦄".into()]);
        let mut store = MemoryStore::new();
        store.set_many(&state.entries()).unwrap();
        assert_eq!(ProgressionState::load(&store), state);
        assert_eq!(store.get(keys::LEVEL).unwrap().as_deref(), Some("2"));
    }
}
