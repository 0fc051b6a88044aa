//! services/app/src/state/favorites.rs
//!
//! The set of documents marked "favorite". Purely local: loaded
//! synchronously from the profile store on construction, written
//! synchronously on every effective mutation, never synchronized to the
//! server. Switching profiles sees an independent set.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tracing::warn;

use doclens_core::ports::{ProfileStorage, FAVORITES_KEY};

use super::lock;

pub struct FavoritesStore {
    storage: Arc<dyn ProfileStorage>,
    ids: Mutex<BTreeSet<i64>>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn ProfileStorage>) -> Self {
        let ids = storage
            .get(FAVORITES_KEY)
            .and_then(|raw| match serde_json::from_str::<Vec<i64>>(&raw) {
                Ok(ids) => Some(ids.into_iter().collect()),
                Err(error) => {
                    warn!("persisted favorites are corrupt, starting empty: {error}");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            storage,
            ids: Mutex::new(ids),
        }
    }

    /// Idempotent: adding a present id changes nothing and skips the
    /// persist.
    pub fn add(&self, document_id: i64) {
        let mut ids = lock(&self.ids);
        if ids.insert(document_id) {
            self.persist(&ids);
        }
    }

    pub fn remove(&self, document_id: i64) {
        let mut ids = lock(&self.ids);
        if ids.remove(&document_id) {
            self.persist(&ids);
        }
    }

    pub fn toggle(&self, document_id: i64) {
        let mut ids = lock(&self.ids);
        if !ids.insert(document_id) {
            ids.remove(&document_id);
        }
        self.persist(&ids);
    }

    pub fn is_favorite(&self, document_id: i64) -> bool {
        lock(&self.ids).contains(&document_id)
    }

    pub fn ids(&self) -> BTreeSet<i64> {
        lock(&self.ids).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.ids).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.ids).is_empty()
    }

    fn persist(&self, ids: &BTreeSet<i64>) {
        let encoded = match serde_json::to_string(&ids.iter().collect::<Vec<_>>()) {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!("cannot encode favorites: {error}");
                return;
            }
        };
        if let Err(error) = self.storage.set(FAVORITES_KEY, &encoded) {
            warn!("cannot persist favorites: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::MemoryStorage;
    use proptest::prelude::*;

    fn persisted(storage: &MemoryStorage) -> BTreeSet<i64> {
        storage
            .get(FAVORITES_KEY)
            .map(|raw| serde_json::from_str::<Vec<i64>>(&raw).unwrap().into_iter().collect())
            .unwrap_or_default()
    }

    #[test]
    fn add_is_idempotent() {
        let storage = Arc::new(MemoryStorage::default());
        let favorites = FavoritesStore::new(storage.clone());

        favorites.add(42);
        let after_one = persisted(&storage);
        favorites.add(42);

        assert!(favorites.is_favorite(42));
        assert_eq!(favorites.len(), 1);
        assert_eq!(persisted(&storage), after_one);
    }

    #[test]
    fn toggle_flips_membership() {
        let storage = Arc::new(MemoryStorage::default());
        let favorites = FavoritesStore::new(storage);

        favorites.toggle(7);
        assert!(favorites.is_favorite(7));
        favorites.toggle(7);
        assert!(!favorites.is_favorite(7));
    }

    #[test]
    fn survives_reload_from_storage() {
        let storage = Arc::new(MemoryStorage::default());
        {
            let favorites = FavoritesStore::new(storage.clone());
            favorites.add(1);
            favorites.add(2);
            favorites.remove(1);
        }

        let reloaded = FavoritesStore::new(storage);
        assert_eq!(reloaded.ids(), BTreeSet::from([2]));
    }

    #[test]
    fn corrupt_persisted_set_starts_empty() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set(FAVORITES_KEY, "not json").unwrap();
        let favorites = FavoritesStore::new(storage);
        assert!(favorites.is_empty());
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Add(i64),
        Remove(i64),
        Toggle(i64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        (0..3u8, 0..10i64).prop_map(|(kind, id)| match kind {
            0 => Op::Add(id),
            1 => Op::Remove(id),
            _ => Op::Toggle(id),
        })
    }

    proptest! {
        /// Membership reflects the net parity of operations per id, and the
        /// persisted set never drifts from the in-memory one.
        #[test]
        fn membership_matches_a_model_set(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let storage = Arc::new(MemoryStorage::default());
            let favorites = FavoritesStore::new(storage.clone());
            let mut model = BTreeSet::new();

            for op in ops {
                match op {
                    Op::Add(id) => {
                        favorites.add(id);
                        model.insert(id);
                    }
                    Op::Remove(id) => {
                        favorites.remove(id);
                        model.remove(&id);
                    }
                    Op::Toggle(id) => {
                        if !model.insert(id) {
                            model.remove(&id);
                        }
                        favorites.toggle(id);
                    }
                }
                prop_assert_eq!(favorites.ids(), model.clone());
                prop_assert_eq!(persisted(&storage), model.clone());
            }

            for id in 0..10i64 {
                prop_assert_eq!(favorites.is_favorite(id), model.contains(&id));
            }
        }
    }
}
