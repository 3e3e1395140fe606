use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crossbeam_utils::sync::WaitGroup;

use crate::AssetPath;

/// A cached result. `None` records a failed load.
pub(crate) type Cached<T> = Option<Arc<T>>;

pub(crate) type CacheMap<T> = HashMap<AssetPath, CacheState<T>>;

pub(crate) enum CacheState<T> {
    /// Being loaded by another thread. The group is dropped once the load finishes.
    Processing {
        wait_group: WaitGroup,
        /// Set when the slot was evicted while loading, the result is then discarded.
        evicted: bool,
    },
    Cached(Cached<T>),
}

/// Outcome of looking up a slot before loading.
pub(crate) enum Slot<T> {
    Ready(Cached<T>),
    Pending(WaitGroup),
    /// The slot was empty and is now marked as processing by the caller.
    Claimed,
}

/// A result map with its value type erased.
trait ErasedCache: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Drops every finished result and marks running loads as evicted.
    fn clear(&mut self);
}

impl<T: Send + Sync + 'static> ErasedCache for CacheMap<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clear(&mut self) {
        self.retain(|_, state| match state {
            CacheState::Processing { evicted, .. } => {
                *evicted = true;
                true
            }
            CacheState::Cached(_) => false,
        });
    }
}

/// One result map per kind of asset, keyed by the type producing it.
#[derive(Default)]
pub(crate) struct CacheManager {
    caches: BTreeMap<TypeId, Box<dyn ErasedCache>>,
}

impl CacheManager {
    pub fn get_cache<T: Send + Sync + 'static>(&self, kind: TypeId) -> Option<&CacheMap<T>> {
        let cache = self.caches.get(&kind)?;

        Some(
            cache
                .as_any()
                .downcast_ref()
                .expect("type must be correct here, map is keyed by type id"),
        )
    }

    pub fn get_cache_mut<T: Send + Sync + 'static>(&mut self, kind: TypeId) -> &mut CacheMap<T> {
        let cache = self
            .caches
            .entry(kind)
            .or_insert_with(|| Box::<CacheMap<T>>::default());

        cache
            .as_any_mut()
            .downcast_mut()
            .expect("type must be correct here, map is keyed by type id")
    }

    pub fn claim<T: Send + Sync + 'static>(&mut self, kind: TypeId, path: &AssetPath) -> Slot<T> {
        let cache = self.get_cache_mut::<T>(kind);

        match cache.get(path) {
            Some(CacheState::Cached(cached)) => Slot::Ready(cached.clone()),
            Some(CacheState::Processing { wait_group, .. }) => Slot::Pending(wait_group.clone()),
            None => {
                cache.insert(
                    path.clone(),
                    CacheState::Processing {
                        wait_group: WaitGroup::new(),
                        evicted: false,
                    },
                );
                Slot::Claimed
            }
        }
    }

    /// Stores the result of a claimed slot, releasing everyone waiting on it.
    ///
    /// If the slot was evicted while loading, the result is discarded and the
    /// slot is emptied instead, so waiters load the asset again.
    pub fn complete<T: Send + Sync + 'static>(
        &mut self,
        kind: TypeId,
        path: &AssetPath,
        result: Cached<T>,
    ) {
        let cache = self.get_cache_mut::<T>(kind);

        // Replacing or removing the state drops the WaitGroup, signaling waiting threads
        match cache.get_mut(path) {
            Some(CacheState::Processing { evicted: true, .. }) => {
                cache.remove(path);
            }
            Some(state) => *state = CacheState::Cached(result),
            None => {}
        }
    }

    pub fn get<T: Send + Sync + 'static>(&self, kind: TypeId, path: &AssetPath) -> Cached<T> {
        match self.get_cache::<T>(kind)?.get(path)? {
            CacheState::Cached(cached) => cached.clone(),
            CacheState::Processing { .. } => None,
        }
    }

    /// Drops a finished result. A running load keeps its slot, so no second
    /// load of the path can start, but its result won't be stored.
    ///
    /// Returns whether there was anything to evict.
    pub fn evict<T: Send + Sync + 'static>(&mut self, kind: TypeId, path: &AssetPath) -> bool {
        let cache = self.get_cache_mut::<T>(kind);

        match cache.get_mut(path) {
            Some(CacheState::Processing { evicted, .. }) => {
                *evicted = true;
                true
            }
            Some(CacheState::Cached(_)) => cache.remove(path).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for cache in self.caches.values_mut() {
            cache.clear();
        }
    }
}
