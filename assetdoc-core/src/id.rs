//! # Session IDs
//!
//! Unique identifiers for things that live only as long as the process does, such as open documents
//! or frozen type registries. `SessionID<T>` is namespaced by `T`: two IDs of different namespaces may
//! share a numeric value, but they can never be compared with each other.
//!
//! These are *not* persistent. Nothing here survives a restart, and nothing should be written to disk.

use std::sync::atomic::{AtomicU64, Ordering};

// Next free value per namespace. Namespaces are added rarely (once per type, ever), so the
// write lock is almost never taken.
static COUNTERS: parking_lot::RwLock<Option<hashbrown::HashMap<std::any::TypeId, AtomicU64>>> =
    parking_lot::const_rwlock(None);

/// ID unique within this execution of the program, within the namespace `T`.
pub struct SessionID<T: std::any::Any> {
    id: std::num::NonZeroU64,
    _namespace: std::marker::PhantomData<fn() -> T>,
}
impl<T: std::any::Any> Clone for SessionID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for SessionID<T> {}
impl<T: std::any::Any> PartialEq for SessionID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for SessionID<T> {}
impl<T: std::any::Any> PartialOrd for SessionID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T: std::any::Any> Ord for SessionID<T> {
    /// Ordering is allocation order within a namespace. Handy for stable listings,
    /// meaningless across runs.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T: std::any::Any> std::hash::Hash for SessionID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> SessionID<T> {
    /// Allocate a fresh ID in this namespace.
    ///
    /// # Panics
    /// If all `u64::MAX - 1` values of the namespace have been handed out.
    #[must_use]
    pub fn new() -> Self {
        let ty = std::any::TypeId::of::<T>();
        let raw = {
            let read = COUNTERS.upgradable_read();
            match read.as_ref().and_then(|counters| counters.get(&ty)) {
                Some(counter) => counter.fetch_add(1, Ordering::Relaxed),
                None => {
                    let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                    let counters = write.get_or_insert_with(hashbrown::HashMap::new);
                    // Another thread may have raced us between the read and the upgrade.
                    counters
                        .entry(ty)
                        .or_insert_with(|| AtomicU64::new(1))
                        .fetch_add(1, Ordering::Relaxed)
                }
            }
        };
        let Some(id) = std::num::NonZeroU64::new(raw) else {
            log::error!("{} ID overflow!", std::any::type_name::<T>());
            panic!("{} ID overflow!", std::any::type_name::<T>());
        };
        Self {
            id,
            _namespace: std::marker::PhantomData,
        }
    }
    /// The raw numeric value. Only unique within this namespace!
    #[must_use]
    pub fn get(&self) -> u64 {
        self.id.get()
    }
}
impl<T: std::any::Any> Default for SessionID<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: std::any::Any> std::fmt::Display for SessionID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = std::any::type_name::<T>();
        // rsplit always yields at least one item.
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{short}#{}", self.id)
    }
}
impl<T: std::any::Any> std::fmt::Debug for SessionID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
