//! CountCache: per-group block presence tracking.
//!
//! The reconstruction loop asks one question constantly: how many blocks
//! of this group are local, and which ones. Most blocks, once verified
//! present, stay present, so presence reads vastly outnumber updates.
//! The cache therefore memoizes each group's present/absent partition and
//! recomputes it lazily, only after a flag for that group actually
//! changed. An update invalidates only the groups containing the touched
//! key, found through a reverse index, not every registered group.
//!
//! One coarse mutex guards the whole structure. Updates and reads are
//! both cheap relative to the I/O-bound fetches that trigger them, so
//! lock contention is not a concern here.

use std::collections::HashMap;
use std::sync::Mutex;

use amoeba_core::{Group, Key};

/// Lock-protected presence bookkeeping for registered groups.
///
/// Keys not belonging to any registered group are ignored on update and
/// read as absent. The cache is process-local bookkeeping, not a source
/// of network truth; it is never persisted.
pub struct CountCache {
    inner: Mutex<CountCacheInner>,
}

struct CountCacheInner {
    /// Slot index per registered group.
    ids: HashMap<Group, usize>,

    /// Presence state per group, indexed by slot.
    slots: Vec<GroupSlot>,

    /// Reverse index: key to the slots of the groups containing it.
    by_key: HashMap<Key, Vec<usize>>,
}

struct GroupSlot {
    group: Group,
    present: Vec<bool>,
    partitions: Option<Partitions>,
}

struct Partitions {
    present: Vec<Key>,
    absent: Vec<Key>,
}

impl GroupSlot {
    fn partitions(&mut self) -> &Partitions {
        let group = &self.group;
        let present = &self.present;
        self.partitions.get_or_insert_with(|| {
            // Single pass over the group's keys, amortized across reads.
            let mut have = Vec::new();
            let mut missing = Vec::new();
            for (pos, key) in group.keys().iter().enumerate() {
                if present[pos] {
                    have.push(key.clone());
                } else {
                    missing.push(key.clone());
                }
            }
            Partitions {
                present: have,
                absent: missing,
            }
        })
    }
}

impl CountCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CountCacheInner {
                ids: HashMap::new(),
                slots: Vec::new(),
                by_key: HashMap::new(),
            }),
        }
    }

    /// Register a group, all blocks initialized to absent.
    ///
    /// Idempotent: re-registering a known group resets its state.
    pub fn set_group(&self, group: &Group) {
        let mut inner = self.inner.lock().unwrap();

        if let Some(&id) = inner.ids.get(group) {
            let slot = &mut inner.slots[id];
            slot.present.fill(false);
            slot.partitions = None;
            return;
        }

        let id = inner.slots.len();
        inner.slots.push(GroupSlot {
            group: group.clone(),
            present: vec![false; group.keys().len()],
            partitions: None,
        });
        inner.ids.insert(group.clone(), id);
        for key in group.keys() {
            let slot_ids = inner.by_key.entry(key.clone()).or_default();
            // A group may hold the same key at several positions.
            if !slot_ids.contains(&id) {
                slot_ids.push(id);
            }
        }
    }

    /// Flip the presence flag of `key` in every group containing it.
    ///
    /// A key outside all registered groups is a no-op. Memoized
    /// partitions are invalidated only where a flag actually changed.
    pub fn set_state(&self, key: &Key, present: bool) {
        let mut inner = self.inner.lock().unwrap();

        let slot_ids = match inner.by_key.get(key) {
            Some(slot_ids) => slot_ids.clone(),
            None => return,
        };

        for id in slot_ids {
            let slot = &mut inner.slots[id];
            let mut changed = false;
            for (pos, slot_key) in slot.group.keys().iter().enumerate() {
                if slot_key == key && slot.present[pos] != present {
                    slot.present[pos] = present;
                    changed = true;
                }
            }
            if changed {
                slot.partitions = None;
            }
        }
    }

    /// The memoized present or absent partition of `group`.
    ///
    /// An unregistered group reads as empty.
    pub fn get_keys(&self, group: &Group, present: bool) -> Vec<Key> {
        let mut inner = self.inner.lock().unwrap();

        let id = match inner.ids.get(group) {
            Some(&id) => id,
            None => return Vec::new(),
        };
        let partitions = inner.slots[id].partitions();
        if present {
            partitions.present.clone()
        } else {
            partitions.absent.clone()
        }
    }

    /// Number of present blocks for `group`. Unregistered groups read 0.
    pub fn get_count(&self, group: &Group) -> usize {
        let mut inner = self.inner.lock().unwrap();

        let id = match inner.ids.get(group) {
            Some(&id) => id,
            None => return 0,
        };
        inner.slots[id].partitions().present.len()
    }
}

impl Default for CountCache {
    fn default() -> Self {
        Self::new()
    }
}
