use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToggleError {
    #[error("a previous change to this item is still being saved")]
    AlreadyPending,
}

/// Membership flip applied locally and awaiting the server's answer.
#[derive(Debug)]
#[must_use = "a pending toggle must be committed or rolled back"]
pub struct PendingToggle<T> {
    item: T,
    previous: bool,
    generation: u64,
}

impl<T> PendingToggle<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Membership shown to the user while the request is in flight.
    pub fn is_member(&self) -> bool {
        !self.previous
    }
}

/// Set whose membership flips immediately and is rolled back if the server refuses.
///
/// [`clear`](Self::clear) starts a new generation; toggles begun before it resolve as stale and
/// leave the set untouched.
#[derive(Debug, Clone)]
pub struct OptimisticSet<T> {
    members: HashSet<T>,
    pending: HashMap<T, bool>,
    generation: u64,
}

impl<T> Default for OptimisticSet<T> {
    fn default() -> Self {
        Self {
            members: HashSet::new(),
            pending: HashMap::new(),
            generation: 0,
        }
    }
}

impl<T: Eq + Hash + Clone> OptimisticSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    pub fn is_pending(&self, item: &T) -> bool {
        self.pending.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &T> {
        self.members.iter()
    }

    /// Replaces membership with what the server reported. Items with a toggle in flight keep
    /// their local state.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        let mut next: HashSet<T> = items.into_iter().collect();
        for item in self.pending.keys() {
            next.remove(item);
            if self.members.contains(item) {
                next.insert(item.clone());
            }
        }
        self.members = next;
    }

    /// Records server-side membership of a single item, unless a toggle is in flight.
    pub fn observe(&mut self, item: T, member: bool) {
        if self.pending.contains_key(&item) {
            return;
        }
        if member {
            self.members.insert(item);
        } else {
            self.members.remove(&item);
        }
    }

    pub fn begin_toggle(&mut self, item: T) -> Result<PendingToggle<T>, ToggleError> {
        if self.pending.contains_key(&item) {
            return Err(ToggleError::AlreadyPending);
        }
        let previous = self.members.contains(&item);
        if previous {
            self.members.remove(&item);
        } else {
            self.members.insert(item.clone());
        }
        self.pending.insert(item.clone(), previous);
        Ok(PendingToggle {
            item,
            previous,
            generation: self.generation,
        })
    }

    /// Keeps the flipped membership. Returns `false` for a toggle begun before the last
    /// [`clear`](Self::clear).
    pub fn commit(&mut self, toggle: PendingToggle<T>) -> bool {
        if toggle.generation != self.generation {
            return false;
        }
        self.pending.remove(&toggle.item);
        true
    }

    /// Restores the membership seen before the toggle. Returns `false` for a stale toggle.
    pub fn rollback(&mut self, toggle: PendingToggle<T>) -> bool {
        if toggle.generation != self.generation {
            return false;
        }
        self.pending.remove(&toggle.item);
        if toggle.previous {
            self.members.insert(toggle.item);
        } else {
            self.members.remove(&toggle.item);
        }
        true
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.pending.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
#[path = "tests/optimistic_tests.rs"]
mod tests;
