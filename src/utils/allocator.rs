use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable identifier for a body. Handles are never reused once retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

impl BodyHandle {
    /// Reserved placeholder carried by bodies that were never registered.
    pub const PLACEHOLDER: BodyHandle = BodyHandle(u32::MAX);

    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// The default handle is [`BodyHandle::PLACEHOLDER`], never issued by an [`Arena`].
impl Default for BodyHandle {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Insertion-ordered arena keyed by [`BodyHandle`].
///
/// Removed slots become tombstones so iteration order stays the order of
/// insertion; handles of removed items are retired and never handed out again.
pub struct Arena<T> {
    items: Vec<Option<(BodyHandle, T)>>,
    slots: HashMap<BodyHandle, usize>,
    retired: HashSet<BodyHandle>,
    next: u32,
    tombstones: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            slots: HashMap::new(),
            retired: HashSet::new(),
            next: 0,
            tombstones: 0,
        }
    }

    /// Returns `true` if `handle` is neither live, retired nor the placeholder.
    pub fn is_available(&self, handle: BodyHandle) -> bool {
        handle != BodyHandle::PLACEHOLDER
            && !self.slots.contains_key(&handle)
            && !self.retired.contains(&handle)
    }

    /// Returns `true` if `handle` was ever handed out, live or retired.
    pub fn was_issued(&self, handle: BodyHandle) -> bool {
        self.slots.contains_key(&handle) || self.retired.contains(&handle)
    }

    /// Inserts an item under the next unused handle.
    ///
    /// Returns the item back once every handle below the placeholder is taken.
    pub fn insert(&mut self, item: T) -> Result<BodyHandle, T> {
        let mut raw = self.next;
        while !self.is_available(BodyHandle(raw)) {
            match raw.checked_add(1) {
                Some(next) => raw = next,
                None => return Err(item),
            }
        }
        let handle = BodyHandle(raw);
        self.place(handle, item);
        Ok(handle)
    }

    /// Inserts an item under a caller-chosen handle.
    ///
    /// Returns the item back if the handle is live, retired or the placeholder.
    pub fn insert_with_handle(&mut self, handle: BodyHandle, item: T) -> Result<(), T> {
        if !self.is_available(handle) {
            return Err(item);
        }
        self.place(handle, item);
        Ok(())
    }

    fn place(&mut self, handle: BodyHandle, item: T) {
        self.slots.insert(handle, self.items.len());
        self.items.push(Some((handle, item)));
        // The placeholder is never placed, so this cannot overflow.
        if handle.0 >= self.next {
            self.next = handle.0 + 1;
        }
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&T> {
        let slot = *self.slots.get(&handle)?;
        self.items[slot].as_ref().map(|(_, item)| item)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut T> {
        let slot = *self.slots.get(&handle)?;
        self.items[slot].as_mut().map(|(_, item)| item)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<T> {
        let slot = self.slots.remove(&handle)?;
        self.retired.insert(handle);
        let (_, item) = self.items[slot].take()?;
        self.tombstones += 1;
        if self.tombstones * 2 > self.items.len() {
            self.compact();
        }
        Some(item)
    }

    fn compact(&mut self) {
        self.items.retain(Option::is_some);
        self.slots.clear();
        for (slot, entry) in self.items.iter().enumerate() {
            if let Some((handle, _)) = entry {
                self.slots.insert(*handle, slot);
            }
        }
        self.tombstones = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(_, item)| item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.items
            .iter_mut()
            .filter_map(|entry| entry.as_mut().map(|(_, item)| item))
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.items
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(handle, _)| *handle))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Borrows two distinct elements of a slice mutably, in argument order.
pub fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }

    let (first, second, flipped) = if a < b { (a, b, false) } else { (b, a, true) };
    let (left, right) = items.split_at_mut(second);
    let first_slot = &mut left[first];
    let second_slot = &mut right[0];

    if flipped {
        Some((second_slot, first_slot))
    } else {
        Some((first_slot, second_slot))
    }
}
