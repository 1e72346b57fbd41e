use alloc::vec::Vec;

use super::handle::{Handle, Link};

/// Backing storage for tree nodes.
///
/// Released slots are threaded into an intrusive free list and reused before the
/// vector grows, so a tree that churns through inserts and removals keeps a
/// stable footprint.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    entries: Vec<Entry<T>>,
    next_free: Link,
    len: usize,
}

#[derive(Clone)]
enum Entry<T> {
    Occupied(T),
    // Link to the next vacant entry.
    Vacant(Link),
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_free: None,
            len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            next_free: None,
            len: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        self.len += 1;
        if let Some(handle) = self.next_free {
            let entry = &mut self.entries[handle.to_index()];
            match core::mem::replace(entry, Entry::Occupied(element)) {
                Entry::Vacant(next) => self.next_free = next,
                Entry::Occupied(_) => panic!("`Arena::alloc()` - free list points at a live entry!"),
            }
            return handle;
        }

        // At most `Handle::MAX` entries, so that a subtree size always fits a `Size`.
        assert!(
            self.entries.len() < Handle::MAX,
            "`Arena::alloc()` - arena is at maximum capacity ({})",
            Handle::MAX
        );
        self.entries.push(Entry::Occupied(element));
        Handle::from_index(self.entries.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        match &self.entries[handle.to_index()] {
            Entry::Occupied(element) => element,
            Entry::Vacant(_) => panic!("`Arena::get()` - `handle` is invalid!"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        match &mut self.entries[handle.to_index()] {
            Entry::Occupied(element) => element,
            Entry::Vacant(_) => panic!("`Arena::get_mut()` - `handle` is invalid!"),
        }
    }

    /// Moves the element out and puts its slot on the free list.
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let entry = &mut self.entries[handle.to_index()];
        match core::mem::replace(entry, Entry::Vacant(self.next_free)) {
            Entry::Occupied(element) => {
                self.next_free = Some(handle);
                self.len -= 1;
                element
            }
            Entry::Vacant(next) => {
                *entry = Entry::Vacant(next);
                panic!("`Arena::take()` - `handle` is invalid!")
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_free = None;
        self.len = 0;
    }
}
