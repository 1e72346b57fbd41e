use alloc::boxed::Box;
use core::iter::FusedIterator;

/// One cell of the open-addressing table.
#[derive(Clone, Debug)]
pub(crate) enum Slot<T> {
    /// Never used since the table was (re)built. Ends every probe walk.
    Empty,
    Occupied(T),
    /// Tombstone: used to hold a value, which was removed. Probe walks step over
    /// it, insertions may reuse it.
    Deleted,
}

impl<T> Slot<T> {
    #[inline]
    pub(crate) fn value(&self) -> Option<&T> {
        match self {
            Slot::Occupied(value) => Some(value),
            Slot::Empty | Slot::Deleted => None,
        }
    }

    /// Turns an occupied slot into a tombstone and hands back its value.
    /// Any other slot is left alone.
    pub(crate) fn bury(&mut self) -> Option<T> {
        match core::mem::replace(self, Slot::Deleted) {
            Slot::Occupied(value) => Some(value),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Allocates a table of `capacity` empty slots.
pub(crate) fn empty_table<T>(capacity: usize) -> Box<[Slot<T>]> {
    core::iter::repeat_with(|| Slot::Empty).take(capacity).collect()
}

/// Double-hashing probe sequence `(h1 + i * h2) mod capacity` for
/// `i = 0..capacity`.
///
/// The table capacity is a power of two and the step is forced odd, so the two
/// are coprime: the sequence never stalls on a zero step and visits every slot
/// exactly once.
#[derive(Clone, Debug)]
pub(crate) struct ProbeSeq {
    index: usize,
    step: usize,
    capacity: usize,
    remaining: usize,
}

impl ProbeSeq {
    pub(crate) fn new(primary: u64, secondary: u64, capacity: usize) -> Self {
        debug_assert!(
            capacity >= 2 && capacity.is_power_of_two(),
            "`ProbeSeq::new()` - capacity {capacity} is not a power of two"
        );
        let modulus = capacity as u64;
        let half = modulus / 2;
        // Both results are below `capacity`, so they fit a `usize`.
        #[allow(clippy::cast_possible_truncation)]
        let (index, step) = ((primary % modulus) as usize, ((secondary % half) * 2 + 1) as usize);
        Self {
            index,
            step,
            capacity,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let index = self.index;
        self.index = (self.index + self.step) % self.capacity;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}

impl FusedIterator for ProbeSeq {}
