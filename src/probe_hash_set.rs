//! An open-addressing hash set with double hashing and lazy deletion.

use alloc::boxed::Box;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;

use thiserror::Error;

mod hasher;
mod slot;

pub use hasher::{PolynomialHasher, PolynomialState, Primary, Secondary};
use slot::{ProbeSeq, Slot, empty_table};

/// Number of slots in a freshly created table.
pub const INITIAL_CAPACITY: usize = 8;

// Maximum load factor, 3/4, as a fraction so the check stays in integers.
const MAX_LOAD_NUMERATOR: usize = 3;
const MAX_LOAD_DENOMINATOR: usize = 4;

/// Why a [`ProbeHashSet`] operation did not change the set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error)]
pub enum ProbeError {
    /// `insert` found an equal value already in the set.
    #[error("value is already in the set")]
    AlreadyExists,
    /// `remove` found no equal value in the set.
    #[error("value is not in the set")]
    NotFound,
}

/// A hash set storing its values directly in a table of slots.
///
/// Collisions are resolved by double hashing: the value's probe sequence starts at
/// `h1(value) mod capacity` and advances by a step derived from an independent
/// hash `h2(value)`. Removal leaves a tombstone, so that values further along the
/// same probe sequence stay reachable; tombstones are reused by later insertions
/// and dropped whenever the table is rebuilt.
///
/// The table starts with [`INITIAL_CAPACITY`] slots. Its capacity is always a
/// power of two and doubles, never shrinks, whenever an insertion would push the
/// load factor above 3/4.
///
/// Tombstones do not count toward the load factor. A set churned at a steady
/// size keeps its capacity, so tombstones can come to fill every free slot; a
/// lookup that misses then walks the whole table. Growth and [`clear`] are the
/// only ways tombstones leave.
///
/// [`clear`]: ProbeHashSet::clear
/// Both hashers default to deterministic [`PolynomialState`]s; any pair of
/// [`BuildHasher`]s can be supplied with [`with_hashers`].
///
/// [`with_hashers`]: ProbeHashSet::with_hashers
///
/// # Examples
///
/// ```
/// use ostat::{ProbeError, ProbeHashSet};
///
/// let mut words = ProbeHashSet::new();
///
/// assert_eq!(words.insert(String::from("abc")), Ok(()));
/// assert_eq!(words.insert(String::from("abc")), Err(ProbeError::AlreadyExists));
/// assert!(words.contains("abc"));
///
/// assert_eq!(words.remove("abc"), Ok(String::from("abc")));
/// assert!(!words.contains("abc"));
/// assert_eq!(words.remove("abc"), Err(ProbeError::NotFound));
/// ```
#[derive(Clone)]
pub struct ProbeHashSet<T, S1 = Primary, S2 = Secondary> {
    slots: Box<[Slot<T>]>,
    // Occupied slots.
    len: usize,
    // Deleted slots.
    tombstones: usize,
    primary: S1,
    secondary: S2,
}

/// An iterator over the values of a [`ProbeHashSet`], in table order.
///
/// This `struct` is created by the [`iter`](ProbeHashSet::iter) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T: 'a> {
    slots: core::slice::Iter<'a, Slot<T>>,
    remaining: usize,
}

impl<T> ProbeHashSet<T> {
    /// Creates an empty set with [`INITIAL_CAPACITY`] slots and the default
    /// polynomial hashers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates an empty set with at least `capacity` slots.
    ///
    /// The capacity is rounded up to a power of two and never drops below
    /// [`INITIAL_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::ProbeHashSet;
    ///
    /// let set: ProbeHashSet<u32> = ProbeHashSet::with_capacity(100);
    /// assert_eq!(set.capacity(), 128);
    ///
    /// let set: ProbeHashSet<u32> = ProbeHashSet::with_capacity(0);
    /// assert_eq!(set.capacity(), 8);
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hashers(capacity, Primary::default(), Secondary::default())
    }
}

impl<T, S1, S2> ProbeHashSet<T, S1, S2> {
    /// Creates an empty set that hashes with `primary` for the start of each probe
    /// sequence and `secondary` for its step.
    #[must_use]
    pub fn with_hashers(primary: S1, secondary: S2) -> Self {
        Self::with_capacity_and_hashers(INITIAL_CAPACITY, primary, secondary)
    }

    /// Creates an empty set with at least `capacity` slots and the given hashers.
    #[must_use]
    pub fn with_capacity_and_hashers(capacity: usize, primary: S1, secondary: S2) -> Self {
        let capacity = capacity.max(INITIAL_CAPACITY).next_power_of_two();
        ProbeHashSet {
            slots: empty_table(capacity),
            len: 0,
            tombstones: 0,
            primary,
            secondary,
        }
    }

    /// Returns the number of values in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set holds no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstones left behind by removals since the table
    /// was last rebuilt.
    #[must_use]
    pub const fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns the ratio of values to slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Returns the two hashers, primary first.
    pub const fn hashers(&self) -> (&S1, &S2) {
        (&self.primary, &self.secondary)
    }

    /// Removes every value and tombstone, keeping the capacity.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
        self.len = 0;
        self.tombstones = 0;
    }

    /// Gets an iterator over the values in table order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }
}

/// Outcome of walking a probe sequence in search of a home for a value.
enum Vacancy {
    /// An equal value already lives in the set.
    Taken,
    /// The value belongs in this slot.
    At(usize),
    /// Every slot is live and none holds the value.
    Exhausted,
}

impl<T, S1, S2> ProbeHashSet<T, S1, S2>
where
    T: Hash + Eq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    #[inline]
    fn probe<Q>(&self, value: &Q) -> ProbeSeq
    where
        Q: ?Sized + Hash,
    {
        ProbeSeq::new(self.primary.hash_one(value), self.secondary.hash_one(value), self.capacity())
    }

    /// Finds the slot holding a value equal to `value`.
    fn position<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        for index in self.probe(value) {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied(stored) if value.eq(stored.borrow()) => return Some(index),
                Slot::Occupied(_) | Slot::Deleted => {}
            }
        }
        None
    }

    /// Walks the whole live stretch of `value`'s probe sequence: a tombstone is
    /// only reused once it is certain no equal value sits further along.
    fn vacancy(&self, value: &T) -> Vacancy {
        let mut tombstone = None;
        for index in self.probe(value) {
            match &self.slots[index] {
                Slot::Empty => return Vacancy::At(tombstone.unwrap_or(index)),
                Slot::Deleted => {
                    tombstone.get_or_insert(index);
                }
                Slot::Occupied(stored) if stored == value => return Vacancy::Taken,
                Slot::Occupied(_) => {}
            }
        }
        tombstone.map_or(Vacancy::Exhausted, Vacancy::At)
    }

    /// Returns `true` if the set contains a value equal to `value`.
    ///
    /// # Complexity
    ///
    /// O(1) expected.
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.position(value).is_some()
    }

    /// Returns a reference to the stored value equal to `value`, if any.
    #[must_use]
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.position(value).and_then(|index| self.slots[index].value())
    }

    /// Adds `value` to the set.
    ///
    /// Grows the table first if the insertion would take the load factor above
    /// 3/4. The value goes into the first tombstone of its probe sequence, or the
    /// first empty slot if there is no tombstone. Should the sequence turn out to
    /// be fully live, the table grows and the insertion is retried.
    ///
    /// # Errors
    ///
    /// [`ProbeError::AlreadyExists`] if an equal value is present; `value` is
    /// dropped and the set is unchanged apart from a possible growth.
    pub fn insert(&mut self, value: T) -> Result<(), ProbeError> {
        if exceeds_max_load(self.len + 1, self.capacity()) {
            self.grow();
        }

        loop {
            match self.vacancy(&value) {
                Vacancy::Taken => return Err(ProbeError::AlreadyExists),
                Vacancy::At(index) => {
                    if matches!(self.slots[index], Slot::Deleted) {
                        self.tombstones -= 1;
                    }
                    self.slots[index] = Slot::Occupied(value);
                    self.len += 1;
                    return Ok(());
                }
                Vacancy::Exhausted => {
                    log::debug!("probe sequence exhausted at capacity {}, growing", self.capacity());
                    self.grow();
                }
            }
        }
    }

    /// Removes the value equal to `value` and returns it, leaving a tombstone in
    /// its slot.
    ///
    /// # Errors
    ///
    /// [`ProbeError::NotFound`] if no equal value is present.
    pub fn remove<Q>(&mut self, value: &Q) -> Result<T, ProbeError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let index = self.position(value).ok_or(ProbeError::NotFound)?;
        let removed = self.slots[index].bury().ok_or(ProbeError::NotFound)?;
        self.len -= 1;
        self.tombstones += 1;
        Ok(removed)
    }

    /// Rebuilds the table at twice the capacity. Live values are rehashed into the
    /// first empty slot of their new probe sequence; tombstones are dropped.
    fn grow(&mut self) {
        let capacity = self
            .capacity()
            .checked_mul(2)
            .expect("`ProbeHashSet::grow()` - capacity overflow!");
        log::debug!(
            "growing probe table from {} to {capacity} slots ({} values, {} tombstones dropped)",
            self.capacity(),
            self.len,
            self.tombstones
        );

        let old = core::mem::replace(&mut self.slots, empty_table(capacity));
        self.tombstones = 0;
        for slot in old.into_vec() {
            if let Slot::Occupied(value) = slot {
                let index = self
                    .probe(&value)
                    .find(|&index| matches!(self.slots[index], Slot::Empty))
                    .expect("`ProbeHashSet::grow()` - rebuilt table has no empty slot!");
                self.slots[index] = Slot::Occupied(value);
            }
        }
    }
}

#[inline]
const fn exceeds_max_load(len: usize, capacity: usize) -> bool {
    len * MAX_LOAD_DENOMINATOR > capacity * MAX_LOAD_NUMERATOR
}

impl<T, S1: Default, S2: Default> Default for ProbeHashSet<T, S1, S2> {
    fn default() -> Self {
        Self::with_hashers(S1::default(), S2::default())
    }
}

impl<T: fmt::Debug, S1, S2> fmt::Debug for ProbeHashSet<T, S1, S2> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S1, S2> FromIterator<T> for ProbeHashSet<T, S1, S2>
where
    T: Hash + Eq,
    S1: BuildHasher + Default,
    S2: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

/// Values already in the set are skipped.
impl<T, S1, S2> Extend<T> for ProbeHashSet<T, S1, S2>
where
    T: Hash + Eq,
    S1: BuildHasher,
    S2: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            let _ = self.insert(value);
        }
    }
}

impl<'a, T, S1, S2> IntoIterator for &'a ProbeHashSet<T, S1, S2> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let value = self.slots.by_ref().find_map(Slot::value)?;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}
