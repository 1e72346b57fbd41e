use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::Rank;
use crate::raw::{RawAvlTree, RawIter};

/// An ordered set on a size-augmented AVL tree.
///
/// Unlike [`OSAvlTree`](crate::OSAvlTree), keys are unique and are inserted and
/// removed by value. The subtree sizes still answer "how many keys are greater
/// than this one" in O(log n) through [`rank_less_than`].
///
/// [`rank_less_than`]: OSAvlSet::rank_less_than
///
/// # Examples
///
/// ```
/// use ostat::OSAvlSet;
///
/// let mut set = OSAvlSet::new();
/// assert!(set.insert(4));
/// assert!(set.insert(8));
/// assert!(!set.insert(4));
///
/// assert_eq!(set.rank_less_than(&5), 1);
/// assert_eq!(set.remove(&4), Some(4));
/// assert_eq!(set.len(), 1);
/// ```
pub struct OSAvlSet<K> {
    tree: RawAvlTree<K>,
}

/// An iterator over the keys of an [`OSAvlSet`] in ascending order.
///
/// This `struct` is created by the [`iter`](OSAvlSet::iter) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K: 'a> {
    inner: RawIter<'a, K>,
}

impl<K> OSAvlSet<K> {
    /// Makes a new, empty `OSAvlSet`.
    #[must_use]
    pub const fn new() -> Self {
        OSAvlSet { tree: RawAvlTree::new() }
    }

    /// Creates an empty set with room for at least `capacity` keys before it
    /// reallocates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        OSAvlSet {
            tree: RawAvlTree::with_capacity(capacity),
        }
    }

    /// Returns the number of keys the set can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Returns the number of keys in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the set holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the height of the underlying tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns the key at `position`, counted from the largest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlSet;
    ///
    /// let set = OSAvlSet::from([3, 9, 6]);
    /// assert_eq!(set.get(0), Some(&9));
    /// assert_eq!(set.get(3), None);
    /// ```
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&K> {
        self.tree.get_by_position(position)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Gets an iterator over the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter { inner: self.tree.iter() }
    }
}

impl<K: Ord> OSAvlSet<K> {
    /// Adds `key` to the set.
    ///
    /// Returns `false`, leaving the set unchanged, if an equal key is present.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K) -> bool {
        self.tree.insert_unique(key)
    }

    /// Removes the key equal to `key` and returns it, or `None` if absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.remove_key(key)
    }

    /// Returns `true` if the set contains a key equal to `key`.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.get(key).is_some()
    }

    /// Counts the keys that are strictly greater than `key`.
    ///
    /// This is the position `key` has, or would have, counted from the largest
    /// key. `key` does not need to be in the set.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlSet;
    ///
    /// let set = OSAvlSet::from([10, 20, 30, 40]);
    /// assert_eq!(set.rank_less_than(&20), 2);
    /// assert_eq!(set.rank_less_than(&25), 2);
    /// assert_eq!(set.rank_less_than(&0), 4);
    /// assert_eq!(set.rank_less_than(&40), 0);
    /// ```
    #[must_use]
    pub fn rank_less_than<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.tree.count_greater(key)
    }
}

impl<K> Default for OSAvlSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Clone for OSAvlSet<K> {
    fn clone(&self) -> Self {
        OSAvlSet { tree: self.tree.clone() }
    }
}

impl<K: fmt::Debug> fmt::Debug for OSAvlSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord> FromIterator<K> for OSAvlSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = OSAvlSet::new();
        set.extend(iter);
        set
    }
}

impl<K: Ord> Extend<K> for OSAvlSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for OSAvlSet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K> IntoIterator for &'a OSAvlSet<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

/// Indexes into the set by position from the largest key.
///
/// # Panics
///
/// Panics if the rank is out of bounds.
impl<K> Index<Rank> for OSAvlSet<K> {
    type Output = K;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.get(rank.0).expect("index out of bounds")
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
