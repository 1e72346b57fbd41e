use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::Rank;
use crate::raw::{RawAvlTree, RawIter};

/// An ordered multiset on an AVL tree, addressed by position.
///
/// Every node tracks the size of its subtree, so each [`insert`] reports in
/// O(log n) where the new key landed, and [`remove_at`] removes by that same
/// position. Positions are zero-based and counted from the **largest** key:
/// position 0 is the maximum.
///
/// Equal keys are all kept. A key inserted next to equal keys is placed after
/// them in ascending order, which makes its position the number of keys strictly
/// greater than it.
///
/// It is a logic error for a key to be modified in such a way that its ordering
/// relative to any other key, as determined by the [`Ord`] trait, changes while it
/// is in the tree.
///
/// [`insert`]: OSAvlTree::insert
/// [`remove_at`]: OSAvlTree::remove_at
///
/// # Examples
///
/// ```
/// use ostat::OSAvlTree;
///
/// let mut line = OSAvlTree::new();
///
/// // Each arrival reports how many taller ones stand before it.
/// assert_eq!(line.insert(170), 0);
/// assert_eq!(line.insert(160), 1);
/// assert_eq!(line.insert(185), 0);
///
/// // The second tallest leaves.
/// assert_eq!(line.remove_at(1), Some(170));
/// assert_eq!(line.iter().copied().collect::<Vec<_>>(), [160, 185]);
/// ```
pub struct OSAvlTree<K> {
    tree: RawAvlTree<K>,
}

/// An iterator over the keys of an [`OSAvlTree`] in ascending order.
///
/// This `struct` is created by the [`iter`](OSAvlTree::iter) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K: 'a> {
    inner: RawIter<'a, K>,
}

impl<K> OSAvlTree<K> {
    /// Makes a new, empty `OSAvlTree`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let tree: OSAvlTree<i32> = OSAvlTree::new();
    /// assert!(tree.is_empty());
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        OSAvlTree { tree: RawAvlTree::new() }
    }

    /// Creates an empty tree with room for at least `capacity` keys before it
    /// reallocates.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let tree: OSAvlTree<u64> = OSAvlTree::with_capacity(64);
    /// assert!(tree.capacity() >= 64);
    /// ```
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        OSAvlTree {
            tree: RawAvlTree::with_capacity(capacity),
        }
    }

    /// Returns the number of keys the tree can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Returns the number of keys in the tree, counting duplicates.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the height of the tree: 0 when empty, 1 for a single key.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let tree: OSAvlTree<_> = (0..7).collect();
    /// assert_eq!(tree.height(), 3);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns the key at `position`, counted from the largest key, or `None`
    /// if `position >= len`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let tree = OSAvlTree::from([1, 3, 2]);
    /// assert_eq!(tree.get(0), Some(&3));
    /// assert_eq!(tree.get(2), Some(&1));
    /// assert_eq!(tree.get(3), None);
    /// ```
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&K> {
        self.tree.get_by_position(position)
    }

    /// Removes and returns the key at `position`, counted from the largest key.
    ///
    /// A `position` past the end is a no-op and returns `None`; the tree is left
    /// exactly as it was.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let mut tree = OSAvlTree::from([5, 7, 5]);
    /// assert_eq!(tree.remove_at(0), Some(7));
    /// assert_eq!(tree.remove_at(2), None);
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn remove_at(&mut self, position: usize) -> Option<K> {
        self.tree.remove_at(position)
    }

    /// Removes every key, releasing the node storage.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Gets an iterator over the keys in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let tree = OSAvlTree::from([2, 1, 2]);
    /// assert_eq!(tree.iter().collect::<Vec<_>>(), [&1, &2, &2]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K> {
        Iter { inner: self.tree.iter() }
    }
}

impl<K: Ord> OSAvlTree<K> {
    /// Inserts `key` and returns its position: the number of keys already in the
    /// tree that are strictly greater than it.
    ///
    /// Duplicates are accepted.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use ostat::OSAvlTree;
    ///
    /// let mut tree = OSAvlTree::new();
    /// assert_eq!(tree.insert(10), 0);
    /// assert_eq!(tree.insert(5), 1);
    /// assert_eq!(tree.insert(20), 0);
    /// assert_eq!(tree.insert(10), 1);
    /// assert_eq!(tree.len(), 4);
    /// ```
    pub fn insert(&mut self, key: K) -> usize {
        self.tree.insert_ranked(key)
    }
}

impl<K> Default for OSAvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Clone for OSAvlTree<K> {
    fn clone(&self) -> Self {
        OSAvlTree { tree: self.tree.clone() }
    }
}

impl<K: fmt::Debug> fmt::Debug for OSAvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: Ord> FromIterator<K> for OSAvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = OSAvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord> Extend<K> for OSAvlTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for OSAvlTree<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K> IntoIterator for &'a OSAvlTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

/// Indexes into the tree by position from the largest key.
///
/// # Panics
///
/// Panics if the rank is out of bounds.
impl<K> Index<Rank> for OSAvlTree<K> {
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
