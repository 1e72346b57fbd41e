/// A zero-based position counted from the **largest** element of a tree.
///
/// `Rank(0)` is the maximum, `Rank(len - 1)` the minimum. This is the same
/// number [`OSAvlTree::insert`](crate::OSAvlTree::insert) reports and
/// [`OSAvlTree::remove_at`](crate::OSAvlTree::remove_at) consumes.
///
/// # Examples
///
/// ```
/// use ostat::{OSAvlTree, Rank};
///
/// let tree = OSAvlTree::from([10, 30, 20]);
///
/// assert_eq!(tree[Rank(0)], 30);
/// assert_eq!(tree[Rank(2)], 10);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
