use core::borrow::Borrow;
use core::cmp::Ordering::{Equal, Greater, Less};

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::{Handle, Link};
use super::node::{Node, Side};
use super::size::Size;

/// Inline depth of descent paths and iteration stacks. An AVL tree over the whole
/// `u32` handle space is at most 46 levels tall.
const MAX_DEPTH: usize = 48;

/// One step of a root-to-node descent: the node left behind and the link taken.
#[derive(Clone, Copy, Debug)]
struct Step {
    node: Handle,
    side: Side,
}

/// Ancestors visited on the way down, root first.
type Path = SmallVec<[Step; MAX_DEPTH]>;

/// The size-augmented AVL tree backing `OSAvlTree` and `OSAvlSet`.
///
/// Positions are zero-based and counted from the largest key: position 0 is the
/// maximum. Nodes never point back at their parents; every mutation records the
/// descent in a [`Path`] and rebalances along it on the way back up.
#[derive(Clone)]
pub(crate) struct RawAvlTree<K> {
    /// Arena owning every node of the tree.
    nodes: Arena<Node<K>>,
    /// Handle of the root node, if the tree is non-empty.
    root: Link,
}

impl<K> RawAvlTree<K> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    /// Creates an empty tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Height of the whole tree; 0 when empty.
    pub(crate) fn height(&self) -> usize {
        usize::from(self.height_of(self.root))
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn iter(&self) -> RawIter<'_, K> {
        RawIter::new(self)
    }

    #[inline]
    fn height_of(&self, link: Link) -> u8 {
        link.map_or(0, |handle| self.nodes.get(handle).height())
    }

    #[inline]
    fn size_of(&self, link: Link) -> usize {
        link.map_or(0, |handle| self.nodes.get(handle).size())
    }

    fn balance_factor(&self, handle: Handle) -> i16 {
        let node = self.nodes.get(handle);
        i16::from(self.height_of(node.right())) - i16::from(self.height_of(node.left()))
    }

    /// Recomputes the height and size of `handle` from its children.
    fn update(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let (left, right) = (node.left(), node.right());
        let height = 1 + self.height_of(left).max(self.height_of(right));
        let size = Size::of_children(self.size_of(left), self.size_of(right));
        self.nodes.get_mut(handle).set_measure(height, size);
    }

    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let pivot = self
            .nodes
            .get(handle)
            .right()
            .expect("`RawAvlTree::rotate_left()` - node has no right child!");
        let inner = self.nodes.get(pivot).left();
        self.nodes.get_mut(handle).set_child(Side::Right, inner);
        self.nodes.get_mut(pivot).set_child(Side::Left, Some(handle));
        self.update(handle);
        self.update(pivot);
        log::trace!("rotated left, new subtree size {}", self.nodes.get(pivot).size());
        pivot
    }

    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let pivot = self
            .nodes
            .get(handle)
            .left()
            .expect("`RawAvlTree::rotate_right()` - node has no left child!");
        let inner = self.nodes.get(pivot).right();
        self.nodes.get_mut(handle).set_child(Side::Left, inner);
        self.nodes.get_mut(pivot).set_child(Side::Right, Some(handle));
        self.update(handle);
        self.update(pivot);
        log::trace!("rotated right, new subtree size {}", self.nodes.get(pivot).size());
        pivot
    }

    /// Restores the balance of the subtree rooted at `handle`, whose children are
    /// already balanced, and returns the subtree's new root.
    fn rebalance(&mut self, handle: Handle) -> Handle {
        self.update(handle);
        match self.balance_factor(handle) {
            2 => {
                let right = self
                    .nodes
                    .get(handle)
                    .right()
                    .expect("`RawAvlTree::rebalance()` - right-heavy without right child!");
                if self.balance_factor(right) < 0 {
                    let right = self.rotate_right(right);
                    self.nodes.get_mut(handle).set_child(Side::Right, Some(right));
                }
                self.rotate_left(handle)
            }
            -2 => {
                let left = self
                    .nodes
                    .get(handle)
                    .left()
                    .expect("`RawAvlTree::rebalance()` - left-heavy without left child!");
                if self.balance_factor(left) > 0 {
                    let left = self.rotate_left(left);
                    self.nodes.get_mut(handle).set_child(Side::Left, Some(left));
                }
                self.rotate_right(handle)
            }
            factor => {
                debug_assert!(factor.abs() <= 1, "`RawAvlTree::rebalance()` - balance factor {factor} out of reach");
                handle
            }
        }
    }

    /// Hangs `child` below the deepest step of `path`, then rebalances each step
    /// bottom-up. Consumes the path and returns the top of the rebuilt chain.
    fn rebuild(&mut self, path: &mut Path, mut child: Link) -> Link {
        while let Some(step) = path.pop() {
            self.nodes.get_mut(step.node).set_child(step.side, child);
            child = Some(self.rebalance(step.node));
        }
        child
    }

    /// Removes the node `target`, reached through `path`, and returns its key.
    fn unlink(&mut self, path: &mut Path, target: Handle) -> K {
        let removed = self.nodes.take(target);
        let replacement = match removed.right() {
            None => removed.left(),
            Some(right) => {
                let (successor, rest) = self.detach_min(right);
                self.nodes.get_mut(successor).set_children(removed.left(), rest);
                Some(self.rebalance(successor))
            }
        };
        self.root = self.rebuild(path, replacement);
        removed.into_key()
    }

    /// Cuts the leftmost node out of `subtree`. Returns it (with stale links) and
    /// the rebalanced remainder of the subtree.
    fn detach_min(&mut self, subtree: Handle) -> (Handle, Link) {
        let mut path = Path::new();
        let mut current = subtree;
        while let Some(left) = self.nodes.get(current).left() {
            path.push(Step {
                node: current,
                side: Side::Left,
            });
            current = left;
        }
        let rest = self.nodes.get(current).right();
        (current, self.rebuild(&mut path, rest))
    }

    /// Returns the key at `position`, counted from the largest key.
    pub(crate) fn get_by_position(&self, position: usize) -> Option<&K> {
        if position >= self.len() {
            return None;
        }

        let mut remaining = position;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let right = self.size_of(node.right());
            match remaining.cmp(&right) {
                Equal => return Some(node.key()),
                Greater => {
                    remaining -= right + 1;
                    current = node.left();
                }
                Less => current = node.right(),
            }
        }
        unreachable!("get_by_position: size invariant violated - position {position} not found (len: {})", self.len())
    }

    /// Removes the key at `position`, counted from the largest key.
    ///
    /// Out-of-range positions leave the tree untouched and return `None`.
    pub(crate) fn remove_at(&mut self, position: usize) -> Option<K> {
        if position >= self.len() {
            log::debug!("remove_at({position}) ignored, tree holds {} keys", self.len());
            return None;
        }

        let mut path = Path::new();
        let mut remaining = position;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let right = self.size_of(node.right());
            match remaining.cmp(&right) {
                Equal => return Some(self.unlink(&mut path, handle)),
                Greater => {
                    remaining -= right + 1;
                    path.push(Step {
                        node: handle,
                        side: Side::Left,
                    });
                    current = node.left();
                }
                Less => {
                    path.push(Step {
                        node: handle,
                        side: Side::Right,
                    });
                    current = node.right();
                }
            }
        }
        unreachable!("remove_at: size invariant violated - position {position} not found (len: {})", self.len())
    }
}

impl<K: Ord> RawAvlTree<K> {
    /// Inserts `key`, keeping any equal keys already present, and returns its
    /// position: the number of keys strictly greater than it.
    ///
    /// Equal keys descend right, so the new key lands after every equal key in
    /// ascending order.
    pub(crate) fn insert_ranked(&mut self, key: K) -> usize {
        let mut path = Path::new();
        let mut position = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            if key < *node.key() {
                position += self.size_of(node.right()) + 1;
                path.push(Step {
                    node: handle,
                    side: Side::Left,
                });
                current = node.left();
            } else {
                path.push(Step {
                    node: handle,
                    side: Side::Right,
                });
                current = node.right();
            }
        }

        let leaf = self.nodes.alloc(Node::leaf(key));
        self.root = self.rebuild(&mut path, Some(leaf));
        position
    }

    /// Inserts `key` unless an equal key is present. Returns whether it was inserted.
    pub(crate) fn insert_unique(&mut self, key: K) -> bool {
        let mut path = Path::new();
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let side = match key.cmp(node.key()) {
                Less => Side::Left,
                Greater => Side::Right,
                Equal => return false,
            };
            path.push(Step { node: handle, side });
            current = node.child(side);
        }

        let leaf = self.nodes.alloc(Node::leaf(key));
        self.root = self.rebuild(&mut path, Some(leaf));
        true
    }

    /// Removes the key equal to `key`, if any.
    pub(crate) fn remove_key<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut path = Path::new();
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let side = match key.cmp(node.key().borrow()) {
                Less => Side::Left,
                Greater => Side::Right,
                Equal => return Some(self.unlink(&mut path, handle)),
            };
            path.push(Step { node: handle, side });
            current = node.child(side);
        }
        None
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            current = match key.cmp(node.key().borrow()) {
                Less => node.left(),
                Greater => node.right(),
                Equal => return Some(node.key()),
            };
        }
        None
    }

    /// Number of keys strictly greater than `key`.
    pub(crate) fn count_greater<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut count = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            if key.cmp(node.key().borrow()) == Less {
                count += self.size_of(node.right()) + 1;
                current = node.left();
            } else {
                current = node.right();
            }
        }
        count
    }
}

/// Ascending in-order walk over a [`RawAvlTree`].
pub(crate) struct RawIter<'a, K> {
    tree: &'a RawAvlTree<K>,
    // Nodes whose key and right subtree are still to be yielded, deepest on top.
    stack: SmallVec<[Handle; MAX_DEPTH]>,
    remaining: usize,
}

impl<'a, K> RawIter<'a, K> {
    fn new(tree: &'a RawAvlTree<K>) -> Self {
        let mut iter = Self {
            tree,
            stack: SmallVec::new(),
            remaining: tree.len(),
        };
        iter.push_left_spine(tree.root);
        iter
    }

    fn push_left_spine(&mut self, mut link: Link) {
        while let Some(handle) = link {
            self.stack.push(handle);
            link = self.tree.nodes.get(handle).left();
        }
    }
}

impl<K> Clone for RawIter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K> Iterator for RawIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let handle = self.stack.pop()?;
        let node = self.tree.nodes.get(handle);
        self.push_left_spine(node.right());
        self.remaining -= 1;
        Some(node.key())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    impl<K: Ord + core::fmt::Debug> RawAvlTree<K> {
        /// Validates balance, size and ordering invariants. Panics with every
        /// violation found. `strict` demands strictly increasing keys.
        pub(crate) fn validate_invariants(&self, strict: bool) {
            let mut errors: Vec<String> = Vec::new();
            let (_, size) = self.validate_node(self.root, &mut errors);
            if size != self.len() {
                errors.push(alloc::format!("len mismatch: arena holds {}, root size {}", self.len(), size));
            }

            let keys: Vec<&K> = self.iter().collect();
            if keys.len() != self.len() {
                errors.push(alloc::format!("iter yielded {} keys, len is {}", keys.len(), self.len()));
            }
            for pair in keys.windows(2) {
                let ordered = if strict { pair[0] < pair[1] } else { pair[0] <= pair[1] };
                if !ordered {
                    errors.push(alloc::format!("in-order violation: {:?} before {:?}", pair[0], pair[1]));
                }
            }

            assert!(errors.is_empty(), "Tree invariant violations:\n{}", errors.join("\n"));
        }

        // Returns the (height, size) actually found below `link`.
        fn validate_node(&self, link: Link, errors: &mut Vec<String>) -> (u8, usize) {
            let Some(handle) = link else {
                return (0, 0);
            };
            let node = self.nodes.get(handle);
            let (left_height, left_size) = self.validate_node(node.left(), errors);
            let (right_height, right_size) = self.validate_node(node.right(), errors);

            let height = 1 + left_height.max(right_height);
            let size = left_size + right_size + 1;
            if node.height() != height {
                errors.push(alloc::format!("node {:?}: stored height {}, actual {}", node.key(), node.height(), height));
            }
            if node.size() != size {
                errors.push(alloc::format!("node {:?}: stored size {}, actual {}", node.key(), node.size(), size));
            }
            if left_height.abs_diff(right_height) > 1 {
                errors.push(alloc::format!(
                    "node {:?}: unbalanced, left height {}, right height {}",
                    node.key(),
                    left_height,
                    right_height
                ));
            }
            (height, size)
        }
    }

    /// Reference model: keys sorted from largest to smallest, so the index is the position.
    fn model_insert(model: &mut Vec<i32>, key: i32) -> usize {
        let position = model.iter().filter(|&&k| k > key).count();
        model.insert(position, key);
        position
    }

    #[test]
    fn insert_reports_count_of_greater_keys() {
        let mut tree = RawAvlTree::new();
        assert_eq!(tree.insert_ranked(10), 0);
        assert_eq!(tree.insert_ranked(5), 1);
        assert_eq!(tree.insert_ranked(20), 0);
        tree.validate_invariants(false);
    }

    #[test]
    fn duplicates_land_after_equal_keys() {
        let mut tree = RawAvlTree::new();
        assert_eq!(tree.insert_ranked(7), 0);
        assert_eq!(tree.insert_ranked(7), 0);
        assert_eq!(tree.insert_ranked(9), 0);
        assert_eq!(tree.insert_ranked(7), 1);
        assert_eq!(tree.len(), 4);
        tree.validate_invariants(false);
    }

    #[test]
    fn remove_at_out_of_range_is_a_no_op() {
        let mut tree = RawAvlTree::new();
        for key in [3, 1, 2] {
            tree.insert_ranked(key);
        }
        let height = tree.height();
        assert_eq!(tree.remove_at(3), None);
        assert_eq!(tree.remove_at(usize::MAX), None);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.height(), height);
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn remove_root_with_two_children() {
        let mut tree = RawAvlTree::new();
        for key in [50, 30, 70, 20, 40, 60, 80, 65] {
            tree.insert_ranked(key);
        }
        // 50 is the fifth largest.
        assert_eq!(tree.get_by_position(4), Some(&50));
        assert_eq!(tree.remove_at(4), Some(50));
        tree.validate_invariants(false);
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [20, 30, 40, 60, 65, 70, 80]);
    }

    #[test]
    fn ascending_inserts_stay_logarithmic() {
        let mut tree = RawAvlTree::new();
        for key in 0..1000 {
            assert_eq!(tree.insert_ranked(key), 0);
        }
        tree.validate_invariants(true);
        assert!(tree.height() <= 14, "height {} too tall for 1000 keys", tree.height());
    }

    // Tallest AVL tree over `u32` handles is 46 levels.
    static_assertions::const_assert!(MAX_DEPTH >= 46);

    #[test]
    fn descent_stacks_hold_max_depth_inline() {
        assert_eq!(Path::new().inline_size(), MAX_DEPTH);
        let tree: RawAvlTree<u8> = RawAvlTree::new();
        assert_eq!(tree.iter().stack.inline_size(), MAX_DEPTH);
    }

    #[test]
    fn few_distinct_keys_under_heavy_churn() {
        let mut tree = RawAvlTree::new();
        let mut model = Vec::new();
        let mut x: u64 = 12345;
        for _ in 0..20_000 {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            let roll = (x >> 33) as usize;
            if roll % 3 == 0 {
                let position = (roll / 3) % (model.len() + 2);
                let expected = (position < model.len()).then(|| model.remove(position));
                assert_eq!(tree.remove_at(position), expected);
            } else {
                let key = (roll % 5) as i32;
                assert_eq!(tree.insert_ranked(key), model_insert(&mut model, key));
            }
        }
        tree.validate_invariants(false);
        assert_eq!(tree.len(), model.len());
        assert!(tree.iter().copied().eq(model.iter().rev().copied()));
    }

    #[test]
    fn removed_slots_are_recycled() {
        let mut tree = RawAvlTree::new();
        for key in 0..64 {
            tree.insert_ranked(key);
        }
        let capacity = tree.capacity();
        for _ in 0..1000 {
            let key = tree.remove_at(17).unwrap();
            tree.insert_ranked(key);
        }
        assert_eq!(tree.capacity(), capacity);
        tree.validate_invariants(true);
    }

    #[test]
    fn count_greater_on_unique_tree() {
        let mut tree = RawAvlTree::new();
        for key in [10, 20, 30, 40] {
            assert!(tree.insert_unique(key));
        }
        assert!(!tree.insert_unique(20));
        assert_eq!(tree.count_greater(&5), 4);
        assert_eq!(tree.count_greater(&20), 2);
        assert_eq!(tree.count_greater(&25), 2);
        assert_eq!(tree.count_greater(&40), 0);
        tree.validate_invariants(true);
    }

    #[derive(Clone, Debug)]
    enum RankedOp {
        Insert(i32),
        RemoveAt(usize),
    }

    fn ranked_op_strategy() -> impl Strategy<Value = RankedOp> {
        prop_oneof![
            3 => (0i32..200).prop_map(RankedOp::Insert),
            2 => (0usize..300).prop_map(RankedOp::RemoveAt),
        ]
    }

    #[derive(Clone, Debug)]
    enum KeyedOp {
        Insert(i32),
        Remove(i32),
        CountGreater(i32),
    }

    fn keyed_op_strategy() -> impl Strategy<Value = KeyedOp> {
        prop_oneof![
            3 => (0i32..1000).prop_map(KeyedOp::Insert),
            2 => (0i32..1000).prop_map(KeyedOp::Remove),
            1 => (-10i32..1010).prop_map(KeyedOp::CountGreater),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn ranked_ops_match_descending_vec(ops in prop::collection::vec(ranked_op_strategy(), 0..500)) {
            let mut tree = RawAvlTree::new();
            let mut model: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    RankedOp::Insert(key) => {
                        let expected = model_insert(&mut model, key);
                        prop_assert_eq!(tree.insert_ranked(key), expected, "insert({})", key);
                        prop_assert_eq!(tree.get_by_position(expected), Some(&key));
                    }
                    RankedOp::RemoveAt(position) => {
                        let expected = (position < model.len()).then(|| model.remove(position));
                        prop_assert_eq!(tree.remove_at(position), expected, "remove_at({})", position);
                    }
                }
                tree.validate_invariants(false);
                prop_assert_eq!(tree.len(), model.len());
            }

            let ascending: Vec<i32> = model.iter().rev().copied().collect();
            prop_assert_eq!(tree.iter().copied().collect::<Vec<_>>(), ascending);
        }

        #[test]
        fn keyed_ops_match_btreeset(ops in prop::collection::vec(keyed_op_strategy(), 0..500)) {
            let mut tree = RawAvlTree::new();
            let mut model: BTreeSet<i32> = BTreeSet::new();

            for op in ops {
                match op {
                    KeyedOp::Insert(key) => {
                        prop_assert_eq!(tree.insert_unique(key), model.insert(key), "insert({})", key);
                    }
                    KeyedOp::Remove(key) => {
                        prop_assert_eq!(tree.remove_key(&key), model.take(&key), "remove({})", key);
                    }
                    KeyedOp::CountGreater(key) => {
                        let expected = model.range(key + 1..).count();
                        prop_assert_eq!(tree.count_greater(&key), expected, "count_greater({})", key);
                    }
                }
                tree.validate_invariants(true);
            }

            prop_assert_eq!(tree.iter().copied().collect::<Vec<_>>(), model.iter().copied().collect::<Vec<_>>());
        }

        #[test]
        fn position_round_trip(keys in prop::collection::vec(0i32..500, 1..200)) {
            let mut tree = RawAvlTree::new();
            for &key in &keys {
                tree.insert_unique(key);
            }

            for position in 0..tree.len() {
                let key = *tree.get_by_position(position).unwrap();
                prop_assert_eq!(tree.count_greater(&key), position);
                prop_assert_eq!(tree.get(&key), Some(&key));
            }
            prop_assert!(tree.get_by_position(tree.len()).is_none());
        }
    }
}
