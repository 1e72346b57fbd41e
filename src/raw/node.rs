use super::handle::Link;
use super::size::Size;

/// Which child link of a node a descent followed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

// AVL node augmented with the size of its subtree.
#[derive(Clone)]
pub(crate) struct Node<K> {
    key: K,
    // Height of the subtree rooted here; a leaf has height 1.
    height: u8,
    size: Size,
    left: Link,
    right: Link,
}

impl<K> Node<K> {
    /// Creates a detached leaf.
    pub(crate) const fn leaf(key: K) -> Self {
        Self {
            key,
            height: 1,
            size: Size::ONE,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn into_key(self) -> K {
        self.key
    }

    #[inline]
    pub(crate) fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size.to_usize()
    }

    #[inline]
    pub(crate) fn left(&self) -> Link {
        self.left
    }

    #[inline]
    pub(crate) fn right(&self) -> Link {
        self.right
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Link) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    pub(crate) fn set_children(&mut self, left: Link, right: Link) {
        self.left = left;
        self.right = right;
    }

    /// Stores the height and size derived from the children's.
    pub(crate) fn set_measure(&mut self, height: u8, size: Size) {
        self.height = height;
        self.size = size;
    }
}
