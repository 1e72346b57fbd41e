//! Order-statistic AVL trees and a double-hashed open-addressing hash set.
//!
//! This crate provides three small in-memory containers:
//!
//! - [`OSAvlTree`] - an AVL multiset whose [`insert`](OSAvlTree::insert) reports
//!   the new key's position and whose [`remove_at`](OSAvlTree::remove_at)
//!   removes by position
//! - [`OSAvlSet`] - the same tree keyed by value, with a
//!   [`rank_less_than`](OSAvlSet::rank_less_than) query
//! - [`ProbeHashSet`] - an open-addressing set with double hashing, tombstones and
//!   doubling growth
//!
//! Positions are zero-based and counted from the **largest** key, so position 0
//! is the maximum.
//!
//! # Example
//!
//! ```
//! use ostat::{OSAvlTree, ProbeHashSet, Rank};
//!
//! let mut tree = OSAvlTree::new();
//! assert_eq!(tree.insert(10), 0);
//! assert_eq!(tree.insert(5), 1);
//! assert_eq!(tree.insert(20), 0);
//! assert_eq!(tree[Rank(0)], 20);
//!
//! let mut seen = ProbeHashSet::new();
//! assert!(seen.insert("abc").is_ok());
//! assert!(seen.insert("abc").is_err());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - the containers only require `alloc`
//! - **`driver`** (default) - the line-oriented command loops behind the
//!   `probe-set` and `ranked-avl` binaries; requires `std`
//!
//! # Implementation
//!
//! Tree nodes live in an arena and refer to their children by handle. Nodes carry
//! no parent links: every mutation records its descent path and rebalances along it
//! on the way back up. The hash set keeps its values in a power-of-two table of
//! tri-state slots.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;
#[cfg(feature = "driver")]
extern crate std;

mod order_statistic;
mod raw;

#[cfg(feature = "driver")]
pub mod driver;
pub mod osavl_set;
pub mod osavl_tree;
pub mod probe_hash_set;

pub use order_statistic::Rank;
pub use osavl_set::OSAvlSet;
pub use osavl_tree::OSAvlTree;
pub use probe_hash_set::{ProbeError, ProbeHashSet};
