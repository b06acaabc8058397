//! Collection types used throughout the compiler.

use rustc_hash::FxBuildHasher;
use std::fmt;
use std::sync::Arc;

pub use rustc_hash::{FxHashMap, FxHashSet};

/// Insertion-ordered map with the Fx hasher. Used where iteration order is
/// observable, e.g. library types exposed by a bound global scope.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// An immutable singly linked list with shared tails.
///
/// `prepend` never copies: the new list points at the existing one, so
/// nested scope frames can extend a list while siblings keep the same tail.
pub struct ConsList<T> {
    head: Option<Arc<ConsNode<T>>>,
}

struct ConsNode<T> {
    value: T,
    tail: ConsList<T>,
}

impl<T> ConsList<T> {
    pub const fn empty() -> Self {
        Self { head: None }
    }

    /// Return a new list with `value` in front of `self`.
    pub fn prepend(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(ConsNode {
                value,
                tail: self.clone(),
            })),
        }
    }

    pub fn head(&self) -> Option<&T> {
        self.head.as_ref().map(|node| &node.value)
    }

    pub fn tail(&self) -> Option<&ConsList<T>> {
        self.head.as_ref().map(|node| &node.tail)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> ConsIter<'_, T> {
        ConsIter {
            next: self.head.as_deref(),
        }
    }

    /// Whether both lists are the same allocation (or both empty).
    pub fn ptr_eq(&self, other: &ConsList<T>) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: PartialEq> ConsList<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|item| item == value)
    }
}

impl<T> Clone for ConsList<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
        }
    }
}

impl<T> Default for ConsList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for ConsList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct ConsIter<'a, T> {
    next: Option<&'a ConsNode<T>>,
}

impl<'a, T> Iterator for ConsIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.next?;
        self.next = node.tail.head.as_deref();
        Some(&node.value)
    }
}
