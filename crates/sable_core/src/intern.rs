//! Identifier interning.
//!
//! Every declared name is interned once when the symbol table is built so
//! that member lookup compares integer handles instead of strings.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned identifier. Comparing two `Name`s is an integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(Spur);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// Thread-safe identifier table.
///
/// Cloning is cheap and every clone shares the same storage, so the table
/// can be handed to parallel binding passes.
#[derive(Clone)]
pub struct NameTable {
    rodeo: Arc<ThreadedRodeo>,
}

impl NameTable {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern `text`, returning the existing handle if it was seen before.
    #[inline]
    pub fn intern(&self, text: &str) -> Name {
        Name(self.rodeo.get_or_intern(text))
    }

    /// Look up a name without interning it. Lookups of names that were never
    /// declared return `None`, which lets callers skip member searches early.
    #[inline]
    pub fn get(&self, text: &str) -> Option<Name> {
        self.rodeo.get(text).map(Name)
    }

    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.0)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let names = NameTable::new();
        let a = names.intern("count");
        let b = names.intern("count");
        let c = names.intern("total");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(names.resolve(a), "count");
        assert_eq!(names.resolve(c), "total");
    }

    #[test]
    fn test_get_does_not_intern() {
        let names = NameTable::new();
        assert!(names.get("missing").is_none());
        assert!(names.is_empty());
        let a = names.intern("missing");
        assert_eq!(names.get("missing"), Some(a));
    }

    #[test]
    fn test_clones_share_storage() {
        let names = NameTable::new();
        let other = names.clone();
        let a = names.intern("shared");
        assert_eq!(other.get("shared"), Some(a));
        assert_eq!(other.len(), 1);
    }
}
