//! sable_syntax: The immutable syntax tree consumed by the binder.
//!
//! Trees are produced by an external front end (or by `SyntaxTreeBuilder`
//! in tests) as a flat node list in which children precede their parents.
//! A node's `NodeId` is its index, which makes node identity stable and
//! cheap to use as a cache key.

pub mod builder;
pub mod kinds;
pub mod tree;

pub use builder::SyntaxTreeBuilder;
pub use kinds::{BinaryOperator, LiteralValue, ModifierFlags, SyntaxKind, UnaryOperator};
pub use tree::{NodeId, SyntaxNode, SyntaxTree, TreeDocument, TreeError};
