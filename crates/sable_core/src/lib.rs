//! sable_core: Core utilities shared by every stage of the sable compiler.
//!
//! Provides identifier interning, text spans, and the small persistent
//! collections the binder threads through its scope chain.

pub mod collections;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use collections::{ConsList, FxIndexMap};
pub use intern::{Name, NameTable};
pub use text::TextSpan;
