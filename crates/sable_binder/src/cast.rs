//! Conversion kinds.

use std::fmt;

/// The kind of a conversion from one type to another.
///
/// `None` means no conversion exists. The predicates below are total over
/// every variant; a new variant must be added to each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    None,
    Identity,
    Implicit,
    ImplicitNullable,
    ImplicitReference,
    Boxing,
    BoxingImplicitNullable,
    AnyBoxing,
    AnyBoxingImplicitNullable,
    Explicit,
    ExplicitNullable,
    ExplicitReference,
    BoxingExplicitNullable,
    AnyBoxingExplicitNullable,
    Unboxing,
    UnboxingImplicitNullable,
    UnboxingExplicitNullable,
    AnyUnboxing,
    AnyUnboxingImplicitNullable,
    AnyUnboxingExplicitNullable,
}

impl CastKind {
    pub const ALL: [CastKind; 20] = [
        CastKind::None,
        CastKind::Identity,
        CastKind::Implicit,
        CastKind::ImplicitNullable,
        CastKind::ImplicitReference,
        CastKind::Boxing,
        CastKind::BoxingImplicitNullable,
        CastKind::AnyBoxing,
        CastKind::AnyBoxingImplicitNullable,
        CastKind::Explicit,
        CastKind::ExplicitNullable,
        CastKind::ExplicitReference,
        CastKind::BoxingExplicitNullable,
        CastKind::AnyBoxingExplicitNullable,
        CastKind::Unboxing,
        CastKind::UnboxingImplicitNullable,
        CastKind::UnboxingExplicitNullable,
        CastKind::AnyUnboxing,
        CastKind::AnyUnboxingImplicitNullable,
        CastKind::AnyUnboxingExplicitNullable,
    ];

    /// Whether the conversion may happen without a cast expression.
    pub fn is_implicit(self) -> bool {
        match self {
            CastKind::Identity
            | CastKind::Implicit
            | CastKind::ImplicitNullable
            | CastKind::ImplicitReference
            | CastKind::Boxing
            | CastKind::BoxingImplicitNullable
            | CastKind::AnyBoxing
            | CastKind::AnyBoxingImplicitNullable => true,
            CastKind::None
            | CastKind::Explicit
            | CastKind::ExplicitNullable
            | CastKind::ExplicitReference
            | CastKind::BoxingExplicitNullable
            | CastKind::AnyBoxingExplicitNullable
            | CastKind::Unboxing
            | CastKind::UnboxingImplicitNullable
            | CastKind::UnboxingExplicitNullable
            | CastKind::AnyUnboxing
            | CastKind::AnyUnboxingImplicitNullable
            | CastKind::AnyUnboxingExplicitNullable => false,
        }
    }

    /// Whether the conversion needs a cast expression. `None` counts as
    /// explicit: it is not implicit, and a cast will reject it.
    pub fn is_explicit(self) -> bool {
        !self.is_implicit()
    }

    pub fn exists(self) -> bool {
        self != CastKind::None
    }

    /// Whether a nullable type is involved on either side.
    pub fn is_nullable(self) -> bool {
        match self {
            CastKind::ImplicitNullable
            | CastKind::BoxingImplicitNullable
            | CastKind::AnyBoxingImplicitNullable
            | CastKind::ExplicitNullable
            | CastKind::BoxingExplicitNullable
            | CastKind::UnboxingImplicitNullable
            | CastKind::UnboxingExplicitNullable
            | CastKind::AnyBoxingExplicitNullable
            | CastKind::AnyUnboxingImplicitNullable
            | CastKind::AnyUnboxingExplicitNullable => true,
            CastKind::None
            | CastKind::Identity
            | CastKind::Implicit
            | CastKind::ImplicitReference
            | CastKind::Boxing
            | CastKind::AnyBoxing
            | CastKind::Explicit
            | CastKind::ExplicitReference
            | CastKind::Unboxing
            | CastKind::AnyUnboxing => false,
        }
    }

    pub fn is_boxing(self) -> bool {
        match self {
            CastKind::Boxing
            | CastKind::BoxingImplicitNullable
            | CastKind::BoxingExplicitNullable
            | CastKind::AnyBoxing
            | CastKind::AnyBoxingImplicitNullable
            | CastKind::AnyBoxingExplicitNullable => true,
            CastKind::None
            | CastKind::Identity
            | CastKind::Implicit
            | CastKind::ImplicitNullable
            | CastKind::ImplicitReference
            | CastKind::Explicit
            | CastKind::ExplicitNullable
            | CastKind::ExplicitReference
            | CastKind::Unboxing
            | CastKind::UnboxingImplicitNullable
            | CastKind::UnboxingExplicitNullable
            | CastKind::AnyUnboxing
            | CastKind::AnyUnboxingImplicitNullable
            | CastKind::AnyUnboxingExplicitNullable => false,
        }
    }

    pub fn is_unboxing(self) -> bool {
        match self {
            CastKind::Unboxing
            | CastKind::UnboxingImplicitNullable
            | CastKind::UnboxingExplicitNullable
            | CastKind::AnyUnboxing
            | CastKind::AnyUnboxingImplicitNullable
            | CastKind::AnyUnboxingExplicitNullable => true,
            CastKind::None
            | CastKind::Identity
            | CastKind::Implicit
            | CastKind::ImplicitNullable
            | CastKind::ImplicitReference
            | CastKind::Boxing
            | CastKind::BoxingImplicitNullable
            | CastKind::AnyBoxing
            | CastKind::AnyBoxingImplicitNullable
            | CastKind::Explicit
            | CastKind::ExplicitNullable
            | CastKind::ExplicitReference
            | CastKind::BoxingExplicitNullable
            | CastKind::AnyBoxingExplicitNullable => false,
        }
    }

    /// Whether the conversion boxes to or unboxes from `any`.
    pub fn involves_any(self) -> bool {
        matches!(
            self,
            CastKind::AnyBoxing
                | CastKind::AnyBoxingImplicitNullable
                | CastKind::AnyBoxingExplicitNullable
                | CastKind::AnyUnboxing
                | CastKind::AnyUnboxingImplicitNullable
                | CastKind::AnyUnboxingExplicitNullable
        )
    }
}

impl fmt::Display for CastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
