//! Compile-time constants and the constant-field dependency ledger.

use sable_core::collections::FxHashSet;
use sable_symbols::{ConstantValue, SymbolId, TemplateArgument, TypeRef};
use sable_syntax::NodeId;
use std::sync::{Arc, Mutex, PoisonError};

/// A constant produced by binding. A `None` value is the `null` constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundConstant {
    pub value: Option<ConstantValue>,
}

impl BoundConstant {
    pub fn new(value: ConstantValue) -> Self {
        Self { value: Some(value) }
    }

    pub fn null() -> Self {
        Self { value: None }
    }

    /// Present and `null`.
    pub fn is_null(constant: Option<&BoundConstant>) -> bool {
        constant.is_some_and(|constant| constant.value.is_none())
    }

    /// Present and not `null`.
    pub fn is_not_null(constant: Option<&BoundConstant>) -> bool {
        constant.is_some_and(|constant| constant.value.is_some())
    }
}

/// Records which constant fields the constant currently being evaluated
/// depends on.
///
/// The tracker does not detect cycles itself; the constant evaluator orders
/// the recorded dependencies and breaks cycles.
#[derive(Debug, Clone)]
pub struct ConstantFieldsInProgress {
    field: Option<SymbolId>,
    dependencies: Option<Arc<Mutex<FxHashSet<SymbolId>>>>,
}

impl ConstantFieldsInProgress {
    /// Not evaluating any constant.
    pub const EMPTY: ConstantFieldsInProgress = ConstantFieldsInProgress {
        field: None,
        dependencies: None,
    };

    pub fn new(field: SymbolId) -> Self {
        Self {
            field: Some(field),
            dependencies: Some(Arc::new(Mutex::new(FxHashSet::default()))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_none()
    }

    pub fn field(&self) -> Option<SymbolId> {
        self.field
    }

    /// Record that the active field depends on `field`.
    ///
    /// # Panics
    ///
    /// Panics when no constant is being evaluated.
    pub fn add_dependency(&self, field: SymbolId) {
        let Some(dependencies) = &self.dependencies else {
            panic!("add_dependency called on an empty constant tracker");
        };
        dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(field);
    }

    /// The dependencies recorded so far, in `SymbolId` order.
    pub fn dependencies(&self) -> Vec<SymbolId> {
        let Some(dependencies) = &self.dependencies else {
            return Vec::new();
        };
        let mut snapshot: Vec<SymbolId> = dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();
        snapshot.sort_unstable();
        snapshot
    }
}

/// A bound template argument: a type, or a constant together with the
/// expression it came from.
#[derive(Debug, Clone)]
pub enum BoundTypeOrConstant {
    Type(TypeRef),
    Constant {
        constant: BoundConstant,
        ty: TypeRef,
        syntax: NodeId,
    },
}

impl BoundTypeOrConstant {
    pub fn is_constant(&self) -> bool {
        matches!(self, BoundTypeOrConstant::Constant { .. })
    }

    /// The type of the argument: the type itself, or the constant's type.
    pub fn ty(&self) -> &TypeRef {
        match self {
            BoundTypeOrConstant::Type(ty) | BoundTypeOrConstant::Constant { ty, .. } => ty,
        }
    }

    pub fn to_template_argument(&self) -> TemplateArgument {
        match self {
            BoundTypeOrConstant::Type(ty) => TemplateArgument::Type(ty.clone()),
            BoundTypeOrConstant::Constant { constant, .. } => TemplateArgument::Constant(constant.value.clone()),
        }
    }
}

// Constants compare by value; the expression they came from does not matter.
impl PartialEq for BoundTypeOrConstant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BoundTypeOrConstant::Type(a), BoundTypeOrConstant::Type(b)) => a == b,
            (BoundTypeOrConstant::Constant { constant: a, .. }, BoundTypeOrConstant::Constant { constant: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl Eq for BoundTypeOrConstant {}
