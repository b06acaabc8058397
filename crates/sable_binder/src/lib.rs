//! sable_binder: Semantic binding.
//!
//! Binding turns declared symbols and syntax into bound trees. Name lookup
//! runs through an immutable chain of binder frames, built per region by
//! the `BinderFactory` and cached by node and usage. Conversions, overload
//! resolution and constant folding happen here; the compilation drives the
//! passes and assembles the `BoundGlobalScope`.

pub mod binder;
pub mod bound;
pub mod cast;
pub mod constant;
pub mod context;
pub mod conversions;
mod expressions;
pub mod factory;
pub mod field_constants;
pub mod flags;
pub mod global_scope;
mod local_binder_factory;
pub mod locals;
pub mod module;
pub mod overload;
pub mod pass;
mod statements;
mod type_binding;

// Re-export commonly used types
pub use binder::{Binder, BinderKind, LookupResult, Member};
pub use bound::{BoundBlock, BoundExpression, BoundExpressionKind, BoundStatement};
pub use cast::CastKind;
pub use constant::{BoundConstant, BoundTypeOrConstant, ConstantFieldsInProgress};
pub use context::{BindingContext, Evaluated, MethodSignature};
pub use conversions::Conversions;
pub use factory::{BinderCacheKey, BinderFactory};
pub use field_constants::FieldConstant;
pub use flags::{BindValueKind, BinderFlags, NodeUsage, NodeUsageCategory};
pub use global_scope::{BoundGlobalScope, GlobalScopeParts};
pub use locals::{LabelSymbol, LocalFunctionSymbol, LocalSymbol};
pub use module::SourceModule;
pub use overload::{Candidate, CandidateParameter, OverloadResolution, OverloadResolutionResult, PreboundArgument};
pub use pass::BindingPass;
