//! Symbols created by binding: locals, local functions and labels.
//!
//! These are identified by their declaring node, so two binder maps built
//! for the same region produce equal symbols.

use crate::bound::BoundExpression;
use crate::constant::BoundConstant;
use sable_symbols::TypeRef;
use sable_syntax::{NodeId, SyntaxKind, SyntaxTree};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalKind {
    Variable,
    /// A parameter of a local function.
    Parameter,
}

#[derive(Debug)]
pub struct LocalSymbol {
    pub name: String,
    pub declaration: NodeId,
    /// `None` for implicitly typed locals.
    pub type_syntax: Option<NodeId>,
    pub is_constant: bool,
    pub kind: LocalKind,
    ty: OnceLock<TypeRef>,
    constant: OnceLock<Option<BoundConstant>>,
}

impl LocalSymbol {
    pub fn new(name: &str, declaration: NodeId, type_syntax: Option<NodeId>, is_constant: bool, kind: LocalKind) -> Self {
        Self {
            name: name.to_string(),
            declaration,
            type_syntax,
            is_constant,
            kind,
            ty: OnceLock::new(),
            constant: OnceLock::new(),
        }
    }

    /// The bound type, once the declaration has been bound.
    pub fn ty(&self) -> Option<&TypeRef> {
        self.ty.get()
    }

    /// Publish the bound type. The first published type wins.
    pub fn set_type(&self, ty: TypeRef) -> &TypeRef {
        self.ty.get_or_init(|| ty)
    }

    /// The value of a constant local, once bound.
    pub fn constant(&self) -> Option<&BoundConstant> {
        self.constant.get().and_then(Option::as_ref)
    }

    pub fn set_constant(&self, constant: Option<BoundConstant>) {
        let _ = self.constant.set(constant);
    }
}

impl PartialEq for LocalSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.declaration == other.declaration
    }
}

impl Eq for LocalSymbol {}

impl Hash for LocalSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaration.hash(state);
    }
}

/// The resolved signature of a local function.
#[derive(Debug, Clone)]
pub struct LocalFunctionSignature {
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

#[derive(Debug)]
pub struct LocalFunctionSymbol {
    pub name: String,
    pub declaration: NodeId,
    pub parameters: Vec<Arc<LocalSymbol>>,
    pub return_type_syntax: Option<NodeId>,
    pub body: NodeId,
    signature: OnceLock<LocalFunctionSignature>,
    /// Bound parameter default values, published when the declaration
    /// statement is bound. Calls bound earlier see no defaults.
    defaults: OnceLock<Vec<Option<BoundExpression>>>,
}

impl LocalFunctionSymbol {
    /// Build the symbol for a `LocalFunction` node.
    pub fn from_syntax(tree: &SyntaxTree, declaration: NodeId) -> Option<Self> {
        let SyntaxKind::LocalFunction {
            name,
            return_type,
            parameters,
            body,
        } = tree.kind(declaration)
        else {
            return None;
        };
        let parameters = parameters
            .iter()
            .filter_map(|&parameter| match tree.kind(parameter) {
                SyntaxKind::Parameter { name, ty, .. } => Some(Arc::new(LocalSymbol::new(
                    name,
                    parameter,
                    Some(*ty),
                    false,
                    LocalKind::Parameter,
                ))),
                _ => None,
            })
            .collect();
        Some(Self {
            name: name.clone(),
            declaration,
            parameters,
            return_type_syntax: *return_type,
            body: *body,
            signature: OnceLock::new(),
            defaults: OnceLock::new(),
        })
    }

    pub fn signature(&self) -> Option<&LocalFunctionSignature> {
        self.signature.get()
    }

    /// Publish the signature and the parameter types. The first published
    /// signature wins.
    pub fn set_signature(&self, signature: LocalFunctionSignature) -> &LocalFunctionSignature {
        let published = self.signature.get_or_init(|| signature);
        for (parameter, ty) in self.parameters.iter().zip(&published.parameters) {
            parameter.set_type(ty.clone());
        }
        published
    }

    pub fn defaults(&self) -> Option<&[Option<BoundExpression>]> {
        self.defaults.get().map(Vec::as_slice)
    }

    pub fn set_defaults(&self, defaults: Vec<Option<BoundExpression>>) {
        let _ = self.defaults.set(defaults);
    }
}

impl PartialEq for LocalFunctionSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.declaration == other.declaration
    }
}

impl Eq for LocalFunctionSymbol {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Written in source as `label:`.
    Declared,
    Break,
    Continue,
}

/// A jump target. Identity is the declaring node and the kind, since a loop
/// declares both a break and a continue label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelSymbol {
    pub name: String,
    pub declaration: NodeId,
    pub kind: LabelKind,
}

impl LabelSymbol {
    pub fn declared(name: &str, declaration: NodeId) -> Self {
        Self {
            name: name.to_string(),
            declaration,
            kind: LabelKind::Declared,
        }
    }

    /// The synthesized break and continue labels of a loop.
    pub fn loop_labels(declaration: NodeId) -> (Self, Self) {
        (
            Self {
                name: format!("break{}", declaration.0),
                declaration,
                kind: LabelKind::Break,
            },
            Self {
                name: format!("continue{}", declaration.0),
                declaration,
                kind: LabelKind::Continue,
            },
        )
    }
}

/// Locals, local functions and labels declared directly in one scope.
#[derive(Debug, Default)]
pub struct ScopeDeclarations {
    pub locals: Vec<Arc<LocalSymbol>>,
    pub functions: Vec<Arc<LocalFunctionSymbol>>,
    pub labels: Vec<Arc<LabelSymbol>>,
}

impl ScopeDeclarations {
    /// Collect the declarations of the scope designated by `designator`: a
    /// block, the compilation unit (its global statements) or a single
    /// embedded statement.
    pub fn collect(tree: &SyntaxTree, designator: NodeId) -> Self {
        let mut declarations = ScopeDeclarations::default();
        match tree.kind(designator) {
            SyntaxKind::Block { statements } => {
                for &statement in statements {
                    declarations.collect_statement(tree, statement);
                }
            }
            SyntaxKind::CompilationUnit { members } => {
                for &member in members {
                    if let SyntaxKind::GlobalStatement { statement } = tree.kind(member) {
                        declarations.collect_statement(tree, *statement);
                    }
                }
            }
            _ => declarations.collect_statement(tree, designator),
        }
        declarations
    }

    fn collect_statement(&mut self, tree: &SyntaxTree, statement: NodeId) {
        match tree.kind(statement) {
            SyntaxKind::LocalDeclaration {
                name, ty, is_constant, ..
            } => {
                self.locals.push(Arc::new(LocalSymbol::new(
                    name,
                    statement,
                    *ty,
                    *is_constant,
                    LocalKind::Variable,
                )));
            }
            SyntaxKind::LocalFunction { .. } => {
                if let Some(function) = LocalFunctionSymbol::from_syntax(tree, statement) {
                    self.functions.push(Arc::new(function));
                }
            }
            SyntaxKind::Labeled { label, statement: inner } => {
                self.labels.push(Arc::new(LabelSymbol::declared(label, statement)));
                self.collect_statement(tree, *inner);
            }
            _ => {}
        }
    }

    pub fn local(&self, name: &str) -> Option<&Arc<LocalSymbol>> {
        self.locals.iter().find(|local| local.name == name)
    }

    pub fn local_declared_at(&self, declaration: NodeId) -> Option<&Arc<LocalSymbol>> {
        self.locals.iter().find(|local| local.declaration == declaration)
    }

    pub fn function(&self, name: &str) -> Option<&Arc<LocalFunctionSymbol>> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn function_declared_at(&self, declaration: NodeId) -> Option<&Arc<LocalFunctionSymbol>> {
        self.functions.iter().find(|function| function.declaration == declaration)
    }

    pub fn label(&self, name: &str) -> Option<&Arc<LabelSymbol>> {
        self.labels.iter().find(|label| label.name == name)
    }

    pub fn label_declared_at(&self, declaration: NodeId) -> Option<&Arc<LabelSymbol>> {
        self.labels.iter().find(|label| label.declaration == declaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_symbols::PrimitiveType;
    use sable_syntax::SyntaxTreeBuilder;

    #[test]
    fn test_collect_block_declarations() {
        let mut b = SyntaxTreeBuilder::new("scope.sb");
        let one = b.int(1);
        let x = b.local("x", None, Some(one));
        let body = b.block(vec![]);
        let f = b.local_function("f", None, vec![], body);
        let brk = b.goto("done");
        let labeled = b.labeled("done", brk);
        let block = b.block(vec![x, f, labeled]);
        let method = b.method("M", None, vec![], block);
        let tree = b.finish(vec![method]);

        let declarations = ScopeDeclarations::collect(&tree, block);
        assert_eq!(declarations.locals.len(), 1);
        assert_eq!(declarations.local("x").map(|local| local.declaration), Some(x));
        assert!(declarations.function("f").is_some());
        assert_eq!(declarations.label("done").map(|label| label.declaration), Some(labeled));
        assert!(declarations.local("f").is_none());
    }

    #[test]
    fn test_locals_compare_by_declaration() {
        let a = LocalSymbol::new("x", NodeId(4), None, false, LocalKind::Variable);
        let b = LocalSymbol::new("y", NodeId(4), None, true, LocalKind::Variable);
        assert_eq!(a, b);
        let int = TypeRef::primitive(PrimitiveType::Int);
        assert_eq!(a.set_type(int.clone()), &int);
        assert_eq!(a.set_type(TypeRef::void()), &int);
    }

    #[test]
    fn test_loop_labels_are_distinct() {
        let (brk, cont) = LabelSymbol::loop_labels(NodeId(2));
        assert_ne!(brk, cont);
        assert_eq!(brk.declaration, cont.declaration);
    }
}
