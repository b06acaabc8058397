//! Overload resolution.

use crate::bound::BoundExpression;
use crate::cast::CastKind;
use crate::conversions::Conversions;
use sable_diagnostics::{messages, Diagnostic, DiagnosticMessage, DiagnosticQueue};
use sable_symbols::{SymbolTable, TypeRef};
use sable_syntax::{NodeId, SyntaxTree};

/// The outcome of resolving one call site.
///
/// `arguments` is the argument list after rewriting: reordered to
/// parameter order, with defaults inserted for omitted parameters and each
/// argument converted to its parameter type. A failed result never carries
/// arguments.
#[derive(Debug, Clone)]
pub struct OverloadResolutionResult<T> {
    best_overload: Option<T>,
    arguments: Vec<BoundExpression>,
    succeeded: bool,
    ambiguous: bool,
}

impl<T> OverloadResolutionResult<T> {
    /// No candidate was applicable.
    pub fn failed() -> Self {
        Self {
            best_overload: None,
            arguments: Vec::new(),
            succeeded: false,
            ambiguous: false,
        }
    }

    /// Several candidates were applicable and none was better than the
    /// others. Satisfies everything `failed()` does.
    pub fn ambiguous() -> Self {
        Self {
            ambiguous: true,
            ..Self::failed()
        }
    }

    pub fn succeeded(best_overload: T, arguments: Vec<BoundExpression>) -> Self {
        Self {
            best_overload: Some(best_overload),
            arguments,
            succeeded: true,
            ambiguous: false,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    pub fn best_overload(&self) -> Option<&T> {
        self.best_overload.as_ref()
    }

    pub fn arguments(&self) -> &[BoundExpression] {
        &self.arguments
    }

    pub fn into_parts(self) -> (Option<T>, Vec<BoundExpression>) {
        (self.best_overload, self.arguments)
    }
}

/// A parameter as overload resolution sees it.
#[derive(Debug, Clone)]
pub struct CandidateParameter {
    pub name: String,
    pub ty: TypeRef,
    /// The bound default value, already converted to `ty`.
    pub default: Option<BoundExpression>,
}

/// A method that a call site may resolve to.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    pub overload: T,
    pub name: String,
    pub parameters: Vec<CandidateParameter>,
}

impl<T> Candidate<T> {
    fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.default.is_none()).count()
    }

    fn signature(&self, symbols: &SymbolTable) -> String {
        let parameters: Vec<String> = self.parameters.iter().map(|p| p.ty.display(symbols)).collect();
        format!("'{}({})'", self.name, parameters.join(", "))
    }
}

/// An argument bound before resolution, in source order.
#[derive(Debug, Clone)]
pub struct PreboundArgument {
    pub name: Option<String>,
    pub expression: BoundExpression,
    pub syntax: NodeId,
}

struct Applicable<'c, T> {
    candidate: &'c Candidate<T>,
    arguments: Vec<BoundExpression>,
    /// Number of implicit non-identity conversions. Lower is better.
    score: usize,
}

pub struct OverloadResolution<'a> {
    conversions: Conversions<'a>,
    symbols: &'a SymbolTable,
    tree: &'a SyntaxTree,
}

impl<'a> OverloadResolution<'a> {
    pub fn new(symbols: &'a SymbolTable, tree: &'a SyntaxTree) -> Self {
        Self {
            conversions: Conversions::new(symbols),
            symbols,
            tree,
        }
    }

    fn report(&self, diagnostics: &mut DiagnosticQueue, node: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        diagnostics.push(Diagnostic::with_location(
            self.tree.file_name(),
            self.tree.span(node),
            message,
            args,
        ));
    }

    /// Pick the best candidate for a call with `arguments`.
    ///
    /// With a single candidate its own diagnostics are reported. With
    /// several, per-candidate diagnostics are discarded and the result is
    /// reported as a whole: `NoOverload` when nothing applies,
    /// `AmbiguousOverload` when the best score is shared.
    pub fn resolve_method_invocation<T: Clone>(
        &self,
        candidates: &[Candidate<T>],
        arguments: &[PreboundArgument],
        call: NodeId,
        diagnostics: &mut DiagnosticQueue,
    ) -> OverloadResolutionResult<T> {
        match candidates {
            [] => OverloadResolutionResult::failed(),
            [candidate] => match self.try_candidate(candidate, arguments, call, diagnostics) {
                Some(applicable) => {
                    OverloadResolutionResult::succeeded(applicable.candidate.overload.clone(), applicable.arguments)
                }
                None => OverloadResolutionResult::failed(),
            },
            _ => {
                let mut applicable: Vec<Applicable<'_, T>> = Vec::new();
                for candidate in candidates {
                    let mut speculative = DiagnosticQueue::new();
                    if let Some(found) = self.try_candidate(candidate, arguments, call, &mut speculative) {
                        applicable.push(found);
                    }
                }
                let Some(best_score) = applicable.iter().map(|a| a.score).min() else {
                    self.report(diagnostics, call, &messages::NO_OVERLOAD, &[&candidates[0].name]);
                    return OverloadResolutionResult::failed();
                };
                let mut best: Vec<Applicable<'_, T>> = applicable.into_iter().filter(|a| a.score == best_score).collect();
                if best.len() > 1 {
                    let names: Vec<String> = best.iter().map(|a| a.candidate.signature(self.symbols)).collect();
                    self.report(diagnostics, call, &messages::AMBIGUOUS_OVERLOAD, &[&names.join(" and ")]);
                    tracing::debug!(method = %candidates[0].name, tied = best.len(), "ambiguous overload");
                    return OverloadResolutionResult::ambiguous();
                }
                let winner = best.remove(0);
                OverloadResolutionResult::succeeded(winner.candidate.overload.clone(), winner.arguments)
            }
        }
    }

    fn try_candidate<'c, T>(
        &self,
        candidate: &'c Candidate<T>,
        arguments: &[PreboundArgument],
        call: NodeId,
        diagnostics: &mut DiagnosticQueue,
    ) -> Option<Applicable<'c, T>> {
        let parameter_count = candidate.parameters.len();
        if arguments.len() > parameter_count || arguments.len() < candidate.required_count() {
            self.report_count(diagnostics, candidate, arguments.len(), call);
            return None;
        }

        // Named arguments go to the parameter of that name, positional ones
        // to the parameter at their position.
        let mut slots: Vec<Option<&PreboundArgument>> = vec![None; parameter_count];
        for (position, argument) in arguments.iter().enumerate() {
            let index = match &argument.name {
                Some(name) => match candidate.parameters.iter().position(|p| &p.name == name) {
                    Some(index) => index,
                    None => {
                        self.report(
                            diagnostics,
                            argument.syntax,
                            &messages::NO_SUCH_PARAMETER,
                            &[&candidate.name, name],
                        );
                        return None;
                    }
                },
                None => position,
            };
            if slots[index].is_some() {
                let name = &candidate.parameters[index].name;
                self.report(diagnostics, argument.syntax, &messages::PARAMETER_ALREADY_SPECIFIED, &[name]);
                return None;
            }
            slots[index] = Some(argument);
        }

        let mut rewritten = Vec::with_capacity(parameter_count);
        let mut score = 0;
        for (slot, parameter) in slots.into_iter().zip(&candidate.parameters) {
            let Some(argument) = slot else {
                match &parameter.default {
                    Some(default) => {
                        rewritten.push(default.clone());
                        continue;
                    }
                    None => {
                        self.report_count(diagnostics, candidate, arguments.len(), call);
                        return None;
                    }
                }
            };
            let cast = self.conversions.classify(&argument.expression.ty, &parameter.ty);
            if !cast.is_implicit() {
                let source = argument.expression.ty.display(self.symbols);
                let target = parameter.ty.display(self.symbols);
                let message = if cast.exists() {
                    &messages::CANNOT_CONVERT_IMPLICITLY
                } else {
                    &messages::CANNOT_CONVERT
                };
                self.report(diagnostics, argument.syntax, message, &[&source, &target]);
                return None;
            }
            if cast != CastKind::Identity {
                score += 1;
            }
            rewritten.push(BoundExpression::cast(argument.expression.clone(), parameter.ty.clone(), cast));
        }

        Some(Applicable {
            candidate,
            arguments: rewritten,
            score,
        })
    }

    fn report_count<T>(&self, diagnostics: &mut DiagnosticQueue, candidate: &Candidate<T>, got: usize, call: NodeId) {
        let expected = if candidate.required_count() == candidate.parameters.len() {
            candidate.parameters.len().to_string()
        } else {
            format!("{} to {}", candidate.required_count(), candidate.parameters.len())
        };
        self.report(
            diagnostics,
            call,
            &messages::INCORRECT_ARGUMENT_COUNT,
            &[&candidate.name, &expected, &got.to_string()],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bound::BoundExpressionKind;
    use sable_symbols::PrimitiveType;
    use sable_syntax::SyntaxTreeBuilder;

    /// Helper: a tree with `count` literal nodes to anchor spans.
    fn anchors(count: usize) -> (SyntaxTree, Vec<NodeId>) {
        let mut b = SyntaxTreeBuilder::new("overload.sb");
        let nodes: Vec<NodeId> = (0..count)
            .map(|i| {
                let literal = b.int(i as i64);
                b.expression_statement(literal)
            })
            .collect();
        let globals: Vec<NodeId> = nodes.iter().map(|&n| b.global_statement(n)).collect();
        (b.finish(globals), nodes)
    }

    fn literal(ty: PrimitiveType, syntax: NodeId) -> BoundExpression {
        BoundExpression::new(BoundExpressionKind::Literal, TypeRef::primitive(ty), syntax)
    }

    fn parameter(name: &str, ty: PrimitiveType) -> CandidateParameter {
        CandidateParameter {
            name: name.to_string(),
            ty: TypeRef::primitive(ty),
            default: None,
        }
    }

    fn positional(expression: BoundExpression) -> PreboundArgument {
        PreboundArgument {
            name: None,
            syntax: expression.syntax,
            expression,
        }
    }

    #[test]
    fn test_failed_invariants() {
        let failed = OverloadResolutionResult::<u32>::failed();
        assert!(!failed.is_succeeded());
        assert!(failed.best_overload().is_none());
        assert!(failed.arguments().is_empty());
        assert!(!failed.is_ambiguous());

        let ambiguous = OverloadResolutionResult::<u32>::ambiguous();
        assert!(!ambiguous.is_succeeded());
        assert!(ambiguous.best_overload().is_none());
        assert!(ambiguous.arguments().is_empty());
        assert!(ambiguous.is_ambiguous());
    }

    #[test]
    fn test_succeeded_invariants() {
        let result = OverloadResolutionResult::succeeded(7u32, Vec::new());
        assert!(result.is_succeeded());
        assert_eq!(result.best_overload(), Some(&7));
    }

    #[test]
    fn test_identity_beats_implicit() {
        let (tree, nodes) = anchors(1);
        let symbols = SymbolTable::new();
        let resolution = OverloadResolution::new(&symbols, &tree);
        let candidates = vec![
            Candidate {
                overload: "decimal",
                name: "f".to_string(),
                parameters: vec![parameter("x", PrimitiveType::Decimal)],
            },
            Candidate {
                overload: "int",
                name: "f".to_string(),
                parameters: vec![parameter("x", PrimitiveType::Int)],
            },
        ];
        let arguments = vec![positional(literal(PrimitiveType::Int, nodes[0]))];
        let mut diagnostics = DiagnosticQueue::new();
        let result = resolution.resolve_method_invocation(&candidates, &arguments, nodes[0], &mut diagnostics);
        assert!(result.is_succeeded());
        assert_eq!(result.best_overload(), Some(&"int"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_tie_is_ambiguous() {
        let (tree, nodes) = anchors(1);
        let symbols = SymbolTable::new();
        let resolution = OverloadResolution::new(&symbols, &tree);
        let candidates = vec![
            Candidate {
                overload: 1,
                name: "g".to_string(),
                parameters: vec![parameter("x", PrimitiveType::Decimal)],
            },
            Candidate {
                overload: 2,
                name: "g".to_string(),
                parameters: vec![parameter("x", PrimitiveType::Any)],
            },
        ];
        let arguments = vec![positional(literal(PrimitiveType::Int, nodes[0]))];
        let mut diagnostics = DiagnosticQueue::new();
        let result = resolution.resolve_method_invocation(&candidates, &arguments, nodes[0], &mut diagnostics);
        assert!(result.is_ambiguous());
        assert!(diagnostics.contains_code(messages::AMBIGUOUS_OVERLOAD.code));
    }

    #[test]
    fn test_named_arguments_and_defaults() {
        let (tree, nodes) = anchors(2);
        let symbols = SymbolTable::new();
        let resolution = OverloadResolution::new(&symbols, &tree);
        let mut with_default = parameter("b", PrimitiveType::Int);
        with_default.default = Some(literal(PrimitiveType::Int, nodes[1]));
        let candidates = vec![Candidate {
            overload: (),
            name: "h".to_string(),
            parameters: vec![parameter("a", PrimitiveType::String), with_default],
        }];
        let arguments = vec![PreboundArgument {
            name: Some("a".to_string()),
            expression: literal(PrimitiveType::String, nodes[0]),
            syntax: nodes[0],
        }];
        let mut diagnostics = DiagnosticQueue::new();
        let result = resolution.resolve_method_invocation(&candidates, &arguments, nodes[0], &mut diagnostics);
        assert!(result.is_succeeded());
        assert_eq!(result.arguments().len(), 2);
        assert_eq!(result.arguments()[1].syntax, nodes[1]);
    }

    #[test]
    fn test_single_candidate_reports_its_own_errors() {
        let (tree, nodes) = anchors(1);
        let symbols = SymbolTable::new();
        let resolution = OverloadResolution::new(&symbols, &tree);
        let candidates = vec![Candidate {
            overload: (),
            name: "k".to_string(),
            parameters: vec![parameter("a", PrimitiveType::Int)],
        }];
        let arguments = vec![PreboundArgument {
            name: Some("z".to_string()),
            expression: literal(PrimitiveType::Int, nodes[0]),
            syntax: nodes[0],
        }];
        let mut diagnostics = DiagnosticQueue::new();
        let result = resolution.resolve_method_invocation(&candidates, &arguments, nodes[0], &mut diagnostics);
        assert!(!result.is_succeeded());
        assert!(result.arguments().is_empty());
        assert!(diagnostics.contains_code(messages::NO_SUCH_PARAMETER.code));
    }

    #[test]
    fn test_wrong_count_among_many_is_no_overload() {
        let (tree, nodes) = anchors(1);
        let symbols = SymbolTable::new();
        let resolution = OverloadResolution::new(&symbols, &tree);
        let candidates = vec![
            Candidate {
                overload: 1,
                name: "m".to_string(),
                parameters: vec![],
            },
            Candidate {
                overload: 2,
                name: "m".to_string(),
                parameters: vec![parameter("a", PrimitiveType::Int), parameter("b", PrimitiveType::Int)],
            },
        ];
        let arguments = vec![positional(literal(PrimitiveType::Int, nodes[0]))];
        let mut diagnostics = DiagnosticQueue::new();
        let result = resolution.resolve_method_invocation(&candidates, &arguments, nodes[0], &mut diagnostics);
        assert!(!result.is_succeeded());
        assert!(!result.is_ambiguous());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.contains_code(messages::NO_OVERLOAD.code));
    }
}
