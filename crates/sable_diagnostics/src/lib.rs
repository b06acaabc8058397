//! sable_diagnostics: Diagnostic messages and the ordered diagnostic queue.
//!
//! Binding never stops at the first error. Every recoverable problem becomes
//! a `Diagnostic` pushed onto the queue owned by the current pass, and queues
//! are merged in traversal order when passes are combined.

use sable_core::text::TextSpan;
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file the diagnostic belongs to, if any.
    pub file: Option<String>,
    /// The source text span, if any.
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    /// Create a diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    /// Create a diagnostic with file and span info.
    pub fn with_location(
        file: impl Into<String>,
        span: TextSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file.into()),
            span: Some(span),
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// The code rendered the way it is printed, e.g. `SB0017`.
    pub fn code_text(&self) -> String {
        format!("SB{:04}", self.code)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} {}: {}", self.category, self.code_text(), self.message_text)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// An ordered queue of diagnostics.
///
/// Order is significant: diagnostics are reported in the order binding
/// produced them, so the queue is never sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Append every diagnostic of `other`, leaving `other` empty.
    pub fn move_from(&mut self, other: &mut DiagnosticQueue) {
        self.diagnostics.append(&mut other.diagnostics);
    }

    /// Append copies of every diagnostic of `other`.
    pub fn extend_from(&mut self, other: &DiagnosticQueue) {
        self.diagnostics.extend_from_slice(&other.diagnostics);
    }

    pub fn extend(&mut self, other: DiagnosticQueue) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Whether any diagnostic carries `code`.
    pub fn contains_code(&self, code: u32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drop every diagnostic pushed after the queue had `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.diagnostics.truncate(len);
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

impl<'a> IntoIterator for &'a DiagnosticQueue {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
    }

    // ========================================================================
    // Declarations
    // ========================================================================
    pub const PARAMETER_ALREADY_DECLARED: DiagnosticMessage = diag!(13, Error, "Cannot reuse parameter name '{0}'; parameter names must be unique.");
    pub const INVALID_MAIN: DiagnosticMessage = diag!(14, Error, "Invalid signature for '{0}'; the entry point must not take parameters.");
    pub const MAIN_AND_GLOBALS: DiagnosticMessage = diag!(16, Error, "Declaring '{0}' and using global statements creates an ambiguous entry point.");
    pub const VARIABLE_ALREADY_DECLARED: DiagnosticMessage = diag!(21, Error, "A variable named '{0}' is already declared in this scope.");
    pub const DUPLICATE_DECLARATION: DiagnosticMessage = diag!(30, Error, "The name '{0}' is already declared in '{1}'.");
    pub const UNKNOWN_TYPE: DiagnosticMessage = diag!(34, Error, "Unknown type '{0}'.");
    pub const VOID_VARIABLE: DiagnosticMessage = diag!(55, Error, "Cannot use 'void' as the type of '{0}'.");
    pub const CIRCULAR_BASE: DiagnosticMessage = diag!(125, Error, "Circular base type dependency involving '{0}' and '{1}'.");

    // ========================================================================
    // Names and members
    // ========================================================================
    pub const UNDEFINED_SYMBOL: DiagnosticMessage = diag!(17, Error, "The name '{0}' does not exist in the current context.");
    pub const NO_VALUE: DiagnosticMessage = diag!(24, Error, "Expression does not have a value.");
    pub const NO_SUCH_MEMBER: DiagnosticMessage = diag!(61, Error, "'{0}' contains no such member '{1}'.");
    pub const LOCAL_USED_BEFORE_DECLARATION: DiagnosticMessage = diag!(114, Error, "Cannot use local variable '{0}' before it is declared.");
    pub const LOCAL_USED_IN_OWN_INITIALIZER: DiagnosticMessage = diag!(115, Error, "Cannot use local variable '{0}' in its own initializer.");
    pub const MEMBER_INACCESSIBLE: DiagnosticMessage = diag!(118, Error, "'{0}' is inaccessible due to its protection level.");
    pub const MEMBER_BINDING_OUTSIDE_CONDITIONAL_ACCESS: DiagnosticMessage = diag!(122, Error, "Member binding '.{0}' is only valid on the right side of '?.'.");

    // ========================================================================
    // Types and templates
    // ========================================================================
    pub const UNBOUND_TEMPLATE_NOT_ALLOWED: DiagnosticMessage = diag!(119, Error, "Unbound template '{0}' is only allowed inside 'typeof'.");
    pub const INCORRECT_TEMPLATE_ARGUMENT_COUNT: DiagnosticMessage = diag!(120, Error, "Type '{0}' expects {1} template arguments, got {2}.");
    pub const TEMPLATE_MUST_BE_CONSTANT: DiagnosticMessage = diag!(121, Error, "Template argument for '{0}' must be a compile-time constant.");

    // ========================================================================
    // Conversions and operators
    // ========================================================================
    pub const CANNOT_CONVERT_IMPLICITLY: DiagnosticMessage = diag!(7, Error, "Cannot convert from type '{0}' to '{1}' implicitly; an explicit conversion exists (are you missing a cast?).");
    pub const INVALID_UNARY_OPERATOR_USE: DiagnosticMessage = diag!(8, Error, "Unary operator '{0}' is not defined for type '{1}'.");
    pub const INVALID_BINARY_OPERATOR_USE: DiagnosticMessage = diag!(11, Error, "Binary operator '{0}' is not defined for types '{1}' and '{2}'.");
    pub const CANNOT_CONVERT: DiagnosticMessage = diag!(20, Error, "Cannot convert from type '{0}' to '{1}'.");

    // ========================================================================
    // Assignment
    // ========================================================================
    pub const CONSTANT_ASSIGNMENT: DiagnosticMessage = diag!(22, Error, "Cannot assign to '{0}'; it is a constant.");
    pub const CANNOT_ASSIGN: DiagnosticMessage = diag!(62, Error, "Left side of an assignment must be a variable, parameter or field.");

    // ========================================================================
    // Calls
    // ========================================================================
    pub const NO_SUCH_PARAMETER: DiagnosticMessage = diag!(15, Error, "Method '{0}' does not have a parameter named '{1}'.");
    pub const INCORRECT_ARGUMENT_COUNT: DiagnosticMessage = diag!(29, Error, "Method '{0}' expects {1} arguments, got {2}.");
    pub const CANNOT_CALL_NON_METHOD: DiagnosticMessage = diag!(32, Error, "Called object '{0}' is not a method.");
    pub const NO_OVERLOAD: DiagnosticMessage = diag!(57, Error, "No overload for method '{0}' matches the given arguments.");
    pub const AMBIGUOUS_OVERLOAD: DiagnosticMessage = diag!(58, Error, "Call is ambiguous between {0}.");
    pub const PARAMETER_ALREADY_SPECIFIED: DiagnosticMessage = diag!(67, Error, "Named argument '{0}' is specified multiple times.");
    pub const LOW_LEVEL_REQUIRED: DiagnosticMessage = diag!(123, Error, "Method '{0}' is low-level and can only be used in a low-level context.");

    // ========================================================================
    // Statements
    // ========================================================================
    pub const INVALID_BREAK_OR_CONTINUE: DiagnosticMessage = diag!(35, Error, "The '{0}' statement can only be used inside of a loop.");
    pub const UNEXPECTED_RETURN_VALUE: DiagnosticMessage = diag!(37, Error, "Unexpected return value; '{0}' returns void.");
    pub const MISSING_RETURN_VALUE: DiagnosticMessage = diag!(38, Error, "Missing return value; '{0}' returns '{1}'.");
    pub const NO_INIT_ON_IMPLICIT: DiagnosticMessage = diag!(40, Error, "Implicitly-typed variable '{0}' must have an initializer.");
    pub const NULL_ASSIGN_ON_IMPLICIT: DiagnosticMessage = diag!(42, Error, "Cannot initialize implicitly-typed variable '{0}' with 'null'.");
    pub const UNDEFINED_LABEL: DiagnosticMessage = diag!(116, Error, "No such label '{0}' within the scope of the goto statement.");
    pub const RETURN_IN_FINALLY: DiagnosticMessage = diag!(117, Error, "Control cannot leave the body of a finally clause.");
    pub const DUPLICATE_LABEL: DiagnosticMessage = diag!(124, Error, "The label '{0}' is a duplicate.");
    pub const INVALID_STATEMENT: DiagnosticMessage = diag!(126, Error, "A {0} cannot be used as a statement.");
    pub const ALWAYS_VALUE: DiagnosticMessage = diag!(1, Warning, "Condition will always evaluate to '{0}'.");

    // ========================================================================
    // Constants
    // ========================================================================
    pub const CIRCULAR_CONSTANT: DiagnosticMessage = diag!(110, Error, "The evaluation of the constant value for '{0}' involves a circular definition.");
    pub const CIRCULAR_FIELD_TYPE: DiagnosticMessage = diag!(111, Error, "The type of '{0}' cannot be inferred because its initializer depends on itself.");
    pub const NOT_CONSTANT_EXPRESSION: DiagnosticMessage = diag!(112, Error, "The expression assigned to '{0}' must be constant.");
    pub const CONSTANT_NEEDS_INITIALIZER: DiagnosticMessage = diag!(113, Error, "Constant '{0}' must be initialized.");
}
