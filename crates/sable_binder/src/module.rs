//! The immutable inputs every binder frame shares.

use sable_symbols::SymbolTable;
use sable_syntax::SyntaxTree;

/// A syntax tree together with the symbols declared from it. Read-only for
/// the whole of binding.
#[derive(Debug)]
pub struct SourceModule {
    tree: SyntaxTree,
    symbols: SymbolTable,
}

impl SourceModule {
    pub fn new(tree: SyntaxTree, symbols: SymbolTable) -> Self {
        Self { tree, symbols }
    }

    #[inline]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn file_name(&self) -> &str {
        self.tree.file_name()
    }
}
