//! Accessibility checks.

use crate::symbol::{Accessibility, SymbolId};
use crate::table::SymbolTable;

/// Whether `symbol` may be referenced from code inside `within`, the
/// innermost type enclosing the reference (`None` at global scope).
///
/// Private members are visible inside their declaring type and types nested
/// in it. Protected members are additionally visible in derived types.
pub fn is_symbol_accessible(table: &SymbolTable, symbol: SymbolId, within: Option<SymbolId>) -> bool {
    let declared = table.get(symbol);
    let Some(owner) = declared.containing.and_then(|container| {
        let container_symbol = table.get(container);
        container_symbol.is_type().then_some(container)
    }) else {
        return true;
    };

    match declared.accessibility {
        Accessibility::Public => true,
        Accessibility::Private => enclosing_types(table, within).any(|ty| ty == owner),
        Accessibility::Protected => enclosing_types(table, within).any(|ty| table.is_derived_from(ty, owner)),
    }
}

/// `start` followed by every type it is nested in.
fn enclosing_types(table: &SymbolTable, start: Option<SymbolId>) -> impl Iterator<Item = SymbolId> + '_ {
    std::iter::successors(start, move |&ty| {
        table.get(ty).containing.and_then(|container| table.containing_type(container))
    })
}
