//! Conversion classification.

use crate::cast::CastKind;
use sable_symbols::{PrimitiveType, SymbolTable, TypeKind, TypeRef};

const NON: CastKind = CastKind::None;
const IDN: CastKind = CastKind::Identity;
const IPL: CastKind = CastKind::Implicit;
const XPL: CastKind = CastKind::Explicit;
const NUL: CastKind = CastKind::ImplicitNullable;
const XNL: CastKind = CastKind::ExplicitNullable;
const BOX: CastKind = CastKind::AnyBoxing;
const BNU: CastKind = CastKind::AnyBoxingImplicitNullable;
const BXN: CastKind = CastKind::AnyBoxingExplicitNullable;
const UNB: CastKind = CastKind::AnyUnboxing;
const UIN: CastKind = CastKind::AnyUnboxingImplicitNullable;
const UXN: CastKind = CastKind::AnyUnboxingExplicitNullable;

const PRIMITIVE_COUNT: usize = 7;

/// Conversions between primitive types, indexed `[source][target]`. The
/// first seven rows and columns are `any string bool char int decimal type`,
/// the next seven are their nullable forms in the same order.
#[rustfmt::skip]
const EASY_OUT: [[CastKind; 2 * PRIMITIVE_COUNT]; 2 * PRIMITIVE_COUNT] = [
    //          any  str  bool chr  int  dec  type any? str? bool?chr? int? dec? type?
    /* any   */ [IDN, UNB, UNB, UNB, UNB, UNB, UNB, NUL, UIN, UIN, UIN, UIN, UIN, UIN],
    /* str   */ [BOX, IDN, XPL, NON, XPL, XPL, NON, BNU, NUL, XNL, NON, XNL, XNL, NON],
    /* bool  */ [BOX, NON, IDN, NON, NON, NON, NON, BNU, NON, NUL, NON, NON, NON, NON],
    /* chr   */ [BOX, NON, NON, IDN, NON, NON, NON, BNU, NON, NON, NUL, NON, NON, NON],
    /* int   */ [BOX, XPL, NON, NON, IDN, IPL, NON, BNU, XNL, NON, NON, NUL, NON, NON],
    /* dec   */ [BOX, XPL, NON, NON, XPL, IDN, NON, BNU, XNL, NON, NON, XNL, NUL, NON],
    /* type  */ [BOX, NON, NON, NON, NON, NON, IDN, BNU, NON, NON, NON, NON, NON, NUL],
    /* any?  */ [XNL, UXN, UXN, UXN, UXN, UXN, UXN, IDN, UNB, UNB, UNB, UNB, UNB, UNB],
    /* str?  */ [BXN, XNL, XNL, NON, XNL, XNL, NON, BNU, IDN, XNL, NON, XNL, XNL, NON],
    /* bool? */ [BXN, NON, XNL, NON, NON, NON, NON, BNU, NON, IDN, NON, NON, NON, NON],
    /* chr?  */ [BXN, NON, NON, XNL, NON, NON, NON, BNU, NON, NON, IDN, NON, NON, NON],
    /* int?  */ [BXN, XNL, NON, NON, XNL, XNL, NON, BNU, XNL, NON, NON, IDN, NUL, NON],
    /* dec?  */ [BXN, XNL, NON, NON, XNL, XNL, NON, BNU, XNL, NON, NON, XNL, IDN, NON],
    /* type? */ [BXN, NON, NON, NON, NON, NON, XNL, BNU, NON, NON, NON, NON, NON, IDN],
];

fn easy_out_index(primitive: PrimitiveType, nullable: bool) -> Option<usize> {
    let index = match primitive {
        PrimitiveType::Any => 0,
        PrimitiveType::String => 1,
        PrimitiveType::Bool => 2,
        PrimitiveType::Char => 3,
        PrimitiveType::Int => 4,
        PrimitiveType::Decimal => 5,
        PrimitiveType::Type => 6,
        PrimitiveType::Void => return None,
    };
    Some(if nullable { index + PRIMITIVE_COUNT } else { index })
}

fn boxing(source_nullable: bool, target_nullable: bool) -> CastKind {
    match (source_nullable, target_nullable) {
        (false, false) => CastKind::Boxing,
        (true, false) => CastKind::BoxingExplicitNullable,
        (_, true) => CastKind::BoxingImplicitNullable,
    }
}

fn unboxing(source_nullable: bool, target_nullable: bool) -> CastKind {
    match (source_nullable, target_nullable) {
        (false, true) => CastKind::UnboxingImplicitNullable,
        (true, false) => CastKind::UnboxingExplicitNullable,
        _ => CastKind::Unboxing,
    }
}

/// Classifies conversions between bound types.
#[derive(Clone, Copy)]
pub struct Conversions<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> Conversions<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    /// The kind of conversion from `source` to `target`.
    ///
    /// Error types convert to and from everything by identity so that a
    /// reported error does not produce follow-up conversion errors.
    pub fn classify(&self, source: &TypeRef, target: &TypeRef) -> CastKind {
        if source.is_error() || target.is_error() {
            return CastKind::Identity;
        }
        if source.is_null() {
            return if target.nullable { CastKind::Identity } else { CastKind::None };
        }
        if source == target {
            return CastKind::Identity;
        }

        match (&source.kind, &target.kind) {
            (TypeKind::Primitive(from), TypeKind::Primitive(to)) => {
                match (easy_out_index(*from, source.nullable), easy_out_index(*to, target.nullable)) {
                    (Some(row), Some(column)) => EASY_OUT[row][column],
                    _ => CastKind::None,
                }
            }
            (_, TypeKind::Primitive(PrimitiveType::Any)) if self.is_boxable(source) => {
                boxing(source.nullable, target.nullable)
            }
            (TypeKind::Primitive(PrimitiveType::Any), _) if self.is_boxable(target) => {
                unboxing(source.nullable, target.nullable)
            }
            _ if source.same_kind(target) => {
                if target.nullable {
                    CastKind::ImplicitNullable
                } else {
                    CastKind::ExplicitNullable
                }
            }
            _ => self.classify_reference(source, target),
        }
    }

    /// Named and constructed types convert along the base type chain.
    fn classify_reference(&self, source: &TypeRef, target: &TypeRef) -> CastKind {
        let (Some(from), Some(to)) = (source.definition(), target.definition()) else {
            return CastKind::None;
        };
        // Two constructions of one template with different arguments.
        if from == to {
            return CastKind::None;
        }
        if self.symbols.is_derived_from(from, to) {
            if source.nullable && !target.nullable {
                CastKind::ExplicitNullable
            } else {
                CastKind::ImplicitReference
            }
        } else if self.symbols.is_derived_from(to, from) {
            CastKind::ExplicitReference
        } else {
            CastKind::None
        }
    }

    fn is_boxable(&self, ty: &TypeRef) -> bool {
        matches!(
            ty.kind,
            TypeKind::Named(_) | TypeKind::Constructed { .. } | TypeKind::TemplateParameter(_)
        )
    }

    pub fn is_implicit(&self, source: &TypeRef, target: &TypeRef) -> bool {
        self.classify(source, target).is_implicit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_symbols::{NamedTypeData, SymbolKind};

    fn primitive(primitive: PrimitiveType, nullable: bool) -> TypeRef {
        TypeRef::primitive(primitive).with_nullability(nullable)
    }

    #[test]
    fn test_table_diagonal_is_identity() {
        for row in 0..2 * PRIMITIVE_COUNT {
            assert_eq!(EASY_OUT[row][row], CastKind::Identity);
        }
    }

    #[test]
    fn test_numeric_conversions() {
        let table = SymbolTable::new();
        let conversions = Conversions::new(&table);
        let int = primitive(PrimitiveType::Int, false);
        let decimal = primitive(PrimitiveType::Decimal, false);
        assert_eq!(conversions.classify(&int, &decimal), CastKind::Implicit);
        assert_eq!(conversions.classify(&decimal, &int), CastKind::Explicit);
        assert_eq!(conversions.classify(&int, &int.as_nullable()), CastKind::ImplicitNullable);
        assert_eq!(conversions.classify(&int.as_nullable(), &int), CastKind::ExplicitNullable);
        assert_eq!(
            conversions.classify(&primitive(PrimitiveType::Bool, false), &int),
            CastKind::None
        );
    }

    #[test]
    fn test_any_boxing() {
        let table = SymbolTable::new();
        let conversions = Conversions::new(&table);
        let any = primitive(PrimitiveType::Any, false);
        let string = primitive(PrimitiveType::String, false);
        assert_eq!(conversions.classify(&string, &any), CastKind::AnyBoxing);
        assert_eq!(conversions.classify(&any, &string), CastKind::AnyUnboxing);
        assert!(conversions.classify(&any, &string).is_unboxing());
    }

    #[test]
    fn test_null_and_error() {
        let table = SymbolTable::new();
        let conversions = Conversions::new(&table);
        let int = primitive(PrimitiveType::Int, false);
        assert_eq!(conversions.classify(&TypeRef::null(), &int), CastKind::None);
        assert_eq!(conversions.classify(&TypeRef::null(), &int.as_nullable()), CastKind::Identity);
        assert_eq!(conversions.classify(&TypeRef::error(), &int), CastKind::Identity);
        assert_eq!(conversions.classify(&int, &TypeRef::void()), CastKind::None);
    }

    #[test]
    fn test_named_types_follow_base_chain() {
        let mut table = SymbolTable::new();
        let global = table.global();
        let base = table.add(
            "Animal",
            SymbolKind::NamedType(NamedTypeData::default()),
            sable_symbols::Accessibility::Public,
            global,
            None,
        );
        let derived = table.add(
            "Dog",
            SymbolKind::NamedType(NamedTypeData {
                base: Some(base),
                ..NamedTypeData::default()
            }),
            sable_symbols::Accessibility::Public,
            global,
            None,
        );
        let conversions = Conversions::new(&table);
        let animal = TypeRef::named(base);
        let dog = TypeRef::named(derived);
        let any = primitive(PrimitiveType::Any, false);

        assert_eq!(conversions.classify(&dog, &animal), CastKind::ImplicitReference);
        assert_eq!(conversions.classify(&animal, &dog), CastKind::ExplicitReference);
        assert_eq!(conversions.classify(&dog.as_nullable(), &animal), CastKind::ExplicitNullable);
        assert_eq!(conversions.classify(&dog, &dog.as_nullable()), CastKind::ImplicitNullable);
        assert_eq!(conversions.classify(&dog, &any), CastKind::Boxing);
        assert_eq!(conversions.classify(&any, &dog), CastKind::Unboxing);
        assert_eq!(conversions.classify(&any, &dog.as_nullable()), CastKind::UnboxingImplicitNullable);
        assert_eq!(conversions.classify(&dog.as_nullable(), &any), CastKind::BoxingExplicitNullable);
        assert_eq!(
            conversions.classify(&dog, &primitive(PrimitiveType::Int, false)),
            CastKind::None
        );
    }
}
