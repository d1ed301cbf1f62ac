//! Implicit and explicit conversion rules.
//!
//! The implicit numeric table lists, for each target kind, the source kinds
//! that widen to it without loss. Its order is significant:
//! [`standard_implicit`] picks the last target accepting both operands.

use crate::registry::TypeRegistry;
use strexpr_ast::types::{NumericKind, TypeDefId, TypeDescriptor};

use NumericKind::*;

/// Target kind and the source kinds it accepts implicitly.
pub static IMPLICIT_NUMERIC_CONVERSIONS: &[(NumericKind, &[NumericKind])] = &[
    (Short, &[SByte, Byte]),
    (UShort, &[Char, Byte]),
    (Int, &[Char, SByte, Byte, Short, UShort]),
    (UInt, &[Char, Byte, UShort]),
    (Long, &[Char, SByte, Byte, Short, UShort, Int, UInt]),
    (ULong, &[Char, Byte, UShort, UInt]),
    (Float, &[Char, SByte, Byte, Short, UShort, Int, UInt, Long, ULong]),
    (Double, &[Char, SByte, Byte, Short, UShort, Int, UInt, Long, ULong, Float]),
    (Decimal, &[Char, SByte, Byte, Short, UShort, Int, UInt, Long, ULong]),
];

fn accepted_sources(target: NumericKind) -> &'static [NumericKind] {
    IMPLICIT_NUMERIC_CONVERSIONS
        .iter()
        .find(|(kind, _)| *kind == target)
        .map(|(_, sources)| *sources)
        .unwrap_or(&[])
}

/// Whether `source` widens implicitly to `target`. Both must be non-nullable
/// numeric primitives; enums never qualify.
pub fn is_standard_implicit_from(target: &TypeDescriptor, source: &TypeDescriptor) -> bool {
    match (target.numeric_kind(), source.numeric_kind()) {
        (Some(target), Some(source)) => accepted_sources(target).contains(&source),
        _ => false,
    }
}

/// The common type two operands are converted to before a binary operator.
///
/// Nullable wrappers are stripped first and restored on the result when
/// either side had one. Returns `None` when the operands have no common type,
/// which includes the mixed `long`/`ulong` case.
pub fn standard_implicit(a: &TypeDescriptor, b: &TypeDescriptor) -> Option<TypeDescriptor> {
    let nullable = a.is_nullable() || b.is_nullable();
    let common = common_type(a.strip_nullable(), b.strip_nullable())?;
    Some(if nullable {
        TypeDescriptor::nullable(common)
    } else {
        common
    })
}

fn common_type(a: &TypeDescriptor, b: &TypeDescriptor) -> Option<TypeDescriptor> {
    if a == b || is_standard_implicit_from(a, b) {
        return Some(a.clone());
    }
    if is_standard_implicit_from(b, a) {
        return Some(b.clone());
    }
    let (ka, kb) = (a.numeric_kind()?, b.numeric_kind()?);
    if matches!(ka, Long | ULong) && matches!(kb, Long | ULong) {
        return None;
    }
    IMPLICIT_NUMERIC_CONVERSIONS
        .iter()
        .filter(|(_, sources)| sources.contains(&ka) && sources.contains(&kb))
        .last()
        .map(|(target, _)| TypeDescriptor::numeric(*target))
}

/// Implicit conversion in assignment position: identity, numeric widening,
/// a nullable lift of either, or a reference conversion to a base type.
pub fn can_convert_implicitly(registry: &dyn TypeRegistry, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    if from == to || is_standard_implicit_from(to, from) {
        return true;
    }
    if let Some(inner) = to.nullable_inner() {
        let source = from.strip_nullable();
        return source == inner || is_standard_implicit_from(inner, source);
    }
    if from.is_nullable() {
        return to.is(TypeDefId::OBJECT);
    }
    !to.is(TypeDefId::VOID) && registry.ancestors(from).contains(to)
}

/// Conversion allowed by a cast `(T)x`.
pub fn can_convert_explicitly(registry: &dyn TypeRegistry, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    if can_convert_implicitly(registry, from, to) {
        return true;
    }
    let (source, target) = (from.strip_nullable(), to.strip_nullable());
    let numeric_like = |ty: &TypeDescriptor| ty.numeric_kind().is_some() || registry.is_enum(ty);
    if numeric_like(source) && numeric_like(target) {
        // `int? -> int` unwraps; `int -> long?` and `int? -> long?` lift.
        return true;
    }
    if source == target {
        return true;
    }
    // Unboxing and downcasts.
    from.is(TypeDefId::OBJECT) || registry.ancestors(to).contains(from)
}
