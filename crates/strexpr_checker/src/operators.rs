//! Operand typing for the unary and binary operators.
//!
//! The builder unifies binary operands first (see
//! [`standard_implicit`](crate::conversions::standard_implicit)) and then asks
//! these functions whether the operator is defined for the unified type and
//! what it produces.

use crate::registry::TypeRegistry;
use strexpr_ast::node::{BinaryOp, UnaryOp};
use strexpr_ast::types::{NumericKind, TypeDescriptor};

/// Integral kinds narrower than `int`, which arithmetic promotes to `int`.
fn is_sub_int(kind: NumericKind) -> bool {
    matches!(
        kind,
        NumericKind::Char | NumericKind::SByte | NumericKind::Byte | NumericKind::Short | NumericKind::UShort
    )
}

fn keep_nullability(original: &TypeDescriptor, ty: TypeDescriptor) -> TypeDescriptor {
    if original.is_nullable() {
        TypeDescriptor::nullable(ty)
    } else {
        ty
    }
}

/// The type an operand of `op` is promoted to before the operator applies:
/// `int` for narrow integers, the type itself otherwise.
pub fn promoted_operand_type(ty: &TypeDescriptor) -> TypeDescriptor {
    match ty.strip_nullable().numeric_kind() {
        Some(kind) if is_sub_int(kind) => keep_nullability(ty, TypeDescriptor::int()),
        _ => ty.clone(),
    }
}

/// Whether a binary operator promotes narrow integer operands.
pub fn promotes_operands(op: BinaryOp) -> bool {
    op.is_arithmetic() || op.is_bitwise() || op.is_shift()
}

/// Result type of a unary operator applied to an already promoted operand.
pub fn unary_result(op: UnaryOp, operand: &TypeDescriptor) -> Option<TypeDescriptor> {
    let inner = operand.strip_nullable();
    let defined = match op {
        UnaryOp::Not => {
            *inner == TypeDescriptor::bool() || inner.numeric_kind().map_or(false, NumericKind::is_integral)
        }
        UnaryOp::Negate => inner.numeric_kind().map_or(false, |k| k != NumericKind::ULong),
        UnaryOp::UnaryPlus => inner.numeric_kind().is_some(),
    };
    defined.then(|| operand.clone())
}

/// Result type of a binary operator whose operands were unified to
/// `left`/`right`. Shifts take an `int` count on the right.
pub fn binary_result(
    registry: &dyn TypeRegistry,
    op: BinaryOp,
    left: &TypeDescriptor,
    right: &TypeDescriptor,
) -> Option<TypeDescriptor> {
    let inner = left.strip_nullable();
    let kind = inner.numeric_kind();
    let is_bool = *inner == TypeDescriptor::bool();

    if op.is_shift() {
        let integral = kind.map_or(false, NumericKind::is_integral);
        let count_is_int = *right.strip_nullable() == TypeDescriptor::int();
        return (integral && count_is_int).then(|| left.clone());
    }

    if op.is_equality() {
        let comparable = left == right
            || (registry.is_nullable_or_reference(left) && registry.is_nullable_or_reference(right));
        return comparable.then(TypeDescriptor::bool);
    }

    if left != right {
        return None;
    }

    if op.is_arithmetic() {
        return kind.is_some().then(|| left.clone());
    }
    if op.is_bitwise() {
        let defined = is_bool || kind.map_or(false, NumericKind::is_integral) || registry.is_enum(inner);
        return defined.then(|| left.clone());
    }
    if op.is_relational() {
        return (kind.is_some() || registry.is_enum(inner)).then(TypeDescriptor::bool);
    }
    // `&&` and `||` do not lift.
    (op.is_short_circuit() && *left == TypeDescriptor::bool()).then(TypeDescriptor::bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryBuilder;

    #[test]
    fn test_promotion() {
        assert_eq!(promoted_operand_type(&TypeDescriptor::char()), TypeDescriptor::int());
        assert_eq!(
            promoted_operand_type(&TypeDescriptor::nullable(TypeDescriptor::numeric(NumericKind::Byte))),
            TypeDescriptor::nullable(TypeDescriptor::int())
        );
        assert_eq!(promoted_operand_type(&TypeDescriptor::long()), TypeDescriptor::long());
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary_result(UnaryOp::Not, &TypeDescriptor::bool()), Some(TypeDescriptor::bool()));
        assert_eq!(unary_result(UnaryOp::Not, &TypeDescriptor::int()), Some(TypeDescriptor::int()));
        assert_eq!(unary_result(UnaryOp::Not, &TypeDescriptor::double()), None);
        assert_eq!(unary_result(UnaryOp::Negate, &TypeDescriptor::string()), None);
    }

    #[test]
    fn test_binary() {
        let registry = RegistryBuilder::new().build();
        let int = TypeDescriptor::int();
        let string = TypeDescriptor::string();
        assert_eq!(binary_result(&registry, BinaryOp::Add, &int, &int), Some(int.clone()));
        assert_eq!(binary_result(&registry, BinaryOp::LessThan, &int, &int), Some(TypeDescriptor::bool()));
        assert_eq!(binary_result(&registry, BinaryOp::Equal, &string, &TypeDescriptor::object()), Some(TypeDescriptor::bool()));
        assert_eq!(binary_result(&registry, BinaryOp::Subtract, &string, &string), None);
        assert_eq!(binary_result(&registry, BinaryOp::AndAlso, &int, &int), None);
        assert_eq!(
            binary_result(&registry, BinaryOp::LeftShift, &TypeDescriptor::long(), &int),
            Some(TypeDescriptor::long())
        );
        assert_eq!(binary_result(&registry, BinaryOp::LeftShift, &TypeDescriptor::double(), &int), None);
    }
}
