//! Operator semantics on runtime values.
//!
//! Operands reach these functions already converted to a common type, so
//! every arm matches two values of the same variant. Integer arithmetic wraps;
//! division and remainder are the only integer operations that fail.
//! Decimal arithmetic is checked. Nullable operands are lifted: a null side
//! makes the result null, except for comparisons (false), equality and the
//! three-valued `bool?` operators `&` and `|`.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use strexpr_ast::node::{BinaryOp, UnaryOp};
use strexpr_ast::value::Value;

use crate::error::EvalError;

fn not_applicable(symbol: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "operator '{}' cannot be applied to {:?} and {:?}",
        symbol, left, right
    ))
}

macro_rules! integer_arithmetic {
    ($op:expr, $a:expr, $b:expr, $variant:path, $left:expr, $right:expr) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Ok($variant(a.wrapping_add(b))),
            BinaryOp::Subtract => Ok($variant(a.wrapping_sub(b))),
            BinaryOp::Multiply => Ok($variant(a.wrapping_mul(b))),
            BinaryOp::Divide | BinaryOp::Modulo if b == 0 => Err(EvalError::DivideByZero),
            // Only `MIN / -1` fails here.
            BinaryOp::Divide => a.checked_div(b).map($variant).ok_or(EvalError::Overflow),
            BinaryOp::Modulo => a.checked_rem(b).map($variant).ok_or(EvalError::Overflow),
            BinaryOp::And => Ok($variant(a & b)),
            BinaryOp::Or => Ok($variant(a | b)),
            BinaryOp::ExclusiveOr => Ok($variant(a ^ b)),
            op => Err(not_applicable(op.symbol(), $left, $right)),
        }
    }};
}

macro_rules! float_arithmetic {
    ($op:expr, $a:expr, $b:expr, $variant:path, $left:expr, $right:expr) => {{
        let (a, b) = ($a, $b);
        match $op {
            BinaryOp::Add => Ok($variant(a + b)),
            BinaryOp::Subtract => Ok($variant(a - b)),
            BinaryOp::Multiply => Ok($variant(a * b)),
            BinaryOp::Divide => Ok($variant(a / b)),
            BinaryOp::Modulo => Ok($variant(a % b)),
            op => Err(not_applicable(op.symbol(), $left, $right)),
        }
    }};
}

fn decimal_arithmetic(op: BinaryOp, a: Decimal, b: Decimal, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Subtract => a.checked_sub(b),
        BinaryOp::Multiply => a.checked_mul(b),
        BinaryOp::Divide | BinaryOp::Modulo if b.is_zero() => return Err(EvalError::DivideByZero),
        BinaryOp::Divide => a.checked_div(b),
        BinaryOp::Modulo => a.checked_rem(b),
        op => return Err(not_applicable(op.symbol(), left, right)),
    };
    result.map(Value::Decimal).ok_or(EvalError::Overflow)
}

/// Apply a unary operator to a non-null operand.
pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    let result = match (op, operand) {
        (UnaryOp::UnaryPlus, value) if value.numeric_kind().is_some() => value.clone(),
        (UnaryOp::Negate, Value::Int(v)) => Value::Int(v.wrapping_neg()),
        (UnaryOp::Negate, Value::UInt(v)) => Value::UInt(v.wrapping_neg()),
        (UnaryOp::Negate, Value::Long(v)) => Value::Long(v.wrapping_neg()),
        (UnaryOp::Negate, Value::Float(v)) => Value::Float(-v),
        (UnaryOp::Negate, Value::Double(v)) => Value::Double(-v),
        (UnaryOp::Negate, Value::Decimal(v)) => Value::Decimal(-*v),
        (UnaryOp::Not, Value::Bool(v)) => Value::Bool(!v),
        (UnaryOp::Not, Value::Int(v)) => Value::Int(!v),
        (UnaryOp::Not, Value::UInt(v)) => Value::UInt(!v),
        (UnaryOp::Not, Value::Long(v)) => Value::Long(!v),
        (UnaryOp::Not, Value::ULong(v)) => Value::ULong(!v),
        (op, value) => {
            return Err(EvalError::TypeMismatch(format!(
                "operator '{}' cannot be applied to {:?}",
                op.symbol(),
                value
            )))
        }
    };
    Ok(result)
}

/// Apply a non-short-circuit binary operator.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if op.is_equality() {
        let equal = left == right;
        return Ok(Value::Bool(if op == BinaryOp::Equal { equal } else { !equal }));
    }
    if op.is_bitwise() {
        if let Some(result) = logical(op, left, right) {
            return Ok(result);
        }
    }
    if left.is_null() || right.is_null() {
        return Ok(if op.is_relational() { Value::Bool(false) } else { Value::Null });
    }
    if op.is_relational() {
        return compare(op, left, right);
    }
    if op.is_shift() {
        let count = right
            .as_i32()
            .ok_or_else(|| not_applicable(op.symbol(), left, right))?;
        return shift(op, left, count);
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => integer_arithmetic!(op, *a, *b, Value::Int, left, right),
        (Value::UInt(a), Value::UInt(b)) => integer_arithmetic!(op, *a, *b, Value::UInt, left, right),
        (Value::Long(a), Value::Long(b)) => integer_arithmetic!(op, *a, *b, Value::Long, left, right),
        (Value::ULong(a), Value::ULong(b)) => integer_arithmetic!(op, *a, *b, Value::ULong, left, right),
        (Value::Float(a), Value::Float(b)) => float_arithmetic!(op, *a, *b, Value::Float, left, right),
        (Value::Double(a), Value::Double(b)) => float_arithmetic!(op, *a, *b, Value::Double, left, right),
        (Value::Decimal(a), Value::Decimal(b)) => decimal_arithmetic(op, *a, *b, left, right),
        (Value::Enum { ty, value: a }, Value::Enum { value: b, .. }) if op.is_bitwise() => {
            let value = match op {
                BinaryOp::And => a & b,
                BinaryOp::Or => a | b,
                _ => a ^ b,
            };
            Ok(Value::Enum { ty: *ty, value })
        }
        _ => Err(not_applicable(op.symbol(), left, right)),
    }
}

/// `&`, `|` and `^` over `bool` and `bool?`. `None` when neither side is a
/// boolean.
fn logical(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    let operand = |value: &Value| match value {
        Value::Bool(b) => Some(Some(*b)),
        Value::Null => Some(None),
        _ => None,
    };
    let (a, b) = (operand(left)?, operand(right)?);
    if a.is_none() && b.is_none() {
        return None;
    }
    let result = match (op, a, b) {
        (BinaryOp::And, Some(false), _) | (BinaryOp::And, _, Some(false)) => Some(false),
        (BinaryOp::Or, Some(true), _) | (BinaryOp::Or, _, Some(true)) => Some(true),
        (_, Some(a), Some(b)) => Some(match op {
            BinaryOp::And => a & b,
            BinaryOp::Or => a | b,
            _ => a ^ b,
        }),
        _ => None,
    };
    Some(result.map_or(Value::Null, Value::Bool))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
        _ => match (left.as_i128(), right.as_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => return Err(not_applicable(op.symbol(), left, right)),
        },
    };
    // NaN compares false with everything.
    let result = ordering.map_or(false, |ordering| match op {
        BinaryOp::LessThan => ordering == Ordering::Less,
        BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
        BinaryOp::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    });
    Ok(Value::Bool(result))
}

/// The count is masked to the operand width, as `wrapping_shl` does.
fn shift(op: BinaryOp, value: &Value, count: i32) -> Result<Value, EvalError> {
    let count = count as u32;
    let left = op == BinaryOp::LeftShift;
    macro_rules! shift_by {
        ($v:expr, $variant:path) => {
            Ok($variant(if left { $v.wrapping_shl(count) } else { $v.wrapping_shr(count) }))
        };
    }
    match value {
        Value::Int(v) => shift_by!(v, Value::Int),
        Value::UInt(v) => shift_by!(v, Value::UInt),
        Value::Long(v) => shift_by!(v, Value::Long),
        Value::ULong(v) => shift_by!(v, Value::ULong),
        other => Err(not_applicable(op.symbol(), other, &Value::Int(count as i32))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic_wraps() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::Int(i32::MAX), &Value::Int(1)).unwrap(),
            Value::Int(i32::MIN)
        );
        assert_eq!(binary(BinaryOp::Modulo, &Value::Long(-7), &Value::Long(3)).unwrap(), Value::Long(-1));
        assert_eq!(binary(BinaryOp::Divide, &Value::Int(7), &Value::Int(0)), Err(EvalError::DivideByZero));
        assert_eq!(binary(BinaryOp::Divide, &Value::Int(i32::MIN), &Value::Int(-1)), Err(EvalError::Overflow));
    }

    #[test]
    fn test_float_division_by_zero_is_infinite() {
        let result = binary(BinaryOp::Divide, &Value::Double(1.0), &Value::Double(0.0)).unwrap();
        assert_eq!(result, Value::Double(f64::INFINITY));
        let nan = Value::Double(f64::NAN);
        assert_eq!(binary(BinaryOp::LessThan, &nan, &Value::Double(1.0)).unwrap(), Value::Bool(false));
        assert_eq!(binary(BinaryOp::Equal, &nan, &nan).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_decimal_is_checked() {
        let max = Value::Decimal(Decimal::MAX);
        assert_eq!(binary(BinaryOp::Add, &max, &Value::Decimal(Decimal::ONE)), Err(EvalError::Overflow));
        assert_eq!(
            binary(BinaryOp::Divide, &Value::Decimal(Decimal::ONE), &Value::Decimal(Decimal::ZERO)),
            Err(EvalError::DivideByZero)
        );
    }

    #[test]
    fn test_lifted_operators() {
        assert_eq!(binary(BinaryOp::Add, &Value::Null, &Value::Int(1)).unwrap(), Value::Null);
        assert_eq!(binary(BinaryOp::LessThan, &Value::Null, &Value::Int(1)).unwrap(), Value::Bool(false));
        assert_eq!(binary(BinaryOp::Equal, &Value::Null, &Value::Null).unwrap(), Value::Bool(true));
        assert_eq!(binary(BinaryOp::NotEqual, &Value::Null, &Value::Int(1)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_three_valued_logic() {
        let (t, f, n) = (Value::Bool(true), Value::Bool(false), Value::Null);
        assert_eq!(binary(BinaryOp::And, &n, &f).unwrap(), f);
        assert_eq!(binary(BinaryOp::And, &n, &t).unwrap(), n);
        assert_eq!(binary(BinaryOp::Or, &n, &t).unwrap(), t);
        assert_eq!(binary(BinaryOp::ExclusiveOr, &t, &f).unwrap(), t);
    }

    #[test]
    fn test_shift_masks_count() {
        assert_eq!(binary(BinaryOp::LeftShift, &Value::Int(1), &Value::Int(33)).unwrap(), Value::Int(2));
        assert_eq!(binary(BinaryOp::RightShift, &Value::Int(-8), &Value::Int(1)).unwrap(), Value::Int(-4));
        assert_eq!(
            binary(BinaryOp::RightShift, &Value::UInt(u32::MAX), &Value::Int(28)).unwrap(),
            Value::UInt(15)
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Not, &Value::Int(6)).unwrap(), Value::Int(-7));
        assert_eq!(unary(UnaryOp::Negate, &Value::Int(i32::MIN)).unwrap(), Value::Int(i32::MIN));
        assert_eq!(unary(UnaryOp::Not, &Value::Bool(true)).unwrap(), Value::Bool(false));
        assert!(unary(UnaryOp::Negate, &Value::string("a")).is_err());
    }
}
