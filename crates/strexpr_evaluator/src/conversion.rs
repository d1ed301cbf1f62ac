//! Runtime conversions behind `Convert` nodes.
//!
//! The kind of conversion is decided once from the static source and target
//! types; only the value is inspected per call.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use strexpr_ast::types::{NumericKind, TypeDefId, TypeDescriptor};
use strexpr_ast::value::Value;
use strexpr_checker::TypeRegistry;

use crate::error::EvalError;

#[derive(Debug, Clone)]
enum Kind {
    /// Same representation: nullable wrapping and unwrapping, boxing and
    /// upcasts.
    Identity,
    Numeric(NumericKind),
    ToEnum { ty: TypeDefId, underlying: NumericKind },
    /// Unboxing and downcasts, checked against the runtime type.
    Checked(TypeDescriptor),
}

/// A conversion from one static type to another.
#[derive(Debug, Clone)]
pub(crate) struct Conversion {
    kind: Kind,
    /// Whether null converts to null rather than failing.
    accepts_null: bool,
}

impl Conversion {
    pub(crate) fn new(registry: &dyn TypeRegistry, from: &TypeDescriptor, to: &TypeDescriptor) -> Self {
        let (source, target) = (from.strip_nullable(), to.strip_nullable());
        let numeric_like = |ty: &TypeDescriptor| ty.numeric_kind().is_some() || registry.is_enum(ty);
        let kind = if source == target {
            Kind::Identity
        } else if numeric_like(source) && numeric_like(target) {
            match (target.numeric_kind(), target.def_id()) {
                (Some(kind), _) => Kind::Numeric(kind),
                (None, Some(ty)) => Kind::ToEnum {
                    ty,
                    underlying: registry.enum_kind(target).unwrap_or(NumericKind::Int),
                },
                (None, None) => Kind::Checked(target.clone()),
            }
        } else if registry.is_assignable(source, target) {
            Kind::Identity
        } else {
            Kind::Checked(target.clone())
        };
        Self {
            kind,
            accepts_null: registry.is_nullable_or_reference(to),
        }
    }

    pub(crate) fn apply(&self, value: Value, registry: &dyn TypeRegistry) -> Result<Value, EvalError> {
        if value.is_null() {
            return if self.accepts_null {
                Ok(Value::Null)
            } else {
                Err(EvalError::NullReference)
            };
        }
        match &self.kind {
            Kind::Identity => Ok(value),
            Kind::Numeric(kind) => to_numeric(&value, *kind),
            Kind::ToEnum { ty, underlying } => {
                let number = to_numeric(&value, *underlying)?;
                let value = number.as_i128().map_or(0, |v| v as i64);
                Ok(Value::Enum { ty: *ty, value })
            }
            Kind::Checked(target) => {
                let runtime = value.runtime_type();
                match runtime {
                    Some(ref ty) if registry.is_assignable(ty, target) => Ok(value),
                    _ => Err(EvalError::InvalidCast {
                        from: runtime.map_or_else(|| format!("{:?}", value), |ty| registry.type_name(&ty)),
                        to: registry.type_name(target),
                    }),
                }
            }
        }
    }
}

/// Convert a numeric or enum value to `kind` the way an explicit cast does:
/// floating values truncate toward zero, integers keep their low bits, and
/// only conversions from `decimal` that leave the target range fail.
pub fn to_numeric(value: &Value, kind: NumericKind) -> Result<Value, EvalError> {
    let not_numeric = || EvalError::TypeMismatch(format!("{:?} is not a number", value));
    match kind {
        NumericKind::Float => value.as_f64().map(|v| Value::Float(v as f32)).ok_or_else(not_numeric),
        NumericKind::Double => value.as_f64().map(Value::Double).ok_or_else(not_numeric),
        NumericKind::Decimal => {
            let decimal = match value {
                Value::Float(v) => Decimal::from_f32(*v).ok_or(EvalError::Overflow)?,
                Value::Double(v) => Decimal::from_f64(*v).ok_or(EvalError::Overflow)?,
                Value::Decimal(d) => *d,
                other => other
                    .as_i128()
                    .and_then(Decimal::from_i128)
                    .ok_or_else(not_numeric)?,
            };
            Ok(Value::Decimal(decimal))
        }
        _ => {
            let integer = match value {
                Value::Float(v) => truncate(*v as f64),
                Value::Double(v) => truncate(*v),
                Value::Decimal(d) => {
                    let integer = d.trunc().to_i128().ok_or(EvalError::Overflow)?;
                    if !fits(kind, integer) {
                        return Err(EvalError::Overflow);
                    }
                    integer
                }
                other => other.as_i128().ok_or_else(not_numeric)?,
            };
            Ok(integral_value(kind, integer))
        }
    }
}

fn truncate(v: f64) -> i128 {
    if v.is_nan() {
        0
    } else {
        v.trunc() as i128
    }
}

fn fits(kind: NumericKind, v: i128) -> bool {
    let (min, max): (i128, i128) = match kind {
        NumericKind::Char | NumericKind::UShort => (0, u16::MAX as i128),
        NumericKind::SByte => (i8::MIN as i128, i8::MAX as i128),
        NumericKind::Byte => (0, u8::MAX as i128),
        NumericKind::Short => (i16::MIN as i128, i16::MAX as i128),
        NumericKind::Int => (i32::MIN as i128, i32::MAX as i128),
        NumericKind::UInt => (0, u32::MAX as i128),
        NumericKind::Long => (i64::MIN as i128, i64::MAX as i128),
        NumericKind::ULong => (0, u64::MAX as i128),
        NumericKind::Float | NumericKind::Double | NumericKind::Decimal => return true,
    };
    (min..=max).contains(&v)
}

/// Keep the low bits of `v` that fit `kind`.
fn integral_value(kind: NumericKind, v: i128) -> Value {
    match kind {
        NumericKind::Char => Value::Char(char::from_u32(v as u16 as u32).unwrap_or(char::REPLACEMENT_CHARACTER)),
        NumericKind::SByte => Value::SByte(v as i8),
        NumericKind::Byte => Value::Byte(v as u8),
        NumericKind::Short => Value::Short(v as i16),
        NumericKind::UShort => Value::UShort(v as u16),
        NumericKind::Int => Value::Int(v as i32),
        NumericKind::UInt => Value::UInt(v as u32),
        NumericKind::Long => Value::Long(v as i64),
        NumericKind::ULong => Value::ULong(v as u64),
        NumericKind::Float => Value::Float(v as f32),
        NumericKind::Double => Value::Double(v as f64),
        NumericKind::Decimal => Value::Decimal(Decimal::from_i128(v).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_checker::Registry;

    #[test]
    fn test_casts_truncate() {
        assert_eq!(to_numeric(&Value::Double(3.7), NumericKind::Int).unwrap(), Value::Int(3));
        assert_eq!(to_numeric(&Value::Double(-3.7), NumericKind::Int).unwrap(), Value::Int(-3));
        assert_eq!(to_numeric(&Value::Int(300), NumericKind::Byte).unwrap(), Value::Byte(44));
        assert_eq!(to_numeric(&Value::Int(-1), NumericKind::UInt).unwrap(), Value::UInt(u32::MAX));
        assert_eq!(to_numeric(&Value::Int(97), NumericKind::Char).unwrap(), Value::Char('a'));
    }

    #[test]
    fn test_decimal_range_is_checked() {
        let big = Value::Decimal(Decimal::from(1_000_000_000_000i64));
        assert_eq!(to_numeric(&big, NumericKind::Int), Err(EvalError::Overflow));
        assert_eq!(to_numeric(&big, NumericKind::Long).unwrap(), Value::Long(1_000_000_000_000));
        assert_eq!(to_numeric(&Value::Double(f64::NAN), NumericKind::Decimal), Err(EvalError::Overflow));
    }

    #[test]
    fn test_unboxing() {
        let registry = Registry::standard();
        let unbox = Conversion::new(registry.as_ref(), &TypeDescriptor::object(), &TypeDescriptor::int());
        assert_eq!(unbox.apply(Value::Int(4), registry.as_ref()).unwrap(), Value::Int(4));
        assert_eq!(unbox.apply(Value::Null, registry.as_ref()), Err(EvalError::NullReference));
        assert!(matches!(
            unbox.apply(Value::Long(4), registry.as_ref()),
            Err(EvalError::InvalidCast { .. })
        ));
    }

    #[test]
    fn test_nullable_unwrap() {
        let registry = Registry::standard();
        let int_n = TypeDescriptor::nullable(TypeDescriptor::int());
        let unwrap = Conversion::new(registry.as_ref(), &int_n, &TypeDescriptor::int());
        assert_eq!(unwrap.apply(Value::Int(1), registry.as_ref()).unwrap(), Value::Int(1));
        assert_eq!(unwrap.apply(Value::Null, registry.as_ref()), Err(EvalError::NullReference));
        let widen = Conversion::new(registry.as_ref(), &int_n, &TypeDescriptor::nullable(TypeDescriptor::long()));
        assert_eq!(widen.apply(Value::Null, registry.as_ref()).unwrap(), Value::Null);
        assert_eq!(widen.apply(Value::Int(2), registry.as_ref()).unwrap(), Value::Long(2));
    }
}
