//! The standard library registered by
//! [`RegistryBuilder::with_standard_library`](crate::RegistryBuilder::with_standard_library).
//!
//! Members of the built-in types (`Object`, `String`, the numeric primitives,
//! `Nullable<T>`, `Type`, arrays) plus `Math`, `List<T>` and
//! `Dictionary<TKey, TValue>`.

use crate::registry::{RegistryBuilder, TypeBuilder, TypeRegistry};
use crate::types::{Invocation, InvokeError, MemberFlags};
use parking_lot::RwLock;
use rust_decimal::prelude::*;
use std::str::FromStr;
use strexpr_ast::types::{NumericKind, TypeDefId, TypeDescriptor};
use strexpr_ast::value::{ObjectRef, Value};

type NativeResult = Result<Value, InvokeError>;

/// Payload of a `List<T>` instance.
#[derive(Debug, Default)]
pub struct HostList {
    pub items: RwLock<Vec<Value>>,
}

/// Payload of a `Dictionary<TKey, TValue>` instance. Entries keep insertion
/// order; keys compare with value equality.
#[derive(Debug, Default)]
pub struct HostDictionary {
    pub entries: RwLock<Vec<(Value, Value)>>,
}

pub const LIST_TYPE: &str = "System.Collections.Generic.List";
pub const DICTIONARY_TYPE: &str = "System.Collections.Generic.Dictionary";

/// A `List<element>` holding `items`, for hosts passing lists as arguments.
/// `None` when the registry has no standard library.
pub fn list_value(registry: &dyn TypeRegistry, element: TypeDescriptor, items: Vec<Value>) -> Option<Value> {
    let id = registry.resolve_type_by_name(LIST_TYPE, 1)?;
    let payload = HostList {
        items: RwLock::new(items),
    };
    Some(Value::Object(ObjectRef::new(TypeDescriptor::generic(id, vec![element]), payload)))
}

/// `ToString()` of any value. Enum values print their variant name and
/// types print their full name when a registry is available.
pub fn to_display_string(registry: Option<&dyn TypeRegistry>, value: &Value) -> String {
    let Some(registry) = registry else {
        return value.to_string();
    };
    match value {
        Value::Type(ty) => registry.full_type_name(ty),
        Value::Object(object) => registry.full_type_name(object.ty()),
        Value::Array(array) => format!("{}[]", registry.full_type_name(array.element())),
        Value::Enum { ty, value: number } => registry
            .definition(*ty)
            .and_then(|def| {
                def.members.values().find(|member| {
                    member.flags.contains(MemberFlags::STATIC)
                        && member.getter.call(&Invocation::new(None, &[])).ok().as_ref() == Some(value)
                })
            })
            .map(|member| member.name.clone())
            .unwrap_or_else(|| number.to_string()),
        other => other.to_string(),
    }
}

pub(crate) fn register(builder: &mut RegistryBuilder) {
    builder.extend(TypeDefId::OBJECT, register_object);
    builder.extend(TypeDefId::BOOL, |t| {
        t.static_method("Parse", vec![TypeDescriptor::string()], TypeDescriptor::bool(), |inv| {
            let text = required_str(inv, 0)?;
            match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(InvokeError::Format(text.to_string())),
            }
        });
    });
    for kind in NumericKind::ALL {
        builder.extend(kind.def_id(), |t| register_numeric(t, kind));
    }
    builder.extend(TypeDefId::STRING, register_string);
    builder.extend(TypeDefId::TYPE, |t| {
        t.property("Name", TypeDescriptor::string(), |inv| {
            let ty = type_receiver(inv)?;
            let name = match inv.registry {
                Some(registry) => short_type_name(registry, ty),
                None => format!("{:?}", ty),
            };
            Ok(Value::string(&name))
        })
        .property("FullName", TypeDescriptor::string(), |inv| {
            let ty = type_receiver(inv)?;
            Ok(Value::string(&to_display_string(inv.registry, &Value::Type(ty.clone()))))
        });
    });
    builder.extend(TypeDefId::NULLABLE, register_nullable);
    builder.extend(TypeDefId::ARRAY, |t| {
        t.property("Length", TypeDescriptor::int(), |inv| match inv.this()? {
            Value::Array(array) => Ok(Value::Int(array.len() as i32)),
            _ => Err(InvokeError::InvalidArgument("receiver is not an array".to_string())),
        });
    });
    builder.static_class("System.Math", register_math);
    builder.generic_class(LIST_TYPE, &["T"], register_list);
    builder.generic_class(DICTIONARY_TYPE, &["TKey", "TValue"], register_dictionary);
}

// ============================================================================
// Argument helpers
// ============================================================================

fn required_str<'a>(inv: &Invocation<'a>, index: usize) -> Result<&'a str, InvokeError> {
    inv.str_arg(index)?
        .ok_or_else(|| InvokeError::InvalidArgument(format!("argument {} is null", index)))
}

fn receiver_str<'a>(inv: &Invocation<'a>) -> Result<&'a str, InvokeError> {
    match inv.this()? {
        Value::String(s) => Ok(s),
        _ => Err(InvokeError::InvalidArgument("receiver is not a string".to_string())),
    }
}

fn type_receiver<'a>(inv: &Invocation<'a>) -> Result<&'a TypeDescriptor, InvokeError> {
    match inv.this()? {
        Value::Type(ty) => Ok(ty),
        _ => Err(InvokeError::InvalidArgument("receiver is not a type".to_string())),
    }
}

fn decimal_arg(inv: &Invocation<'_>, index: usize) -> Result<Decimal, InvokeError> {
    inv.arg(index)?
        .as_decimal()
        .ok_or_else(|| InvokeError::InvalidArgument(format!("argument {} is not a decimal", index)))
}

/// `Type.Name`: the simple runtime name, e.g. `Int32` or `List`1`.
fn short_type_name(registry: &dyn TypeRegistry, ty: &TypeDescriptor) -> String {
    if let Some(element) = ty.element_type() {
        return format!("{}[]", short_type_name(registry, element));
    }
    match ty.def_id().and_then(|id| registry.definition(id)) {
        Some(def) if def.arity() > 0 => format!("{}`{}", def.name, def.arity()),
        Some(def) => def.name.clone(),
        None => registry.type_name(ty),
    }
}

/// A value of `kind` from an integer that is known to fit.
fn integral_value(kind: NumericKind, v: i128) -> Value {
    match kind {
        NumericKind::Char => Value::Char(char::from_u32(v as u32).unwrap_or('\0')),
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

fn integral_range(kind: NumericKind) -> (i128, i128) {
    match kind {
        NumericKind::Char => (0, u16::MAX as i128),
        NumericKind::SByte => (i8::MIN as i128, i8::MAX as i128),
        NumericKind::Byte => (0, u8::MAX as i128),
        NumericKind::Short => (i16::MIN as i128, i16::MAX as i128),
        NumericKind::UShort => (0, u16::MAX as i128),
        NumericKind::Int => (i32::MIN as i128, i32::MAX as i128),
        NumericKind::UInt => (0, u32::MAX as i128),
        NumericKind::Long => (i64::MIN as i128, i64::MAX as i128),
        _ => (0, u64::MAX as i128),
    }
}

// ============================================================================
// Built-in types
// ============================================================================

fn register_object(t: &mut TypeBuilder<'_>) {
    t.constructor(vec![], |_| Ok(Value::Object(ObjectRef::new(TypeDescriptor::object(), ()))))
        .method("ToString", vec![], TypeDescriptor::string(), |inv| {
            Ok(Value::string(&to_display_string(inv.registry, inv.this()?)))
        })
        .method("Equals", vec![TypeDescriptor::object()], TypeDescriptor::bool(), |inv| {
            Ok(Value::Bool(inv.this()? == inv.arg(0)?))
        })
        .method("GetType", vec![], TypeDescriptor::type_object(), |inv| {
            let ty = inv.this()?.runtime_type().ok_or(InvokeError::NullReference)?;
            Ok(Value::Type(ty))
        });
}

fn register_numeric(t: &mut TypeBuilder<'_>, kind: NumericKind) {
    let ty = TypeDescriptor::numeric(kind);
    let (min, max) = match kind {
        NumericKind::Float => (Value::Float(f32::MIN), Value::Float(f32::MAX)),
        NumericKind::Double => (Value::Double(f64::MIN), Value::Double(f64::MAX)),
        NumericKind::Decimal => (Value::Decimal(Decimal::MIN), Value::Decimal(Decimal::MAX)),
        _ => {
            let (min, max) = integral_range(kind);
            (integral_value(kind, min), integral_value(kind, max))
        }
    };
    t.constant("MinValue", ty.clone(), min)
        .constant("MaxValue", ty.clone(), max)
        .static_method("Parse", vec![TypeDescriptor::string()], ty, move |inv| {
            let text = required_str(inv, 0)?;
            parse_numeric(kind, text.trim()).ok_or_else(|| InvokeError::Format(text.to_string()))
        });
}

fn parse_numeric(kind: NumericKind, text: &str) -> Option<Value> {
    match kind {
        NumericKind::Char => {
            let mut chars = text.chars();
            let ch = chars.next()?;
            chars.next().is_none().then_some(Value::Char(ch))
        }
        NumericKind::Float => text.parse::<f32>().ok().map(Value::Float),
        NumericKind::Double => text.parse::<f64>().ok().map(Value::Double),
        NumericKind::Decimal => Decimal::from_str(text).ok().map(Value::Decimal),
        _ => {
            let v = text.parse::<i128>().ok()?;
            let (min, max) = integral_range(kind);
            (min..=max).contains(&v).then(|| integral_value(kind, v))
        }
    }
}

/// Position of the first occurrence of `needle`, counted in characters.
fn char_index_of(haystack: &str, needle: &str) -> i32 {
    match haystack.find(needle) {
        Some(byte) => haystack[..byte].chars().count() as i32,
        None => -1,
    }
}

fn substring(text: &str, start: i32, length: Option<i32>) -> NativeResult {
    let total = text.chars().count() as i64;
    let start = start as i64;
    let length = length.map_or(total - start, |l| l as i64);
    if start < 0 || length < 0 || start + length > total {
        return Err(InvokeError::IndexOutOfRange {
            index: start + length.max(0),
            len: total as usize,
        });
    }
    let result: String = text.chars().skip(start as usize).take(length as usize).collect();
    Ok(Value::string(&result))
}

fn register_string(t: &mut TypeBuilder<'_>) {
    let string = TypeDescriptor::string;
    t.default_member("Chars")
        .constant("Empty", string(), Value::string(""))
        .property("Length", TypeDescriptor::int(), |inv| {
            Ok(Value::Int(receiver_str(inv)?.chars().count() as i32))
        })
        .method("get_Chars", vec![TypeDescriptor::int()], TypeDescriptor::char(), |inv| {
            let text = receiver_str(inv)?;
            let index = inv.i32_arg(0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| text.chars().nth(i))
                .map(Value::Char)
                .ok_or(InvokeError::IndexOutOfRange {
                    index: index as i64,
                    len: text.chars().count(),
                })
        })
        .static_method(
            "Concat",
            vec![TypeDescriptor::object(), TypeDescriptor::object()],
            string(),
            |inv| {
                let left = to_display_string(inv.registry, inv.arg(0)?);
                let right = to_display_string(inv.registry, inv.arg(1)?);
                Ok(Value::string(&(left + &right)))
            },
        )
        .static_method("Concat", vec![string(), string()], string(), |inv| {
            let left = inv.str_arg(0)?.unwrap_or("");
            let right = inv.str_arg(1)?.unwrap_or("");
            Ok(Value::string(&format!("{}{}", left, right)))
        })
        .static_method("IsNullOrEmpty", vec![string()], TypeDescriptor::bool(), |inv| {
            Ok(Value::Bool(inv.str_arg(0)?.map_or(true, str::is_empty)))
        })
        .method("Substring", vec![TypeDescriptor::int()], string(), |inv| {
            substring(receiver_str(inv)?, inv.i32_arg(0)?, None)
        })
        .method(
            "Substring",
            vec![TypeDescriptor::int(), TypeDescriptor::int()],
            string(),
            |inv| substring(receiver_str(inv)?, inv.i32_arg(0)?, Some(inv.i32_arg(1)?)),
        )
        .method("Contains", vec![string()], TypeDescriptor::bool(), |inv| {
            Ok(Value::Bool(receiver_str(inv)?.contains(required_str(inv, 0)?)))
        })
        .method("StartsWith", vec![string()], TypeDescriptor::bool(), |inv| {
            Ok(Value::Bool(receiver_str(inv)?.starts_with(required_str(inv, 0)?)))
        })
        .method("EndsWith", vec![string()], TypeDescriptor::bool(), |inv| {
            Ok(Value::Bool(receiver_str(inv)?.ends_with(required_str(inv, 0)?)))
        })
        .method("IndexOf", vec![string()], TypeDescriptor::int(), |inv| {
            Ok(Value::Int(char_index_of(receiver_str(inv)?, required_str(inv, 0)?)))
        })
        .method("IndexOf", vec![TypeDescriptor::char()], TypeDescriptor::int(), |inv| {
            let needle = match inv.arg(0)? {
                Value::Char(c) => c.to_string(),
                _ => return Err(InvokeError::InvalidArgument("argument 0 is not a char".to_string())),
            };
            Ok(Value::Int(char_index_of(receiver_str(inv)?, &needle)))
        })
        .method("ToUpper", vec![], string(), |inv| {
            Ok(Value::string(&receiver_str(inv)?.to_uppercase()))
        })
        .method("ToLower", vec![], string(), |inv| {
            Ok(Value::string(&receiver_str(inv)?.to_lowercase()))
        })
        .method("Trim", vec![], string(), |inv| Ok(Value::string(receiver_str(inv)?.trim())))
        .method("Replace", vec![string(), string()], string(), |inv| {
            let old = required_str(inv, 0)?;
            if old.is_empty() {
                return Err(InvokeError::InvalidArgument("string cannot be of zero length".to_string()));
            }
            let new = inv.str_arg(1)?.unwrap_or("");
            Ok(Value::string(&receiver_str(inv)?.replace(old, new)))
        });
}

fn register_nullable(t: &mut TypeBuilder<'_>) {
    let inner = TypeDescriptor::TypeParam(0);
    t.property("HasValue", TypeDescriptor::bool(), |inv| {
        Ok(Value::Bool(inv.receiver.map_or(false, |v| !v.is_null())))
    })
    .property("Value", inner.clone(), |inv| match inv.receiver {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Err(InvokeError::Failed("Nullable object must have a value.".to_string())),
    })
    .method("GetValueOrDefault", vec![], inner, |inv| match inv.receiver {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Ok(match (inv.registry, inv.type_args.first()) {
            (Some(registry), Some(ty)) => registry.default_value(ty),
            (None, Some(ty)) => Value::default_of(ty),
            _ => Value::Null,
        }),
    });
}

// ============================================================================
// Math
// ============================================================================

/// Round half to even, as `Math.Round` does.
fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}

fn unary_double(t: &mut TypeBuilder<'_>, name: &str, f: fn(f64) -> f64) {
    let double = TypeDescriptor::double();
    t.static_method(name, vec![double.clone()], double, move |inv| {
        Ok(Value::Double(f(inv.f64_arg(0)?)))
    });
}

fn register_math(t: &mut TypeBuilder<'_>) {
    let double = TypeDescriptor::double;
    let decimal = TypeDescriptor::decimal;
    let int = TypeDescriptor::int;
    let long = TypeDescriptor::long;

    t.constant("PI", double(), Value::Double(std::f64::consts::PI))
        .constant("E", double(), Value::Double(std::f64::consts::E))
        .static_method("Pow", vec![double(), double()], double(), |inv| {
            Ok(Value::Double(inv.f64_arg(0)?.powf(inv.f64_arg(1)?)))
        });

    for (name, f) in [
        ("Sqrt", f64::sqrt as fn(f64) -> f64),
        ("Sin", f64::sin),
        ("Cos", f64::cos),
        ("Tan", f64::tan),
        ("Log", f64::ln),
        ("Log10", f64::log10),
        ("Exp", f64::exp),
    ] {
        unary_double(t, name, f);
    }

    t.static_method("Abs", vec![int()], int(), |inv| match inv.arg(0)? {
        Value::Int(v) => v
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| InvokeError::Failed("Negating the minimum value of a twos complement number is invalid.".to_string())),
        _ => Err(InvokeError::InvalidArgument("argument 0 is not an int".to_string())),
    })
    .static_method("Abs", vec![long()], long(), |inv| match inv.arg(0)? {
        Value::Long(v) => v
            .checked_abs()
            .map(Value::Long)
            .ok_or_else(|| InvokeError::Failed("Negating the minimum value of a twos complement number is invalid.".to_string())),
        _ => Err(InvokeError::InvalidArgument("argument 0 is not a long".to_string())),
    })
    .static_method("Abs", vec![double()], double(), |inv| Ok(Value::Double(inv.f64_arg(0)?.abs())))
    .static_method("Abs", vec![decimal()], decimal(), |inv| Ok(Value::Decimal(decimal_arg(inv, 0)?.abs())));

    for name in ["Max", "Min"] {
        let pick_max = name == "Max";
        t.static_method(name, vec![int(), int()], int(), move |inv| {
            let (a, b) = (inv.i32_arg(0)?, inv.i32_arg(1)?);
            Ok(Value::Int(if pick_max { a.max(b) } else { a.min(b) }))
        })
        .static_method(name, vec![long(), long()], long(), move |inv| {
            let a = inv.arg(0)?.as_i128().unwrap_or_default() as i64;
            let b = inv.arg(1)?.as_i128().unwrap_or_default() as i64;
            Ok(Value::Long(if pick_max { a.max(b) } else { a.min(b) }))
        })
        .static_method(name, vec![double(), double()], double(), move |inv| {
            let (a, b) = (inv.f64_arg(0)?, inv.f64_arg(1)?);
            if a.is_nan() || b.is_nan() {
                return Ok(Value::Double(f64::NAN));
            }
            Ok(Value::Double(if pick_max { a.max(b) } else { a.min(b) }))
        })
        .static_method(name, vec![decimal(), decimal()], decimal(), move |inv| {
            let (a, b) = (decimal_arg(inv, 0)?, decimal_arg(inv, 1)?);
            Ok(Value::Decimal(if pick_max { a.max(b) } else { a.min(b) }))
        });
    }

    t.static_method("Floor", vec![double()], double(), |inv| Ok(Value::Double(inv.f64_arg(0)?.floor())))
        .static_method("Floor", vec![decimal()], decimal(), |inv| Ok(Value::Decimal(decimal_arg(inv, 0)?.floor())))
        .static_method("Ceiling", vec![double()], double(), |inv| Ok(Value::Double(inv.f64_arg(0)?.ceil())))
        .static_method("Ceiling", vec![decimal()], decimal(), |inv| Ok(Value::Decimal(decimal_arg(inv, 0)?.ceil())))
        .static_method("Round", vec![double()], double(), |inv| {
            Ok(Value::Double(round_half_even(inv.f64_arg(0)?)))
        })
        .static_method("Round", vec![double(), int()], double(), |inv| {
            let digits = inv.i32_arg(1)?;
            if !(0..=15).contains(&digits) {
                return Err(InvokeError::InvalidArgument("rounding digits must be between 0 and 15".to_string()));
            }
            let scale = 10f64.powi(digits);
            Ok(Value::Double(round_half_even(inv.f64_arg(0)? * scale) / scale))
        })
        .static_method("Round", vec![decimal()], decimal(), |inv| {
            // `Decimal::round` rounds half to even.
            Ok(Value::Decimal(decimal_arg(inv, 0)?.round()))
        });
}

// ============================================================================
// Collections
// ============================================================================

fn list_receiver<'a>(inv: &Invocation<'a>) -> Result<&'a HostList, InvokeError> {
    inv.this()?
        .as_object()
        .and_then(|o| o.downcast::<HostList>())
        .ok_or_else(|| InvokeError::InvalidArgument("receiver is not a list".to_string()))
}

fn dictionary_receiver<'a>(inv: &Invocation<'a>) -> Result<&'a HostDictionary, InvokeError> {
    inv.this()?
        .as_object()
        .and_then(|o| o.downcast::<HostDictionary>())
        .ok_or_else(|| InvokeError::InvalidArgument("receiver is not a dictionary".to_string()))
}

fn register_list(t: &mut TypeBuilder<'_>) {
    let item = TypeDescriptor::TypeParam(0);
    let id = t.id();
    let new_list = move |inv: &Invocation<'_>, capacity: usize| -> NativeResult {
        let ty = TypeDescriptor::generic(id, inv.type_args.to_vec());
        let payload = HostList {
            items: RwLock::new(Vec::with_capacity(capacity)),
        };
        Ok(Value::Object(ObjectRef::new(ty, payload)))
    };

    t.default_member("Item")
        .constructor(vec![], move |inv| new_list(inv, 0))
        .constructor(vec![TypeDescriptor::int()], move |inv| {
            let capacity = inv.i32_arg(0)?;
            let capacity = usize::try_from(capacity)
                .map_err(|_| InvokeError::InvalidArgument(format!("capacity {} is negative", capacity)))?;
            new_list(inv, capacity)
        })
        .property("Count", TypeDescriptor::int(), |inv| {
            Ok(Value::Int(list_receiver(inv)?.items.read().len() as i32))
        })
        .method("Add", vec![item.clone()], TypeDescriptor::void(), |inv| {
            list_receiver(inv)?.items.write().push(inv.arg(0)?.clone());
            Ok(Value::Null)
        })
        .method("get_Item", vec![TypeDescriptor::int()], item.clone(), |inv| {
            let items = list_receiver(inv)?.items.read();
            let index = inv.i32_arg(0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i).cloned())
                .ok_or(InvokeError::IndexOutOfRange {
                    index: index as i64,
                    len: items.len(),
                })
        })
        .method("Contains", vec![item.clone()], TypeDescriptor::bool(), |inv| {
            let needle = inv.arg(0)?;
            Ok(Value::Bool(list_receiver(inv)?.items.read().contains(needle)))
        })
        .method("IndexOf", vec![item], TypeDescriptor::int(), |inv| {
            let needle = inv.arg(0)?;
            let items = list_receiver(inv)?.items.read();
            Ok(Value::Int(items.iter().position(|v| v == needle).map_or(-1, |i| i as i32)))
        })
        .method("Clear", vec![], TypeDescriptor::void(), |inv| {
            list_receiver(inv)?.items.write().clear();
            Ok(Value::Null)
        });
}

fn register_dictionary(t: &mut TypeBuilder<'_>) {
    let key = TypeDescriptor::TypeParam(0);
    let value = TypeDescriptor::TypeParam(1);
    let id = t.id();

    t.default_member("Item")
        .constructor(vec![], move |inv| {
            let ty = TypeDescriptor::generic(id, inv.type_args.to_vec());
            Ok(Value::Object(ObjectRef::new(ty, HostDictionary::default())))
        })
        .property("Count", TypeDescriptor::int(), |inv| {
            Ok(Value::Int(dictionary_receiver(inv)?.entries.read().len() as i32))
        })
        .method("Add", vec![key.clone(), value.clone()], TypeDescriptor::void(), |inv| {
            let (k, v) = (inv.arg(0)?, inv.arg(1)?);
            if k.is_null() {
                return Err(InvokeError::InvalidArgument("key cannot be null".to_string()));
            }
            let mut entries = dictionary_receiver(inv)?.entries.write();
            if entries.iter().any(|(existing, _)| existing == k) {
                return Err(InvokeError::InvalidArgument(format!(
                    "an item with the same key '{}' has already been added",
                    to_display_string(inv.registry, k)
                )));
            }
            entries.push((k.clone(), v.clone()));
            Ok(Value::Null)
        })
        .method("ContainsKey", vec![key.clone()], TypeDescriptor::bool(), |inv| {
            let k = inv.arg(0)?;
            let entries = dictionary_receiver(inv)?.entries.read();
            Ok(Value::Bool(entries.iter().any(|(existing, _)| existing == k)))
        })
        .method("get_Item", vec![key], value, |inv| {
            let k = inv.arg(0)?;
            let entries = dictionary_receiver(inv)?.entries.read();
            entries
                .iter()
                .find(|(existing, _)| existing == k)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| InvokeError::KeyNotFound(to_display_string(inv.registry, k)))
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
        assert_eq!(round_half_even(-2.5), -2.0);
        assert_eq!(round_half_even(2.4), 2.0);
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric(NumericKind::Int, "42"), Some(Value::Int(42)));
        assert_eq!(parse_numeric(NumericKind::Byte, "256"), None);
        assert_eq!(parse_numeric(NumericKind::Double, "2.5"), Some(Value::Double(2.5)));
        assert_eq!(parse_numeric(NumericKind::Char, "ab"), None);
    }

    #[test]
    fn test_substring_bounds() {
        assert_eq!(substring("hello", 1, Some(3)), Ok(Value::string("ell")));
        assert_eq!(substring("hello", 2, None), Ok(Value::string("llo")));
        assert!(substring("hello", 4, Some(3)).is_err());
    }

    #[test]
    fn test_display_strings() {
        let registry = Registry::standard();
        let registry: &dyn TypeRegistry = &*registry;
        assert_eq!(to_display_string(Some(registry), &Value::Type(TypeDescriptor::int())), "System.Int32");
        assert_eq!(to_display_string(Some(registry), &Value::Bool(false)), "False");
        assert_eq!(to_display_string(None, &Value::Null), "");
    }

    #[test]
    fn test_list_value() {
        let registry = Registry::standard();
        let list = list_value(&*registry, TypeDescriptor::int(), vec![Value::Int(1)]).unwrap();
        let object = list.as_object().unwrap();
        assert_eq!(registry.type_name(object.ty()), "List<int>");
        assert_eq!(object.downcast::<HostList>().unwrap().items.read().len(), 1);
    }
}
