//! Runtime values.
//!
//! Constants in the tree and the arguments and results of compiled lambdas are
//! [`Value`]s. Primitive values are stored inline; host objects and arrays are
//! shared handles so that copies alias the same instance, as reference types do.

use crate::types::{NumericKind, TypeDefId, TypeDescriptor};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    SByte(i8),
    Byte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    String(Arc<str>),
    /// A `System.Type` value, as produced by `typeof`.
    Type(TypeDescriptor),
    Enum { ty: TypeDefId, value: i64 },
    Array(ArrayRef),
    Object(ObjectRef),
}

/// A host object: its runtime type plus a shared payload owned by the host.
#[derive(Clone)]
pub struct ObjectRef {
    ty: TypeDescriptor,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(ty: TypeDescriptor, payload: T) -> Self {
        Self {
            ty,
            payload: Arc::new(payload),
        }
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:?})", self.ty)
    }
}

/// A single-dimensional array.
#[derive(Clone)]
pub struct ArrayRef {
    element: TypeDescriptor,
    items: Arc<RwLock<Vec<Value>>>,
}

impl ArrayRef {
    pub fn new(element: TypeDescriptor, items: Vec<Value>) -> Self {
        Self {
            element,
            items: Arc::new(RwLock::new(items)),
        }
    }

    pub fn element(&self) -> &TypeDescriptor {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.read().iter()).finish()
    }
}

impl Value {
    pub fn string(s: &str) -> Value {
        Value::String(Arc::from(s))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The zero value of a numeric kind.
    pub fn zero(kind: NumericKind) -> Value {
        match kind {
            NumericKind::Char => Value::Char('\0'),
            NumericKind::SByte => Value::SByte(0),
            NumericKind::Byte => Value::Byte(0),
            NumericKind::Short => Value::Short(0),
            NumericKind::UShort => Value::UShort(0),
            NumericKind::Int => Value::Int(0),
            NumericKind::UInt => Value::UInt(0),
            NumericKind::Long => Value::Long(0),
            NumericKind::ULong => Value::ULong(0),
            NumericKind::Float => Value::Float(0.0),
            NumericKind::Double => Value::Double(0.0),
            NumericKind::Decimal => Value::Decimal(Decimal::ZERO),
        }
    }

    /// `default(T)` for built-in types; everything else defaults to null.
    pub fn default_of(ty: &TypeDescriptor) -> Value {
        if let Some(kind) = ty.numeric_kind() {
            return Value::zero(kind);
        }
        if *ty == TypeDescriptor::bool() {
            return Value::Bool(false);
        }
        Value::Null
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        Some(match self {
            Value::Char(_) => NumericKind::Char,
            Value::SByte(_) => NumericKind::SByte,
            Value::Byte(_) => NumericKind::Byte,
            Value::Short(_) => NumericKind::Short,
            Value::UShort(_) => NumericKind::UShort,
            Value::Int(_) => NumericKind::Int,
            Value::UInt(_) => NumericKind::UInt,
            Value::Long(_) => NumericKind::Long,
            Value::ULong(_) => NumericKind::ULong,
            Value::Float(_) => NumericKind::Float,
            Value::Double(_) => NumericKind::Double,
            Value::Decimal(_) => NumericKind::Decimal,
            _ => return None,
        })
    }

    /// The runtime type of a non-null value.
    pub fn runtime_type(&self) -> Option<TypeDescriptor> {
        if let Some(kind) = self.numeric_kind() {
            return Some(TypeDescriptor::numeric(kind));
        }
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeDescriptor::bool()),
            Value::String(_) => Some(TypeDescriptor::string()),
            Value::Type(_) => Some(TypeDescriptor::type_object()),
            Value::Enum { ty, .. } => Some(TypeDescriptor::of(*ty)),
            Value::Array(array) => Some(TypeDescriptor::array(array.element().clone())),
            Value::Object(object) => Some(object.ty().clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Integral value widened to `i128`; `char` yields its code point.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Char(c) => *c as i128,
            Value::SByte(v) => *v as i128,
            Value::Byte(v) => *v as i128,
            Value::Short(v) => *v as i128,
            Value::UShort(v) => *v as i128,
            Value::Int(v) => *v as i128,
            Value::UInt(v) => *v as i128,
            Value::Long(v) => *v as i128,
            Value::ULong(v) => *v as i128,
            Value::Enum { value, .. } => *value as i128,
            _ => return None,
        })
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_i128().and_then(|v| i32::try_from(v).ok())
    }

    /// Any numeric value as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Decimal(d) => d.to_f64(),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        use rust_decimal::prelude::FromPrimitive;
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Float(v) => Decimal::from_f32(*v),
            Value::Double(v) => Decimal::from_f64(*v),
            other => other.as_i128().and_then(Decimal::from_i128),
        }
    }
}

/// Equality with reference semantics for objects and arrays, value
/// semantics for everything else.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::SByte(a), Value::SByte(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::UShort(a), Value::UShort(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::ULong(a), Value::ULong(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Enum { ty: ta, value: a }, Value::Enum { ty: tb, value: b }) => ta == tb && a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::SByte(v) => write!(f, "{}sb", v),
            Value::Byte(v) => write!(f, "{}b", v),
            Value::Short(v) => write!(f, "{}s", v),
            Value::UShort(v) => write!(f, "{}us", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}u", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::ULong(v) => write!(f, "{}UL", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}d", v),
            Value::Decimal(v) => write!(f, "{}m", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::Type(t) => write!(f, "typeof({:?})", t),
            Value::Enum { ty, value } => write!(f, "{:?}({})", ty, value),
            Value::Array(a) => write!(f, "{:?}", a),
            Value::Object(o) => write!(f, "{:?}", o),
        }
    }
}

/// `ToString()` formatting for values that do not need registry names.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Char(v) => write!(f, "{}", v),
            Value::SByte(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::UShort(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::ULong(v) => write!(f, "{}", v),
            Value::Float(v) => f.write_str(&format_real(*v as f64, format!("{}", v), format!("{:E}", v), 7)),
            Value::Double(v) => f.write_str(&format_real(*v, format!("{}", v), format!("{:E}", v), 15)),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Type(t) => write!(f, "{:?}", t),
            Value::Enum { value, .. } => write!(f, "{}", value),
            Value::Array(_) => write!(f, "Array"),
            Value::Object(o) => write!(f, "{:?}", o.ty()),
        }
    }
}

/// Round-trip formatting with an exponent once the magnitude leaves
/// `[1e-5, 1e{max_exponent})`, e.g. `3.4E+30`.
fn format_real(value: f64, plain: String, scientific: String, max_exponent: i32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞".to_string() } else { "-∞".to_string() };
    }
    if value == 0.0 {
        return plain;
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < max_exponent && exponent >= -5 {
        return plain;
    }
    match scientific.split_once('E') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(exponent);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}E{}{:02}", mantissa, sign, exp.abs())
        }
        None => plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_dotnet_to_string() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Double(3.2).to_string(), "3.2");
        assert_eq!(Value::Double(1e30).to_string(), "1E+30");
        assert_eq!(Value::Double(1.5e-7).to_string(), "1.5E-07");
        assert_eq!(Value::Float(3.4e30).to_string(), "3.4E+30");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::string("abc").to_string(), "abc");
    }

    #[test]
    fn test_equality_semantics() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Long(3));
        assert_eq!(Value::string("a"), Value::string("a"));

        let ty = TypeDescriptor::object();
        let a = ObjectRef::new(ty.clone(), ());
        let b = ObjectRef::new(ty, ());
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_default_and_runtime_type() {
        assert_eq!(Value::default_of(&TypeDescriptor::int()), Value::Int(0));
        assert_eq!(Value::default_of(&TypeDescriptor::bool()), Value::Bool(false));
        assert!(Value::default_of(&TypeDescriptor::string()).is_null());
        assert_eq!(Value::Long(1).runtime_type(), Some(TypeDescriptor::long()));
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Char('a').as_i128(), Some(97));
    }
}
