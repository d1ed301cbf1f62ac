//! Type definitions stored in a registry.
//!
//! Definitions are stored in the registry's table and referenced by
//! `TypeDefId`. Members carry native callables so that a compiled expression
//! can read fields, call methods and construct objects without reflection.

use crate::registry::TypeRegistry;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use strexpr_ast::types::{NumericKind, TypeDefId, TypeDescriptor};
use strexpr_ast::value::Value;
use strexpr_core::intern::InternedString;
use thiserror::Error;

bitflags::bitflags! {
    /// Flags describing a type definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        const NONE       = 0;
        /// Copied by value; only value types can be wrapped in `Nullable<T>`.
        const VALUE_TYPE = 1 << 0;
        const ENUM       = 1 << 1;
        /// Only static members; cannot be instantiated.
        const STATIC     = 1 << 2;
        const PRIMITIVE  = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Flags for fields, properties and methods.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        const NONE     = 0;
        const STATIC   = 1 << 0;
        const PROPERTY = 1 << 1;
    }
}

/// Failure raised by a native member while an expression runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    #[error("object reference not set to an instance of an object")]
    NullReference,
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("the given key '{0}' was not present in the dictionary")]
    KeyNotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("input string '{0}' was not in a correct format")]
    Format(String),
    #[error("{0}")]
    Failed(String),
}

/// The receiver and arguments of a native call.
pub struct Invocation<'a> {
    /// `None` for static members and constructors.
    pub receiver: Option<&'a Value>,
    pub args: &'a [Value],
    /// Generic arguments of the declaring type.
    pub type_args: &'a [TypeDescriptor],
    /// Generic arguments of a generic method instantiation.
    pub method_type_args: &'a [TypeDescriptor],
    /// The registry the call was bound against, for natives that format or
    /// inspect types.
    pub registry: Option<&'a dyn TypeRegistry>,
}

impl<'a> Invocation<'a> {
    pub fn new(receiver: Option<&'a Value>, args: &'a [Value]) -> Self {
        Self {
            receiver,
            args,
            type_args: &[],
            method_type_args: &[],
            registry: None,
        }
    }

    /// The receiver of an instance call; null receivers fail.
    pub fn this(&self) -> Result<&'a Value, InvokeError> {
        match self.receiver {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(InvokeError::NullReference),
        }
    }

    pub fn arg(&self, index: usize) -> Result<&'a Value, InvokeError> {
        self.args
            .get(index)
            .ok_or_else(|| InvokeError::InvalidArgument(format!("missing argument {}", index)))
    }

    pub fn f64_arg(&self, index: usize) -> Result<f64, InvokeError> {
        self.arg(index)?
            .as_f64()
            .ok_or_else(|| InvokeError::InvalidArgument(format!("argument {} is not numeric", index)))
    }

    pub fn i32_arg(&self, index: usize) -> Result<i32, InvokeError> {
        self.arg(index)?
            .as_i32()
            .ok_or_else(|| InvokeError::InvalidArgument(format!("argument {} is not an int", index)))
    }

    /// A string argument; null is reported as `None`.
    pub fn str_arg(&self, index: usize) -> Result<Option<&'a str>, InvokeError> {
        match self.arg(index)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            _ => Err(InvokeError::InvalidArgument(format!("argument {} is not a string", index))),
        }
    }
}

/// A host callable backing a member, method or constructor.
#[derive(Clone)]
pub struct NativeFn(Arc<dyn Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync>);

impl NativeFn {
    pub fn new(f: impl Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, invocation: &Invocation<'_>) -> Result<Value, InvokeError> {
        (self.0)(invocation)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native>")
    }
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeDescriptor,
}

/// A field or property.
#[derive(Debug, Clone)]
pub struct MemberDef {
    pub name: String,
    /// Declared type; may mention the declaring type's generic parameters.
    pub ty: TypeDescriptor,
    pub flags: MemberFlags,
    pub getter: NativeFn,
    /// Receives the value as its single argument.
    pub setter: Option<NativeFn>,
}

impl MemberDef {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub flags: MemberFlags,
    /// Names of the method's own generic parameters.
    pub generic_params: Vec<String>,
    /// Parameter types may mention `TypeParam` and `MethodParam`.
    pub params: Vec<ParamDef>,
    pub return_type: TypeDescriptor,
    pub invoke: NativeFn,
}

impl MethodDef {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorDef {
    pub params: Vec<ParamDef>,
    pub invoke: NativeFn,
}

/// A registered type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub id: TypeDefId,
    /// Simple name, e.g. `List`.
    pub name: String,
    /// Dotted namespace, empty for the global namespace.
    pub namespace: String,
    pub generic_params: Vec<String>,
    pub flags: TypeFlags,
    /// Underlying kind of an enum, or the kind of a numeric primitive.
    pub numeric: Option<NumericKind>,
    pub base: Option<TypeDescriptor>,
    /// Size reported by `sizeof`, for value types that have one.
    pub size: Option<u32>,
    /// Name of the indexer property, e.g. `Item`.
    pub default_member: Option<String>,
    /// Fields and properties in declaration order, keyed by interned name.
    pub members: IndexMap<InternedString, MemberDef>,
    /// Methods in declaration order.
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<ConstructorDef>,
    pub(crate) method_groups: FxHashMap<InternedString, Vec<usize>>,
}

impl TypeDef {
    pub(crate) fn new(id: TypeDefId, full_name: &str, generic_params: Vec<String>, flags: TypeFlags) -> Self {
        let (namespace, name) = match full_name.rsplit_once('.') {
            Some((namespace, name)) => (namespace.to_string(), name.to_string()),
            None => (String::new(), full_name.to_string()),
        };
        Self {
            id,
            name,
            namespace,
            generic_params,
            flags,
            numeric: None,
            base: None,
            size: None,
            default_member: None,
            members: IndexMap::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            method_groups: FxHashMap::default(),
        }
    }

    /// The dotted name used for resolution, e.g. `System.Collections.Generic.List`.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.generic_params.len()
    }

    #[inline]
    pub fn is_value_type(&self) -> bool {
        self.flags.contains(TypeFlags::VALUE_TYPE)
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.flags.contains(TypeFlags::ENUM)
    }

    /// The descriptor of this definition applied to its own parameters.
    pub fn self_type(&self) -> TypeDescriptor {
        let args = (0..self.generic_params.len())
            .map(|i| TypeDescriptor::TypeParam(i as u16))
            .collect();
        TypeDescriptor::generic(self.id, args)
    }

    pub fn member(&self, name: InternedString) -> Option<(usize, &MemberDef)> {
        self.members.get_full(&name).map(|(index, _, member)| (index, member))
    }

    /// Indices of the methods named `name`, in declaration order.
    pub fn method_group(&self, name: InternedString) -> &[usize] {
        self.method_groups.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }
}
