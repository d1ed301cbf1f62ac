//! strexpr_checker: Type registry, conversion rules and overload resolution.
//!
//! The registry answers every question the expression builder asks about
//! types: name lookup, members, methods, constructors and sizes. The rules in
//! [`conversions`], [`operators`] and [`overload`] decide how operands are
//! unified and which member a call binds to.

pub mod conversions;
pub mod operators;
pub mod overload;
mod registry;
mod stdlib;
mod types;

pub use registry::{
    ConstructorHandle, MemberHandle, MethodHandle, Registry, RegistryBuilder, TypeBuilder, TypeRegistry,
    SYSTEM_CONTAINER,
};
pub use stdlib::{list_value, to_display_string, HostDictionary, HostList, DICTIONARY_TYPE, LIST_TYPE};
pub use types::{
    ConstructorDef, Invocation, InvokeError, MemberDef, MemberFlags, MethodDef, NativeFn, ParamDef, TypeDef,
    TypeFlags,
};
