//! The type registry.
//!
//! A registry is an ordered list of containers, each mapping dotted type names
//! and generic arities to definitions. The built-in primitive definitions are
//! registered first, with the fixed ids of [`TypeDefId`], in the `System`
//! container. Names are interned once at build time; lookups afterwards only
//! read the interner.

use crate::types::*;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use strexpr_ast::node::{ConstructorRef, MemberRef, MethodRef};
use strexpr_ast::types::{alias_to_def, def_to_alias, NumericKind, TypeDefId, TypeDescriptor};
use strexpr_ast::value::Value;
use strexpr_core::intern::{InternedString, StringInterner};

/// Name of the container holding the built-in types and the standard library.
pub const SYSTEM_CONTAINER: &str = "System";

/// A field or property found on a type, viewed through the receiver's
/// generic arguments.
#[derive(Debug, Clone)]
pub struct MemberHandle<'r> {
    pub declaring: TypeDescriptor,
    pub index: usize,
    pub def: &'r MemberDef,
}

impl MemberHandle<'_> {
    /// The member type with the declaring type's parameters substituted.
    pub fn ty(&self) -> TypeDescriptor {
        self.def.ty.substitute(self.declaring.args(), &[])
    }

    pub fn to_ref(&self) -> MemberRef {
        MemberRef {
            declaring: self.declaring.clone(),
            index: self.index,
            name: self.def.name.clone(),
            is_static: self.def.is_static(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodHandle<'r> {
    pub declaring: TypeDescriptor,
    pub index: usize,
    pub def: &'r MethodDef,
}

impl MethodHandle<'_> {
    /// Parameter types with the declaring type's parameters substituted and
    /// the method's own parameters bound to `method_args` where given.
    pub fn param_types(&self, method_args: &[TypeDescriptor]) -> Vec<TypeDescriptor> {
        self.def
            .params
            .iter()
            .map(|p| p.ty.substitute(self.declaring.args(), method_args))
            .collect()
    }

    pub fn return_type(&self, method_args: &[TypeDescriptor]) -> TypeDescriptor {
        self.def.return_type.substitute(self.declaring.args(), method_args)
    }

    pub fn to_ref(&self, type_args: Vec<TypeDescriptor>) -> MethodRef {
        MethodRef {
            declaring: self.declaring.clone(),
            index: self.index,
            name: self.def.name.clone(),
            type_args,
            is_static: self.def.is_static(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorHandle<'r> {
    pub declaring: TypeDescriptor,
    pub index: usize,
    pub def: &'r ConstructorDef,
}

impl ConstructorHandle<'_> {
    pub fn param_types(&self) -> Vec<TypeDescriptor> {
        self.def
            .params
            .iter()
            .map(|p| p.ty.substitute(self.declaring.args(), &[]))
            .collect()
    }

    pub fn to_ref(&self) -> ConstructorRef {
        ConstructorRef {
            declaring: self.declaring.clone(),
            index: self.index,
        }
    }
}

/// Everything the expression builder and the backend need to know about
/// types. Only the three lookups are required; the rest derive from them.
pub trait TypeRegistry: Send + Sync {
    /// Find the definition registered under a dotted name with the given
    /// number of generic parameters. Keyword aliases resolve for bare names.
    fn resolve_type_by_name(&self, name: &str, arity: usize) -> Option<TypeDefId>;

    fn definition(&self, id: TypeDefId) -> Option<&TypeDef>;

    /// The interned key of a member name, if any type declares it.
    fn name_key(&self, name: &str) -> Option<InternedString>;

    /// C#-style display name: `int`, `int?`, `string[]`, `List<int>`.
    fn type_name(&self, ty: &TypeDescriptor) -> String {
        match ty {
            TypeDescriptor::TypeParam(i) => format!("T{}", i),
            TypeDescriptor::MethodParam(i) => format!("TM{}", i),
            TypeDescriptor::Named { def, args } => {
                if let Some(inner) = ty.nullable_inner() {
                    return format!("{}?", self.type_name(inner));
                }
                if let Some(element) = ty.element_type() {
                    return format!("{}[]", self.type_name(element));
                }
                if let Some(alias) = def_to_alias(*def) {
                    return alias.to_string();
                }
                let mut name = self
                    .definition(*def)
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| format!("{:?}", def));
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| self.type_name(a)).collect();
                    name.push('<');
                    name.push_str(&args.join(", "));
                    name.push('>');
                }
                name
            }
        }
    }

    /// Namespace-qualified name, e.g. `System.Int32`.
    fn full_type_name(&self, ty: &TypeDescriptor) -> String {
        match ty.def_id().and_then(|id| self.definition(id)) {
            Some(def) if !ty.is_array() => {
                let mut name = def.full_name();
                if !ty.args().is_empty() {
                    let args: Vec<String> = ty.args().iter().map(|a| self.full_type_name(a)).collect();
                    name.push_str(&format!("`{}[{}]", args.len(), args.join(",")));
                }
                name
            }
            _ => self.type_name(ty),
        }
    }

    fn is_value_type(&self, ty: &TypeDescriptor) -> bool {
        ty.def_id()
            .and_then(|id| self.definition(id))
            .map_or(false, TypeDef::is_value_type)
    }

    /// Whether `null` is a valid value of the type.
    fn is_nullable_or_reference(&self, ty: &TypeDescriptor) -> bool {
        ty.is_nullable() || !self.is_value_type(ty)
    }

    fn is_enum(&self, ty: &TypeDescriptor) -> bool {
        ty.def_id()
            .and_then(|id| self.definition(id))
            .map_or(false, TypeDef::is_enum)
    }

    /// Underlying kind of an enum type.
    fn enum_kind(&self, ty: &TypeDescriptor) -> Option<NumericKind> {
        let def = self.definition(ty.def_id()?)?;
        if def.is_enum() {
            def.numeric
        } else {
            None
        }
    }

    /// The declared base type, instantiated over `ty`'s arguments.
    fn base_type(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor> {
        let def = self.definition(ty.def_id()?)?;
        def.base.as_ref().map(|base| base.substitute(ty.args(), &[]))
    }

    /// `ty`, its declared bases, then `object`.
    fn ancestors(&self, ty: &TypeDescriptor) -> Vec<TypeDescriptor> {
        let mut chain = vec![ty.clone()];
        let mut current = ty.clone();
        while let Some(base) = self.base_type(&current) {
            if chain.contains(&base) {
                break;
            }
            chain.push(base.clone());
            current = base;
        }
        let object = TypeDescriptor::object();
        if !chain.contains(&object) {
            chain.push(object);
        }
        chain
    }

    /// Whether a value whose runtime type is `from` is an instance of `to`.
    fn is_assignable(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        if from == to || to.is(TypeDefId::OBJECT) {
            return true;
        }
        if to.nullable_inner() == Some(from) {
            return true;
        }
        self.ancestors(from).contains(to)
    }

    /// Fields and properties named `name`, most derived first.
    fn list_members(&self, ty: &TypeDescriptor, name: &str) -> Vec<MemberHandle<'_>> {
        let Some(key) = self.name_key(name) else {
            return Vec::new();
        };
        self.ancestors(ty)
            .into_iter()
            .filter_map(|declaring| {
                let def = self.definition(declaring.def_id()?)?;
                let (index, member) = def.member(key)?;
                Some(MemberHandle { declaring, index, def: member })
            })
            .collect()
    }

    /// Methods named `name`, most derived first, each type's in declaration order.
    fn list_methods(&self, ty: &TypeDescriptor, name: &str) -> Vec<MethodHandle<'_>> {
        let Some(key) = self.name_key(name) else {
            return Vec::new();
        };
        let mut methods = Vec::new();
        for declaring in self.ancestors(ty) {
            let Some(def) = declaring.def_id().and_then(|id| self.definition(id)) else {
                continue;
            };
            for &index in def.method_group(key) {
                methods.push(MethodHandle {
                    declaring: declaring.clone(),
                    index,
                    def: &def.methods[index],
                });
            }
        }
        methods
    }

    fn list_constructors(&self, ty: &TypeDescriptor) -> Vec<ConstructorHandle<'_>> {
        let Some(def) = ty.def_id().and_then(|id| self.definition(id)) else {
            return Vec::new();
        };
        def.constructors
            .iter()
            .enumerate()
            .map(|(index, ctor)| ConstructorHandle {
                declaring: ty.clone(),
                index,
                def: ctor,
            })
            .collect()
    }

    fn member_def(&self, member: &MemberRef) -> Option<&MemberDef> {
        let def = self.definition(member.declaring.def_id()?)?;
        def.members.get_index(member.index).map(|(_, m)| m)
    }

    fn method_def(&self, method: &MethodRef) -> Option<&MethodDef> {
        self.definition(method.declaring.def_id()?)?.methods.get(method.index)
    }

    fn constructor_def(&self, ctor: &ConstructorRef) -> Option<&ConstructorDef> {
        self.definition(ctor.declaring.def_id()?)?.constructors.get(ctor.index)
    }

    /// Call a resolved method. Natives see no registry through this path;
    /// [`Registry`] overrides it to pass itself.
    fn invoke(&self, method: &MethodRef, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvokeError> {
        invoke_method(self.method_def(method), None, method, receiver, args)
    }

    /// Size in bytes reported by `sizeof`; enums report their underlying size.
    fn size_of(&self, ty: &TypeDescriptor) -> Option<u32> {
        if let Some(kind) = ty.numeric_kind() {
            return Some(kind.size());
        }
        if let Some(kind) = self.enum_kind(ty) {
            return Some(kind.size());
        }
        self.definition(ty.def_id()?)?.size
    }

    /// `default(T)`.
    fn default_value(&self, ty: &TypeDescriptor) -> Value {
        match ty.def_id() {
            Some(def) if self.is_enum(ty) => Value::Enum { ty: def, value: 0 },
            _ => Value::default_of(ty),
        }
    }
}

struct TypeContainer {
    name: String,
    types: FxHashMap<(InternedString, usize), TypeDefId>,
}

/// A table-backed registry.
pub struct Registry {
    interner: StringInterner,
    types: Vec<TypeDef>,
    containers: Vec<TypeContainer>,
}

static STANDARD: Lazy<Arc<Registry>> = Lazy::new(|| {
    let mut builder = RegistryBuilder::new();
    builder.with_standard_library();
    let registry = builder.build();
    tracing::debug!("Standard registry initialised with {} types", registry.type_count());
    Arc::new(registry)
});

impl Registry {
    /// The process-wide registry holding the built-in types and the standard
    /// library. Built on first use.
    pub fn standard() -> Arc<Registry> {
        Arc::clone(&STANDARD)
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn container_names(&self) -> Vec<&str> {
        self.containers.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter()
    }
}

impl TypeRegistry for Registry {
    fn resolve_type_by_name(&self, name: &str, arity: usize) -> Option<TypeDefId> {
        if arity == 0 {
            if let Some(id) = alias_to_def(name) {
                return Some(id);
            }
        }
        let key = self.interner.get(name)?;
        self.containers
            .iter()
            .find_map(|container| container.types.get(&(key, arity)).copied())
    }

    #[inline]
    fn definition(&self, id: TypeDefId) -> Option<&TypeDef> {
        self.types.get(id.index())
    }

    #[inline]
    fn name_key(&self, name: &str) -> Option<InternedString> {
        self.interner.get(name)
    }

    fn invoke(&self, method: &MethodRef, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvokeError> {
        invoke_method(self.method_def(method), Some(self), method, receiver, args)
    }
}

fn invoke_method(
    def: Option<&MethodDef>,
    registry: Option<&dyn TypeRegistry>,
    method: &MethodRef,
    receiver: Option<&Value>,
    args: &[Value],
) -> Result<Value, InvokeError> {
    let def = def.ok_or_else(|| InvokeError::Failed(format!("method '{}' is not registered", method.name)))?;
    let invocation = Invocation {
        receiver,
        args,
        type_args: method.declaring.args(),
        method_type_args: &method.type_args,
        registry,
    };
    def.invoke.call(&invocation)
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types.len())
            .field("containers", &self.container_names())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`Registry`]. New definitions go into the current container,
/// which is `System` until [`container`](Self::container) is called.
pub struct RegistryBuilder {
    interner: StringInterner,
    types: Vec<TypeDef>,
    containers: Vec<TypeContainer>,
    current: usize,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// A builder holding only the built-in definitions.
    pub fn new() -> Self {
        let mut builder = Self {
            interner: StringInterner::new(),
            types: Vec::new(),
            containers: vec![TypeContainer {
                name: SYSTEM_CONTAINER.to_string(),
                types: FxHashMap::default(),
            }],
            current: 0,
        };
        builder.register_builtins();
        builder
    }

    /// Add members to the built-in types and register `Math`, `List<T>`,
    /// `Dictionary<TKey, TValue>` and friends in the `System` container.
    pub fn with_standard_library(&mut self) -> &mut Self {
        let saved = self.current;
        self.current = 0;
        crate::stdlib::register(self);
        self.current = saved;
        self
    }

    /// Start a new container; later definitions are registered in it.
    /// Containers are searched in the order they were added.
    pub fn container(&mut self, name: &str) -> &mut Self {
        match self.containers.iter().position(|c| c.name == name) {
            Some(index) => self.current = index,
            None => {
                self.containers.push(TypeContainer {
                    name: name.to_string(),
                    types: FxHashMap::default(),
                });
                self.current = self.containers.len() - 1;
            }
        }
        self
    }

    pub fn class(&mut self, name: &str, build: impl FnOnce(&mut TypeBuilder<'_>)) -> TypeDefId {
        self.define(name, &[], TypeFlags::NONE, build)
    }

    pub fn generic_class(
        &mut self,
        name: &str,
        generic_params: &[&str],
        build: impl FnOnce(&mut TypeBuilder<'_>),
    ) -> TypeDefId {
        self.define(name, generic_params, TypeFlags::NONE, build)
    }

    pub fn structure(&mut self, name: &str, build: impl FnOnce(&mut TypeBuilder<'_>)) -> TypeDefId {
        self.define(name, &[], TypeFlags::VALUE_TYPE, build)
    }

    pub fn static_class(&mut self, name: &str, build: impl FnOnce(&mut TypeBuilder<'_>)) -> TypeDefId {
        self.define(name, &[], TypeFlags::STATIC, build)
    }

    /// An enum whose variants are static constants of the enum type.
    pub fn enumeration(&mut self, name: &str, underlying: NumericKind, variants: &[(&str, i64)]) -> TypeDefId {
        self.define(name, &[], TypeFlags::VALUE_TYPE | TypeFlags::ENUM, |t| {
            t.def.numeric = Some(underlying);
            t.def.size = Some(underlying.size());
            let id = t.id();
            for &(variant, value) in variants {
                t.constant(variant, TypeDescriptor::of(id), Value::Enum { ty: id, value });
            }
        })
    }

    /// Add members to an already registered definition.
    pub fn extend(&mut self, id: TypeDefId, build: impl FnOnce(&mut TypeBuilder<'_>)) -> &mut Self {
        if let Some(def) = self.types.get_mut(id.index()) {
            build(&mut TypeBuilder {
                def,
                interner: &self.interner,
            });
        }
        self
    }

    pub fn build(self) -> Registry {
        tracing::debug!(
            "Built registry with {} types in {} containers",
            self.types.len(),
            self.containers.len()
        );
        Registry {
            interner: self.interner,
            types: self.types,
            containers: self.containers,
        }
    }

    fn define(
        &mut self,
        name: &str,
        generic_params: &[&str],
        flags: TypeFlags,
        build: impl FnOnce(&mut TypeBuilder<'_>),
    ) -> TypeDefId {
        let id = self.register(name, generic_params, flags, true);
        self.extend(id, build);
        id
    }

    fn register(&mut self, name: &str, generic_params: &[&str], flags: TypeFlags, named: bool) -> TypeDefId {
        let id = TypeDefId(self.types.len() as u32);
        let params = generic_params.iter().map(|p| p.to_string()).collect();
        self.types.push(TypeDef::new(id, name, params, flags));
        if named {
            let key = self.interner.intern(name);
            self.containers[self.current]
                .types
                .insert((key, generic_params.len()), id);
        }
        id
    }

    fn register_builtins(&mut self) {
        let primitive = TypeFlags::VALUE_TYPE | TypeFlags::PRIMITIVE;

        self.register("System.Void", &[], TypeFlags::NONE, true);
        self.register("System.Object", &[], TypeFlags::NONE, true);
        let bool_id = self.register("System.Boolean", &[], primitive, true);
        self.types[bool_id.index()].size = Some(1);
        for kind in NumericKind::ALL {
            let id = self.register(clr_name(kind), &[], primitive, true);
            debug_assert_eq!(id, kind.def_id());
            let def = &mut self.types[id.index()];
            def.numeric = Some(kind);
            def.size = Some(kind.size());
        }
        let string_id = self.register("System.String", &[], TypeFlags::PRIMITIVE, true);
        self.types[string_id.index()].default_member = Some("Chars".to_string());
        self.register("System.Type", &[], TypeFlags::NONE, true);
        self.register("System.Nullable", &["T"], TypeFlags::VALUE_TYPE, true);
        // Array types are only created by `new T[...]`, never named.
        self.register("System.Array", &["T"], TypeFlags::NONE, false);

        debug_assert_eq!(self.types.len() as u32, TypeDefId::BUILTIN_COUNT);
    }
}

/// Runtime name of a numeric primitive.
fn clr_name(kind: NumericKind) -> &'static str {
    match kind {
        NumericKind::Char => "System.Char",
        NumericKind::SByte => "System.SByte",
        NumericKind::Byte => "System.Byte",
        NumericKind::Short => "System.Int16",
        NumericKind::UShort => "System.UInt16",
        NumericKind::Int => "System.Int32",
        NumericKind::UInt => "System.UInt32",
        NumericKind::Long => "System.Int64",
        NumericKind::ULong => "System.UInt64",
        NumericKind::Float => "System.Single",
        NumericKind::Double => "System.Double",
        NumericKind::Decimal => "System.Decimal",
    }
}

// ============================================================================
// Type builder
// ============================================================================

/// Adds members to one definition. Every method returns `&mut Self` so
/// registrations chain.
pub struct TypeBuilder<'b> {
    def: &'b mut TypeDef,
    interner: &'b StringInterner,
}

impl<'b> TypeBuilder<'b> {
    pub fn id(&self) -> TypeDefId {
        self.def.id
    }

    /// This type applied to its own generic parameters.
    pub fn self_type(&self) -> TypeDescriptor {
        self.def.self_type()
    }

    pub fn base(&mut self, base: TypeDescriptor) -> &mut Self {
        self.def.base = Some(base);
        self
    }

    /// Name of the indexer property; `x[i]` calls `get_<name>`.
    pub fn default_member(&mut self, name: &str) -> &mut Self {
        self.def.default_member = Some(name.to_string());
        self
    }

    pub fn size(&mut self, size: u32) -> &mut Self {
        self.def.size = Some(size);
        self
    }

    pub fn constructor<F>(&mut self, params: Vec<TypeDescriptor>, f: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.def.constructors.push(ConstructorDef {
            params: params_of(params),
            invoke: NativeFn::new(f),
        });
        self
    }

    /// Read-only instance field.
    pub fn field<F>(&mut self, name: &str, ty: TypeDescriptor, getter: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_member(name, ty, MemberFlags::NONE, NativeFn::new(getter), None)
    }

    /// Instance field that can be assigned in a member initializer. The
    /// setter receives the new value as its only argument.
    pub fn settable_field<G, S>(&mut self, name: &str, ty: TypeDescriptor, getter: G, setter: S) -> &mut Self
    where
        G: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
        S: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_member(
            name,
            ty,
            MemberFlags::NONE,
            NativeFn::new(getter),
            Some(NativeFn::new(setter)),
        )
    }

    pub fn property<F>(&mut self, name: &str, ty: TypeDescriptor, getter: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_member(name, ty, MemberFlags::PROPERTY, NativeFn::new(getter), None)
    }

    pub fn settable_property<G, S>(&mut self, name: &str, ty: TypeDescriptor, getter: G, setter: S) -> &mut Self
    where
        G: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
        S: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_member(
            name,
            ty,
            MemberFlags::PROPERTY,
            NativeFn::new(getter),
            Some(NativeFn::new(setter)),
        )
    }

    pub fn static_property<F>(&mut self, name: &str, ty: TypeDescriptor, getter: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_member(
            name,
            ty,
            MemberFlags::STATIC | MemberFlags::PROPERTY,
            NativeFn::new(getter),
            None,
        )
    }

    /// Static field holding a fixed value.
    pub fn constant(&mut self, name: &str, ty: TypeDescriptor, value: Value) -> &mut Self {
        let getter = NativeFn::new(move |_| Ok(value.clone()));
        self.push_member(name, ty, MemberFlags::STATIC, getter, None)
    }

    pub fn method<F>(&mut self, name: &str, params: Vec<TypeDescriptor>, ret: TypeDescriptor, f: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_method(name, MemberFlags::NONE, &[], params, ret, NativeFn::new(f))
    }

    pub fn static_method<F>(&mut self, name: &str, params: Vec<TypeDescriptor>, ret: TypeDescriptor, f: F) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_method(name, MemberFlags::STATIC, &[], params, ret, NativeFn::new(f))
    }

    /// Instance method with its own type parameters, referenced in `params`
    /// and `ret` as [`TypeDescriptor::MethodParam`].
    pub fn generic_method<F>(
        &mut self,
        name: &str,
        generic_params: &[&str],
        params: Vec<TypeDescriptor>,
        ret: TypeDescriptor,
        f: F,
    ) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_method(name, MemberFlags::NONE, generic_params, params, ret, NativeFn::new(f))
    }

    pub fn static_generic_method<F>(
        &mut self,
        name: &str,
        generic_params: &[&str],
        params: Vec<TypeDescriptor>,
        ret: TypeDescriptor,
        f: F,
    ) -> &mut Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.push_method(name, MemberFlags::STATIC, generic_params, params, ret, NativeFn::new(f))
    }

    fn push_member(
        &mut self,
        name: &str,
        ty: TypeDescriptor,
        flags: MemberFlags,
        getter: NativeFn,
        setter: Option<NativeFn>,
    ) -> &mut Self {
        let key = self.interner.intern(name);
        self.def.members.insert(
            key,
            MemberDef {
                name: name.to_string(),
                ty,
                flags,
                getter,
                setter,
            },
        );
        self
    }

    fn push_method(
        &mut self,
        name: &str,
        flags: MemberFlags,
        generic_params: &[&str],
        params: Vec<TypeDescriptor>,
        ret: TypeDescriptor,
        invoke: NativeFn,
    ) -> &mut Self {
        let key = self.interner.intern(name);
        let index = self.def.methods.len();
        self.def.methods.push(MethodDef {
            name: name.to_string(),
            flags,
            generic_params: generic_params.iter().map(|p| p.to_string()).collect(),
            params: params_of(params),
            return_type: ret,
            invoke,
        });
        self.def.method_groups.entry(key).or_default().push(index);
        self
    }
}

fn params_of(types: Vec<TypeDescriptor>) -> Vec<ParamDef> {
    types
        .into_iter()
        .enumerate()
        .map(|(i, ty)| ParamDef {
            name: format!("arg{}", i),
            ty,
        })
        .collect()
}
