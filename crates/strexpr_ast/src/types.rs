//! Type identities.
//!
//! Types are stored in a registry and referenced by [`TypeDefId`]. A
//! [`TypeDescriptor`] is a definition applied to its generic arguments, so two
//! descriptors are the same type exactly when they compare equal.

use std::fmt;

/// Index of a type definition inside a registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDefId(pub u32);

impl TypeDefId {
    // Built-in definitions. Every registry registers these first, in this order.
    pub const VOID: TypeDefId = TypeDefId(0);
    pub const OBJECT: TypeDefId = TypeDefId(1);
    pub const BOOL: TypeDefId = TypeDefId(2);
    pub const CHAR: TypeDefId = TypeDefId(3);
    pub const SBYTE: TypeDefId = TypeDefId(4);
    pub const BYTE: TypeDefId = TypeDefId(5);
    pub const SHORT: TypeDefId = TypeDefId(6);
    pub const USHORT: TypeDefId = TypeDefId(7);
    pub const INT: TypeDefId = TypeDefId(8);
    pub const UINT: TypeDefId = TypeDefId(9);
    pub const LONG: TypeDefId = TypeDefId(10);
    pub const ULONG: TypeDefId = TypeDefId(11);
    pub const FLOAT: TypeDefId = TypeDefId(12);
    pub const DOUBLE: TypeDefId = TypeDefId(13);
    pub const DECIMAL: TypeDefId = TypeDefId(14);
    pub const STRING: TypeDefId = TypeDefId(15);
    pub const TYPE: TypeDefId = TypeDefId(16);
    pub const NULLABLE: TypeDefId = TypeDefId(17);
    pub const ARRAY: TypeDefId = TypeDefId(18);

    /// Number of built-in definitions.
    pub const BUILTIN_COUNT: u32 = 19;

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }
}

impl fmt::Debug for TypeDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Keyword aliases accepted wherever a type name is expected.
pub const TYPE_ALIASES: &[(&str, TypeDefId)] = &[
    ("bool", TypeDefId::BOOL),
    ("byte", TypeDefId::BYTE),
    ("sbyte", TypeDefId::SBYTE),
    ("char", TypeDefId::CHAR),
    ("short", TypeDefId::SHORT),
    ("ushort", TypeDefId::USHORT),
    ("int", TypeDefId::INT),
    ("uint", TypeDefId::UINT),
    ("long", TypeDefId::LONG),
    ("ulong", TypeDefId::ULONG),
    ("float", TypeDefId::FLOAT),
    ("double", TypeDefId::DOUBLE),
    ("decimal", TypeDefId::DECIMAL),
    ("string", TypeDefId::STRING),
    ("object", TypeDefId::OBJECT),
];

pub fn alias_to_def(name: &str) -> Option<TypeDefId> {
    TYPE_ALIASES.iter().find(|(alias, _)| *alias == name).map(|(_, id)| *id)
}

pub fn def_to_alias(id: TypeDefId) -> Option<&'static str> {
    TYPE_ALIASES.iter().find(|(_, def)| *def == id).map(|(alias, _)| *alias)
}

/// The primitive numeric kinds, including `char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Char,
    SByte,
    Byte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Decimal,
}

impl NumericKind {
    pub const ALL: [NumericKind; 12] = [
        NumericKind::Char,
        NumericKind::SByte,
        NumericKind::Byte,
        NumericKind::Short,
        NumericKind::UShort,
        NumericKind::Int,
        NumericKind::UInt,
        NumericKind::Long,
        NumericKind::ULong,
        NumericKind::Float,
        NumericKind::Double,
        NumericKind::Decimal,
    ];

    pub fn def_id(self) -> TypeDefId {
        match self {
            NumericKind::Char => TypeDefId::CHAR,
            NumericKind::SByte => TypeDefId::SBYTE,
            NumericKind::Byte => TypeDefId::BYTE,
            NumericKind::Short => TypeDefId::SHORT,
            NumericKind::UShort => TypeDefId::USHORT,
            NumericKind::Int => TypeDefId::INT,
            NumericKind::UInt => TypeDefId::UINT,
            NumericKind::Long => TypeDefId::LONG,
            NumericKind::ULong => TypeDefId::ULONG,
            NumericKind::Float => TypeDefId::FLOAT,
            NumericKind::Double => TypeDefId::DOUBLE,
            NumericKind::Decimal => TypeDefId::DECIMAL,
        }
    }

    pub fn from_def(id: TypeDefId) -> Option<NumericKind> {
        NumericKind::ALL.iter().copied().find(|kind| kind.def_id() == id)
    }

    /// Integer kinds, `char` included.
    pub fn is_integral(self) -> bool {
        !matches!(self, NumericKind::Float | NumericKind::Double | NumericKind::Decimal)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, NumericKind::Float | NumericKind::Double)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            NumericKind::SByte
                | NumericKind::Short
                | NumericKind::Int
                | NumericKind::Long
                | NumericKind::Float
                | NumericKind::Double
                | NumericKind::Decimal
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            NumericKind::Char => "char",
            NumericKind::SByte => "sbyte",
            NumericKind::Byte => "byte",
            NumericKind::Short => "short",
            NumericKind::UShort => "ushort",
            NumericKind::Int => "int",
            NumericKind::UInt => "uint",
            NumericKind::Long => "long",
            NumericKind::ULong => "ulong",
            NumericKind::Float => "float",
            NumericKind::Double => "double",
            NumericKind::Decimal => "decimal",
        }
    }

    /// Size in bytes as reported by `sizeof`.
    pub fn size(self) -> u32 {
        match self {
            NumericKind::SByte | NumericKind::Byte => 1,
            NumericKind::Char | NumericKind::Short | NumericKind::UShort => 2,
            NumericKind::Int | NumericKind::UInt | NumericKind::Float => 4,
            NumericKind::Long | NumericKind::ULong | NumericKind::Double => 8,
            NumericKind::Decimal => 16,
        }
    }
}

/// A concrete or open type: a definition applied to generic arguments, or a
/// generic parameter of the declaring type or of a generic method.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Named { def: TypeDefId, args: Vec<TypeDescriptor> },
    /// The n-th generic parameter of the declaring type.
    TypeParam(u16),
    /// The n-th generic parameter of a generic method.
    MethodParam(u16),
}

impl TypeDescriptor {
    #[inline]
    pub fn of(def: TypeDefId) -> Self {
        TypeDescriptor::Named { def, args: Vec::new() }
    }

    pub fn generic(def: TypeDefId, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Named { def, args }
    }

    pub fn void() -> Self {
        Self::of(TypeDefId::VOID)
    }

    pub fn object() -> Self {
        Self::of(TypeDefId::OBJECT)
    }

    pub fn bool() -> Self {
        Self::of(TypeDefId::BOOL)
    }

    pub fn char() -> Self {
        Self::of(TypeDefId::CHAR)
    }

    pub fn int() -> Self {
        Self::of(TypeDefId::INT)
    }

    pub fn long() -> Self {
        Self::of(TypeDefId::LONG)
    }

    pub fn float() -> Self {
        Self::of(TypeDefId::FLOAT)
    }

    pub fn double() -> Self {
        Self::of(TypeDefId::DOUBLE)
    }

    pub fn decimal() -> Self {
        Self::of(TypeDefId::DECIMAL)
    }

    pub fn string() -> Self {
        Self::of(TypeDefId::STRING)
    }

    /// The descriptor of `System.Type` itself.
    pub fn type_object() -> Self {
        Self::of(TypeDefId::TYPE)
    }

    pub fn numeric(kind: NumericKind) -> Self {
        Self::of(kind.def_id())
    }

    /// `T?`. Wrapping an already nullable type returns it unchanged.
    pub fn nullable(inner: TypeDescriptor) -> Self {
        if inner.is_nullable() {
            return inner;
        }
        TypeDescriptor::Named { def: TypeDefId::NULLABLE, args: vec![inner] }
    }

    /// `T[]`.
    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Named { def: TypeDefId::ARRAY, args: vec![element] }
    }

    pub fn def_id(&self) -> Option<TypeDefId> {
        match self {
            TypeDescriptor::Named { def, .. } => Some(*def),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        match self {
            TypeDescriptor::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether this is the definition `def`, with any arguments.
    #[inline]
    pub fn is(&self, def: TypeDefId) -> bool {
        self.def_id() == Some(def)
    }

    pub fn is_nullable(&self) -> bool {
        self.is(TypeDefId::NULLABLE)
    }

    pub fn nullable_inner(&self) -> Option<&TypeDescriptor> {
        if self.is_nullable() {
            self.args().first()
        } else {
            None
        }
    }

    /// The underlying type of `T?`, or the type itself.
    pub fn strip_nullable(&self) -> &TypeDescriptor {
        self.nullable_inner().unwrap_or(self)
    }

    pub fn is_array(&self) -> bool {
        self.is(TypeDefId::ARRAY)
    }

    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        if self.is_array() {
            self.args().first()
        } else {
            None
        }
    }

    /// The numeric kind of a non-nullable primitive numeric type.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        match self {
            TypeDescriptor::Named { def, args } if args.is_empty() => NumericKind::from_def(*def),
            _ => None,
        }
    }

    /// Whether any generic parameter occurs in this type.
    pub fn is_open(&self) -> bool {
        match self {
            TypeDescriptor::Named { args, .. } => args.iter().any(TypeDescriptor::is_open),
            _ => true,
        }
    }

    /// Replace generic parameters with the given arguments. Parameters without
    /// a corresponding argument are left open.
    pub fn substitute(&self, type_args: &[TypeDescriptor], method_args: &[TypeDescriptor]) -> TypeDescriptor {
        match self {
            TypeDescriptor::Named { def, args } => TypeDescriptor::Named {
                def: *def,
                args: args.iter().map(|a| a.substitute(type_args, method_args)).collect(),
            },
            TypeDescriptor::TypeParam(i) => {
                type_args.get(*i as usize).cloned().unwrap_or_else(|| self.clone())
            }
            TypeDescriptor::MethodParam(i) => {
                method_args.get(*i as usize).cloned().unwrap_or_else(|| self.clone())
            }
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Named { def, args } => {
                write!(f, "{:?}", def)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{:?}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeDescriptor::TypeParam(i) => write!(f, "!{}", i),
            TypeDescriptor::MethodParam(i) => write!(f, "!!{}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_wrapping() {
        let int_n = TypeDescriptor::nullable(TypeDescriptor::int());
        assert!(int_n.is_nullable());
        assert_eq!(int_n.strip_nullable(), &TypeDescriptor::int());
        assert_eq!(TypeDescriptor::nullable(int_n.clone()), int_n);
        assert_eq!(int_n.numeric_kind(), None);
        assert_eq!(TypeDescriptor::int().strip_nullable(), &TypeDescriptor::int());
    }

    #[test]
    fn test_substitute() {
        let list_def = TypeDefId(40);
        let open = TypeDescriptor::generic(list_def, vec![TypeDescriptor::MethodParam(0)]);
        assert!(open.is_open());
        let closed = open.substitute(&[], &[TypeDescriptor::string()]);
        assert_eq!(closed, TypeDescriptor::generic(list_def, vec![TypeDescriptor::string()]));
        assert!(!closed.is_open());
        assert_eq!(TypeDescriptor::TypeParam(1).substitute(&[TypeDescriptor::int()], &[]), TypeDescriptor::TypeParam(1));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(alias_to_def("decimal"), Some(TypeDefId::DECIMAL));
        assert_eq!(def_to_alias(TypeDefId::OBJECT), Some("object"));
        assert_eq!(alias_to_def("Int32"), None);
        assert_eq!(NumericKind::from_def(TypeDefId::ULONG), Some(NumericKind::ULong));
        assert_eq!(NumericKind::Double.size(), 8);
    }
}
