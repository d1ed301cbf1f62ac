//! The typed expression tree.
//!
//! A tree is produced only after every name has been resolved and every
//! operand has been converted, so each [`Expr`] carries its static result type
//! and can be handed to a backend without further checking.

use crate::types::TypeDescriptor;
use crate::value::Value;
use strexpr_core::text::TextSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation on `bool`, bitwise complement on integers.
    Not,
    Negate,
    UnaryPlus,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
            UnaryOp::UnaryPlus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LeftShift,
    RightShift,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    ExclusiveOr,
    /// `&&`
    AndAlso,
    /// `||`
    OrElse,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::ExclusiveOr => "^",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        Some(match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "%" => BinaryOp::Modulo,
            "<<" => BinaryOp::LeftShift,
            ">>" => BinaryOp::RightShift,
            "<" => BinaryOp::LessThan,
            "<=" => BinaryOp::LessThanOrEqual,
            ">" => BinaryOp::GreaterThan,
            ">=" => BinaryOp::GreaterThanOrEqual,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "&" => BinaryOp::And,
            "|" => BinaryOp::Or,
            "^" => BinaryOp::ExclusiveOr,
            "&&" => BinaryOp::AndAlso,
            "||" => BinaryOp::OrElse,
            _ => return None,
        })
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::LeftShift | BinaryOp::RightShift)
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan | BinaryOp::LessThanOrEqual | BinaryOp::GreaterThan | BinaryOp::GreaterThanOrEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::ExclusiveOr)
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }
}

/// A field or property of a registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    /// The declaring type, instantiated over the receiver's generic arguments.
    pub declaring: TypeDescriptor,
    /// Position in the declaring definition's member list.
    pub index: usize,
    pub name: String,
    pub is_static: bool,
}

/// A resolved method overload.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRef {
    pub declaring: TypeDescriptor,
    pub index: usize,
    pub name: String,
    /// Arguments of a generic method instantiation; empty otherwise.
    pub type_args: Vec<TypeDescriptor>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorRef {
    pub declaring: TypeDescriptor,
    pub index: usize,
}

/// `Name = value` inside a member initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    pub member: MemberRef,
    pub value: Expr,
}

/// One element of a collection initializer, fed to `add_method`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub add_method: MethodRef,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayInit {
    /// `new T[n]`
    Bounds(Box<Expr>),
    /// `new T[] { a, b }`
    Elements(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Constant(Value),
    Parameter {
        name: String,
        index: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// `left ?? right`: `left` unless it is null.
    Coalesce {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Field or property read; `target` is `None` for static members.
    MemberAccess {
        target: Option<Box<Expr>>,
        member: MemberRef,
    },
    /// Array element read.
    IndexAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        target: Option<Box<Expr>>,
        method: MethodRef,
        args: Vec<Expr>,
    },
    /// Object creation. `constructor` is `None` for the default value of a
    /// value type without a parameterless constructor.
    New {
        constructor: Option<ConstructorRef>,
        args: Vec<Expr>,
    },
    NewArray {
        element: TypeDescriptor,
        init: ArrayInit,
    },
    MemberInit {
        new: Box<Expr>,
        bindings: Vec<MemberBinding>,
    },
    ListInit {
        new: Box<Expr>,
        initializers: Vec<ElementInit>,
    },
    /// Conversion of `operand` to this node's type.
    Convert {
        operand: Box<Expr>,
    },
    TypeIs {
        operand: Box<Expr>,
        target: TypeDescriptor,
    },
    /// `operand as T`, where `T` is this node's type.
    TypeAs {
        operand: Box<Expr>,
    },
}

/// A node of the typed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    /// The static result type.
    pub ty: TypeDescriptor,
    pub span: TextSpan,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeDescriptor, span: TextSpan) -> Self {
        Self { kind, ty, span }
    }

    pub fn constant(value: Value, ty: TypeDescriptor, span: TextSpan) -> Self {
        Self::new(ExprKind::Constant(value), ty, span)
    }

    /// Wrap in a `Convert` node, unless the type already matches.
    pub fn convert(self, ty: TypeDescriptor) -> Expr {
        if self.ty == ty {
            return self;
        }
        let span = self.span;
        Expr::new(ExprKind::Convert { operand: Box::new(self) }, ty, span)
    }

    /// Whether this is the literal `null`.
    pub fn is_null_literal(&self) -> bool {
        matches!(&self.kind, ExprKind::Constant(Value::Null))
    }
}

/// A lambda parameter bound from the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub index: usize,
    pub ty: TypeDescriptor,
}

/// The output of parsing: ordered parameters, a typed body and the declared
/// return type the body was converted to.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<Parameter>,
    pub body: Expr,
    pub return_type: TypeDescriptor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_symbols_round_trip() {
        for symbol in ["+", "<<", ">=", "==", "&", "^", "&&", "||"] {
            let op = BinaryOp::from_symbol(symbol).map(BinaryOp::symbol);
            assert_eq!(op, Some(symbol));
        }
        assert_eq!(BinaryOp::from_symbol("??"), None);
        assert!(BinaryOp::Modulo.is_arithmetic());
        assert!(BinaryOp::ExclusiveOr.is_bitwise());
    }

    #[test]
    fn test_convert_skips_identity() {
        let one = Expr::constant(Value::Int(1), TypeDescriptor::int(), TextSpan::new(0, 1));
        let same = one.clone().convert(TypeDescriptor::int());
        assert_eq!(same, one);
        let widened = one.convert(TypeDescriptor::long());
        assert!(matches!(widened.kind, ExprKind::Convert { .. }));
        assert_eq!(widened.ty, TypeDescriptor::long());
    }
}
