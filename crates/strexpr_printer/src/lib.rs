//! strexpr_printer: typed expression tree to text.
//!
//! Renders a [`Lambda`] or [`Expr`] back into C#-like source. Every binary,
//! conditional and conversion node is wrapped in parentheses so the printed
//! text shows exactly how the parser grouped the input, e.g.
//! `6 << 2 + 5 >> 1` prints as `((6 << (2 + 5)) >> 1)`. Type names come from
//! the registry, so casts and constructors read `int`, `List<int>` and so on.

use strexpr_ast::node::*;
use strexpr_ast::types::TypeDescriptor;
use strexpr_ast::value::Value;
use strexpr_checker::{to_display_string, TypeRegistry};

/// Print a lambda as `(a, b) => body`.
pub fn print_lambda(lambda: &Lambda, registry: &dyn TypeRegistry) -> String {
    let mut printer = Printer::new(registry);
    printer.print_lambda(lambda);
    printer.finish()
}

/// Print a single expression.
pub fn print_expr(expr: &Expr, registry: &dyn TypeRegistry) -> String {
    let mut printer = Printer::new(registry);
    printer.print_expression(expr);
    printer.finish()
}

/// Accumulates the text of one tree.
pub struct Printer<'r> {
    output: String,
    registry: &'r dyn TypeRegistry,
}

impl<'r> Printer<'r> {
    pub fn new(registry: &'r dyn TypeRegistry) -> Self {
        Self {
            output: String::with_capacity(256),
            registry,
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    pub fn print_lambda(&mut self, lambda: &Lambda) {
        match lambda.parameters.as_slice() {
            [single] => self.write(&single.name),
            parameters => {
                self.write("(");
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&parameter.name);
                }
                self.write(")");
            }
        }
        self.write(" => ");
        self.print_expression(&lambda.body);
    }

    // ========================================================================
    // Expression printing
    // ========================================================================

    pub fn print_expression(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Constant(value) => self.print_constant(value, &expr.ty),
            ExprKind::Parameter { name, .. } => self.write(name),
            ExprKind::Unary { op, operand } => {
                let symbol = match op {
                    UnaryOp::Not if *operand.ty.strip_nullable() != TypeDescriptor::bool() => "~",
                    op => op.symbol(),
                };
                self.write(symbol);
                self.print_expression(operand);
            }
            ExprKind::Binary { op, left, right } => {
                self.write("(");
                self.print_expression(left);
                self.write(" ");
                self.write(op.symbol());
                self.write(" ");
                self.print_expression(right);
                self.write(")");
            }
            ExprKind::Conditional { test, if_true, if_false } => {
                self.write("(");
                self.print_expression(test);
                self.write(" ? ");
                self.print_expression(if_true);
                self.write(" : ");
                self.print_expression(if_false);
                self.write(")");
            }
            ExprKind::Coalesce { left, right } => {
                self.write("(");
                self.print_expression(left);
                self.write(" ?? ");
                self.print_expression(right);
                self.write(")");
            }
            ExprKind::MemberAccess { target, member } => {
                self.print_receiver(target.as_deref(), &member.declaring);
                self.write(".");
                self.write(&member.name);
            }
            ExprKind::IndexAccess { array, index } => {
                self.print_expression(array);
                self.write("[");
                self.print_expression(index);
                self.write("]");
            }
            ExprKind::Call { target, method, args } => self.print_call(target.as_deref(), method, args),
            ExprKind::New { args, .. } => {
                self.write("new ");
                self.print_type(&expr.ty);
                self.print_arguments("(", args, ")");
            }
            ExprKind::NewArray { element, init } => {
                self.write("new ");
                self.print_type(element);
                match init {
                    ArrayInit::Bounds(bound) => {
                        self.write("[");
                        self.print_expression(bound);
                        self.write("]");
                    }
                    ArrayInit::Elements(elements) => {
                        self.write("[] ");
                        self.print_arguments("{", elements, "}");
                    }
                }
            }
            ExprKind::MemberInit { new, bindings } => {
                self.print_expression(new);
                self.write(" {");
                for (i, binding) in bindings.iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                    }
                    self.write(" ");
                    self.write(&binding.member.name);
                    self.write(" = ");
                    self.print_expression(&binding.value);
                }
                self.write(" }");
            }
            ExprKind::ListInit { new, initializers } => {
                self.print_expression(new);
                self.write(" {");
                for (i, init) in initializers.iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                    }
                    self.write(" ");
                    match init.args.as_slice() {
                        [single] => self.print_expression(single),
                        args => self.print_arguments("{", args, "}"),
                    }
                }
                self.write(" }");
            }
            ExprKind::Convert { operand } => {
                self.write("((");
                self.print_type(&expr.ty);
                self.write(")");
                self.print_expression(operand);
                self.write(")");
            }
            ExprKind::TypeIs { operand, target } => {
                self.write("(");
                self.print_expression(operand);
                self.write(" is ");
                self.print_type(target);
                self.write(")");
            }
            ExprKind::TypeAs { operand } => {
                self.write("(");
                self.print_expression(operand);
                self.write(" as ");
                self.print_type(&expr.ty);
                self.write(")");
            }
        }
    }

    fn print_call(&mut self, target: Option<&Expr>, method: &MethodRef, args: &[Expr]) {
        // Indexer getters read back as element access.
        if let (Some(target), Some(_)) = (target, method.name.strip_prefix("get_")) {
            if !args.is_empty() {
                self.print_expression(target);
                self.print_arguments("[", args, "]");
                return;
            }
        }
        self.print_receiver(target, &method.declaring);
        self.write(".");
        self.write(&method.name);
        if !method.type_args.is_empty() {
            self.write("<");
            for (i, arg) in method.type_args.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                self.print_type(arg);
            }
            self.write(">");
        }
        self.print_arguments("(", args, ")");
    }

    /// The instance, or the declaring type for static members.
    fn print_receiver(&mut self, target: Option<&Expr>, declaring: &TypeDescriptor) {
        match target {
            Some(target) => self.print_expression(target),
            None => self.print_type(declaring),
        }
    }

    fn print_arguments(&mut self, open: &str, args: &[Expr], close: &str) {
        self.write(open);
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expression(arg);
        }
        self.write(close);
    }

    fn print_constant(&mut self, value: &Value, ty: &TypeDescriptor) {
        let text = match value {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => format!("'{}'", c),
            Value::String(s) => format!("\"{}\"", s),
            Value::UInt(v) => format!("{}U", v),
            Value::Long(v) => format!("{}L", v),
            Value::ULong(v) => format!("{}UL", v),
            Value::Float(v) => format!("{}F", v),
            Value::Double(v) => v.to_string(),
            Value::Decimal(v) => format!("{}M", v),
            Value::Type(t) => format!("typeof({})", self.registry.type_name(t)),
            Value::Enum { .. } => format!(
                "{}.{}",
                self.registry.type_name(ty),
                to_display_string(Some(self.registry), value)
            ),
            other => to_display_string(Some(self.registry), other),
        };
        self.write(&text);
    }

    fn print_type(&mut self, ty: &TypeDescriptor) {
        let name = self.registry.type_name(ty);
        self.write(&name);
    }

    #[inline]
    fn write(&mut self, text: &str) {
        self.output.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_checker::Registry;
    use strexpr_core::text::TextSpan;

    fn int(v: i32) -> Expr {
        Expr::constant(Value::Int(v), TypeDescriptor::int(), TextSpan::empty(0))
    }

    #[test]
    fn test_binary_nodes_are_parenthesised() {
        let registry = Registry::standard();
        let sum = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(int(2)),
                right: Box::new(int(5)),
            },
            TypeDescriptor::int(),
            TextSpan::empty(0),
        );
        let shift = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::LeftShift,
                left: Box::new(int(6)),
                right: Box::new(sum),
            },
            TypeDescriptor::int(),
            TextSpan::empty(0),
        );
        assert_eq!(print_expr(&shift, registry.as_ref()), "(6 << (2 + 5))");
    }

    #[test]
    fn test_constants() {
        let registry = Registry::standard();
        let print = |value: Value, ty: TypeDescriptor| {
            print_expr(&Expr::constant(value, ty, TextSpan::empty(0)), registry.as_ref())
        };
        assert_eq!(print(Value::Long(8), TypeDescriptor::long()), "8L");
        assert_eq!(print(Value::Float(1.5), TypeDescriptor::float()), "1.5F");
        assert_eq!(print(Value::string("hi"), TypeDescriptor::string()), "\"hi\"");
        assert_eq!(print(Value::Null, TypeDescriptor::object()), "null");
        assert_eq!(print(Value::Type(TypeDescriptor::int()), TypeDescriptor::type_object()), "typeof(int)");
    }

    #[test]
    fn test_conversion_and_complement() {
        let registry = Registry::standard();
        let converted = int(3).convert(TypeDescriptor::double());
        assert_eq!(print_expr(&converted, registry.as_ref()), "((double)3)");

        let complement = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(int(5)),
            },
            TypeDescriptor::int(),
            TextSpan::empty(0),
        );
        assert_eq!(print_expr(&complement, registry.as_ref()), "~5");
    }

    #[test]
    fn test_lambda_headers() {
        let registry = Registry::standard();
        let parameter = |name: &str, index: usize| Parameter {
            name: name.to_string(),
            index,
            ty: TypeDescriptor::int(),
        };
        let body = Expr::new(
            ExprKind::Parameter {
                name: "a".to_string(),
                index: 0,
            },
            TypeDescriptor::int(),
            TextSpan::empty(0),
        );
        let mut lambda = Lambda {
            parameters: vec![parameter("a", 0)],
            body,
            return_type: TypeDescriptor::int(),
        };
        assert_eq!(print_lambda(&lambda, registry.as_ref()), "a => a");
        lambda.parameters.push(parameter("b", 1));
        assert_eq!(print_lambda(&lambda, registry.as_ref()), "(a, b) => a");
        lambda.parameters.clear();
        assert_eq!(print_lambda(&lambda, registry.as_ref()), "() => a");
    }
}
