//! End-to-end tests: source text in, values out.

use std::sync::Arc;

use rust_decimal::Decimal;
use strexpr_ast::types::{TypeDefId, TypeDescriptor};
use strexpr_ast::value::{ObjectRef, Value};
use strexpr_checker::{list_value, Invocation, InvokeError, RegistryBuilder, TypeRegistry};
use strexpr_compiler::{EvalError, ExpressionCompiler, Signature};
use strexpr_diagnostics::ErrorKind;
use strexpr_options::ParseOptions;
use strexpr_printer::print_expr;

struct TestObj {
    count: i32,
}

fn test_obj<'a>(inv: &Invocation<'a>) -> Result<&'a TestObj, InvokeError> {
    inv.this()?
        .as_object()
        .and_then(|o| o.downcast::<TestObj>())
        .ok_or_else(|| InvokeError::InvalidArgument("receiver is not a TestObj".to_string()))
}

/// A compiler over the standard library plus `Demo.TestObj`, which has a
/// `Count` property and both a plain and a generic `Func` overload.
fn demo_compiler() -> (ExpressionCompiler, TypeDefId) {
    let mut builder = RegistryBuilder::new();
    builder.with_standard_library().container("Demo");
    let id = builder.class("Demo.TestObj", |t| {
        t.property("Count", TypeDescriptor::int(), |inv| Ok(Value::Int(test_obj(inv)?.count)))
            .method("Func", vec![TypeDescriptor::int()], TypeDescriptor::object(), |_| {
                Ok(Value::string("plain"))
            })
            .generic_method(
                "Func",
                &["TIn", "TOut"],
                vec![TypeDescriptor::MethodParam(0)],
                TypeDescriptor::MethodParam(1),
                |inv| Ok(Value::string(&format!("generic {}", inv.arg(0)?))),
            );
    });
    let registry: Arc<dyn TypeRegistry> = Arc::new(builder.build());
    let compiler = ExpressionCompiler::new()
        .with_registry(registry)
        .with_namespaces(["System", "System.Collections.Generic", "Demo"]);
    (compiler, id)
}

fn new_test_obj(id: TypeDefId, count: i32) -> Value {
    Value::Object(ObjectRef::new(TypeDescriptor::of(id), TestObj { count }))
}

fn eval(source: &str, return_type: TypeDescriptor) -> Value {
    let (compiler, _) = demo_compiler();
    compiler
        .compile(source, &Signature::returning(return_type))
        .unwrap()
        .invoke(&[])
        .unwrap()
}

fn eval_with_obj(source: &str, return_type: TypeDescriptor, count: Option<i32>) -> Value {
    let (compiler, id) = demo_compiler();
    let signature = Signature::new(vec![TypeDescriptor::of(id)], return_type);
    let arg = count.map_or(Value::Null, |count| new_test_obj(id, count));
    compiler.compile(source, &signature).unwrap().invoke(&[arg]).unwrap()
}

// ============================================================================
// Arithmetic and literals
// ============================================================================

#[test]
fn test_precedence_of_arithmetic() {
    assert_eq!(eval("3 + 2 * 5 + ((5 - 1) + 10) / 4", TypeDescriptor::int()), Value::Int(16));
}

#[test]
fn test_shift_and_additive_precedence() {
    let (compiler, _) = demo_compiler();
    let lambda = compiler
        .parse("6 << 2 + 5 >> 1", &Signature::returning(TypeDescriptor::int()))
        .unwrap();
    assert_eq!(print_expr(&lambda.body, compiler.registry().as_ref()), "((6 << (2 + 5)) >> 1)");
    assert_eq!(eval("6 << 2 + 5 >> 1", TypeDescriptor::int()), Value::Int(384));
}

#[test]
fn test_numeric_suffixes() {
    let object = TypeDescriptor::object();
    for suffix in ["l", "L"] {
        assert_eq!(eval(&format!("123{}", suffix), object.clone()), Value::Long(123));
    }
    for suffix in ["f", "F"] {
        assert_eq!(eval(&format!("123{}", suffix), object.clone()), Value::Float(123.0));
    }
    for suffix in ["d", "D"] {
        assert_eq!(eval(&format!("123{}", suffix), object.clone()), Value::Double(123.0));
    }
    for suffix in ["m", "M"] {
        assert_eq!(eval(&format!("123{}", suffix), object.clone()), Value::Decimal(Decimal::from(123)));
    }
}

#[test]
fn test_unary_operators() {
    assert_eq!(eval("-1 + ~(5 + 1)", TypeDescriptor::int()), Value::Int(-8));
}

#[test]
fn test_float_arithmetic() {
    assert_eq!(eval("1.2f + 3.2", TypeDescriptor::double()), Value::Double(1.2f32 as f64 + 3.2));
    let product = eval("2 * 3.40E+30F", TypeDescriptor::float());
    assert_eq!(product, Value::Float(6.8e30));
    assert_eq!(product.to_string(), "6.8E+30");
}

#[test]
fn test_sizeof() {
    assert_eq!(eval("sizeof(double)", TypeDescriptor::int()), Value::Int(8));
}

#[test]
fn test_cast_versus_group() {
    assert_eq!(eval("(int)3.2", TypeDescriptor::int()), Value::Int(3));
    assert_eq!(eval("(3.2)", TypeDescriptor::double()), Value::Double(3.2));
}

#[test]
fn test_math_with_imported_namespace() {
    assert_eq!(
        eval("(int)(Math.Pow(2, 3) + Math.Sqrt(4) + Math.PI)", TypeDescriptor::int()),
        Value::Int(13)
    );

    // Without `System` imported, `Math` does not resolve.
    let err = ExpressionCompiler::new()
        .parse("Math.PI", &Signature::returning(TypeDescriptor::double()))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeNotFound);
}

// ============================================================================
// Lambdas and host objects
// ============================================================================

#[test]
fn test_max_lambda() {
    let (compiler, _) = demo_compiler();
    let int = TypeDescriptor::int();
    let max = compiler
        .compile("(x, y) => x > y ? x : y", &Signature::new(vec![int.clone(), int.clone()], int))
        .unwrap();
    assert_eq!(max.invoke(&[Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(2));
    assert_eq!(max.invoke(&[Value::Int(2), Value::Int(1)]).unwrap(), Value::Int(2));
    assert_eq!(
        max.invoke(&[Value::Int(1)]),
        Err(EvalError::ArgumentCount { expected: 2, actual: 1 })
    );
}

#[test]
fn test_explicit_generic_instantiation_is_called() {
    assert_eq!(
        eval_with_obj("t => t.Func<int, string>(4)", TypeDescriptor::string(), Some(0)),
        Value::string("generic 4")
    );
    assert_eq!(
        eval_with_obj("t => t.Func(4)", TypeDescriptor::object(), Some(0)),
        Value::string("plain")
    );
}

#[test]
fn test_new_object_with_empty_initializer() {
    let value = eval("new object(){}", TypeDescriptor::object());
    assert!(value.as_object().is_some());
}

#[test]
fn test_null_check_and_type_test() {
    let source = "t => t != null && t is object == true";
    assert_eq!(eval_with_obj(source, TypeDescriptor::bool(), Some(1)), Value::Bool(true));
    assert_eq!(eval_with_obj(source, TypeDescriptor::bool(), None), Value::Bool(false));
}

#[test]
fn test_list_indexer() {
    let (compiler, _) = demo_compiler();
    let int = TypeDescriptor::int();
    let list = list_value(
        compiler.registry().as_ref(),
        int.clone(),
        vec![Value::Int(1), Value::Int(2), Value::Int(3)],
    )
    .unwrap();
    let list_type = list.runtime_type().unwrap();
    let sum = compiler
        .compile("l => l[1] + l[2]", &Signature::new(vec![list_type], int))
        .unwrap();
    assert_eq!(sum.invoke(&[list.clone()]).unwrap(), Value::Int(5));
}

#[test]
fn test_property_widening() {
    assert_eq!(
        eval_with_obj("t => t.Count + 8L", TypeDescriptor::long(), Some(4)),
        Value::Long(12)
    );
}

#[test]
fn test_logical_operators_over_properties() {
    let source = "t => !(t.Count > 5) || (t.Count < 100 && t.Count > 10)";
    assert_eq!(eval_with_obj(source, TypeDescriptor::bool(), Some(3)), Value::Bool(true));
    assert_eq!(eval_with_obj(source, TypeDescriptor::bool(), Some(7)), Value::Bool(false));
    assert_eq!(eval_with_obj(source, TypeDescriptor::bool(), Some(50)), Value::Bool(true));
}

#[test]
fn test_null_receiver_fails_at_runtime() {
    let (compiler, id) = demo_compiler();
    let count = compiler
        .compile("t => t.Count", &Signature::new(vec![TypeDescriptor::of(id)], TypeDescriptor::int()))
        .unwrap();
    assert_eq!(count.invoke(&[Value::Null]), Err(EvalError::NullReference));
}

// ============================================================================
// Diagnostics and options
// ============================================================================

#[test]
fn test_unterminated_char_literal() {
    let err = strexpr_compiler::parse("'a", &Signature::returning(TypeDescriptor::char())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedLiteral);
    assert_eq!(err.offset(), Some(0));
}

#[test]
fn test_errors_are_surfaced_verbatim() {
    let (compiler, _) = demo_compiler();
    let err = compiler
        .compile("1 + true", &Signature::returning(TypeDescriptor::int()))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::OperatorNotDefined);
    assert!(err.to_string().contains(&format!("EX{}", err.code)));
}

#[test]
fn test_exact_return_type_option() {
    let long = Signature::returning(TypeDescriptor::long());
    let (compiler, _) = demo_compiler();
    assert_eq!(compiler.compile("1", &long).unwrap().invoke(&[]).unwrap(), Value::Long(1));

    let strict = compiler.with_options(ParseOptions::from_json(r#"{ "implicitReturnConversion": false }"#).unwrap());
    assert_eq!(strict.parse("1", &long).unwrap_err().kind, ErrorKind::NoImplicitConversion);
    assert!(strict.parse("1L", &long).is_ok());
}

#[test]
fn test_nesting_limit_option() {
    let (compiler, _) = demo_compiler();
    let shallow = compiler.with_options(ParseOptions {
        max_nesting_depth: Some(4),
        ..ParseOptions::default()
    });
    let deep = format!("{}1{}", "(".repeat(10), ")".repeat(10));
    let err = shallow.parse(&deep, &Signature::returning(TypeDescriptor::int())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NestingTooDeep);
}
