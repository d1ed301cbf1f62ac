//! Runtime behaviour of compiled lambdas.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use strexpr_ast::types::{NumericKind, TypeDescriptor};
use strexpr_ast::value::{ArrayRef, ObjectRef, Value};
use strexpr_checker::{HostList, Invocation, InvokeError, Registry, RegistryBuilder, TypeRegistry, LIST_TYPE};
use strexpr_evaluator::{compile, CompiledLambda, EvalError};
use strexpr_options::ParseOptions;
use strexpr_parser::{parse_lambda, Signature};
use strexpr_scanner::tokenize;

#[derive(Default)]
struct Point {
    x: AtomicI32,
    y: AtomicI32,
}

fn point<'a>(inv: &Invocation<'a>) -> Result<&'a Point, InvokeError> {
    inv.this()?
        .as_object()
        .and_then(|o| o.downcast::<Point>())
        .ok_or_else(|| InvokeError::InvalidArgument("receiver is not a point".to_string()))
}

/// The standard library plus a mutable `Demo.Point`, a `Demo.Color` enum and
/// a static class with a generic method.
fn demo_registry() -> Arc<Registry> {
    let mut builder = RegistryBuilder::new();
    builder.with_standard_library().container("Demo");
    builder.class("Demo.Point", |t| {
        let ty = TypeDescriptor::of(t.id());
        t.constructor(vec![], move |_| Ok(Value::Object(ObjectRef::new(ty.clone(), Point::default()))))
            .settable_field(
                "X",
                TypeDescriptor::int(),
                |inv| Ok(Value::Int(point(inv)?.x.load(Ordering::SeqCst))),
                |inv| {
                    point(inv)?.x.store(inv.i32_arg(0)?, Ordering::SeqCst);
                    Ok(Value::Null)
                },
            )
            .settable_field(
                "Y",
                TypeDescriptor::int(),
                |inv| Ok(Value::Int(point(inv)?.y.load(Ordering::SeqCst))),
                |inv| {
                    point(inv)?.y.store(inv.i32_arg(0)?, Ordering::SeqCst);
                    Ok(Value::Null)
                },
            );
    });
    builder.enumeration("Demo.Color", NumericKind::Int, &[("Red", 0), ("Green", 1), ("Blue", 2)]);
    builder.static_class("Demo.Util", |t| {
        t.static_generic_method(
            "Echo",
            &["T"],
            vec![TypeDescriptor::MethodParam(0)],
            TypeDescriptor::MethodParam(0),
            |inv| Ok(inv.arg(0)?.clone()),
        );
    });
    Arc::new(builder.build())
}

fn compile_source(source: &str, signature: &Signature) -> CompiledLambda {
    let registry = demo_registry();
    let options = ParseOptions::with_namespaces(["System", "System.Collections.Generic", "Demo"]);
    let tokens = tokenize(source).unwrap();
    let lambda = parse_lambda(&tokens, signature, registry.as_ref(), &options).unwrap();
    compile(&lambda, registry)
}

fn run(source: &str, signature: &Signature, args: &[Value]) -> Result<Value, EvalError> {
    compile_source(source, signature).invoke(args)
}

fn eval(source: &str, return_type: TypeDescriptor) -> Result<Value, EvalError> {
    run(source, &Signature::returning(return_type), &[])
}

fn unary_signature(parameter: TypeDescriptor, return_type: TypeDescriptor) -> Signature {
    Signature::new(vec![parameter], return_type)
}

fn int_n() -> TypeDescriptor {
    TypeDescriptor::nullable(TypeDescriptor::int())
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_division_by_zero() {
    let signature = unary_signature(TypeDescriptor::int(), TypeDescriptor::int());
    assert_eq!(run("x => 10 / x", &signature, &[Value::Int(3)]), Ok(Value::Int(3)));
    assert_eq!(run("x => 10 / x", &signature, &[Value::Int(0)]), Err(EvalError::DivideByZero));
    assert_eq!(run("x => 10 % x", &signature, &[Value::Int(0)]), Err(EvalError::DivideByZero));
}

#[test]
fn test_integer_overflow_wraps() {
    let signature = unary_signature(TypeDescriptor::int(), TypeDescriptor::int());
    let result = run("x => x + 1", &signature, &[Value::Int(i32::MAX)]);
    assert_eq!(result, Ok(Value::Int(i32::MIN)));
}

#[test]
fn test_decimal_overflow_is_reported() {
    let signature = unary_signature(TypeDescriptor::decimal(), TypeDescriptor::decimal());
    let result = run("x => x * 2", &signature, &[Value::Decimal(Decimal::MAX)]);
    assert_eq!(result, Err(EvalError::Overflow));
    let result = run("x => x * 2", &signature, &[Value::Decimal(Decimal::new(15, 1))]);
    assert_eq!(result, Ok(Value::Decimal(Decimal::new(30, 1))));
}

#[test]
fn test_math_round_is_half_even() {
    assert_eq!(eval("Math.Round(2.5)", TypeDescriptor::double()), Ok(Value::Double(2.0)));
    assert_eq!(eval("Math.Round(3.5)", TypeDescriptor::double()), Ok(Value::Double(4.0)));
}

// ============================================================================
// Nullable lifting and short-circuiting
// ============================================================================

#[test]
fn test_lifted_addition() {
    let signature = Signature::new(vec![int_n(), TypeDescriptor::int()], int_n());
    let add = compile_source("(a, b) => a + b", &signature);
    assert_eq!(add.invoke(&[Value::Int(2), Value::Int(3)]), Ok(Value::Int(5)));
    assert_eq!(add.invoke(&[Value::Null, Value::Int(3)]), Ok(Value::Null));
}

#[test]
fn test_lifted_comparisons() {
    let signature = Signature::new(vec![int_n(), int_n()], TypeDescriptor::bool());
    let less = compile_source("(a, b) => a < b", &signature);
    assert_eq!(less.invoke(&[Value::Null, Value::Int(1)]), Ok(Value::Bool(false)));
    assert_eq!(less.invoke(&[Value::Int(0), Value::Int(1)]), Ok(Value::Bool(true)));

    let equal = compile_source("(a, b) => a == b", &signature);
    assert_eq!(equal.invoke(&[Value::Null, Value::Null]), Ok(Value::Bool(true)));
    assert_eq!(equal.invoke(&[Value::Null, Value::Int(1)]), Ok(Value::Bool(false)));
}

#[test]
fn test_coalesce() {
    let signature = unary_signature(int_n(), int_n());
    let coalesce = compile_source("a => a ?? 7", &signature);
    assert_eq!(coalesce.invoke(&[Value::Null]), Ok(Value::Int(7)));
    assert_eq!(coalesce.invoke(&[Value::Int(1)]), Ok(Value::Int(1)));
}

#[test]
fn test_nullable_members() {
    let has_value = compile_source("a => a.HasValue", &unary_signature(int_n(), TypeDescriptor::bool()));
    assert_eq!(has_value.invoke(&[Value::Null]), Ok(Value::Bool(false)));
    assert_eq!(has_value.invoke(&[Value::Int(4)]), Ok(Value::Bool(true)));

    let or_default = compile_source("a => a.GetValueOrDefault()", &unary_signature(int_n(), TypeDescriptor::int()));
    assert_eq!(or_default.invoke(&[Value::Null]), Ok(Value::Int(0)));
}

#[test]
fn test_and_also_short_circuits() {
    let signature = unary_signature(TypeDescriptor::string(), TypeDescriptor::bool());
    let check = compile_source("s => s != null && s.Length > 2", &signature);
    assert_eq!(check.invoke(&[Value::Null]), Ok(Value::Bool(false)));
    assert_eq!(check.invoke(&[Value::string("abc")]), Ok(Value::Bool(true)));

    let unguarded = compile_source("s => s.Length > 2", &signature);
    assert_eq!(unguarded.invoke(&[Value::Null]), Err(EvalError::NullReference));
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_unboxing_checks_runtime_type() {
    let signature = unary_signature(TypeDescriptor::object(), TypeDescriptor::int());
    let unbox = compile_source("x => (int)x", &signature);
    assert_eq!(unbox.invoke(&[Value::Int(4)]), Ok(Value::Int(4)));
    assert_eq!(unbox.invoke(&[Value::Null]), Err(EvalError::NullReference));
    assert_eq!(
        unbox.invoke(&[Value::Long(4)]),
        Err(EvalError::InvalidCast {
            from: "long".to_string(),
            to: "int".to_string()
        })
    );

    let to_nullable = compile_source("x => (int?)x", &unary_signature(TypeDescriptor::object(), int_n()));
    assert_eq!(to_nullable.invoke(&[Value::Null]), Ok(Value::Null));
}

#[test]
fn test_as_and_is() {
    let signature = unary_signature(TypeDescriptor::object(), TypeDescriptor::string());
    let as_string = compile_source("x => x as string", &signature);
    assert_eq!(as_string.invoke(&[Value::Int(1)]), Ok(Value::Null));
    assert_eq!(as_string.invoke(&[Value::string("a")]), Ok(Value::string("a")));

    let is_int = compile_source("x => x is int", &unary_signature(TypeDescriptor::object(), TypeDescriptor::bool()));
    assert_eq!(is_int.invoke(&[Value::Int(1)]), Ok(Value::Bool(true)));
    assert_eq!(is_int.invoke(&[Value::Null]), Ok(Value::Bool(false)));
}

#[test]
fn test_enum_conversions() {
    assert_eq!(eval("(int)Color.Blue", TypeDescriptor::int()), Ok(Value::Int(2)));
    let registry = demo_registry();
    let color = registry.resolve_type_by_name("Demo.Color", 0).unwrap();
    let green = eval("(Color)1", TypeDescriptor::of(color)).unwrap();
    assert_eq!(green, Value::Enum { ty: color, value: 1 });
    let combined = eval("Color.Green | Color.Blue", TypeDescriptor::of(color)).unwrap();
    assert_eq!(combined, Value::Enum { ty: color, value: 3 });
}

#[test]
fn test_string_concatenation_formats_values() {
    let result = eval("\"a\" + 1 + true", TypeDescriptor::string());
    assert_eq!(result, Ok(Value::string("a1True")));
    let signature = unary_signature(TypeDescriptor::string(), TypeDescriptor::string());
    assert_eq!(run("s => s + \"!\"", &signature, &[Value::Null]), Ok(Value::string("!")));
}

// ============================================================================
// Arrays, indexers and object creation
// ============================================================================

#[test]
fn test_array_bounds() {
    let array = TypeDescriptor::array(TypeDescriptor::int());
    let signature = unary_signature(array, TypeDescriptor::int());
    let items = Value::Array(ArrayRef::new(TypeDescriptor::int(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    let read = compile_source("a => a[1]", &signature);
    assert_eq!(read.invoke(&[items.clone()]), Ok(Value::Int(2)));
    let out_of_range = compile_source("a => a[5]", &signature);
    assert_eq!(
        out_of_range.invoke(&[items]),
        Err(EvalError::IndexOutOfRange { index: 5, len: 3 })
    );
    assert_eq!(out_of_range.invoke(&[Value::Null]), Err(EvalError::NullReference));
}

#[test]
fn test_new_arrays() {
    let sized = eval("new int[3]", TypeDescriptor::object()).unwrap();
    let sized = sized.as_array().unwrap();
    assert_eq!(sized.to_vec(), vec![Value::Int(0); 3]);

    let listed = eval("new long[] { 1, 2 }", TypeDescriptor::object()).unwrap();
    assert_eq!(listed.as_array().unwrap().to_vec(), vec![Value::Long(1), Value::Long(2)]);

    assert_eq!(eval("new int[-1]", TypeDescriptor::object()), Err(EvalError::Overflow));
}

#[test]
fn test_string_indexer() {
    let signature = unary_signature(TypeDescriptor::string(), TypeDescriptor::char());
    let index = compile_source("s => s[1]", &signature);
    assert_eq!(index.invoke(&[Value::string("abc")]), Ok(Value::Char('b')));
    let out_of_range = compile_source("s => s[5]", &signature);
    assert_eq!(
        out_of_range.invoke(&[Value::string("abc")]),
        Err(EvalError::IndexOutOfRange { index: 5, len: 3 })
    );
}

#[test]
fn test_member_initializer_sets_fields() {
    let value = eval("new Point() { X = 3, Y = 4 }", TypeDescriptor::object()).unwrap();
    let point = value.as_object().and_then(|o| o.downcast::<Point>()).unwrap();
    assert_eq!(point.x.load(Ordering::SeqCst), 3);
    assert_eq!(point.y.load(Ordering::SeqCst), 4);
}

#[test]
fn test_collection_initializer_adds_items() {
    let registry = demo_registry();
    let value = eval("new List<int>() { 1, 2, 3 }", TypeDescriptor::object()).unwrap();
    let object = value.as_object().unwrap();
    let list = registry.resolve_type_by_name(LIST_TYPE, 1).unwrap();
    assert_eq!(object.ty(), &TypeDescriptor::generic(list, vec![TypeDescriptor::int()]));
    let items = object.downcast::<HostList>().unwrap().items.read().clone();
    assert_eq!(items, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_generic_method_call() {
    assert_eq!(eval("Util.Echo(5)", TypeDescriptor::int()), Ok(Value::Int(5)));
    assert_eq!(eval("Util.Echo<string>(\"x\")", TypeDescriptor::string()), Ok(Value::string("x")));
}

// ============================================================================
// Invocation
// ============================================================================

#[test]
fn test_argument_checks() {
    let signature = Signature::new(vec![TypeDescriptor::int(), TypeDescriptor::int()], TypeDescriptor::int());
    let max = compile_source("(x, y) => x > y ? x : y", &signature);
    assert_eq!(
        max.invoke(&[Value::Int(1)]),
        Err(EvalError::ArgumentCount { expected: 2, actual: 1 })
    );
    assert_eq!(
        max.invoke(&[Value::Int(1), Value::string("2")]),
        Err(EvalError::ArgumentType {
            index: 1,
            expected: "int".to_string()
        })
    );
    assert_eq!(
        max.invoke(&[Value::Null, Value::Int(2)]),
        Err(EvalError::ArgumentType {
            index: 0,
            expected: "int".to_string()
        })
    );
}

#[test]
fn test_compiled_lambda_is_shared_across_threads() {
    let signature = Signature::new(vec![TypeDescriptor::int(), TypeDescriptor::int()], TypeDescriptor::int());
    let max = compile_source("(x, y) => x > y ? x : y", &signature);
    std::thread::scope(|scope| {
        for i in 0..4 {
            let max = &max;
            scope.spawn(move || {
                assert_eq!(max.invoke(&[Value::Int(i), Value::Int(2)]), Ok(Value::Int(i.max(2))));
            });
        }
    });
}

#[test]
fn test_parameters_are_reported() {
    let signature = Signature::new(vec![TypeDescriptor::long()], TypeDescriptor::long());
    let lambda = compile_source("x => x * 2", &signature);
    assert_eq!(lambda.parameter_types(), &[TypeDescriptor::long()]);
    assert_eq!(lambda.return_type(), &TypeDescriptor::long());
    assert_eq!(lambda.invoke(&[Value::Long(21)]), Ok(Value::Long(42)));
}
