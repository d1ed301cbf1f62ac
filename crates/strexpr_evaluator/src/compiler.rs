//! Closure compilation of typed trees.

use std::fmt;
use std::sync::Arc;

use strexpr_ast::node::*;
use strexpr_ast::types::TypeDescriptor;
use strexpr_ast::value::{ArrayRef, Value};
use strexpr_checker::{Invocation, NativeFn, TypeRegistry};

use crate::arithmetic::{binary, unary};
use crate::conversion::Conversion;
use crate::error::EvalError;

/// Per-call state visible to every node.
struct Frame<'a> {
    args: &'a [Value],
    registry: &'a dyn TypeRegistry,
}

type Eval = Box<dyn Fn(&Frame<'_>) -> Result<Value, EvalError> + Send + Sync>;

fn eval<F>(f: F) -> Eval
where
    F: Fn(&Frame<'_>) -> Result<Value, EvalError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// A native callable together with the generic arguments it is invoked with.
struct Native {
    name: String,
    function: Option<NativeFn>,
    type_args: Vec<TypeDescriptor>,
    method_type_args: Vec<TypeDescriptor>,
}

impl Native {
    fn call(&self, frame: &Frame<'_>, receiver: Option<&Value>, args: &[Value]) -> Result<Value, EvalError> {
        let function = self
            .function
            .as_ref()
            .ok_or_else(|| EvalError::Unbound(self.name.clone()))?;
        let invocation = Invocation {
            receiver,
            args,
            type_args: &self.type_args,
            method_type_args: &self.method_type_args,
            registry: Some(frame.registry),
        };
        Ok(function.call(&invocation)?)
    }
}

/// A lambda ready to run.
pub struct CompiledLambda {
    registry: Arc<dyn TypeRegistry>,
    parameters: Vec<TypeDescriptor>,
    return_type: TypeDescriptor,
    body: Eval,
}

impl CompiledLambda {
    pub fn parameter_types(&self) -> &[TypeDescriptor] {
        &self.parameters
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }

    /// Run the lambda. `args` must match the parameters in number, and each
    /// non-null argument must be an instance of its parameter type.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        if args.len() != self.parameters.len() {
            return Err(EvalError::ArgumentCount {
                expected: self.parameters.len(),
                actual: args.len(),
            });
        }
        let registry = self.registry.as_ref();
        for (index, (arg, ty)) in args.iter().zip(&self.parameters).enumerate() {
            let accepted = match arg.runtime_type() {
                Some(runtime) => registry.is_assignable(&runtime, ty),
                None => registry.is_nullable_or_reference(ty),
            };
            if !accepted {
                return Err(EvalError::ArgumentType {
                    index,
                    expected: registry.type_name(ty),
                });
            }
        }
        tracing::trace!("Invoking compiled lambda with {} argument(s)", args.len());
        (self.body)(&Frame { args, registry })
    }
}

impl fmt::Debug for CompiledLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledLambda")
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .finish()
    }
}

/// Turn a typed lambda into a callable bound to `registry`, which should be
/// the registry the lambda was built against.
pub fn compile(lambda: &Lambda, registry: Arc<dyn TypeRegistry>) -> CompiledLambda {
    let body = Compiler {
        registry: registry.as_ref(),
    }
    .compile(&lambda.body);
    tracing::debug!("Compiled lambda with {} parameter(s)", lambda.parameters.len());
    CompiledLambda {
        parameters: lambda.parameters.iter().map(|p| p.ty.clone()).collect(),
        return_type: lambda.return_type.clone(),
        registry,
        body,
    }
}

struct Compiler<'r> {
    registry: &'r dyn TypeRegistry,
}

impl Compiler<'_> {
    fn compile(&self, expr: &Expr) -> Eval {
        match &expr.kind {
            ExprKind::Constant(value) => {
                let value = value.clone();
                eval(move |_| Ok(value.clone()))
            }
            ExprKind::Parameter { index, name } => {
                let (index, name) = (*index, name.clone());
                eval(move |frame| {
                    frame
                        .args
                        .get(index)
                        .cloned()
                        .ok_or_else(|| EvalError::Unbound(name.clone()))
                })
            }
            ExprKind::Unary { op, operand } => {
                let (op, operand) = (*op, self.compile(operand));
                eval(move |frame| {
                    let value = operand(frame)?;
                    if value.is_null() {
                        return Ok(Value::Null);
                    }
                    unary(op, &value)
                })
            }
            ExprKind::Binary { op, left, right } => self.compile_binary(*op, left, right),
            ExprKind::Conditional { test, if_true, if_false } => {
                let test = self.compile(test);
                let (if_true, if_false) = (self.compile(if_true), self.compile(if_false));
                eval(move |frame| {
                    if truth(&test(frame)?)? {
                        if_true(frame)
                    } else {
                        if_false(frame)
                    }
                })
            }
            ExprKind::Coalesce { left, right } => {
                let (left, right) = (self.compile(left), self.compile(right));
                eval(move |frame| match left(frame)? {
                    Value::Null => right(frame),
                    value => Ok(value),
                })
            }
            ExprKind::MemberAccess { target, member } => {
                let target = target.as_deref().map(|t| self.compile(t));
                let getter = Native {
                    name: member.name.clone(),
                    function: self.registry.member_def(member).map(|m| m.getter.clone()),
                    type_args: member.declaring.args().to_vec(),
                    method_type_args: Vec::new(),
                };
                eval(move |frame| {
                    let receiver = target.as_ref().map(|t| t(frame)).transpose()?;
                    getter.call(frame, receiver.as_ref(), &[])
                })
            }
            ExprKind::IndexAccess { array, index } => {
                let (array, index) = (self.compile(array), self.compile(index));
                eval(move |frame| {
                    let array = array(frame)?;
                    let index = index(frame)?;
                    element_at(&array, &index)
                })
            }
            ExprKind::Call { target, method, args } => {
                let target = target.as_deref().map(|t| self.compile(t));
                let args = self.compile_all(args);
                let native = Native {
                    name: method.name.clone(),
                    function: self.registry.method_def(method).map(|m| m.invoke.clone()),
                    type_args: method.declaring.args().to_vec(),
                    method_type_args: method.type_args.clone(),
                };
                eval(move |frame| {
                    let receiver = target.as_ref().map(|t| t(frame)).transpose()?;
                    let args = evaluate_all(&args, frame)?;
                    native.call(frame, receiver.as_ref(), &args)
                })
            }
            ExprKind::New { constructor: None, .. } => {
                let value = self.registry.default_value(&expr.ty);
                eval(move |_| Ok(value.clone()))
            }
            ExprKind::New {
                constructor: Some(constructor),
                args,
            } => {
                let args = self.compile_all(args);
                let native = Native {
                    name: format!("{}..ctor", self.registry.type_name(&constructor.declaring)),
                    function: self.registry.constructor_def(constructor).map(|c| c.invoke.clone()),
                    type_args: constructor.declaring.args().to_vec(),
                    method_type_args: Vec::new(),
                };
                eval(move |frame| {
                    let args = evaluate_all(&args, frame)?;
                    native.call(frame, None, &args)
                })
            }
            ExprKind::NewArray { element, init } => self.compile_new_array(element, init),
            ExprKind::MemberInit { new, bindings } => {
                let new = self.compile(new);
                let bindings: Vec<(Native, Eval)> = bindings
                    .iter()
                    .map(|binding| {
                        let member = &binding.member;
                        let setter = Native {
                            name: member.name.clone(),
                            function: self.registry.member_def(member).and_then(|m| m.setter.clone()),
                            type_args: member.declaring.args().to_vec(),
                            method_type_args: Vec::new(),
                        };
                        (setter, self.compile(&binding.value))
                    })
                    .collect();
                eval(move |frame| {
                    let instance = new(frame)?;
                    for (setter, value) in &bindings {
                        let value = value(frame)?;
                        setter.call(frame, Some(&instance), std::slice::from_ref(&value))?;
                    }
                    Ok(instance)
                })
            }
            ExprKind::ListInit { new, initializers } => {
                let new = self.compile(new);
                let initializers: Vec<(Native, Vec<Eval>)> = initializers
                    .iter()
                    .map(|init| {
                        let method = &init.add_method;
                        let add = Native {
                            name: method.name.clone(),
                            function: self.registry.method_def(method).map(|m| m.invoke.clone()),
                            type_args: method.declaring.args().to_vec(),
                            method_type_args: method.type_args.clone(),
                        };
                        (add, self.compile_all(&init.args))
                    })
                    .collect();
                eval(move |frame| {
                    let instance = new(frame)?;
                    for (add, args) in &initializers {
                        let args = evaluate_all(args, frame)?;
                        add.call(frame, Some(&instance), &args)?;
                    }
                    Ok(instance)
                })
            }
            ExprKind::Convert { operand } => {
                let conversion = Conversion::new(self.registry, &operand.ty, &expr.ty);
                let operand = self.compile(operand);
                eval(move |frame| conversion.apply(operand(frame)?, frame.registry))
            }
            ExprKind::TypeIs { operand, target } => {
                let (operand, target) = (self.compile(operand), target.clone());
                eval(move |frame| {
                    let value = operand(frame)?;
                    Ok(Value::Bool(is_instance(&value, &target, frame.registry)))
                })
            }
            ExprKind::TypeAs { operand } => {
                let (operand, target) = (self.compile(operand), expr.ty.clone());
                eval(move |frame| {
                    let value = operand(frame)?;
                    Ok(if is_instance(&value, &target, frame.registry) {
                        value
                    } else {
                        Value::Null
                    })
                })
            }
        }
    }

    fn compile_all(&self, exprs: &[Expr]) -> Vec<Eval> {
        exprs.iter().map(|e| self.compile(e)).collect()
    }

    fn compile_binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Eval {
        let (left, right) = (self.compile(left), self.compile(right));
        match op {
            BinaryOp::AndAlso => eval(move |frame| {
                let result = truth(&left(frame)?)? && truth(&right(frame)?)?;
                Ok(Value::Bool(result))
            }),
            BinaryOp::OrElse => eval(move |frame| {
                let result = truth(&left(frame)?)? || truth(&right(frame)?)?;
                Ok(Value::Bool(result))
            }),
            op => eval(move |frame| {
                let left = left(frame)?;
                let right = right(frame)?;
                binary(op, &left, &right)
            }),
        }
    }

    fn compile_new_array(&self, element: &TypeDescriptor, init: &ArrayInit) -> Eval {
        let element = element.clone();
        match init {
            ArrayInit::Bounds(bound) => {
                let bound = self.compile(bound);
                let default = self.registry.default_value(&element);
                eval(move |frame| {
                    let length = bound(frame)?;
                    let length = length
                        .as_i128()
                        .ok_or_else(|| EvalError::TypeMismatch(format!("array size {:?} is not an integer", length)))?;
                    // Negative sizes overflow, as they do for `new T[-1]` in C#.
                    let length = usize::try_from(length).map_err(|_| EvalError::Overflow)?;
                    let items = vec![default.clone(); length];
                    Ok(Value::Array(ArrayRef::new(element.clone(), items)))
                })
            }
            ArrayInit::Elements(elements) => {
                let elements = self.compile_all(elements);
                eval(move |frame| {
                    let items = evaluate_all(&elements, frame)?;
                    Ok(Value::Array(ArrayRef::new(element.clone(), items)))
                })
            }
        }
    }
}

fn evaluate_all(exprs: &[Eval], frame: &Frame<'_>) -> Result<Vec<Value>, EvalError> {
    exprs.iter().map(|e| e(frame)).collect()
}

fn truth(value: &Value) -> Result<bool, EvalError> {
    value
        .as_bool()
        .ok_or_else(|| EvalError::TypeMismatch(format!("{:?} is not a boolean", value)))
}

fn element_at(array: &Value, index: &Value) -> Result<Value, EvalError> {
    let array = match array {
        Value::Array(array) => array,
        Value::Null => return Err(EvalError::NullReference),
        other => return Err(EvalError::TypeMismatch(format!("{:?} is not an array", other))),
    };
    let index = index
        .as_i128()
        .ok_or_else(|| EvalError::TypeMismatch(format!("array index {:?} is not an integer", index)))?;
    usize::try_from(index)
        .ok()
        .and_then(|i| array.get(i))
        .ok_or(EvalError::IndexOutOfRange {
            index: index as i64,
            len: array.len(),
        })
}

/// `value is target`: non-null and an instance of the target type.
fn is_instance(value: &Value, target: &TypeDescriptor, registry: &dyn TypeRegistry) -> bool {
    value
        .runtime_type()
        .map_or(false, |runtime| registry.is_assignable(&runtime, target))
}
