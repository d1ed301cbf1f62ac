//! strexpr_evaluator: Runs typed expression trees.
//!
//! [`compile`] walks a [`Lambda`](strexpr_ast::node::Lambda) once and turns
//! every node into a closure, looking up the native callables of members,
//! methods and constructors as it goes. The resulting [`CompiledLambda`] can
//! be invoked any number of times, from any thread.

mod arithmetic;
mod compiler;
mod conversion;
mod error;

pub use compiler::{compile, CompiledLambda};
pub use conversion::to_numeric;
pub use error::EvalError;
