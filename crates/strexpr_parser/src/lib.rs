//! strexpr_parser: Builds typed lambda trees from expression tokens.
//!
//! The builder is a precedence climber over a token cursor. Names are bound
//! against a [`TypeRegistry`](strexpr_checker::TypeRegistry) as they are read,
//! so the tree it returns is fully typed.

mod cursor;
mod parser;
mod precedence;
mod type_resolver;

pub use cursor::TokenCursor;
pub use parser::{parse_lambda, Signature};
pub use precedence::{precedence_of, OperatorPrecedence};
pub use type_resolver::TypeResolver;
