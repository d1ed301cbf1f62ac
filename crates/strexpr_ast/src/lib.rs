//! strexpr_ast: Token kinds, lexical tables, type descriptors, runtime values
//! and the typed expression tree.
//!
//! Everything in here is plain data. Resolution of names to definitions lives
//! in `strexpr_checker`; building trees lives in `strexpr_parser`.

pub mod node;
pub mod syntax_kind;
pub mod types;
pub mod value;

pub use node::*;
pub use syntax_kind::TokenKind;
pub use types::{NumericKind, TypeDefId, TypeDescriptor};
pub use value::{ArrayRef, ObjectRef, Value};
