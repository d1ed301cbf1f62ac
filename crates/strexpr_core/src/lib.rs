//! strexpr_core: Core utilities shared by every stage of the expression compiler.
//!
//! Provides source spans for tokens and diagnostics, and the string interner
//! used for type and member name lookups.

pub mod intern;
pub mod text;

pub use intern::{InternedString, StringInterner};
pub use text::{TextPos, TextSpan};
