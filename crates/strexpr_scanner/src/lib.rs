//! strexpr_scanner: Tokenizer for expression source text.
//!
//! Produces the complete token sequence of an expression in one forward pass:
//! - Operators, with two-character operators combined into one token
//! - Identifiers (a trailing `?` stays attached for nullable type names)
//! - Quoted string and character literals
//! - Numeric literals with optional fraction, exponent and type suffix

mod char_codes;
mod scanner;
mod token;

pub use scanner::{tokenize, Scanner};
pub use token::Token;
