//! Character classes used by the scanner.

use unicode_xid::UnicodeXID;

pub const AT: char = '@';
pub const UNDERSCORE: char = '_';
pub const QUESTION: char = '?';
pub const DOT: char = '.';
pub const PLUS: char = '+';
pub const MINUS: char = '-';

#[inline]
pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

#[inline]
pub fn is_exponent_mark(ch: char) -> bool {
    ch == 'e' || ch == 'E'
}

/// First character of an identifier.
#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    ch == AT || ch == UNDERSCORE || UnicodeXID::is_xid_start(ch)
}

/// Subsequent characters of an identifier. `?` is accepted so that `int?`
/// reaches the type resolver as a single token.
#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    ch == UNDERSCORE || ch == QUESTION || UnicodeXID::is_xid_continue(ch)
}
