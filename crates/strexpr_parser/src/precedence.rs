//! Operator precedence.

use strexpr_ast::syntax_kind::TokenKind;
use strexpr_scanner::Token;

/// Operator precedence levels, lowest to highest.
///
/// Unary `~`/`!` sit between additive and multiplicative, so `-a * b` reads
/// as `-(a * b)`. Closing brackets share the grouping level, which lets any
/// read consume the bracket that ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    /// `?`
    Conditional = 1,
    /// `??`
    Coalesce = 2,
    LogicalOr = 3,
    LogicalAnd = 4,
    BitwiseOr = 5,
    BitwiseXor = 6,
    BitwiseAnd = 7,
    Equality = 8,
    /// `< > <= >= is as`
    Relational = 9,
    Shift = 10,
    Additive = 11,
    Unary = 12,
    Multiplicative = 13,
    /// `. new typeof sizeof`
    Member = 14,
    /// `( ) [ ] { }`
    Grouping = 15,
    Invalid = 255,
}

impl OperatorPrecedence {
    /// Whether the token can continue an expression at all.
    #[inline]
    pub fn is_valid(self) -> bool {
        self != OperatorPrecedence::Invalid
    }
}

/// Precedence of an operator token; literals, identifiers, `End` and the
/// separators `, : = =>` have none.
pub fn precedence_of(token: &Token) -> OperatorPrecedence {
    if !matches!(token.kind, TokenKind::Operator | TokenKind::Identifier) {
        return OperatorPrecedence::Invalid;
    }
    match token.text.as_str() {
        "(" | ")" | "[" | "]" | "{" | "}" => OperatorPrecedence::Grouping,
        "." | "new" | "typeof" | "sizeof" => OperatorPrecedence::Member,
        "*" | "/" | "%" => OperatorPrecedence::Multiplicative,
        "~" | "!" => OperatorPrecedence::Unary,
        "+" | "-" => OperatorPrecedence::Additive,
        "<<" | ">>" => OperatorPrecedence::Shift,
        "<" | ">" | "<=" | ">=" | "is" | "as" => OperatorPrecedence::Relational,
        "==" | "!=" => OperatorPrecedence::Equality,
        "&" => OperatorPrecedence::BitwiseAnd,
        "^" => OperatorPrecedence::BitwiseXor,
        "|" => OperatorPrecedence::BitwiseOr,
        "&&" => OperatorPrecedence::LogicalAnd,
        "||" => OperatorPrecedence::LogicalOr,
        "??" => OperatorPrecedence::Coalesce,
        "?" => OperatorPrecedence::Conditional,
        _ => OperatorPrecedence::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_scanner::tokenize;

    fn of(source: &str) -> OperatorPrecedence {
        precedence_of(&tokenize(source).unwrap()[0])
    }

    #[test]
    fn test_ordering() {
        assert!(of("*") > of("~"));
        assert!(of("~") > of("+"));
        assert!(of("+") > of("<<"));
        assert!(of("<<") > of("is"));
        assert!(of("==") > of("&"));
        assert!(of("&") > of("^"));
        assert!(of("^") > of("|"));
        assert!(of("||") > of("??"));
        assert!(of("??") > of("?"));
        assert_eq!(of("}"), OperatorPrecedence::Grouping);
        assert_eq!(of("."), of("new"));
    }

    #[test]
    fn test_non_operators() {
        assert_eq!(of(","), OperatorPrecedence::Invalid);
        assert_eq!(of("=>"), OperatorPrecedence::Invalid);
        assert_eq!(of("foo"), OperatorPrecedence::Invalid);
        assert_eq!(of("42"), OperatorPrecedence::Invalid);
        assert_eq!(of("\"+\""), OperatorPrecedence::Invalid);
        assert!(!OperatorPrecedence::Invalid.is_valid());
    }
}
