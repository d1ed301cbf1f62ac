//! Token kinds and the fixed lexical tables of the expression language.
//!
//! The tables are literal data: the set of operator characters, the operator
//! words the tokenizer may combine, the keywords, the quote marks and the
//! numeric literal suffixes.

use crate::types::NumericKind;

/// The kind of a token produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Sentinel after the last real token. Its text is empty.
    End,
    Identifier,
    Operator,
    QuotedLiteral,
    NumericLiteral,
}

/// Characters that start (and may continue) an operator token.
pub const OPERATOR_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '<', '>', '!', '=', '*', '/', '%', '+', '-', '&', '|', '.', ',', ':',
    '?', '~', '^',
];

/// Two-character operators the tokenizer combines into one token.
pub const TWO_CHAR_OPERATORS: &[&str] = &["<<", ">>", ">=", "<=", "==", "!=", "&&", "||", "??", "=>"];

/// Operators spelled as identifiers.
pub const WORD_OPERATORS: &[&str] = &["new", "typeof", "sizeof", "is", "as"];

/// Reserved literal words.
pub const KEYWORDS: &[&str] = &["true", "false", "null"];

#[inline]
pub fn is_operator_char(ch: char) -> bool {
    OPERATOR_CHARS.contains(&ch)
}

/// Whether `text` is any operator: a single operator character, a
/// two-character operator or a word operator.
pub fn is_operator_word(text: &str) -> bool {
    let mut chars = text.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return is_operator_char(ch);
    }
    TWO_CHAR_OPERATORS.contains(&text) || WORD_OPERATORS.contains(&text)
}

#[inline]
pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

/// What a quote mark delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    String,
    Char,
}

impl QuoteKind {
    pub fn from_char(ch: char) -> Option<QuoteKind> {
        match ch {
            '"' => Some(QuoteKind::String),
            '\'' => Some(QuoteKind::Char),
            _ => None,
        }
    }

    pub fn mark(self) -> char {
        match self {
            QuoteKind::String => '"',
            QuoteKind::Char => '\'',
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            QuoteKind::String => "string",
            QuoteKind::Char => "character",
        }
    }
}

/// The type a numeric literal suffix selects.
pub fn numeric_suffix(ch: char) -> Option<NumericKind> {
    match ch {
        'l' | 'L' => Some(NumericKind::Long),
        'f' | 'F' => Some(NumericKind::Float),
        'd' | 'D' => Some(NumericKind::Double),
        'm' | 'M' => Some(NumericKind::Decimal),
        _ => None,
    }
}
