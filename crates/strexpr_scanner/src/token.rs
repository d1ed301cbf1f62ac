//! Tokens produced by the scanner.

use strexpr_ast::syntax_kind::TokenKind;
use strexpr_core::text::TextSpan;

/// A scanned token. Operators and identifiers are matched by their text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text; empty for [`TokenKind::End`].
    pub text: String,
    pub span: TextSpan,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, start: u32) -> Self {
        Self {
            kind,
            text: text.to_string(),
            span: TextSpan::new(start, text.len() as u32),
        }
    }

    /// Source offset of the first character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.span.start
    }

    /// Whether this token's text is exactly `text`.
    #[inline]
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// An opening operator bracket: `(`, `[` or `{`.
    pub fn is_open_bracket(&self) -> bool {
        self.kind == TokenKind::Operator && matches!(self.text.as_str(), "(" | "[" | "{")
    }

    /// A closing operator bracket: `)`, `]` or `}`.
    pub fn is_close_bracket(&self) -> bool {
        self.kind == TokenKind::Operator && matches!(self.text.as_str(), ")" | "]" | "}")
    }

    /// How the token reads in a message; `End` has no text of its own.
    pub fn display_text(&self) -> &str {
        if self.is_end() {
            "<end>"
        } else {
            &self.text
        }
    }
}
