//! The expression scanner.
//!
//! A single forward scan with one character of lookahead. Every token records
//! the byte offset it starts at, and every error names the offending text.

use crate::char_codes::*;
use crate::token::Token;
use strexpr_ast::syntax_kind::{is_operator_char, numeric_suffix, QuoteKind, TokenKind, TWO_CHAR_OPERATORS};
use strexpr_core::text::TextSpan;
use strexpr_diagnostics::{messages, Diagnostic, Result};

/// Tokenize a whole expression. The result always ends with exactly one
/// [`TokenKind::End`] token.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Scanner::new(source).scan_all()
}

/// The scanner converts expression source text into tokens.
pub struct Scanner<'s> {
    text: &'s str,
    /// Current byte position in the text.
    pos: usize,
    /// Start of the current token (after whitespace).
    token_start: usize,
}

impl<'s> Scanner<'s> {
    pub fn new(text: &'s str) -> Self {
        Self {
            text,
            pos: 0,
            token_start: 0,
        }
    }

    /// Scan every token, including the trailing `End`.
    pub fn scan_all(mut self) -> Result<Vec<Token>> {
        if self.text.trim().is_empty() {
            return Err(Diagnostic::new(&messages::EMPTY_SOURCE, &[]));
        }
        let mut tokens = Vec::new();
        loop {
            let token = self.scan()?;
            let done = token.is_end();
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::trace!("Tokenized {} bytes into {} tokens", self.text.len(), tokens.len());
        Ok(tokens)
    }

    /// Scan the next token. Once the input is exhausted every call returns `End`.
    pub fn scan(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.token_start = self.pos;

        let ch = match self.current_char() {
            Some(ch) => ch,
            None => return Ok(self.make_token(TokenKind::End)),
        };

        if is_operator_char(ch) {
            self.scan_operator(ch);
            return Ok(self.make_token(TokenKind::Operator));
        }
        if is_identifier_start(ch) {
            self.scan_identifier();
            return Ok(self.make_token(TokenKind::Identifier));
        }
        if let Some(quote) = QuoteKind::from_char(ch) {
            self.scan_quoted(quote)?;
            return Ok(self.make_token(TokenKind::QuotedLiteral));
        }
        if is_digit(ch) {
            self.scan_number()?;
            return Ok(self.make_token(TokenKind::NumericLiteral));
        }

        let text = ch.to_string();
        Err(Diagnostic::at(
            TextSpan::new(self.pos as u32, ch.len_utf8() as u32),
            &text,
            &messages::UNSUPPORTED_CHARACTER,
            &[&text],
        ))
    }

    // ========================================================================
    // Character access
    // ========================================================================

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// The character `offset` characters after the current one.
    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        self.text[self.pos..].chars().nth(offset)
    }

    #[inline]
    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, &self.text[self.token_start..self.pos], self.token_start as u32)
    }

    fn error_here(&self, message: &strexpr_diagnostics::DiagnosticMessage, args: &[&str]) -> Diagnostic {
        let text = &self.text[self.token_start..self.pos];
        Diagnostic::at(
            TextSpan::between(self.token_start as u32, self.pos as u32),
            text,
            message,
            args,
        )
    }

    // ========================================================================
    // Token scanners
    // ========================================================================

    fn scan_operator(&mut self, first: char) {
        self.advance();
        if let Some(second) = self.current_char() {
            if is_operator_char(second) {
                let mut pair = String::with_capacity(2);
                pair.push(first);
                pair.push(second);
                if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                    self.advance();
                }
            }
        }
    }

    fn scan_identifier(&mut self) {
        self.advance();
        while let Some(ch) = self.current_char() {
            if !is_identifier_part(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    /// Consume a quoted literal up to and including the matching close quote.
    fn scan_quoted(&mut self, quote: QuoteKind) -> Result<()> {
        let body_start = self.pos + 1;
        match memchr::memchr(quote.mark() as u8, &self.text.as_bytes()[body_start..]) {
            Some(close) => {
                self.pos = body_start + close + 1;
                Ok(())
            }
            None => {
                self.pos = self.text.len();
                Err(self.error_here(&messages::UNTERMINATED_LITERAL, &[quote.describe()]))
            }
        }
    }

    /// Digits, then either a suffix or an optional fraction with optional
    /// exponent and suffix. A dot or exponent mark must be followed by a digit.
    fn scan_number(&mut self) -> Result<()> {
        self.scan_digits();

        if self.current_char().and_then(numeric_suffix).is_some() {
            self.advance();
            return Ok(());
        }
        if self.current_char() != Some(DOT) {
            return Ok(());
        }

        self.advance();
        self.expect_digit()?;
        self.scan_digits();

        if self.current_char().map_or(false, is_exponent_mark) {
            self.advance();
            if let Some(PLUS) | Some(MINUS) = self.current_char() {
                self.advance();
            }
            self.expect_digit()?;
            self.scan_digits();
        }

        if self.current_char().and_then(numeric_suffix).is_some() {
            self.advance();
        }
        Ok(())
    }

    fn scan_digits(&mut self) {
        while self.current_char().map_or(false, is_digit) {
            self.pos += 1;
        }
    }

    fn expect_digit(&mut self) -> Result<()> {
        if self.char_at(0).map_or(false, is_digit) {
            return Ok(());
        }
        let consumed = self.text[self.token_start..self.pos].to_string();
        if let Some(ch) = self.current_char() {
            // Include the offending character in the reported span.
            self.pos += ch.len_utf8();
        }
        Err(self.error_here(&messages::DIGIT_EXPECTED, &[&consumed]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_returns_end_repeatedly() {
        let mut scanner = Scanner::new("x");
        assert_eq!(scanner.scan().map(|t| t.kind), Ok(TokenKind::Identifier));
        assert_eq!(scanner.scan().map(|t| t.kind), Ok(TokenKind::End));
        assert_eq!(scanner.scan().map(|t| t.kind), Ok(TokenKind::End));
    }

    #[test]
    fn test_unsupported_character_location() {
        let err = tokenize("1 + #").unwrap_err();
        assert_eq!(err.kind, strexpr_diagnostics::ErrorKind::UnsupportedCharacter);
        assert_eq!(err.offset(), Some(4));
        assert_eq!(err.token.as_deref(), Some("#"));
    }
}
