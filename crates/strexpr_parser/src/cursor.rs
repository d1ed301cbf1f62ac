//! A read index over a token slice.

use strexpr_ast::syntax_kind::TokenKind;
use strexpr_diagnostics::{messages, Diagnostic, Result};
use strexpr_scanner::Token;

/// Borrowed tokens plus a read index. The index starts at `-1`, before the
/// first token, and never moves past the trailing `End`.
#[derive(Debug, Clone)]
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    index: isize,
}

impl<'t> TokenCursor<'t> {
    /// `tokens` must end with an `End` token, as [`strexpr_scanner::tokenize`]
    /// guarantees.
    pub fn new(tokens: &'t [Token]) -> Self {
        debug_assert!(tokens.last().map_or(false, Token::is_end));
        Self { tokens, index: -1 }
    }

    #[inline]
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    fn at(&self, index: isize) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        let clamped = (index.max(0) as usize).min(last);
        &self.tokens[clamped]
    }

    /// The last token returned by [`next`](Self::next).
    pub fn current(&self) -> &'t Token {
        self.at(self.index)
    }

    /// Advance and return the new current token. Saturates at `End`.
    pub fn next(&mut self) -> &'t Token {
        if self.index + 1 < self.tokens.len() as isize {
            self.index += 1;
        }
        self.current()
    }

    /// The token `n` positions ahead without moving; `peek_next(1)` is what
    /// `next()` would return.
    pub fn peek_next(&self, n: usize) -> &'t Token {
        self.at(self.index + n as isize)
    }

    /// Move the index by `n` tokens.
    pub fn skip(&mut self, n: isize) -> Result<()> {
        self.seek(self.index + n)
    }

    /// Advance until `pred` holds for the current token or `End` is reached.
    /// Returns every token passed over, the stopping token included.
    pub fn skip_until(&mut self, pred: impl Fn(&Token) -> bool) -> Vec<&'t Token> {
        let mut collected = Vec::new();
        loop {
            let token = self.next();
            collected.push(token);
            if token.is_end() || pred(token) {
                return collected;
            }
        }
    }

    /// Restore a saved index. `-1` rewinds to before the first token.
    pub fn seek(&mut self, index: isize) -> Result<()> {
        if index < -1 || index >= self.tokens.len() as isize {
            return Err(Diagnostic::new(&messages::TOKEN_INDEX_OUT_OF_RANGE, &[&index.to_string()]));
        }
        self.index = index;
        Ok(())
    }

    /// Whether the next token is a `<` opening a balanced run of identifiers,
    /// commas and nested `<`/`>` pairs, as in `Func<int,string>` or
    /// `Dictionary<string, List<int> >`. Does not move.
    pub fn is_generic_argument_list(&self) -> bool {
        if !self.peek_next(1).is("<") {
            return false;
        }
        let mut depth = 1usize;
        let mut n = 2;
        loop {
            let token = self.peek_next(n);
            match token.kind {
                TokenKind::Identifier => {}
                TokenKind::Operator if token.is(",") => {}
                TokenKind::Operator if token.is("<") => depth += 1,
                TokenKind::Operator if token.is(">") => {
                    if self.peek_next(n - 1).is("<") {
                        return false;
                    }
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                _ => return false,
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strexpr_scanner::tokenize;

    #[test]
    fn test_next_saturates_at_end() {
        let tokens = tokenize("a + b").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        assert_eq!(cursor.index(), -1);
        assert!(cursor.next().is("a"));
        assert!(cursor.peek_next(1).is("+"));
        assert!(cursor.peek_next(2).is("b"));
        assert!(cursor.peek_next(10).is_end());
        cursor.next();
        cursor.next();
        assert!(cursor.next().is_end());
        assert!(cursor.next().is_end());
        assert_eq!(cursor.index(), 3);
    }

    #[test]
    fn test_seek_and_skip_bounds() {
        let tokens = tokenize("x").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.skip(2).is_err());
        cursor.skip(1).unwrap();
        assert!(cursor.current().is("x"));
        cursor.seek(-1).unwrap();
        assert_eq!(cursor.index(), -1);
        assert!(cursor.seek(-2).is_err());
        assert!(cursor.seek(2).is_err());
    }

    #[test]
    fn test_skip_until_collects_inclusive() {
        let tokens = tokenize("(a, b) => a").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        let collected = cursor.skip_until(|t| t.is(")"));
        let texts: Vec<&str> = collected.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["(", "a", ",", "b", ")"]);

        let rest = cursor.skip_until(|t| t.is("]"));
        assert!(rest.last().unwrap().is_end());
    }

    #[test]
    fn test_generic_argument_lookahead() {
        let tokens = tokenize("t.Func<int,string>(4)").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.skip(3).unwrap();
        assert!(cursor.current().is("Func"));
        assert!(cursor.is_generic_argument_list());

        let tokens = tokenize("t.Count < 100 && x > 1").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.skip(3).unwrap();
        assert!(!cursor.is_generic_argument_list());

        let tokens = tokenize("a < b").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.next();
        assert!(!cursor.is_generic_argument_list());
    }

    #[test]
    fn test_nested_generic_argument_lookahead() {
        let tokens = tokenize("Dictionary<string, List<int> >()").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.next();
        assert!(cursor.is_generic_argument_list());

        // `>>` is a shift token, so the closers must be separated.
        let tokens = tokenize("List<List<int>>").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.next();
        assert!(!cursor.is_generic_argument_list());

        let tokens = tokenize("List<List<int>").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.next();
        assert!(!cursor.is_generic_argument_list());

        let tokens = tokenize("List<List<> >").unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        cursor.next();
        assert!(!cursor.is_generic_argument_list());
    }
}
