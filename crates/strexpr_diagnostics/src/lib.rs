//! strexpr_diagnostics: Error kinds and the diagnostic message catalogue.
//!
//! Every failure of tokenizing, parsing or resolving an expression is a single
//! [`Diagnostic`]: a typed [`ErrorKind`], a stable code, the rendered message,
//! and the span and text of the offending token when one is known.

use std::fmt;
use strexpr_core::text::TextSpan;
use thiserror::Error;

/// Broad family of an error, derived from its [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Lex,
    Syntax,
    Resolution,
    Conversion,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Lex => write!(f, "lex error"),
            DiagnosticCategory::Syntax => write!(f, "syntax error"),
            DiagnosticCategory::Resolution => write!(f, "resolution error"),
            DiagnosticCategory::Conversion => write!(f, "conversion error"),
        }
    }
}

/// The typed reason a parse failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Lex
    EmptySource,
    UnsupportedCharacter,
    UnterminatedLiteral,
    MalformedNumber,
    // Syntax
    UnexpectedToken,
    MismatchedBracket,
    MismatchedTernary,
    InvalidNewSyntax,
    ParameterCountMismatch,
    IndexOutOfRange,
    NestingTooDeep,
    // Resolution
    TypeNotFound,
    MemberNotFound,
    MethodNotFound,
    ConstructorNotFound,
    OperatorNotDefined,
    // Conversion
    NoImplicitConversion,
}

impl ErrorKind {
    pub fn category(self) -> DiagnosticCategory {
        match self {
            ErrorKind::EmptySource
            | ErrorKind::UnsupportedCharacter
            | ErrorKind::UnterminatedLiteral
            | ErrorKind::MalformedNumber => DiagnosticCategory::Lex,
            ErrorKind::UnexpectedToken
            | ErrorKind::MismatchedBracket
            | ErrorKind::MismatchedTernary
            | ErrorKind::InvalidNewSyntax
            | ErrorKind::ParameterCountMismatch
            | ErrorKind::IndexOutOfRange
            | ErrorKind::NestingTooDeep => DiagnosticCategory::Syntax,
            ErrorKind::TypeNotFound
            | ErrorKind::MemberNotFound
            | ErrorKind::MethodNotFound
            | ErrorKind::ConstructorNotFound
            | ErrorKind::OperatorNotDefined => DiagnosticCategory::Resolution,
            ErrorKind::NoImplicitConversion => DiagnosticCategory::Conversion,
        }
    }
}

/// A diagnostic message template with a code and kind.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1003, 3005).
    pub code: u32,
    pub kind: ErrorKind,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with resolved message text and, when known, the
/// offending token and its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category} EX{code}: {message_text}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message_text: String,
    /// Where in the expression source the error was detected.
    pub span: Option<TextSpan>,
    /// Text of the offending token.
    pub token: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            kind: message.kind,
            code: message.code,
            category: message.kind.category(),
            message_text: format_message(message.message, args),
            span: None,
            token: None,
        }
    }

    /// Create a diagnostic pointing at a token.
    pub fn at(span: TextSpan, token: &str, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span: Some(span),
            token: Some(token.to_string()),
            ..Self::new(message, args)
        }
    }

    /// Attach a location if the diagnostic does not carry one yet.
    pub fn or_at(mut self, span: TextSpan, token: &str) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
            self.token = Some(token.to_string());
        }
        self
    }

    /// Source offset of the offending token, if known.
    pub fn offset(&self) -> Option<u32> {
        self.span.map(|s| s.start)
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Result alias used across the parsing pipeline.
pub type Result<T> = std::result::Result<T, Diagnostic>;

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $kind:ident, $msg:expr) => {
            DiagnosticMessage { code: $code, kind: ErrorKind::$kind, message: $msg }
        };
    }

    // ========================================================================
    // Tokenizer errors (1000-1099)
    // ========================================================================
    pub const EMPTY_SOURCE: DiagnosticMessage = diag!(1001, EmptySource, "Expression source is empty.");
    pub const UNSUPPORTED_CHARACTER: DiagnosticMessage = diag!(1002, UnsupportedCharacter, "Unsupported character '{0}'.");
    pub const UNTERMINATED_LITERAL: DiagnosticMessage = diag!(1003, UnterminatedLiteral, "Unterminated {0} literal.");
    pub const DIGIT_EXPECTED: DiagnosticMessage = diag!(1004, MalformedNumber, "Digit expected after '{0}'.");
    pub const NUMERIC_LITERAL_OUT_OF_RANGE: DiagnosticMessage = diag!(1005, MalformedNumber, "Numeric literal '{0}' is out of range for type '{1}'.");

    // ========================================================================
    // Syntax errors (2000-2099)
    // ========================================================================
    pub const UNEXPECTED_TOKEN: DiagnosticMessage = diag!(2001, UnexpectedToken, "Unexpected token '{0}'.");
    pub const UNEXPECTED_END_OF_EXPRESSION: DiagnosticMessage = diag!(2002, UnexpectedToken, "Unexpected end of expression.");
    pub const _0_EXPECTED: DiagnosticMessage = diag!(2003, UnexpectedToken, "'{0}' expected.");
    pub const INVALID_LAMBDA_PARAMETERS: DiagnosticMessage = diag!(2004, UnexpectedToken, "Invalid lambda parameter list near '{0}'.");
    pub const INVALID_CHAR_LITERAL: DiagnosticMessage = diag!(2005, UnexpectedToken, "Character literal {0} must contain exactly one character.");
    pub const _0_EXPECTED_TO_CLOSE_1: DiagnosticMessage = diag!(2010, MismatchedBracket, "'{0}' expected to close '{1}'.");
    pub const UNMATCHED_CLOSING_BRACKET: DiagnosticMessage = diag!(2011, MismatchedBracket, "Unmatched closing '{0}'.");
    pub const COLON_EXPECTED_IN_CONDITIONAL: DiagnosticMessage = diag!(2020, MismatchedTernary, "':' expected in conditional expression, found '{0}'.");
    pub const INVALID_NEW_SYNTAX: DiagnosticMessage = diag!(2030, InvalidNewSyntax, "'(', '{' or '[' expected after 'new {0}', found '{1}'.");
    pub const ARRAY_SIZE_OR_INITIALIZER_EXPECTED: DiagnosticMessage = diag!(2031, InvalidNewSyntax, "Array creation 'new {0}[]' needs a size or an initializer.");
    pub const PARAMETER_COUNT_MISMATCH: DiagnosticMessage = diag!(2040, ParameterCountMismatch, "Lambda declares {0} parameter(s) but the signature has {1}.");
    pub const TOKEN_INDEX_OUT_OF_RANGE: DiagnosticMessage = diag!(2050, IndexOutOfRange, "Token index {0} is out of range.");
    pub const NESTING_TOO_DEEP: DiagnosticMessage = diag!(2060, NestingTooDeep, "Expression nesting exceeds the maximum depth of {0}.");

    // ========================================================================
    // Resolution errors (3000-3099)
    // ========================================================================
    pub const TYPE_NOT_FOUND: DiagnosticMessage = diag!(3001, TypeNotFound, "Type '{0}' could not be found.");
    pub const TYPE_HAS_NO_SIZE: DiagnosticMessage = diag!(3002, TypeNotFound, "Type '{0}' has no defined size.");
    pub const MEMBER_NOT_FOUND: DiagnosticMessage = diag!(3010, MemberNotFound, "'{0}' has no field or property named '{1}'.");
    pub const MEMBER_NOT_SETTABLE: DiagnosticMessage = diag!(3011, MemberNotFound, "'{0}.{1}' cannot be assigned in an initializer.");
    pub const INDEXER_NOT_FOUND: DiagnosticMessage = diag!(3012, MemberNotFound, "'{0}' has no indexer.");
    pub const METHOD_NOT_FOUND: DiagnosticMessage = diag!(3020, MethodNotFound, "No overload of '{0}.{1}' accepts arguments ({2}).");
    pub const CONSTRUCTOR_NOT_FOUND: DiagnosticMessage = diag!(3030, ConstructorNotFound, "'{0}' has no constructor accepting arguments ({1}).");
    pub const OPERATOR_NOT_DEFINED: DiagnosticMessage = diag!(3040, OperatorNotDefined, "Operator '{0}' is not defined for operands of type '{1}' and '{2}'.");
    pub const UNARY_OPERATOR_NOT_DEFINED: DiagnosticMessage = diag!(3041, OperatorNotDefined, "Operator '{0}' is not defined for an operand of type '{1}'.");
    pub const AS_REQUIRES_REFERENCE_TYPE: DiagnosticMessage = diag!(3042, OperatorNotDefined, "The 'as' operator cannot target non-nullable value type '{0}'.");

    // ========================================================================
    // Conversion errors (4000-4099)
    // ========================================================================
    pub const NO_IMPLICIT_CONVERSION: DiagnosticMessage = diag!(4001, NoImplicitConversion, "Cannot implicitly convert type '{0}' to '{1}'.");
    pub const NO_EXPLICIT_CONVERSION: DiagnosticMessage = diag!(4002, NoImplicitConversion, "Cannot convert type '{0}' to '{1}'.");
    pub const NO_COMMON_TYPE: DiagnosticMessage = diag!(4003, NoImplicitConversion, "No common type between '{0}' and '{1}'.");
}
