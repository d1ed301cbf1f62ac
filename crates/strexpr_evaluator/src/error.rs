use strexpr_checker::InvokeError;
use thiserror::Error;

/// A failure while a compiled expression runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("attempted to divide by zero")]
    DivideByZero,
    #[error("arithmetic operation resulted in an overflow")]
    Overflow,
    #[error("object reference not set to an instance of an object")]
    NullReference,
    #[error("unable to cast object of type '{from}' to type '{to}'")]
    InvalidCast { from: String, to: String },
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("expected {expected} argument(s) but received {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("argument {index} is not a value of type '{expected}'")]
    ArgumentType { index: usize, expected: String },
    /// A value did not have the shape its static type promised.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// The tree names a member the registry does not define.
    #[error("'{0}' is not defined by the registry")]
    Unbound(String),
    #[error(transparent)]
    Host(InvokeError),
}

impl From<InvokeError> for EvalError {
    fn from(error: InvokeError) -> Self {
        match error {
            InvokeError::NullReference => EvalError::NullReference,
            InvokeError::IndexOutOfRange { index, len } => EvalError::IndexOutOfRange { index, len },
            other => EvalError::Host(other),
        }
    }
}
