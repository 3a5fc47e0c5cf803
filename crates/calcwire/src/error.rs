use thiserror::Error;

/// Why a piece of text could not be read as a locale-formatted number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberParseError {
    #[error("empty input")]
    Empty,
    #[error("decimal separator '{0}' appears more than once")]
    RepeatedDecimalSeparator(char),
    #[error("'{0}' is not a plain decimal number")]
    Malformed(String),
}

/// A formula that failed to lex or parse. `report` holds the rendered diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid formula `{text}`: {message}")]
pub struct FormulaError {
    pub text: String,
    pub message: String,
    pub report: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{0} is not defined")]
    UnknownIdentifier(String),
    #[error("{0} is not a function")]
    UnknownFunction(String),
    #[error("{name} expects {expected} argument(s), got {actual}")]
    Arity {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{0} expects an identifier text argument")]
    InvalidArgument(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("max_cascade_depth must be at least 1")]
    ZeroCascadeDepth,
}
