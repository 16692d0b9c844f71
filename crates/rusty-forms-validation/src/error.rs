//! Rule configuration errors

use thiserror::Error;

/// Errors raised while compiling a rule argument
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("invalid argument `{arg}` for rule `{rule}`: expected {expected}")]
    InvalidArgument {
        rule: &'static str,
        arg: String,
        expected: &'static str,
    },

    #[error("unknown rule `{0}`")]
    UnknownRule(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;
