//! Built-in rule predicates
//!
//! Every rule takes the field's raw value and the argument string configured
//! for it. An argument of `"false"` switches `required` and `email` off while
//! leaving the rule declared on the field.

use crate::error::{Result, RuleError};
use once_cell::sync::Lazy;
use fancy_regex::Regex as FancyRegex;
use regex::Regex;

/// Argument value that disables an on/off rule
pub const DISABLED_ARG: &str = "false";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// Valid when the rule is switched off or the value is non-empty
pub fn required(value: &str, arg: &str) -> bool {
    arg == DISABLED_ARG || !value.is_empty()
}

/// Compile a pattern argument so that it has to match the whole value.
///
/// Lookaround and backreferences are accepted, as they are in the `pattern`
/// attribute of browsers.
pub fn compile_pattern(pattern: &str) -> Result<FancyRegex> {
    FancyRegex::new(&format!("^(?:{})$", pattern)).map_err(|e| RuleError::InvalidPattern {
        pattern: pattern.to_string(),
        source: Box::new(e),
    })
}

/// Valid when the whole value matches `pattern`
///
/// Compiles the pattern on every call. The registry compiles it once per
/// field instead; use this for one-off checks.
pub fn pattern(value: &str, pattern: &str) -> Result<bool> {
    Ok(matches_pattern(&compile_pattern(pattern)?, value))
}

/// Run a compiled pattern. A match aborted by the backtracking limit counts
/// as a failure.
pub fn matches_pattern(regex: &FancyRegex, value: &str) -> bool {
    regex.is_match(value).unwrap_or_else(|err| {
        tracing::warn!(pattern = regex.as_str(), error = %err, "pattern match aborted");
        false
    })
}

/// Parse a length argument (`minlength`, `maxlength`)
pub fn parse_length(rule: &'static str, arg: &str) -> Result<usize> {
    arg.trim().parse().map_err(|_| RuleError::InvalidArgument {
        rule,
        arg: arg.to_string(),
        expected: "a non-negative integer",
    })
}

/// Valid when the value is empty or has at least `min` characters
pub fn min_length(value: &str, min: usize) -> bool {
    value.is_empty() || value.chars().count() >= min
}

/// Valid when the value has at most `max` characters
pub fn max_length(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// Valid email format
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Valid when switched off, empty, or a well-formed address
pub fn email(value: &str, arg: &str) -> bool {
    arg == DISABLED_ARG || value.is_empty() || is_valid_email(value)
}
