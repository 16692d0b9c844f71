//! Rule registry and compiled per-field rule sets
//!
//! The registry maps rule names to factories. A factory turns the argument
//! configured on a field into a [`Predicate`] once, when the field is first
//! seen, so a pattern is compiled a single time per field rather than on
//! every keystroke.

use crate::error::{Result, RuleError};
use crate::rules;
use std::fmt;
use std::sync::Arc;

/// A rule bound to its argument, ready to test values
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Builds a [`Predicate`] from a rule argument
pub type RuleFactory = fn(&str) -> Result<Predicate>;

fn required_rule(arg: &str) -> Result<Predicate> {
    let arg = arg.to_string();
    Ok(Arc::new(move |value: &str| rules::required(value, &arg)))
}

fn pattern_rule(arg: &str) -> Result<Predicate> {
    let regex = rules::compile_pattern(arg)?;
    Ok(Arc::new(move |value: &str| rules::matches_pattern(&regex, value)))
}

fn min_length_rule(arg: &str) -> Result<Predicate> {
    let min = rules::parse_length("minlength", arg)?;
    Ok(Arc::new(move |value: &str| rules::min_length(value, min)))
}

fn max_length_rule(arg: &str) -> Result<Predicate> {
    let max = rules::parse_length("maxlength", arg)?;
    Ok(Arc::new(move |value: &str| rules::max_length(value, max)))
}

fn email_rule(arg: &str) -> Result<Predicate> {
    let arg = arg.to_string();
    Ok(Arc::new(move |value: &str| rules::email(value, &arg)))
}

/// Ordered set of named rules
///
/// Order matters only for short-circuiting: rule sets are evaluated in
/// registration order and stop at the first failing rule.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: Vec<(String, RuleFactory)>,
}

impl RuleRegistry {
    /// Registry with the default rules: `required` and `pattern`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("required", required_rule);
        registry.register("pattern", pattern_rule);
        registry
    }

    /// Registry with no rules at all
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Default rules plus `minlength`, `maxlength` and `email`
    pub fn extended() -> Self {
        let mut registry = Self::new();
        registry.register("minlength", min_length_rule);
        registry.register("maxlength", max_length_rule);
        registry.register("email", email_rule);
        registry
    }

    /// Add a rule, or replace the factory of an existing one in place.
    /// Returns the replaced factory.
    pub fn register(&mut self, name: impl Into<String>, factory: RuleFactory) -> Option<RuleFactory> {
        let name = name.into();
        match self.rules.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, factory)),
            None => {
                self.rules.push((name, factory));
                None
            }
        }
    }

    /// Registered rule names in evaluation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factory(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn factory(&self, name: &str) -> Option<RuleFactory> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, f)| *f)
    }

    /// Compile a rule, surfacing configuration errors
    pub fn try_compile(&self, name: &str, arg: &str) -> Result<CompiledRule> {
        let factory = self
            .factory(name)
            .ok_or_else(|| RuleError::UnknownRule(name.to_string()))?;
        Ok(CompiledRule {
            name: name.to_string(),
            arg: arg.to_string(),
            predicate: Some(factory(arg)?),
        })
    }

    /// Compile a rule, failing closed on configuration errors.
    ///
    /// A rule whose argument cannot be compiled reports every value as
    /// invalid; the error is logged rather than returned.
    pub fn compile(&self, name: &str, arg: &str) -> CompiledRule {
        self.try_compile(name, arg).unwrap_or_else(|err| {
            tracing::warn!(rule = name, arg, error = %err, "rule misconfigured, failing closed");
            CompiledRule {
                name: name.to_string(),
                arg: arg.to_string(),
                predicate: None,
            }
        })
    }

    /// Evaluate one rule against a value without keeping the compiled form
    pub fn evaluate(&self, name: &str, value: &str, arg: &str) -> bool {
        self.compile(name, arg).check(value)
    }

    /// Compile `(name, arg)` pairs into a rule set ordered like the registry.
    /// Names the registry does not know are skipped.
    pub fn compile_set<'a, I>(&self, pairs: I) -> RuleSet
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut pairs: Vec<(&str, &str)> = pairs
            .into_iter()
            .filter(|(name, _)| self.contains(name))
            .collect();
        pairs.sort_by_key(|(name, _)| self.rules.iter().position(|(n, _)| n == name));

        RuleSet {
            rules: pairs
                .into_iter()
                .map(|(name, arg)| self.compile(name, arg))
                .collect(),
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A rule bound to the argument configured on one field
#[derive(Clone)]
pub struct CompiledRule {
    name: String,
    arg: String,
    predicate: Option<Predicate>,
}

impl CompiledRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg(&self) -> &str {
        &self.arg
    }

    /// True when the argument failed to compile
    pub fn is_misconfigured(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn check(&self, value: &str) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(value),
            None => false,
        }
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.name)
            .field("arg", &self.arg)
            .field("misconfigured", &self.is_misconfigured())
            .finish()
    }
}

/// All rules configured on one field
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Logical AND over every rule, stopping at the first failure.
    /// An empty set accepts every value.
    pub fn evaluate(&self, value: &str) -> bool {
        self.rules.iter().all(|rule| rule.check(value))
    }

    /// Argument configured for `name`, if the rule is present
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.rules.iter().find(|r| r.name == name).map(|r| r.arg())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
