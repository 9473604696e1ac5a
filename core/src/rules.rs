//! Flag rules and the tables that group them.

use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// A configuration value produced by a flag, a default or an omitted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    /// No value at all, e.g. a value-taking flag at the end of the arguments.
    Null,
}

impl Value {
    /// Scripting-style truthiness: `false`, `0`, `""` and `Null` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(value) => *value,
            Value::Int(value) => *value != 0,
            Value::Str(value) => !value.is_empty(),
            Value::Null => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Str(value) => f.write_str(value),
            Value::Null => Ok(()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

/// Describes one recognized flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Field of the resolved configuration this flag writes to.
    pub data_index: String,
    /// Value used when the flag is not given.
    pub default: Value,
    /// The flag takes no value; its presence assigns `omitted_value`.
    pub value_omit: bool,
    pub omitted_value: Option<Value>,
    /// Second spelling that resolves to this very rule.
    pub alias: Option<String>,
}

impl Rule {
    /// A flag followed by its value, e.g. `--port 3000`.
    pub fn value(data_index: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            data_index: data_index.into(),
            default: default.into(),
            value_omit: false,
            omitted_value: None,
            alias: None,
        }
    }

    /// A flag whose presence alone sets the field to `true`, e.g. `--open`.
    pub fn switch(data_index: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::value(data_index, default).omitted_value(true)
    }

    /// Make the flag value-omitting, assigning `value` when it is present.
    pub fn omitted_value(mut self, value: impl Into<Value>) -> Self {
        self.value_omit = true;
        self.omitted_value = Some(value.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub(crate) fn validate(&self, flag: &str) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidRule {
            flag: flag.to_owned(),
            reason: reason.to_owned(),
        };
        if flag.is_empty() {
            return Err(invalid("flag name is empty"));
        }
        if self.data_index.is_empty() {
            return Err(invalid("data index is empty"));
        }
        if self.value_omit && self.omitted_value.is_none() {
            return Err(invalid("value-omitting flag has no omitted value"));
        }
        if matches!(self.alias.as_deref(), Some("")) {
            return Err(invalid("alias is empty"));
        }
        Ok(())
    }
}

/// Flag name to rule, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: IndexMap<String, Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RuleTable::insert`].
    pub fn with(mut self, flag: impl Into<String>, rule: Rule) -> Self {
        self.insert(flag, rule);
        self
    }

    /// Insert a rule, returning the one previously registered under `flag`.
    pub fn insert(&mut self, flag: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.rules.insert(flag.into(), rule)
    }

    pub fn get(&self, flag: &str) -> Option<&Rule> {
        self.rules.get(flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(flag, rule)| (flag.as_str(), rule))
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Rule)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (S, Rule)>>(iter: I) -> Self {
        let mut table = RuleTable::new();
        for (flag, rule) in iter {
            table.insert(flag, rule);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_scripting_rules() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Int(-1).is_truthy());
    }

    #[test]
    fn switch_sets_omitted_value() {
        let rule = Rule::switch("open", false);
        assert!(rule.value_omit);
        assert_eq!(rule.omitted_value, Some(Value::Bool(true)));
        assert_eq!(rule.default, Value::Bool(false));
    }

    #[test]
    fn validation_rejects_malformed_rules() {
        assert!(Rule::value("", 1i64).validate("--x").is_err());
        assert!(Rule::value("x", 1i64).validate("").is_err());
        assert!(Rule::value("x", 1i64).alias("").validate("--x").is_err());

        let mut rule = Rule::switch("x", false);
        rule.omitted_value = None;
        let err = rule.validate("--x").unwrap_err();
        assert!(matches!(err, Error::InvalidRule { ref flag, .. } if flag == "--x"));
    }

    #[test]
    fn table_keeps_declaration_order() {
        let table = RuleTable::new()
            .with("--z", Rule::value("z", 0i64))
            .with("--a", Rule::value("a", 0i64));
        let flags: Vec<_> = table.iter().map(|(flag, _)| flag).collect();
        assert_eq!(flags, ["--z", "--a"]);
    }
}
