//! Resolve raw command-line arguments against a [`RuleTable`].
//!
//! Resolution runs in three steps, each available on its own:
//!
//! 1. [`expand_aliases`] indexes every rule under its flag and its alias,
//! 2. [`parse_arguments`] walks the arguments and records the flags it sees,
//! 3. [`apply_defaults`] fills every field that the arguments left open.
//!
//! [`resolve`] chains the three with the default [`ResolveOptions`].

use crate::rules::{Rule, RuleTable, Value};
use crate::{Error, Result};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// When a rule's default replaces the parsed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DefaultPolicy {
    /// Only when no flag for the field was given.
    #[default]
    WhenAbsent,
    /// Whenever the parsed value is falsy, so an explicit `0`, `""` or
    /// `false` is replaced as well.
    WhenFalsy,
}

/// What a value-taking flag does when no value follows it.
///
/// A value is missing when the flag is the last argument or is directly
/// followed by another recognized flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingValuePolicy {
    /// Assign nothing and report a [`Warning::MissingValue`].
    #[default]
    Warn,
    /// Take the next token anyway (or `Null` past the end), still reporting
    /// the warning.
    Consume,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub defaults: DefaultPolicy,
    pub missing_values: MissingValuePolicy,
}

impl ResolveOptions {
    /// Falsy defaults and unchecked value consumption, for callers that rely
    /// on the historical behavior.
    pub fn legacy() -> Self {
        Self {
            defaults: DefaultPolicy::WhenFalsy,
            missing_values: MissingValuePolicy::Consume,
        }
    }
}

/// Non-fatal findings collected while parsing arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("flag `{flag}` at position {position} expects a value")]
    MissingValue { flag: String, position: usize },
}

/// Every flag spelling mapped to the rule it belongs to.
///
/// A flag and its alias point at the same [`Rule`] of the source table.
#[derive(Debug, Clone)]
pub struct FlagIndex<'a> {
    flags: IndexMap<&'a str, &'a Rule>,
}

impl<'a> FlagIndex<'a> {
    pub fn get(&self, flag: &str) -> Option<&'a Rule> {
        self.flags.get(flag).copied()
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }

    pub fn flags(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.flags.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Index `table` under both flag names and aliases.
///
/// The table itself is left untouched. Rules are validated here, so a
/// malformed rule fails before any argument is looked at.
pub fn expand_aliases(table: &RuleTable) -> Result<FlagIndex<'_>> {
    let mut flags = IndexMap::with_capacity(table.len());
    for (flag, rule) in table.iter() {
        rule.validate(flag)?;
        flags.insert(flag, rule);
    }
    for (flag, rule) in table.iter() {
        let Some(alias) = rule.alias.as_deref() else {
            continue;
        };
        match flags.get(alias) {
            Some(existing) if !std::ptr::eq(*existing, rule) => {
                return Err(Error::InvalidRule {
                    flag: alias.to_owned(),
                    reason: format!("alias of `{flag}` is already bound to another rule"),
                });
            }
            Some(_) => {}
            None => {
                flags.insert(alias, rule);
            }
        }
    }
    Ok(FlagIndex { flags })
}

/// Field values taken from the arguments, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    pub values: IndexMap<String, Value>,
    pub warnings: Vec<Warning>,
}

pub fn parse_arguments<S: AsRef<str>>(
    index: &FlagIndex<'_>,
    arguments: &[S],
    policy: MissingValuePolicy,
) -> ParsedArguments {
    let mut parsed = ParsedArguments::default();
    for (position, token) in arguments.iter().enumerate() {
        let flag = token.as_ref();
        let Some(rule) = index.get(flag) else {
            continue;
        };
        if rule.value_omit {
            let value = rule.omitted_value.clone().unwrap_or(Value::Null);
            parsed.values.insert(rule.data_index.clone(), value);
            continue;
        }

        let next = arguments.get(position + 1).map(AsRef::as_ref);
        if next.map_or(true, |token| index.contains(token)) {
            parsed.warnings.push(Warning::MissingValue {
                flag: flag.to_owned(),
                position,
            });
            if policy == MissingValuePolicy::Warn {
                continue;
            }
        }
        let value = next.map(Value::from).unwrap_or(Value::Null);
        parsed.values.insert(rule.data_index.clone(), value);
    }
    parsed
}

/// Fill the fields `parsed` left open and order them as declared in `table`.
pub fn apply_defaults(
    table: &RuleTable,
    parsed: ParsedArguments,
    policy: DefaultPolicy,
) -> Resolution {
    let ParsedArguments {
        mut values,
        warnings,
    } = parsed;
    for rule in table.rules() {
        let fill = match policy {
            DefaultPolicy::WhenAbsent => !values.contains_key(&rule.data_index),
            DefaultPolicy::WhenFalsy => values
                .get(&rule.data_index)
                .map_or(true, |value| !value.is_truthy()),
        };
        if fill {
            values.insert(rule.data_index.clone(), rule.default.clone());
        }
    }

    let mut config = IndexMap::with_capacity(values.len());
    for rule in table.rules() {
        if let Some(value) = values.swap_remove(&rule.data_index) {
            config.insert(rule.data_index.clone(), value);
        }
    }
    Resolution {
        config: ResolvedConfig { values: config },
        warnings,
    }
}

/// Outcome of a resolution: the configuration plus any warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub config: ResolvedConfig,
    pub warnings: Vec<Warning>,
}

pub fn resolve_with<S: AsRef<str>>(
    table: &RuleTable,
    arguments: &[S],
    options: ResolveOptions,
) -> Result<Resolution> {
    let index = expand_aliases(table)?;
    let parsed = parse_arguments(&index, arguments, options.missing_values);
    let resolution = apply_defaults(table, parsed, options.defaults);
    debug!(config = ?resolution.config, "resolved arguments");
    Ok(resolution)
}

/// Resolve `arguments` with the default options, logging any warning.
pub fn resolve<S: AsRef<str>>(table: &RuleTable, arguments: &[S]) -> Result<ResolvedConfig> {
    let Resolution { config, warnings } = resolve_with(table, arguments, ResolveOptions::default())?;
    for warning in &warnings {
        warn!("{warning}");
    }
    Ok(config)
}

/// Field name to effective value, one entry per distinct data index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    values: IndexMap<String, Value>,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Truthiness of the field; absent fields are `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_truthy)
    }

    pub fn string(&self, key: &str) -> Result<String> {
        self.require(key).map(ToString::to_string)
    }

    /// Read a port number given either as an integer or as a numeric string.
    pub fn port(&self, key: &str) -> Result<u16> {
        let value = self.require(key)?;
        let port = match value {
            Value::Int(number) => u16::try_from(*number).ok(),
            Value::Str(text) => text.trim().parse::<u16>().ok(),
            Value::Bool(_) | Value::Null => None,
        };
        port.ok_or_else(|| Error::InvalidValue {
            key: key.to_owned(),
            value: value.to_string(),
            expected: "a port number",
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.get(key).ok_or_else(|| Error::MissingKey(key.to_owned()))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ResolvedConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
