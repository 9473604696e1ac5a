//! Property tests for argument resolution.

use pagekit_core::resolver::{resolve, resolve_with};
use pagekit_core::{ResolveOptions, Rule, RuleTable, Value};
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (1i64..65_536).prop_map(Value::Int),
        "[a-z]{1,8}".prop_map(Value::Str),
    ]
}

/// Tokens that never collide with a flag of the tables below.
fn arb_token() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn arb_noise() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_token(), 0..4)
}

fn value_table(default: Value) -> RuleTable {
    RuleTable::new().with("--port", Rule::value("port", default).alias("--p"))
}

fn switch_table(default: Value, omitted: Value) -> RuleTable {
    RuleTable::new().with("--open", Rule::value("open", default).omitted_value(omitted))
}

fn with_flag(mut before: Vec<String>, flag: &[&str], after: Vec<String>) -> Vec<String> {
    before.extend(flag.iter().map(|part| part.to_string()));
    before.extend(after);
    before
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The alias spelling resolves exactly like the canonical flag.
    #[test]
    fn prop_alias_matches_canonical(
        default in arb_value(),
        value in arb_token(),
        before in arb_noise(),
        after in arb_noise(),
    ) {
        let table = value_table(default);
        let canonical = with_flag(before.clone(), &["--port", value.as_str()], after.clone());
        let alias = with_flag(before, &["--p", value.as_str()], after);
        prop_assert_eq!(resolve(&table, &canonical).unwrap(), resolve(&table, &alias).unwrap());
    }

    /// A value-omitting flag yields its omitted value wherever it appears.
    #[test]
    fn prop_switch_presence_yields_omitted_value(
        default in arb_value(),
        omitted in arb_value(),
        before in arb_noise(),
        after in arb_noise(),
    ) {
        let table = switch_table(default.clone(), omitted.clone());
        let present = with_flag(before.clone(), &["--open"], after.clone());
        let resolved = resolve(&table, &present).unwrap();
        prop_assert_eq!(resolved.get("open"), Some(&omitted));

        let mut absent = before;
        absent.extend(after);
        let resolved = resolve(&table, &absent).unwrap();
        prop_assert_eq!(resolved.get("open"), Some(&default));
    }

    /// A value-taking flag yields the following token; absence yields the default.
    #[test]
    fn prop_value_flag_takes_next_token(
        default in arb_value(),
        value in arb_token(),
        before in arb_noise(),
        after in arb_noise(),
    ) {
        let table = value_table(default.clone());
        let present = with_flag(before.clone(), &["--port", value.as_str()], after.clone());
        let resolved = resolve(&table, &present).unwrap();
        let expected = Value::Str(value);
        prop_assert_eq!(resolved.get("port"), Some(&expected));

        let mut absent = before;
        absent.extend(after);
        let resolved = resolve(&table, &absent).unwrap();
        prop_assert_eq!(resolved.get("port"), Some(&default));
    }

    /// Resolving twice gives the same answer and leaves the table untouched.
    #[test]
    fn prop_resolution_is_idempotent(
        default in arb_value(),
        arguments in prop::collection::vec(
            prop_oneof![arb_token(), Just("--p".to_string()), Just("--port".to_string())],
            0..8,
        ),
        legacy in any::<bool>(),
    ) {
        let table = value_table(default);
        let snapshot = table.clone();
        let options = if legacy { ResolveOptions::legacy() } else { ResolveOptions::default() };
        let first = resolve_with(&table, &arguments, options).unwrap();
        let second = resolve_with(&table, &arguments, options).unwrap();
        prop_assert_eq!(first.config.len(), 1);
        prop_assert_eq!(first, second);
        prop_assert_eq!(table, snapshot);
    }
}
