//! Rule tables for the flags the standard tasks understand.

use crate::config::{DeployConfig, ServeConfig};
use crate::rules::{Rule, RuleTable};

pub const OPEN: &str = "open";
pub const PORT: &str = "port";
pub const PRODUCTION: &str = "production";
pub const BRANCH: &str = "branch";

/// `--open` and `--port`/`--p` for the preview server.
pub fn serve_rules(defaults: &ServeConfig) -> RuleTable {
    RuleTable::new()
        .with("--open", Rule::switch(OPEN, defaults.open))
        .with("--port", Rule::value(PORT, defaults.port).alias("--p"))
}

/// `--production`/`--prod`; `production` is the caller's default.
pub fn production_rules(production: bool) -> RuleTable {
    RuleTable::new().with(
        "--production",
        Rule::switch(PRODUCTION, production).alias("--prod"),
    )
}

/// `--branch` for the deployment target.
pub fn deploy_rules(defaults: &DeployConfig) -> RuleTable {
    RuleTable::new().with("--branch", Rule::value(BRANCH, defaults.branch.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::rules::Value;

    #[test]
    fn serve_flags_use_configured_defaults() {
        let defaults = ServeConfig {
            port: 4000,
            open: true,
        };
        let resolved = resolve::<&str>(&serve_rules(&defaults), &[]).unwrap();
        assert_eq!(resolved.port(PORT).unwrap(), 4000);
        assert!(resolved.flag(OPEN));
    }

    #[test]
    fn production_alias_turns_it_on() {
        let resolved = resolve(&production_rules(false), &["--prod"]).unwrap();
        assert_eq!(resolved.get(PRODUCTION), Some(&Value::Bool(true)));

        let resolved = resolve::<&str>(&production_rules(true), &[]).unwrap();
        assert!(resolved.flag(PRODUCTION));
    }

    #[test]
    fn branch_defaults_to_configured_branch() {
        let resolved = resolve::<&str>(&deploy_rules(&DeployConfig::default()), &[]).unwrap();
        assert_eq!(resolved.string(BRANCH).unwrap(), "gh-pages");
    }
}
