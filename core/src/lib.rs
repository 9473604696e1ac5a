//! Core crate for the pagekit static-site pipeline.
//!
//! The interesting piece is the [`resolver`]: it turns a [`RuleTable`] and the
//! raw arguments of an invocation into a [`ResolvedConfig`]. Everything else
//! wires the named tasks to the external tools that do the actual work.

pub mod config;
pub mod flags;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod rules;
pub mod runner;

pub use config::Config;
pub use pipeline::Pipeline;
pub use registry::{Registry, Step, Task};
pub use resolver::{
    resolve, DefaultPolicy, MissingValuePolicy, ResolveOptions, Resolution, ResolvedConfig,
    Warning,
};
pub use rules::{Rule, RuleTable, Value};
pub use runner::{CommandRunner, DryRunRunner, Invocation, ProcessRunner};

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for the pagekit workspace.
#[derive(Debug, Error)]
pub enum Error {
    /// A rule cannot be used to resolve arguments.
    #[error("invalid rule for `{flag}`: {reason}")]
    InvalidRule { flag: String, reason: String },
    #[error("`{0}` is not present in the resolved configuration")]
    MissingKey(String),
    #[error("invalid value `{value}` for `{key}`: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("unknown task `{0}`")]
    UnknownTask(String),
    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{context}: {source}")]
    Data {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid `{tool}` command template: {reason}")]
    Template { tool: String, reason: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    CommandFailed { program: String, status: String },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
