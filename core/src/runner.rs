//! Command runner abstractions.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// A fully expanded external tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Trait describing how to execute external tools.
pub trait CommandRunner: Sync {
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Spawns each invocation and waits for it to exit.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    current_dir: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command from `dir` instead of the current directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        debug!(command = %invocation, "spawning");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        let status = command
            .status()
            .map_err(|source| Error::io(format!("failed to run `{}`", invocation.program), source))?;
        if !status.success() {
            return Err(Error::CommandFailed {
                program: invocation.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// A command runner that only logs what it would run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        info!(command = %invocation, "dry run");
        Ok(())
    }
}
