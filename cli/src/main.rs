use clap::Parser;
use pagekit_core::config::{self, Config};
use pagekit_core::{CommandRunner, DryRunRunner, Pipeline, ProcessRunner, Registry};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

/// Build, preview and deploy a static site.
#[derive(Debug, Parser)]
#[command(name = "pagekit", version, about = "Static site build pipeline")]
struct Cli {
    /// Path to a project config file (defaults to ./pagekit.toml when present).
    #[arg(long, env = "PAGEKIT_CONFIG")]
    config: Option<PathBuf>,
    /// Print the tool invocations instead of running them.
    #[arg(long)]
    dry_run: bool,
    /// List the available tasks.
    #[arg(long)]
    list_tasks: bool,
    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
    /// Task to run.
    task: Option<String>,
    /// Flags for the task, e.g. `--open --port 3000` or `--prod`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let registry = Registry::standard();
    let Some(task_name) = cli.task.as_deref().filter(|_| !cli.list_tasks) else {
        for entry in registry.entries() {
            println!("{:<10}{}", entry.name, entry.description);
        }
        return Ok(());
    };

    let task = registry.get(task_name)?;
    let (config, root) = load_config(cli.config.as_deref())?;
    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ProcessRunner::new().in_dir(root))
    };

    let _span = info_span!("task", name = task_name).entered();
    Pipeline::new(&config, runner.as_ref(), &cli.args).run(task)?;
    info!(task = task_name, "finished");
    Ok(())
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| err as Box<dyn Error>)?;
    Ok(())
}

/// Load the config and the directory commands run from.
fn load_config(path: Option<&Path>) -> Result<(Config, PathBuf), Box<dyn Error>> {
    match path {
        Some(path) => {
            let root = project_root(path)?;
            let config = config::load_config(path)?.with_root(&root);
            Ok((config, root))
        }
        None => {
            let root = std::env::current_dir()?;
            Ok((Config::discover(&root)?, root))
        }
    }
}

/// Absolute directory holding the config file at `path`.
fn project_root(path: &Path) -> std::io::Result<PathBuf> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    if parent.is_absolute() {
        Ok(parent.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(parent))
    }
}
