//! Execute a [`Task`] against a project [`Config`].

use crate::config::Config;
use crate::flags;
use crate::registry::{ServeRoot, Step, Task};
use crate::resolver::resolve;
use crate::runner::{CommandRunner, Invocation};
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn, Span};

/// Written to `temp` and handed to the page templates as `{data}`.
pub const SITE_DATA_FILE: &str = "site-data.json";

/// Placeholder name to expanded text.
type Vars = Vec<(&'static str, String)>;

/// Runs tasks, resolving step flags from the raw arguments of the invocation.
pub struct Pipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    arguments: &'a [String],
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner, arguments: &'a [String]) -> Self {
        Self {
            config,
            runner,
            arguments,
        }
    }

    /// Series stop at the first failure; parallel branches all finish and the
    /// first failure is reported.
    pub fn run(&self, task: &Task) -> Result<()> {
        match task {
            Task::Step(step) => self.run_step(*step),
            Task::Series(tasks) => tasks.iter().try_for_each(|task| self.run(task)),
            Task::Parallel(tasks) => std::thread::scope(|scope| {
                let dispatch = tracing::dispatcher::get_default(Clone::clone);
                let handles: Vec<_> = tasks
                    .iter()
                    .map(|task| {
                        let span = Span::current();
                        let dispatch = dispatch.clone();
                        scope.spawn(move || {
                            tracing::dispatcher::with_default(&dispatch, || {
                                span.in_scope(|| self.run(task))
                            })
                        })
                    })
                    .collect();
                let mut outcome = Ok(());
                for handle in handles {
                    let result = handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                    if outcome.is_ok() {
                        outcome = result;
                    }
                }
                outcome
            }),
        }
    }

    fn run_step(&self, step: Step) -> Result<()> {
        let _span = info_span!("step", name = step.name()).entered();
        info!("starting");
        let paths = &self.config.paths;
        let tools = &self.config.tools;
        match step {
            Step::Clean => {
                remove_dir(&paths.temp)?;
                remove_dir(&paths.dist)
            }
            Step::Public => copy_dir(&paths.public, &paths.dist),
            Step::Page => self.invoke("page", &tools.page, self.page_vars()?),
            Step::WatchPage => self.invoke("watch_page", &tools.watch_page, self.page_vars()?),
            Step::WatchStyle => self.invoke("watch_style", &tools.watch_style, self.vars()),
            Step::WatchScript => self.invoke("watch_script", &tools.watch_script, self.vars()),
            Step::Style => self.invoke("style", &tools.style, self.vars()),
            Step::Script => self.invoke("script", &tools.script, self.vars()),
            Step::Image => self.invoke("image", &tools.image, self.vars()),
            Step::Font => self.invoke("font", &tools.font, self.vars()),
            Step::Eslint => self.invoke("eslint", &tools.eslint, self.vars()),
            Step::SassLint => self.invoke("sass_lint", &tools.sass_lint, self.vars()),
            Step::Useref { production } => {
                let resolved = resolve(&flags::production_rules(production), self.arguments)?;
                self.invoke("useref", &tools.useref, self.vars())?;
                if resolved.flag(flags::PRODUCTION) {
                    info!("minifying output");
                    self.invoke("htmlmin", &tools.htmlmin, self.vars())?;
                    self.invoke("uglify", &tools.uglify, self.vars())?;
                    self.invoke("cleancss", &tools.cleancss, self.vars())?;
                }
                Ok(())
            }
            Step::Serve { root } => {
                let resolved = resolve(&flags::serve_rules(&self.config.serve), self.arguments)?;
                let root = match root {
                    ServeRoot::Temp => &paths.temp,
                    ServeRoot::Dist => &paths.dist,
                };
                let mut vars = self.vars();
                vars.push(("root", root.display().to_string()));
                vars.push(("port", resolved.port(flags::PORT)?.to_string()));
                vars.push(("open", resolved.flag(flags::OPEN).to_string()));
                self.invoke("serve", &tools.serve, vars)
            }
            Step::Deploy => {
                let resolved = resolve(&flags::deploy_rules(&self.config.deploy), self.arguments)?;
                let mut vars = self.vars();
                vars.push(("branch", resolved.string(flags::BRANCH)?));
                vars.push(("remote_url", self.config.deploy.remote_url.clone()));
                self.invoke("deploy", &tools.deploy, vars)
            }
        }
    }

    fn vars(&self) -> Vars {
        let paths = &self.config.paths;
        vec![
            ("src", paths.src.display().to_string()),
            ("temp", paths.temp.display().to_string()),
            ("dist", paths.dist.display().to_string()),
            ("public", paths.public.display().to_string()),
        ]
    }

    fn page_vars(&self) -> Result<Vars> {
        let mut vars = self.vars();
        vars.push(("data", self.write_site_data()?.display().to_string()));
        Ok(vars)
    }

    fn write_site_data(&self) -> Result<PathBuf> {
        let temp = &self.config.paths.temp;
        fs::create_dir_all(temp)
            .map_err(|err| Error::io(format!("failed to create {}", temp.display()), err))?;
        let data = self.config.site_data()?;
        let text = serde_json::to_string_pretty(&data).map_err(|source| Error::Data {
            context: "failed to encode site data".into(),
            source,
        })?;
        let path = temp.join(SITE_DATA_FILE);
        fs::write(&path, text)
            .map_err(|err| Error::io(format!("failed to write {}", path.display()), err))?;
        debug!(path = %path.display(), "wrote site data");
        Ok(path)
    }

    fn invoke(&self, tool: &str, template: &[String], vars: Vars) -> Result<()> {
        let invocation = expand_template(tool, template, &vars)?;
        self.runner.run(&invocation)
    }
}

/// Expand the `{name}` placeholders of `template` into an invocation.
pub fn expand_template(tool: &str, template: &[String], vars: &[(&str, String)]) -> Result<Invocation> {
    let template_error = |reason: String| Error::Template {
        tool: tool.to_owned(),
        reason,
    };
    let mut expanded = template
        .iter()
        .map(|arg| expand_arg(arg, vars).map_err(template_error))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let program = expanded
        .next()
        .filter(|program| !program.is_empty())
        .ok_or_else(|| template_error("no program given".into()))?;
    Ok(Invocation {
        program,
        args: expanded.collect(),
    })
}

fn expand_arg(arg: &str, vars: &[(&str, String)]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| format!("unclosed placeholder in `{arg}`"))?;
        let name = &after[..end];
        let value = vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
            .ok_or_else(|| format!("unknown placeholder `{{{name}}}`"))?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn remove_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::io(format!("failed to remove {}", path.display()), err)),
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        debug!(path = %from.display(), "nothing to copy");
        return Ok(());
    }
    fs::create_dir_all(to)
        .map_err(|err| Error::io(format!("failed to create {}", to.display()), err))?;
    let entries =
        fs::read_dir(from).map_err(|err| Error::io(format!("failed to read {}", from.display()), err))?;
    for entry in entries {
        let entry = entry.map_err(|err| Error::io(format!("failed to read {}", from.display()), err))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|err| Error::io(format!("failed to inspect {}", source.display()), err))?;
        if file_type.is_dir() {
            copy_dir(&source, &target)?;
        } else if file_type.is_symlink() && !source.is_file() {
            warn!(path = %source.display(), "skipping symlink that is not a file");
        } else {
            fs::copy(&source, &target).map_err(|err| {
                Error::io(format!("failed to copy {}", source.display()), err)
            })?;
        }
    }
    Ok(())
}
