//! Named tasks and the steps they are built from.

use crate::{Error, Result};
use indexmap::IndexMap;

/// Directory the preview server serves first.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ServeRoot {
    Temp,
    Dist,
}

/// A single unit of work, usually one external tool invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    /// Remove `temp` and `dist`.
    Clean,
    Page,
    Style,
    Script,
    Image,
    Font,
    /// Copy `public` into `dist`.
    Public,
    Eslint,
    SassLint,
    /// Bundle references, minifying when `--production` resolves to true.
    Useref { production: bool },
    Serve { root: ServeRoot },
    Deploy,
    /// Recompile pages into `temp` whenever a template changes.
    WatchPage,
    WatchStyle,
    WatchScript,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Clean => "clean",
            Step::Page => "page",
            Step::Style => "style",
            Step::Script => "script",
            Step::Image => "image",
            Step::Font => "font",
            Step::Public => "public",
            Step::Eslint => "eslint",
            Step::SassLint => "sass-lint",
            Step::Useref { .. } => "useref",
            Step::Serve { .. } => "serve",
            Step::Deploy => "deploy",
            Step::WatchPage => "watch-page",
            Step::WatchStyle => "watch-style",
            Step::WatchScript => "watch-script",
        }
    }
}

/// Steps composed in series or in parallel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Step(Step),
    Series(Vec<Task>),
    Parallel(Vec<Task>),
}

impl Task {
    /// Every step of the task in declaration order.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        self.collect_steps(&mut steps);
        steps
    }

    fn collect_steps(&self, steps: &mut Vec<Step>) {
        match self {
            Task::Step(step) => steps.push(*step),
            Task::Series(tasks) | Task::Parallel(tasks) => {
                for task in tasks {
                    task.collect_steps(steps);
                }
            }
        }
    }
}

impl From<Step> for Task {
    fn from(step: Step) -> Self {
        Task::Step(step)
    }
}

/// A task registered under a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub name: String,
    pub description: String,
    pub task: Task,
}

/// Task lookup by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tasks: IndexMap<String, TaskEntry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tasks of a static site project.
    pub fn standard() -> Self {
        let compile = Task::Parallel(vec![Step::Page.into(), Step::Style.into(), Step::Script.into()]);
        let build = |production: bool| {
            Task::Series(vec![
                Step::Clean.into(),
                Task::Parallel(vec![
                    compile.clone(),
                    Step::Image.into(),
                    Step::Font.into(),
                    Step::Public.into(),
                ]),
                Step::Useref { production }.into(),
            ])
        };
        let watch = Task::Parallel(vec![
            Step::WatchPage.into(),
            Step::WatchStyle.into(),
            Step::WatchScript.into(),
        ]);
        let preview = |root: ServeRoot| Task::Parallel(vec![Step::Serve { root }.into(), watch.clone()]);

        let mut registry = Self::new();
        registry.register("clean", "Remove the temp and dist directories", Step::Clean.into());
        registry.register("compile", "Compile pages, styles and scripts into temp", compile.clone());
        registry.register("build", "Build the site into dist", build(false));
        registry.register(
            "serve",
            "Compile into temp and preview it with live reload",
            Task::Series(vec![
                Step::Clean.into(),
                compile.clone(),
                preview(ServeRoot::Temp),
            ]),
        );
        registry.register(
            "lint",
            "Lint scripts and styles",
            Task::Parallel(vec![Step::Eslint.into(), Step::SassLint.into()]),
        );
        registry.register(
            "start",
            "Build for production and preview dist",
            Task::Series(vec![build(true), preview(ServeRoot::Dist)]),
        );
        registry.register("deploy", "Publish dist to the hosting branch", Step::Deploy.into());
        registry
    }

    /// Add or replace a task.
    pub fn register(&mut self, name: impl Into<String>, description: impl Into<String>, task: Task) {
        let name = name.into();
        self.tasks.insert(
            name.clone(),
            TaskEntry {
                name,
                description: description.into(),
                task,
            },
        );
    }

    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks
            .get(name)
            .map(|entry| &entry.task)
            .ok_or_else(|| Error::UnknownTask(name.to_owned()))
    }

    pub fn entries(&self) -> impl Iterator<Item = &TaskEntry> {
        self.tasks.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_tasks_in_order() {
        let registry = Registry::standard();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["clean", "compile", "build", "serve", "lint", "start", "deploy"]);
    }

    #[test]
    fn build_runs_clean_first_and_useref_last() {
        let registry = Registry::standard();
        let steps = registry.get("build").unwrap().steps();
        assert_eq!(steps.first(), Some(&Step::Clean));
        assert_eq!(steps.last(), Some(&Step::Useref { production: false }));
        assert_eq!(steps.len(), 8);
    }

    #[test]
    fn start_builds_for_production_then_serves_dist() {
        let registry = Registry::standard();
        let steps = registry.get("start").unwrap().steps();
        assert!(steps.contains(&Step::Useref { production: true }));
        assert!(steps.contains(&Step::Serve { root: ServeRoot::Dist }));
        assert_eq!(steps.last(), Some(&Step::WatchScript));
    }

    #[test]
    fn serve_previews_temp() {
        let registry = Registry::standard();
        let steps = registry.get("serve").unwrap().steps();
        assert_eq!(
            steps,
            [
                Step::Clean,
                Step::Page,
                Step::Style,
                Step::Script,
                Step::Serve { root: ServeRoot::Temp },
                Step::WatchPage,
                Step::WatchStyle,
                Step::WatchScript,
            ]
        );
    }

    #[test]
    fn preview_runs_beside_the_watchers() {
        let registry = Registry::standard();
        for name in ["serve", "start"] {
            let Task::Series(stages) = registry.get(name).unwrap() else {
                panic!("`{name}` is not a series");
            };
            let Some(Task::Parallel(branches)) = stages.last() else {
                panic!("`{name}` does not end in a parallel stage");
            };
            assert!(matches!(branches[0], Task::Step(Step::Serve { .. })));
            assert_eq!(
                branches[1].steps(),
                [Step::WatchPage, Step::WatchStyle, Step::WatchScript]
            );
        }
    }

    #[test]
    fn unknown_task_is_an_error() {
        let registry = Registry::standard();
        assert!(matches!(registry.get("publish"), Err(Error::UnknownTask(name)) if name == "publish"));
    }
}
