//! Project configuration and its loader.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// File looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "pagekit.toml";

/// High-level configuration for a site project.
#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub serve: ServeConfig,
    pub deploy: DeployConfig,
    pub tools: Tools,
    /// Template context for the pages, e.g. the navigation menus.
    pub data: toml::Table,
}

/// Directories the pipeline reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Paths {
    /// Templates, styles, scripts, images and fonts.
    pub src: PathBuf,
    /// Intermediate compile output.
    pub temp: PathBuf,
    /// Final output, the directory that gets deployed.
    pub dist: PathBuf,
    /// Copied verbatim into `dist`.
    pub public: PathBuf,
    /// Exposed to the page templates as `pkg` when present.
    pub package: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            temp: PathBuf::from("temp"),
            dist: PathBuf::from("dist"),
            public: PathBuf::from("public"),
            package: PathBuf::from("package.json"),
        }
    }
}

/// Defaults of the preview server flags.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ServeConfig {
    pub port: u16,
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 2080,
            open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DeployConfig {
    pub branch: String,
    pub remote_url: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            branch: "gh-pages".into(),
            remote_url: "https://pages.github.com".into(),
        }
    }
}

/// Argument templates of the external tools.
///
/// The first element is the program. `{name}` placeholders are expanded by
/// the pipeline: `{src}`, `{temp}`, `{dist}` and `{public}` everywhere,
/// `{data}` for `page` and `watch_page`, `{root}`, `{port}` and `{open}` for
/// `serve`, and `{branch}` and `{remote_url}` for `deploy`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Tools {
    pub page: Vec<String>,
    pub style: Vec<String>,
    pub script: Vec<String>,
    pub image: Vec<String>,
    pub font: Vec<String>,
    pub useref: Vec<String>,
    pub htmlmin: Vec<String>,
    pub uglify: Vec<String>,
    pub cleancss: Vec<String>,
    pub eslint: Vec<String>,
    pub sass_lint: Vec<String>,
    pub serve: Vec<String>,
    pub deploy: Vec<String>,
    pub watch_page: Vec<String>,
    pub watch_style: Vec<String>,
    pub watch_script: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            page: argv(&[
                "swig",
                "render",
                "{src}/**/*.html",
                "--data",
                "{data}",
                "--out",
                "{temp}",
            ]),
            style: argv(&[
                "sass",
                "--no-source-map",
                "{src}/assets/styles:{temp}/assets/styles",
            ]),
            script: argv(&[
                "babel",
                "{src}/assets/scripts",
                "--out-dir",
                "{temp}/assets/scripts",
                "--presets",
                "@babel/preset-env",
            ]),
            image: argv(&[
                "imagemin",
                "{src}/assets/images/**",
                "--out-dir",
                "{dist}/assets/images",
            ]),
            font: argv(&[
                "imagemin",
                "{src}/assets/fonts/**",
                "--out-dir",
                "{dist}/assets/fonts",
            ]),
            useref: argv(&[
                "useref",
                "{temp}/**/*.html",
                "--search-path",
                "{temp}",
                "--search-path",
                ".",
                "--out",
                "{dist}",
            ]),
            htmlmin: argv(&[
                "html-minifier",
                "--input-dir",
                "{dist}",
                "--output-dir",
                "{dist}",
                "--file-ext",
                "html",
                "--collapse-whitespace",
                "--minify-css",
                "true",
                "--minify-js",
                "true",
                "--remove-comments",
            ]),
            uglify: argv(&["uglifyjs-folder", "{dist}", "--each", "--output", "{dist}"]),
            cleancss: argv(&["cleancss", "--batch", "--batch-suffix", "", "{dist}/**/*.css"]),
            eslint: argv(&["eslint", "{src}/assets/scripts"]),
            sass_lint: argv(&["sass-lint", "{src}/assets/styles/*.scss", "--verbose"]),
            serve: argv(&[
                "browser-sync",
                "start",
                "--server",
                "{root}",
                "--ss",
                "{src}",
                "--files",
                "{root}/**,{src}/assets/images/**,{src}/assets/fonts/**,{public}/**",
                "--port",
                "{port}",
                "--open={open}",
            ]),
            deploy: argv(&[
                "gh-pages",
                "--dist",
                "{dist}",
                "--branch",
                "{branch}",
                "--repo",
                "{remote_url}",
            ]),
            watch_page: argv(&[
                "chokidar",
                "{src}/**/*.html",
                "--command",
                "swig render {src}/**/*.html --data {data} --out {temp}",
            ]),
            watch_style: argv(&[
                "sass",
                "--watch",
                "--no-source-map",
                "{src}/assets/styles:{temp}/assets/styles",
            ]),
            watch_script: argv(&[
                "babel",
                "--watch",
                "{src}/assets/scripts",
                "--out-dir",
                "{temp}/assets/scripts",
                "--presets",
                "@babel/preset-env",
            ]),
        }
    }
}

impl Config {
    /// Load `pagekit.toml` from `dir`, falling back to the defaults when the
    /// file does not exist. Relative paths are anchored at `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE_NAME);
        let config = if path.is_file() {
            load_config(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Config::default()
        };
        Ok(config.with_root(dir))
    }

    /// Anchor every relative directory at `root`.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        for path in [
            &mut self.paths.src,
            &mut self.paths.temp,
            &mut self.paths.dist,
            &mut self.paths.public,
            &mut self.paths.package,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }

    /// Context handed to the page templates.
    ///
    /// `pkg` holds the parsed package manifest when it exists and `date` the
    /// build time in seconds since the epoch. Keys of `[data]` take precedence.
    pub fn site_data(&self) -> Result<serde_json::Value> {
        let mut data = serde_json::Map::new();
        let package = &self.paths.package;
        if package.is_file() {
            let text = std::fs::read_to_string(package)
                .map_err(|source| Error::io(format!("failed to read {}", package.display()), source))?;
            let pkg = serde_json::from_str(&text).map_err(|source| Error::Data {
                context: format!("failed to parse {}", package.display()),
                source,
            })?;
            data.insert("pkg".into(), pkg);
        }
        let date = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        data.insert("date".into(), date.into());

        let table = serde_json::to_value(&self.data).map_err(|source| Error::Data {
            context: "failed to convert [data]".into(),
            source,
        })?;
        if let serde_json::Value::Object(entries) = table {
            data.extend(entries);
        }
        Ok(serde_json::Value::Object(data))
    }
}

/// Load configuration from the provided path.
///
/// Every table is optional:
/// - `[paths]` with `src`, `temp`, `dist`, `public`
/// - `[serve]` with `port` and `open`
/// - `[deploy]` with `branch` and `remote_url`
/// - `[tools]` with one argument template per tool
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|source| Error::io(format!("failed to read {}", path.display()), source))?;
    toml::from_str(&text).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn loads_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[paths]
dist = "public_html"

[serve]
port = 8080

[tools]
deploy = ["rsync", "-a", "{dist}/", "host:{branch}"]
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.paths.dist, PathBuf::from("public_html"));
        assert_eq!(cfg.paths.src, PathBuf::from("src"));
        assert_eq!(cfg.serve.port, 8080);
        assert!(!cfg.serve.open);
        assert_eq!(cfg.deploy, DeployConfig::default());
        assert_eq!(cfg.tools.deploy[0], "rsync");
        assert_eq!(cfg.tools.style, Tools::default().style);
    }

    #[test]
    fn site_data_merges_package_and_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "my-site", "version": "1.2.0"}"#).unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[[data.menus]]
name = "Home"
link = "index.html"

[[data.menus]]
name = "About"
link = "about.html"
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap().with_root(dir.path());
        let data = cfg.site_data().unwrap();
        assert_eq!(data["pkg"]["name"], "my-site");
        assert_eq!(data["menus"][1]["link"], "about.html");
        assert!(data["date"].is_u64());
    }

    #[test]
    fn site_data_without_package() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::default().with_root(dir.path());
        let data = cfg.site_data().unwrap();
        assert!(data.get("pkg").is_none());
        assert!(data.get("date").is_some());
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[serve]\nport = \"not a number\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::discover(dir.path()).unwrap();
        assert_eq!(cfg.paths.dist, dir.path().join("dist"));
        assert_eq!(cfg.serve, ServeConfig::default());
    }

    #[test]
    fn with_root_keeps_absolute_paths() {
        let mut cfg = Config::default();
        let absolute = std::env::temp_dir().join("site-out");
        cfg.paths.dist = absolute.clone();
        let cfg = cfg.with_root("project");
        assert_eq!(cfg.paths.dist, absolute);
        assert_eq!(cfg.paths.src, Path::new("project").join("src"));
    }
}
