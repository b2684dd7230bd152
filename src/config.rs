//! Loads the site configuration from a project's `config.yml`. See
//! [`Config::from_directory`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use gtmpl_value::Value;
use serde::Deserialize;
use spdlog::warn;
use url::Url;

/// The name of the project file `inkpress` looks for.
pub const PROJECT_FILE_NAME: &str = "config.yml";

#[derive(Deserialize)]
struct RecentPostsLimit(i64);
impl Default for RecentPostsLimit {
    fn default() -> Self {
        RecentPostsLimit(10)
    }
}

#[derive(Deserialize)]
struct Project {
    pub site_title: String,
    pub base_url: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub recent_posts_limit: RecentPostsLimit,

    #[serde(default = "default_posts_directory")]
    pub posts_directory: PathBuf,

    #[serde(default = "default_templates_directory")]
    pub templates_directory: PathBuf,

    #[serde(default)]
    pub partials: Vec<PathBuf>,

    #[serde(default = "default_public_directory")]
    pub public_directory: PathBuf,
}

fn default_language() -> String {
    String::from("en")
}

fn default_posts_directory() -> PathBuf {
    PathBuf::from("posts")
}

fn default_templates_directory() -> PathBuf {
    PathBuf::from("templates")
}

fn default_public_directory() -> PathBuf {
    PathBuf::from("public")
}

/// Facts about the build itself, exposed to templates as `config.build`.
/// These are the only inputs that differ between two builds of unchanged
/// sources.
#[derive(Clone, Debug, Default)]
pub struct BuildInfo {
    /// Whether this is a production build (`--prod`).
    pub production: bool,

    /// When the build ran, in local time.
    pub build_date: String,

    pub commit_hash: String,

    pub short_commit_hash: String,
}

impl BuildInfo {
    /// Collects build info for a project checked out at `project_root`. The
    /// commit hashes fall back to `unknown` outside of a git repository.
    pub fn collect(project_root: &Path, production: bool) -> BuildInfo {
        BuildInfo {
            production,
            build_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            commit_hash: git_rev_parse(project_root, &["HEAD"]),
            short_commit_hash: git_rev_parse(project_root, &["--short", "HEAD"]),
        }
    }

    fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("production".to_owned(), Value::Bool(self.production));
        m.insert("build_date".to_owned(), Value::String(self.build_date.clone()));
        m.insert("commit_hash".to_owned(), Value::String(self.commit_hash.clone()));
        m.insert(
            "short_commit_hash".to_owned(),
            Value::String(self.short_commit_hash.clone()),
        );
        Value::Object(m)
    }
}

fn git_rev_parse(project_root: &Path, args: &[&str]) -> String {
    Command::new("git")
        .arg("rev-parse")
        .args(args)
        .current_dir(project_root)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_owned())
        .unwrap_or_else(|| String::from("unknown"))
}

/// The site configuration. Every component receives the parts of this it
/// needs; nothing reads configuration from anywhere else.
#[derive(Clone, Debug)]
pub struct Config {
    /// The site's name, used in page titles and the feed.
    pub site_title: String,

    /// The URL the site is served from. Absolute links are built by
    /// appending site-relative paths to it verbatim, so it normally ends in
    /// `/`.
    pub base_url: String,

    /// The site description, used in the feed.
    pub description: String,

    /// The feed's language code.
    pub language: String,

    /// How many posts the home page lists. Validated when the home page is
    /// rendered.
    pub recent_posts_limit: i64,

    pub posts_source_directory: PathBuf,
    pub templates_directory: PathBuf,

    /// Template files prepended to every page template.
    pub partials: Vec<PathBuf>,

    pub public_directory: PathBuf,
    pub output_directory: PathBuf,
    pub build: BuildInfo,
}

impl Config {
    /// Searches `dir` and then its ancestors for a [`PROJECT_FILE_NAME`] file
    /// and loads it with [`Config::from_project_file`].
    pub fn from_directory(
        dir: &Path,
        output_directory: Option<&Path>,
        production: bool,
    ) -> Result<Config> {
        for candidate in dir.ancestors() {
            let path = candidate.join(PROJECT_FILE_NAME);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory, production);
            }
        }
        Err(anyhow!(
            "Could not find `{}` in `{}` or any parent directory",
            PROJECT_FILE_NAME,
            dir.display()
        ))
    }

    /// Loads the project file at `path`. Source directories are resolved
    /// relative to the file's directory, as is the output directory when
    /// `output_directory` is `None` (it defaults to `output`).
    pub fn from_project_file(
        path: &Path,
        output_directory: Option<&Path>,
        production: bool,
    ) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        let output_directory = match output_directory {
            Some(dir) => dir.to_owned(),
            None => project_root.join("output"),
        };
        Config::from_yaml(
            &contents,
            project_root,
            output_directory,
            BuildInfo::collect(project_root, production),
        )
        .with_context(|| format!("Loading configuration `{}`", path.display()))
    }

    /// Builds a [`Config`] from the contents of a project file.
    pub fn from_yaml(
        contents: &str,
        project_root: &Path,
        output_directory: PathBuf,
        build: BuildInfo,
    ) -> Result<Config> {
        let project: Project = serde_yaml::from_str(contents)?;

        Url::parse(&project.base_url)
            .with_context(|| format!("`base_url` must be an absolute URL: {}", project.base_url))?;
        if !project.base_url.ends_with('/') {
            warn!(
                "`base_url` ({}) doesn't end with `/`; links will be joined to it verbatim",
                project.base_url
            );
        }

        Ok(Config {
            site_title: project.site_title,
            base_url: project.base_url,
            description: project.description,
            language: project.language,
            recent_posts_limit: project.recent_posts_limit.0,
            posts_source_directory: project_root.join(project.posts_directory),
            templates_directory: project_root.join(project.templates_directory),
            partials: project.partials,
            public_directory: project_root.join(project.public_directory),
            output_directory,
            build,
        })
    }

    /// Converts the site-wide settings into the template [`Value`] every page
    /// receives as `config`.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site_title".to_owned(), Value::String(self.site_title.clone()));
        m.insert("base_url".to_owned(), Value::String(self.base_url.clone()));
        m.insert("description".to_owned(), Value::String(self.description.clone()));
        m.insert("language".to_owned(), Value::String(self.language.clone()));
        m.insert("build".to_owned(), self.build.to_value());
        Value::Object(m)
    }
}
