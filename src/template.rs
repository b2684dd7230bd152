//! Loads the site's page templates and renders them. Templates use Go's
//! `text/template` syntax via [`gtmpl`]; see [`TemplateEngine`] for the
//! interface the rest of the crate renders through.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use gtmpl::{Context, Template};
use gtmpl_value::{FuncError, Value};
use thiserror::Error;

use crate::slug::slugify;

/// The template for the home page.
pub const HOME_TEMPLATE: &str = "home.html";

/// The template for the archive page.
pub const ARCHIVE_TEMPLATE: &str = "archive.html";

/// The template for a single tag's listing page.
pub const TAG_TEMPLATE: &str = "tag.html";

/// The template for a single post page.
pub const POST_TEMPLATE: &str = "post.html";

/// Every template a site must provide.
pub const TEMPLATE_NAMES: [&str; 4] =
    [HOME_TEMPLATE, ARCHIVE_TEMPLATE, TAG_TEMPLATE, POST_TEMPLATE];

/// Turns a named template and a context into text.
pub trait TemplateEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String>;
}

/// The site's parsed templates, keyed by name. Every template can call
/// `slugify`, which is [`crate::slug::slugify`], e.g.
/// `<a href="tags/{{slugify .name}}.html">`.
pub struct Templates {
    templates: HashMap<String, Template>,
}

impl Templates {
    /// Loads every template in [`TEMPLATE_NAMES`] from `directory`. The
    /// contents of each file in `partials` (relative to `directory`) are
    /// prepended to every template, so shared `{{define}}` blocks such as a
    /// page layout only need to be written once.
    pub fn load(directory: &Path, partials: &[PathBuf]) -> Result<Templates> {
        let mut prefix = String::new();
        for partial in partials {
            prefix.push_str(&read_template_file(&directory.join(partial))?);
            prefix.push(' ');
        }

        let mut sources = Vec::with_capacity(TEMPLATE_NAMES.len());
        for name in TEMPLATE_NAMES.iter() {
            let contents = read_template_file(&directory.join(name))?;
            sources.push((*name, format!("{}{}", prefix, contents)));
        }
        Templates::from_sources(sources)
    }

    /// Parses templates from `(name, source)` pairs.
    pub fn from_sources<'n, I>(sources: I) -> Result<Templates>
    where
        I: IntoIterator<Item = (&'n str, String)>,
    {
        let mut templates = HashMap::new();
        for (name, source) in sources {
            templates.insert(name.to_owned(), parse_template(name, &source)?);
        }
        Ok(Templates { templates })
    }
}

impl TemplateEngine for Templates {
    fn render(&self, template_name: &str, context: Value) -> Result<String> {
        let template = self
            .templates
            .get(template_name)
            .ok_or_else(|| Error::UnknownTemplate(template_name.to_owned()))?;
        template
            .render(&Context::from(context))
            .map_err(|e| Error::Render {
                name: template_name.to_owned(),
                message: e.to_string(),
            })
    }
}

fn read_template_file(path: &Path) -> Result<String> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|err| Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        })?;
    Ok(contents)
}

fn parse_template(name: &str, source: &str) -> Result<Template> {
    let mut template = Template::default();
    // Functions must be registered before parsing.
    template.add_func("slugify", slugify_func);
    template.parse(source).map_err(|e| Error::Parse {
        name: name.to_owned(),
        message: e.to_string(),
    })?;
    Ok(template)
}

fn slugify_func(args: &[Value]) -> std::result::Result<Value, FuncError> {
    match args {
        [Value::String(text)] => Ok(Value::String(slugify(text))),
        _ => Err(FuncError::Generic(
            "slugify takes exactly one string argument".to_owned(),
        )),
    }
}

/// The result of a fallible templating operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or rendering templates.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {}", .path.display(), .err)]
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    #[error("parsing template `{name}`: {message}")]
    Parse { name: String, message: String },

    /// Returned when executing a template fails.
    #[error("rendering template `{name}`: {message}")]
    Render { name: String, message: String },

    /// Returned when a page asks for a template that wasn't loaded.
    #[error("no template named `{0}`")]
    UnknownTemplate(String),
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn object(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_render_with_slugify() -> Result<()> {
        let templates = Templates::from_sources(vec![(
            TAG_TEMPLATE,
            String::from(r#"<a href="tags/{{slugify .name}}.html">{{.name}}</a>"#),
        )])?;
        let context = object(&[("name", Value::String("Rust Lang".to_owned()))]);
        assert_eq!(
            r#"<a href="tags/rust-lang.html">Rust Lang</a>"#,
            templates.render(TAG_TEMPLATE, context)?
        );
        Ok(())
    }

    #[test]
    fn test_unknown_template() -> Result<()> {
        let templates = Templates::from_sources(Vec::new())?;
        assert!(matches!(
            templates.render(HOME_TEMPLATE, Value::Nil),
            Err(Error::UnknownTemplate(_))
        ));
        Ok(())
    }

    #[test]
    fn test_parse_error_names_template() {
        match Templates::from_sources(vec![(POST_TEMPLATE, String::from("{{if .x}}unclosed"))]) {
            Err(Error::Parse { name, .. }) => assert_eq!(POST_TEMPLATE, name),
            _ => panic!("expected a parse error"),
        }
    }

    #[test]
    fn test_load_prepends_partials() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_layout.html"),
            r#"{{define "header"}}<h1>{{.page_title}}</h1>{{end}}"#,
        )
        .unwrap();
        for name in TEMPLATE_NAMES.iter() {
            fs::write(
                dir.path().join(name),
                format!(r#"{{{{template "header" .}}}}{}"#, name),
            )
            .unwrap();
        }

        let templates = Templates::load(dir.path(), &[PathBuf::from("_layout.html")])?;
        let context = object(&[("page_title", Value::String("Archive".to_owned()))]);
        assert_eq!(
            "<h1>Archive</h1>archive.html",
            templates.render(ARCHIVE_TEMPLATE, context)?.trim()
        );
        Ok(())
    }

    #[test]
    fn test_load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        match Templates::load(dir.path(), &[]) {
            Err(Error::OpenTemplateFile { path, .. }) => {
                assert_eq!(dir.path().join(HOME_TEMPLATE), path)
            }
            _ => panic!("expected an open error"),
        }
    }
}
