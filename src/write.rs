//! Renders the site's HTML pages. [`Writer`] owns the policy for what goes
//! into each page's template context and where each page is written; turning
//! a context into markup is left to a [`TemplateEngine`].
//!
//! Every context carries `config` (see [`Config::to_value`]) and
//! `page_title`. The page-specific fields are:
//!
//! | Page | File | Template | Fields |
//! |---|---|---|---|
//! | Home | `index.html` | `home.html` | `posts`, `tags` |
//! | Archive | `archive.html` | `archive.html` | `archive` |
//! | Tag | `tags/{slug}.html` | `tag.html` | `tag`, `posts` |
//! | Post | `posts/{year}/{month}/{slug}.html` | `post.html` | `post`, `public_url` |

use std::collections::HashMap;
use std::convert::TryFrom;
use std::io;
use std::path::{Path, PathBuf};

use gtmpl_value::Value;
use spdlog::{info, warn};
use thiserror::Error;

use crate::config::Config;
use crate::index::PostIndex;
use crate::post::Post;
use crate::tag::Tag;
use crate::template::{
    self, TemplateEngine, ARCHIVE_TEMPLATE, HOME_TEMPLATE, POST_TEMPLATE, TAG_TEMPLATE,
};

/// The home page's file name.
pub const HOME_PAGE: &str = "index.html";

/// The archive page's file name.
pub const ARCHIVE_PAGE: &str = "archive.html";

/// Responsible for building template contexts and writing HTML pages to disk
/// from an indexed set of posts.
pub struct Writer<'a> {
    /// Renders the page contexts.
    pub engine: &'a dyn TemplateEngine,

    /// The site configuration. Pages are written under
    /// `config.output_directory` and absolute links are built from
    /// `config.base_url`.
    pub config: &'a Config,
}

impl Writer<'_> {
    /// Writes every page of the site. The recent-posts limit is validated
    /// before anything is written.
    pub fn write_site(&self, index: &PostIndex) -> Result<()> {
        let limit = recent_posts_limit(self.config)?;
        self.write_home_page(index, limit)?;
        self.write_archive_page(index)?;
        self.write_tag_pages(index)?;
        self.write_post_pages(index)
    }

    /// Writes `index.html`, listing the `limit` most recent posts and every
    /// tag.
    pub fn write_home_page(&self, index: &PostIndex, limit: usize) -> Result<()> {
        info!("Rendering home page");
        let tags = index
            .tags()
            .map(|name| Tag::new(name).to_value(&self.config.base_url))
            .collect();
        let context = self.context(
            "Home",
            vec![
                ("posts", self.post_list(index.recent(limit))),
                ("tags", Value::Array(tags)),
            ],
        );
        self.write_page(
            &self.config.output_directory.join(HOME_PAGE),
            HOME_TEMPLATE,
            context,
        )
    }

    /// Writes `archive.html`, listing every post grouped by year and month.
    pub fn write_archive_page(&self, index: &PostIndex) -> Result<()> {
        info!("Rendering archive page");
        let archive = index
            .archive()
            .iter()
            .map(|year| {
                let months = year
                    .months
                    .iter()
                    .map(|month| {
                        object(vec![
                            ("month", Value::String(month.name().to_owned())),
                            ("number", Value::from(month.month)),
                            ("posts", self.post_list(&month.posts)),
                        ])
                    })
                    .collect();
                object(vec![
                    ("year", Value::from(year.year)),
                    ("months", Value::Array(months)),
                ])
            })
            .collect();
        let context = self.context("Archive", vec![("archive", Value::Array(archive))]);
        self.write_page(
            &self.config.output_directory.join(ARCHIVE_PAGE),
            ARCHIVE_TEMPLATE,
            context,
        )
    }

    /// Writes one page per tag to `tags/{slug}.html`. Distinct labels that
    /// share a slug are written to the same file, so the last one wins; a
    /// warning is logged when that happens, and when a label has no
    /// alphanumeric characters to name its page after.
    pub fn write_tag_pages(&self, index: &PostIndex) -> Result<()> {
        info!("Rendering tag pages");
        let mut written: HashMap<String, &str> = HashMap::new();
        for (name, posts) in index.by_tag.iter() {
            let tag = Tag::new(name);
            if tag.has_empty_slug() {
                warn!(
                    "Tag `{}` has no letters or digits; its page will be `{}`",
                    name,
                    tag.path()
                );
            }
            if let Some(previous) = written.insert(tag.slug.clone(), name) {
                warn!(
                    "Tags `{}` and `{}` both map to `{}`; only `{}` will be published",
                    previous,
                    name,
                    tag.path(),
                    name
                );
            }

            let context = self.context(
                name,
                vec![
                    ("tag", tag.to_value(&self.config.base_url)),
                    ("posts", self.post_list(posts)),
                ],
            );
            self.write_page(
                &self.config.output_directory.join(tag.path()),
                TAG_TEMPLATE,
                context,
            )?;
        }
        Ok(())
    }

    /// Writes each post to its canonical path, creating the year and month
    /// directories as needed.
    pub fn write_post_pages(&self, index: &PostIndex) -> Result<()> {
        info!("Rendering posts");
        for post in index.chronological.iter() {
            let context = self.context(
                &post.title,
                vec![
                    ("post", post.to_value(&self.config.base_url)),
                    (
                        "public_url",
                        Value::String(post.public_url(&self.config.base_url)),
                    ),
                ],
            );
            self.write_page(
                &post.output_path(&self.config.output_directory),
                POST_TEMPLATE,
                context,
            )?;
        }
        Ok(())
    }

    fn post_list(&self, posts: &[&Post]) -> Value {
        Value::Array(
            posts
                .iter()
                .map(|p| p.to_value(&self.config.base_url))
                .collect(),
        )
    }

    fn context(&self, page_title: &str, fields: Vec<(&str, Value)>) -> Value {
        let mut fields = fields;
        fields.push(("config", self.config.to_value()));
        fields.push(("page_title", Value::String(page_title.to_owned())));
        object(fields)
    }

    /// Renders `context` with `template` and writes the result to `path`.
    fn write_page(&self, path: &Path, template: &str, context: Value) -> Result<()> {
        let rendered = self.engine.render(template, context)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Write {
                path: dir.to_owned(),
                err,
            })?;
        }
        std::fs::write(path, rendered).map_err(|err| Error::Write {
            path: path.to_owned(),
            err,
        })
    }
}

/// Returns the configured recent-posts limit, failing if it's negative.
pub fn recent_posts_limit(config: &Config) -> Result<usize> {
    usize::try_from(config.recent_posts_limit)
        .map_err(|_| Error::InvalidRecentPostsLimit(config.recent_posts_limit))
}

fn object(fields: Vec<(&str, Value)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect(),
    )
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when `recent_posts_limit` is negative.
    #[error("`recent_posts_limit` must not be negative, got {0}")]
    InvalidRecentPostsLimit(i64),

    /// An error during templating.
    #[error(transparent)]
    Template(#[from] template::Error),

    /// An error writing an output file or creating its directory.
    #[error("writing `{}`: {}", .path.display(), .err)]
    Write { path: PathBuf, err: io::Error },
}

#[cfg(test)]
pub(crate) mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::BuildInfo;
    use crate::post::test::fixture;
    use crate::template::Templates;

    /// Minimal templates that list post slugs, one per line.
    pub(crate) fn templates() -> Templates {
        Templates::from_sources(vec![
            (
                HOME_TEMPLATE,
                String::from(
                    "{{.page_title}}\n{{range .posts}}{{.slug}}\n{{end}}tags:{{range .tags}} {{.name}}={{.url}}{{end}}\n",
                ),
            ),
            (
                ARCHIVE_TEMPLATE,
                String::from(
                    "{{range .archive}}{{.year}}\n{{range .months}}  {{.month}}:{{range .posts}} {{.slug}}{{end}}\n{{end}}{{end}}",
                ),
            ),
            (
                TAG_TEMPLATE,
                String::from("{{.tag.name}}\n{{range .posts}}{{.slug}}\n{{end}}"),
            ),
            (
                POST_TEMPLATE,
                String::from("<title>{{.page_title}} | {{.config.site_title}}</title>\n{{.public_url}}\n{{.post.content}}"),
            ),
        ])
        .unwrap()
    }

    pub(crate) fn config(output_directory: &Path, recent_posts_limit: i64) -> Config {
        Config::from_yaml(
            &format!(
                "site_title: Test Site\nbase_url: https://example.com/\nrecent_posts_limit: {}\n",
                recent_posts_limit
            ),
            output_directory,
            output_directory.to_owned(),
            BuildInfo::default(),
        )
        .unwrap()
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("reading `{}`: {}", path.display(), e))
    }

    fn five_posts() -> Vec<Post> {
        (1..=5)
            .map(|day| fixture(&format!("p{}", day), &format!("2024-01-0{}", day), &[]))
            .collect()
    }

    #[test]
    fn test_home_page_lists_recent_posts() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 2);
        let templates = templates();
        let posts = five_posts();
        let index = PostIndex::build(&posts).unwrap();

        Writer { engine: &templates, config: &config }.write_site(&index)?;
        assert_eq!("Home\np5\np4\ntags:\n", read(out.path().join(HOME_PAGE)));
        Ok(())
    }

    #[test]
    fn test_home_page_limit_larger_than_post_count() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 50);
        let templates = templates();
        let posts = five_posts();
        let index = PostIndex::build(&posts).unwrap();

        let writer = Writer { engine: &templates, config: &config };
        writer.write_home_page(&index, recent_posts_limit(&config)?)?;
        assert_eq!(
            "Home\np5\np4\np3\np2\np1\ntags:\n",
            read(out.path().join(HOME_PAGE))
        );
        Ok(())
    }

    #[test]
    fn test_negative_limit_fails_before_writing() {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), -1);
        let templates = templates();
        let posts = five_posts();
        let index = PostIndex::build(&posts).unwrap();

        match (Writer { engine: &templates, config: &config }).write_site(&index) {
            Err(Error::InvalidRecentPostsLimit(-1)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(0, fs::read_dir(out.path()).unwrap().count());
    }

    #[test]
    fn test_tag_pages() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 10);
        let templates = templates();
        let posts = vec![
            fixture("both", "2024-03-01", &["go", "golang"]),
            fixture("older", "2024-02-01", &["go"]),
        ];
        let index = PostIndex::build(&posts).unwrap();

        Writer { engine: &templates, config: &config }.write_site(&index)?;
        assert_eq!("go\nboth\nolder\n", read(out.path().join("tags/go.html")));
        assert_eq!("golang\nboth\n", read(out.path().join("tags/golang.html")));
        assert_eq!(
            "Home\nboth\nolder\ntags: go=https://example.com/tags/go.html golang=https://example.com/tags/golang.html\n",
            read(out.path().join(HOME_PAGE))
        );
        Ok(())
    }

    #[test]
    fn test_tag_pages_are_named_by_slug() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 10);
        let templates = templates();
        let posts = vec![fixture("p", "2024-03-01", &["Rust Lang"])];
        let index = PostIndex::build(&posts).unwrap();

        let writer = Writer { engine: &templates, config: &config };
        writer.write_tag_pages(&index)?;
        assert_eq!("Rust Lang\np\n", read(out.path().join("tags/rust-lang.html")));
        Ok(())
    }

    #[test]
    fn test_punctuation_only_tag_is_still_written() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 10);
        let templates = templates();
        let posts = vec![fixture("p", "2024-03-01", &["???", "C++"])];
        let index = PostIndex::build(&posts).unwrap();

        let writer = Writer { engine: &templates, config: &config };
        writer.write_tag_pages(&index)?;
        assert_eq!("C++\np\n", read(out.path().join("tags/c.html")));
        assert_eq!("???\np\n", read(out.path().join("tags/.html")));
        Ok(())
    }

    #[test]
    fn test_archive_page() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 10);
        let templates = templates();
        let posts = vec![
            fixture("a", "2024-01-05", &[]),
            fixture("b", "2024-01-10", &[]),
            fixture("c", "2023-11-01", &[]),
        ];
        let index = PostIndex::build(&posts).unwrap();

        let writer = Writer { engine: &templates, config: &config };
        writer.write_archive_page(&index)?;
        assert_eq!(
            "2024\n  January: b a\n2023\n  November: c\n",
            read(out.path().join(ARCHIVE_PAGE))
        );
        Ok(())
    }

    #[test]
    fn test_post_page_public_url_round_trips() -> Result<()> {
        let out = TempDir::new().unwrap();
        let config = config(out.path(), 10);
        let templates = templates();
        let posts = vec![fixture("hello", "2024-01-05", &[])];
        let index = PostIndex::build(&posts).unwrap();

        let writer = Writer { engine: &templates, config: &config };
        writer.write_post_pages(&index)?;
        let page = read(out.path().join("posts/2024/1/hello.html"));
        let mut lines = page.lines();
        assert_eq!(Some("<title>Title of hello | Test Site</title>"), lines.next());
        assert_eq!(
            Some(format!("{}{}", config.base_url, posts[0].canonical_path()).as_str()),
            lines.next()
        );
        assert_eq!(Some("<p>hello</p>"), lines.next());
        Ok(())
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let out = TempDir::new().unwrap();
        // A file where the `posts` directory should go.
        fs::write(out.path().join("posts"), "").unwrap();
        let config = config(out.path(), 10);
        let templates = templates();
        let posts = vec![fixture("hello", "2024-01-05", &[])];
        let index = PostIndex::build(&posts).unwrap();

        let writer = Writer { engine: &templates, config: &config };
        assert!(matches!(
            writer.write_post_pages(&index),
            Err(Error::Write { .. })
        ));
    }
}
