//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), indexing them ([`crate::index`]), rendering the pages
//! ([`crate::write`]), generating the RSS feed ([`crate::feed`]), and copying
//! public assets and post media ([`crate::assets`]).

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use spdlog::info;
use thiserror::Error;

use crate::assets::{self, copy_post_media, copy_public_assets, ASSETS_DIRECTORY};
use crate::config::Config;
use crate::feed::{self, write_feed, FeedConfig, FEED_FILE_NAME};
use crate::index::{self, PostIndex};
use crate::parser::{self, Parser};
use crate::template::{self, Templates};
use crate::write::{self, recent_posts_limit, Writer, ARCHIVE_PAGE, HOME_PAGE};

/// The entries of the output directory a build owns. Only these are removed
/// before a build; anything else in the output directory is left alone.
const MANAGED_OUTPUTS: [&str; 6] = [
    HOME_PAGE,
    ARCHIVE_PAGE,
    "tags",
    "posts",
    ASSETS_DIRECTORY,
    FEED_FILE_NAME,
];

/// Builds the site from a [`Config`] object. This calls into
/// [`Parser::parse_posts`], [`Writer::write_site`], and [`write_feed`] which
/// do the heavy-lifting. Everything that can fail on bad input (posts,
/// duplicate paths, the recent-posts limit, templates) is checked before the
/// output directory is touched.
pub fn build_site(config: &Config) -> Result<()> {
    let posts = Parser::new(&config.posts_source_directory).parse_posts()?;
    info!("Loaded {} posts", posts.len());

    let index = PostIndex::build(&posts)?;
    recent_posts_limit(config)?;
    let templates = Templates::load(&config.templates_directory, &config.partials)?;

    // Blow away the previous build's outputs so we don't have any stale pages
    // (e.g. for a deleted tag). The output directory itself is kept in case
    // the user pointed us at a directory with other contents.
    for name in MANAGED_OUTPUTS.iter() {
        clean(&config.output_directory.join(name))?;
    }
    fs::create_dir_all(&config.output_directory).map_err(|err| Error::Io {
        path: config.output_directory.clone(),
        err,
    })?;

    Writer {
        engine: &templates,
        config,
    }
    .write_site(&index)?;

    let feed_path = config.output_directory.join(FEED_FILE_NAME);
    info!("Writing feed `{}`", feed_path.display());
    let feed_file = File::create(&feed_path).map_err(|err| Error::Io {
        path: feed_path.clone(),
        err,
    })?;
    write_feed(
        &FeedConfig {
            title: &config.site_title,
            link: &config.base_url,
            description: &config.description,
            language: &config.language,
        },
        index.chronological.iter().copied(),
        feed_file,
    )?;

    copy_public_assets(
        &config.public_directory,
        &config.output_directory.join(ASSETS_DIRECTORY),
    )?;
    copy_post_media(&posts, &config.output_directory)?;

    info!("Site written to `{}`", config.output_directory.display());
    Ok(())
}

// Removes a previous build's output file or directory. Missing outputs are
// fine.
fn clean(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Error::Clean {
            path: path.to_owned(),
            err,
        }),
    }
}

/// The result of building a site.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// indexing, templating, writing, cleaning output directories, and copying
/// assets.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors loading posts.
    #[error(transparent)]
    Parse(#[from] parser::Error),

    /// Returned when the posts can't be indexed.
    #[error(transparent)]
    Index(#[from] index::Error),

    /// Returned for errors loading templates.
    #[error(transparent)]
    Template(#[from] template::Error),

    /// Returned for errors rendering or writing pages.
    #[error(transparent)]
    Write(#[from] write::Error),

    /// Returned for errors writing the feed.
    #[error(transparent)]
    Feed(#[from] feed::Error),

    /// Returned for errors copying assets or media.
    #[error(transparent)]
    Assets(#[from] assets::Error),

    /// Returned for I/O problems while cleaning output directories.
    #[error("cleaning `{}`: {}", .path.display(), .err)]
    Clean { path: PathBuf, err: io::Error },

    /// Returned for other I/O errors.
    #[error("`{}`: {}", .path.display(), .err)]
    Io { path: PathBuf, err: io::Error },
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use tempfile::TempDir;
    use walkdir::WalkDir;

    use super::*;
    use crate::config::BuildInfo;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn post(title: &str, date: &str, tags: &str) -> String {
        format!(
            "---\ntitle: {}\nsummary: About {}\npub_date: {}\ntags: [{}]\n---\n# {}\n",
            title, title, date, tags, title
        )
    }

    // Lays out a small project and returns its configuration.
    fn site(root: &Path) -> Config {
        write(
            &root.join("templates/home.html"),
            "{{range .posts}}{{.slug}} {{.public_url}}\n{{end}}",
        );
        write(
            &root.join("templates/archive.html"),
            "{{range .archive}}{{.year}}{{range .months}} {{.month}}{{end}}\n{{end}}",
        );
        write(
            &root.join("templates/tag.html"),
            "{{.tag.name}}:{{range .posts}} {{.slug}}{{end}}\n",
        );
        write(
            &root.join("templates/post.html"),
            "{{.post.title}}\n{{.post.content}}",
        );
        write(
            &root.join("posts/2024/1/a/post.md"),
            &post("A", "2024-01-05T09:00:00Z", "rust"),
        );
        write(
            &root.join("posts/2024/1/b/post.md"),
            &post("B", "2024-01-10T09:00:00Z", "rust, go"),
        );
        write(&root.join("posts/2024/1/b/notes.txt"), "attached");
        write(&root.join("public/css/site.css"), "body {}");

        Config::from_yaml(
            "site_title: Test\nbase_url: https://example.com/\n",
            root,
            root.join("output"),
            BuildInfo::default(),
        )
        .unwrap()
    }

    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                (
                    entry.path().strip_prefix(dir).unwrap().to_owned(),
                    fs::read(entry.path()).unwrap(),
                )
            })
            .collect()
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("reading `{}`: {}", path.display(), e))
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let root = TempDir::new().unwrap();
        let config = site(root.path());
        build_site(&config)?;

        let out = &config.output_directory;
        assert_eq!(
            "b https://example.com/posts/2024/1/b.html\na https://example.com/posts/2024/1/a.html\n",
            read(out.join("index.html"))
        );
        assert_eq!("2024 January\n", read(out.join("archive.html")));
        assert_eq!("go: b\n", read(out.join("tags/go.html")));
        assert_eq!("rust: b a\n", read(out.join("tags/rust.html")));
        assert!(read(out.join("posts/2024/1/a.html")).contains("<h1>A</h1>"));
        assert_eq!("attached", read(out.join("posts/2024/1/b/notes.txt")));
        assert_eq!("body {}", read(out.join("assets/css/site.css")));

        let feed = read(out.join("feed.xml"));
        let b = feed.find("posts/2024/1/b.html").unwrap();
        let a = feed.find("posts/2024/1/a.html").unwrap();
        assert!(b < a);
        Ok(())
    }

    #[test]
    fn test_build_is_reproducible() -> Result<()> {
        let root = TempDir::new().unwrap();
        let config = site(root.path());
        build_site(&config)?;
        let first = snapshot(&config.output_directory);
        build_site(&config)?;
        assert_eq!(first, snapshot(&config.output_directory));
        Ok(())
    }

    #[test]
    fn test_stale_outputs_are_removed() -> Result<()> {
        let root = TempDir::new().unwrap();
        let config = site(root.path());
        build_site(&config)?;
        assert!(config.output_directory.join("tags/go.html").exists());

        write(
            &root.path().join("posts/2024/1/b/post.md"),
            &post("B", "2024-01-10T09:00:00Z", "rust"),
        );
        write(&config.output_directory.join("CNAME"), "example.com");
        build_site(&config)?;
        assert!(!config.output_directory.join("tags/go.html").exists());
        assert!(config.output_directory.join("CNAME").exists());
        Ok(())
    }

    #[test]
    fn test_invalid_post_writes_nothing() {
        let root = TempDir::new().unwrap();
        let config = site(root.path());
        write(
            &root.path().join("posts/2024/2/c/post.md"),
            "---\ntitle: C\npub_date: 2024-02-01\n---\nbody\n",
        );

        match build_site(&config) {
            Err(Error::Parse(err)) => assert!(matches!(
                err.root(),
                parser::Error::MissingField("summary")
            )),
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert!(!config.output_directory.exists());
    }

    #[test]
    fn test_duplicate_posts_are_rejected() {
        let root = TempDir::new().unwrap();
        let config = site(root.path());
        write(
            &root.path().join("posts/elsewhere/a/post.md"),
            &post("Other A", "2024-01-20", "rust"),
        );
        assert!(matches!(
            build_site(&config),
            Err(Error::Index(index::Error::DuplicatePost { .. }))
        ));
        assert!(!config.output_directory.exists());
    }

    #[test]
    fn test_negative_limit_writes_nothing() {
        let root = TempDir::new().unwrap();
        let mut config = site(root.path());
        config.recent_posts_limit = -1;
        assert!(matches!(
            build_site(&config),
            Err(Error::Write(write::Error::InvalidRecentPostsLimit(-1)))
        ));
        assert!(!config.output_directory.exists());
    }
}
