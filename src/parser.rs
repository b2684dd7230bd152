//! Defines the [`Parser`] and [`Error`] types. Also defines the logic for
//! parsing posts from the file system into memory. See [`parse_document`] for
//! the document format and [`Parser::parse_posts`] for the directory layout.

use std::ffi::OsStr;
use std::fs::{read_dir, File};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use spdlog::{debug, warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::index::sort_chronologically;
use crate::markdown;
use crate::post::{InvalidDateError, Post, PublicationDate};

/// The file name every post's source document must have.
pub const POST_FILE_NAME: &str = "post.md";

const FENCE: &str = "---";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `source_directory` is searched recursively for post documents.
    source_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(source_directory: &'a Path) -> Parser<'a> {
        Parser { source_directory }
    }

    /// Searches the source directory for post documents and returns the
    /// posts sorted by date (most recent first). Posts with equal dates keep
    /// their discovery order, and discovery walks the tree in file name order
    /// so the result is the same on every run.
    ///
    /// Each post lives in its own directory, which names the post:
    ///
    /// ```text
    /// posts/
    ///   2024/
    ///     hello-world/
    ///       post.md
    ///       photo.jpg
    ///       _draft-notes.txt
    /// ```
    ///
    /// Here the post's slug is `hello-world` and `photo.jpg` is recorded as a
    /// media file; files starting with `_` are ignored. A document placed
    /// directly in the source directory has no slug and is skipped with a
    /// warning, and a missing source directory yields no posts.
    pub fn parse_posts(&self) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        if !self.source_directory.is_dir() {
            warn!(
                "No posts directory found at `{}`; building an empty site",
                self.source_directory.display()
            );
            return Ok(posts);
        }

        let walker = WalkDir::new(self.source_directory)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file() || entry.file_name() != POST_FILE_NAME {
                continue;
            }

            let path = entry.path();
            match slug_for(self.source_directory, path) {
                Some(slug) => posts.push(self.parse_post(path, slug)?),
                None => warn!(
                    "Skipping `{}`: its directory doesn't name a post",
                    path.display()
                ),
            }
        }

        sort_chronologically(&mut posts);
        Ok(posts)
    }

    fn parse_post(&self, path: &Path, slug: &str) -> Result<Post> {
        match self._parse_post(path, slug) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(path.to_owned(), Box::new(e))),
        }
    }

    fn _parse_post(&self, path: &Path, slug: &str) -> Result<Post> {
        use std::io::Read;
        debug!("Processing post `{}`, slug={}", path.display(), slug);

        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let mut post = parse_document(slug, &contents)?;

        // `path` always has a parent since `slug_for` found one.
        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        post.media_file_names = media_file_names(directory)?;
        post.source_directory = directory.to_owned();
        Ok(post)
    }
}

// The post's slug is the name of the directory containing its document,
// taken verbatim.
fn slug_for<'p>(source_directory: &Path, path: &'p Path) -> Option<&'p str> {
    path.strip_prefix(source_directory)
        .ok()?
        .parent()?
        .file_name()
        .and_then(OsStr::to_str)
}

// Lists the files next to a post document that should be published with it.
fn media_file_names(directory: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for result in read_dir(directory)? {
        let entry = result?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => {
                if name != POST_FILE_NAME && !name.starts_with('_') {
                    names.push(name);
                }
            }
            Err(name) => warn!(
                "Skipping media file {:?} in `{}`: name isn't valid UTF-8",
                name,
                directory.display()
            ),
        }
    }
    names.sort();
    Ok(names)
}

/// The front matter keys a post document recognizes. Every field is optional
/// at this layer so that an absent key can be reported by name.
#[derive(Default, Deserialize)]
struct Frontmatter {
    title: Option<String>,
    summary: Option<String>,
    pub_date: Option<String>,
    tags: Option<Vec<String>>,
}

/// Parses a single post document. The document must be structured as
/// follows:
///
/// 1. A frontmatter fence: a line consisting of `---`
/// 2. A YAML mapping with the keys `title`, `summary`, `pub_date`, and
///    optionally `tags`
/// 3. A second frontmatter fence
/// 4. The Markdown body, which runs to the end of the document and may itself
///    contain `---` lines
///
/// For example:
///
/// ```md
/// ---
/// title: Hello, world!
/// summary: The first post
/// pub_date: 2024-01-05T09:00:00+01:00
/// tags: [greet]
/// ---
/// # Hello
///
/// World
/// ```
///
/// The returned post has no media files and an empty source directory;
/// [`Parser`] fills those in.
pub fn parse_document(slug: &str, input: &str) -> Result<Post> {
    let (yaml, body) = split_frontmatter(input)?;
    // An empty block is an empty mapping, so its missing keys get reported.
    let frontmatter: Frontmatter = if is_blank_yaml(yaml) {
        Frontmatter::default()
    } else {
        serde_yaml::from_str::<Option<Frontmatter>>(yaml)
            .map_err(|e| Error::MalformedMetadata(e.to_string()))?
            .unwrap_or_default()
    };

    let title = frontmatter
        .title
        .filter(|title| !title.trim().is_empty())
        .ok_or(Error::MissingField("title"))?;
    let summary = frontmatter.summary.ok_or(Error::MissingField("summary"))?;
    let pub_date: PublicationDate = frontmatter
        .pub_date
        .ok_or(Error::MissingField("pub_date"))?
        .parse()?;
    if !pub_date.has_offset() {
        warn!(
            "Publication date of `{}` has no time zone: {}",
            slug, pub_date
        );
    }

    let mut tags: Vec<String> = Vec::new();
    for tag in frontmatter.tags.unwrap_or_default() {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let mut content = String::new();
    markdown::to_html(&mut content, body);

    Ok(Post {
        title,
        pub_date,
        tags,
        content,
        summary,
        slug: slug.to_owned(),
        year: pub_date.year(),
        month: pub_date.month(),
        media_file_names: Vec::new(),
        source_directory: PathBuf::new(),
    })
}

// Whether a YAML block holds nothing but whitespace and comments.
fn is_blank_yaml(yaml: &str) -> bool {
    yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Finds the first two fence lines in `input` and returns the text between
/// them (the YAML frontmatter) and the text after the second one (the body).
/// A fence line is `---`, ignoring trailing whitespace. Text before the first
/// fence is discarded, as is a leading byte order mark.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut fences: Vec<(usize, usize)> = Vec::with_capacity(2);
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            fences.push((offset, offset + line.len()));
            if fences.len() == 2 {
                break;
            }
        }
        offset += line.len();
    }

    match fences[..] {
        [(_, yaml_start), (yaml_stop, body_start)] => {
            Ok((&input[yaml_start..yaml_stop], &input[body_start..]))
        }
        _ => Err(Error::MalformedDocument),
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object. Every variant is fatal to a
/// build.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a document doesn't contain two `---` fence lines.
    #[error("expected frontmatter between two `---` lines")]
    MalformedDocument,

    /// Returned when the frontmatter isn't a YAML mapping of the expected
    /// shape.
    #[error("malformed frontmatter: {0}")]
    MalformedMetadata(String),

    /// Returned when a required frontmatter key is absent.
    #[error("missing required frontmatter field `{0}`")]
    MissingField(&'static str),

    /// Returned when `pub_date` can't be parsed.
    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// An error annotated with the document it came from.
    #[error("parsing post `{}`: {}", .0.display(), .1)]
    Annotated(PathBuf, Box<Error>),
}

impl Error {
    /// Strips any [`Error::Annotated`] layers and returns the underlying
    /// error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Annotated(_, err) => err.root(),
            err => err,
        }
    }
}
