//! Defines the [`Post`] type, the canonical in-memory form of a source
//! document, and [`PublicationDate`], the parsed `pub_date` it is ordered by.
//! See [`crate::parser`] for how posts are loaded from disk and
//! [`Post::to_value`] for how they are exposed to templates.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use gtmpl_value::Value;
use thiserror::Error;

use crate::tag::Tag;

/// A post's publication timestamp. Source documents may omit the time (it
/// defaults to midnight) and the UTC offset; a missing offset is preserved
/// rather than guessed so that consumers such as the feed can report it
/// faithfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicationDate {
    local: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl PublicationDate {
    /// Builds a date from its wall-clock time and optional offset.
    pub fn new(local: NaiveDateTime, offset: Option<FixedOffset>) -> Self {
        PublicationDate { local, offset }
    }

    /// Whether the source text carried a UTC offset.
    pub fn has_offset(&self) -> bool {
        self.offset.is_some()
    }

    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.local.year()
    }

    pub fn month(&self) -> u32 {
        use chrono::Datelike;
        self.local.month()
    }

    /// The point in time this date refers to, expressed in UTC. Dates without
    /// an offset are taken to already be UTC so that every pair of dates is
    /// comparable.
    pub fn instant(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => {
                self.local - Duration::seconds(i64::from(offset.local_minus_utc()))
            }
            None => self.local,
        }
    }

    /// Formats the date as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.local.format("%Y-%m-%d").to_string()
    }

    /// Formats the date in RFC 2822 form for RSS `pubDate` elements. A date
    /// without an offset gets the `-0000` zone, which RFC 2822 reserves for
    /// "no zone information".
    pub fn to_rfc2822(&self) -> String {
        format!(
            "{} {}",
            self.local.format("%a, %d %b %Y %H:%M:%S"),
            match self.offset {
                Some(offset) => format_offset(offset, ""),
                None => String::from("-0000"),
            }
        )
    }
}

impl fmt::Display for PublicationDate {
    /// Displays the date in ISO-8601 form, with the offset only if the source
    /// had one.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%dT%H:%M:%S"))?;
        match self.offset {
            Some(offset) => f.write_str(&format_offset(offset, ":")),
            None => Ok(()),
        }
    }
}

fn format_offset(offset: FixedOffset, separator: &str) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{}{:02}{}{:02}", sign, minutes / 60, separator, minutes % 60)
}

/// Returned when a `pub_date` string isn't an ISO-8601 date or date-time.
#[derive(Debug, Error, PartialEq)]
#[error("invalid ISO-8601 date `{0}`")]
pub struct InvalidDateError(pub String);

impl FromStr for PublicationDate {
    type Err = InvalidDateError;

    /// Parses `YYYY-MM-DD`, optionally followed by `T` (or a space) and a
    /// time of the form `HH:MM[:SS[.fff]]`, optionally followed by `Z` or a
    /// `±HH[:MM]` offset.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDateError(s.to_owned());
        let s = s.trim();
        if s.len() < 10 || !s.is_char_boundary(10) {
            return Err(invalid());
        }

        let date =
            NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d").map_err(|_| invalid())?;
        let rest = &s[10..];
        if rest.is_empty() {
            let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
            return Ok(PublicationDate::new(midnight, None));
        }

        let rest = rest
            .strip_prefix('T')
            .or_else(|| rest.strip_prefix('t'))
            .or_else(|| rest.strip_prefix(' '))
            .ok_or_else(invalid)?;
        let (time, offset) = split_offset(rest).ok_or_else(invalid)?;
        let time = parse_time(time).ok_or_else(invalid)?;
        Ok(PublicationDate::new(NaiveDateTime::new(date, time), offset))
    }
}

// Splits `HH:MM:SS±HH:MM` into its time and offset parts.
fn split_offset(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(time) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return Some((time, Some(FixedOffset::east_opt(0)?)));
    }

    match s.rfind(|c: char| c == '+' || c == '-') {
        None => Some((s, None)),
        Some(i) => {
            let sign = if &s[i..i + 1] == "-" { -1 } else { 1 };
            let digits: String = s[i + 1..].chars().filter(|c| *c != ':').collect();
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let (hours, minutes) = match digits.len() {
                2 => (digits.parse::<i32>().ok()?, 0),
                4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
                _ => return None,
            };
            if minutes >= 60 {
                return None;
            }
            let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
            Some((&s[..i], Some(offset)))
        }
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    const FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
}

/// Represents a blog post. `year` and `month` are derived from `pub_date`
/// once, when the post is loaded, and every later use of the post's date
/// bucket reads them rather than the timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The title of the post.
    pub title: String,

    /// When the post was published. Posts are ordered by this field.
    pub pub_date: PublicationDate,

    /// The post's tag labels, in the order the source listed them.
    pub tags: Vec<String>,

    /// The post body, rendered to HTML.
    pub content: String,

    /// A short description used in listings and the feed.
    pub summary: String,

    /// The name of the post's source directory.
    pub slug: String,

    pub year: i32,

    pub month: u32,

    /// The names of the files that sit next to the post's source document
    /// and are copied alongside the rendered page.
    pub media_file_names: Vec<String>,

    /// The directory the post was loaded from.
    pub source_directory: PathBuf,
}

impl Post {
    /// The post's location relative to the site root:
    /// `posts/{year}/{month}/{slug}.html`.
    pub fn canonical_path(&self) -> String {
        format!("posts/{}/{}/{}.html", self.year, self.month, self.slug)
    }

    /// The directory, relative to the site root, that holds the post's media
    /// files: `posts/{year}/{month}/{slug}`.
    pub fn media_directory(&self) -> String {
        format!("posts/{}/{}/{}", self.year, self.month, self.slug)
    }

    /// The fully qualified URL of the post page. `base_url` is prepended
    /// verbatim so that it round-trips exactly.
    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.canonical_path())
    }

    /// The file the post page is rendered into, under `output_directory`.
    pub fn output_path(&self, output_directory: &Path) -> PathBuf {
        self.output_directory(output_directory)
            .join(format!("{}.html", self.slug))
    }

    /// The directory media files are copied into, under `output_directory`.
    pub fn media_output_directory(&self, output_directory: &Path) -> PathBuf {
        self.output_directory(output_directory).join(&self.slug)
    }

    fn output_directory(&self, output_directory: &Path) -> PathBuf {
        output_directory
            .join("posts")
            .join(self.year.to_string())
            .join(self.month.to_string())
    }

    /// Converts the post into a template [`Value`]. The result is a
    /// [`Value::Object`] with the post's fields plus `url` (the canonical
    /// path), `public_url`, `pub_date` (`YYYY-MM-DD`), `pub_date_full`
    /// (ISO-8601), `tags` (see [`Tag::to_value`]) and `media`.
    pub fn to_value(&self, base_url: &str) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("summary".to_owned(), Value::String(self.summary.clone()));
        m.insert("content".to_owned(), Value::String(self.content.clone()));
        m.insert("slug".to_owned(), Value::String(self.slug.clone()));
        m.insert("year".to_owned(), Value::from(self.year));
        m.insert("month".to_owned(), Value::from(self.month));
        m.insert("pub_date".to_owned(), Value::String(self.pub_date.date_string()));
        m.insert("pub_date_full".to_owned(), Value::String(self.pub_date.to_string()));
        m.insert("url".to_owned(), Value::String(self.canonical_path()));
        m.insert("public_url".to_owned(), Value::String(self.public_url(base_url)));
        m.insert(
            "tags".to_owned(),
            Value::Array(
                self.tags
                    .iter()
                    .map(|t| Tag::new(t).to_value(base_url))
                    .collect(),
            ),
        );
        m.insert(
            "media".to_owned(),
            Value::Array(
                self.media_file_names
                    .iter()
                    .map(|name| Value::String(name.clone()))
                    .collect(),
            ),
        );
        Value::Object(m)
    }
}
