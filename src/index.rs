//! Defines [`PostIndex`], the read-only views over the full post set that the
//! listing pages and the feed are rendered from.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::post::Post;

/// English month names, indexed by month number minus one.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Returns the English name for a month number (1-12).
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1],
        _ => "Unknown",
    }
}

/// The posts published in one month of one year.
pub struct MonthGroup<'a> {
    pub month: u32,
    pub posts: Vec<&'a Post>,
}

impl MonthGroup<'_> {
    pub fn name(&self) -> &'static str {
        month_name(self.month)
    }
}

/// The posts published in one year, grouped by month (most recent first).
pub struct YearGroup<'a> {
    pub year: i32,
    pub months: Vec<MonthGroup<'a>>,
}

/// Indexes a set of [`Post`]s. Every list in the index preserves
/// `chronological` order.
pub struct PostIndex<'a> {
    /// Every post, most recent first. Posts with equal dates keep their
    /// input order.
    pub chronological: Vec<&'a Post>,

    /// Posts by tag label. A post appears once under each of its tags.
    pub by_tag: BTreeMap<String, Vec<&'a Post>>,

    /// Posts by year and month. Every post appears in exactly one bucket,
    /// chosen by its own `year` and `month` fields.
    pub by_year_month: BTreeMap<i32, BTreeMap<u32, Vec<&'a Post>>>,
}

impl<'a> PostIndex<'a> {
    /// Indexes `posts`. Fails if two posts would be written to the same
    /// canonical path.
    pub fn build(posts: &'a [Post]) -> Result<PostIndex<'a>> {
        let mut seen: HashMap<String, &Post> = HashMap::new();
        for post in posts {
            if let Some(other) = seen.insert(post.canonical_path(), post) {
                return Err(Error::DuplicatePost {
                    path: post.canonical_path(),
                    first: other.source_directory.display().to_string(),
                    second: post.source_directory.display().to_string(),
                });
            }
        }

        let mut chronological: Vec<&Post> = posts.iter().collect();
        sort_chronologically(&mut chronological);

        let mut by_tag: BTreeMap<String, Vec<&Post>> = BTreeMap::new();
        let mut by_year_month: BTreeMap<i32, BTreeMap<u32, Vec<&Post>>> =
            BTreeMap::new();
        for post in chronological.iter().copied() {
            for tag in post.tags.iter() {
                by_tag.entry(tag.clone()).or_default().push(post);
            }
            by_year_month
                .entry(post.year)
                .or_default()
                .entry(post.month)
                .or_default()
                .push(post);
        }

        Ok(PostIndex {
            chronological,
            by_tag,
            by_year_month,
        })
    }

    /// The `limit` most recent posts, or every post if there are fewer.
    pub fn recent(&self, limit: usize) -> &[&'a Post] {
        &self.chronological[..limit.min(self.chronological.len())]
    }

    /// Every distinct tag label, in label order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// The archive: years most recent first, each with its months most recent
    /// first.
    pub fn archive(&self) -> Vec<YearGroup<'a>> {
        self.by_year_month
            .iter()
            .rev()
            .map(|(year, months)| YearGroup {
                year: *year,
                months: months
                    .iter()
                    .rev()
                    .map(|(month, posts)| MonthGroup {
                        month: *month,
                        posts: posts.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Sorts posts newest first. The sort is stable, so posts published at the
/// same instant keep their relative order.
pub fn sort_chronologically<P: Borrow<Post>>(posts: &mut [P]) {
    posts.sort_by(|a, b| {
        let (a, b) = (a.borrow(), b.borrow());
        b.pub_date.instant().cmp(&a.pub_date.instant())
    });
}

/// The result of indexing posts.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error indexing posts.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when two posts share a year, month, and slug.
    #[error("posts `{first}` and `{second}` would both be written to `{path}`")]
    DuplicatePost {
        path: String,
        first: String,
        second: String,
    },
}
