//! Support for creating RSS 2.0 feeds from a list of posts.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

use crate::post::{Post, PublicationDate};

/// The feed's file name, relative to the output directory.
pub const FEED_FILE_NAME: &str = "feed.xml";

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub language: &'a str,
}

/// One `<item>` in the feed.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,

    /// The post's timestamp exactly as loaded, with or without an offset.
    pub pub_date: PublicationDate,
}

/// Maps posts onto feed entries, preserving their order. `base_url` is
/// prepended verbatim to each post's canonical path.
pub fn feed_entries<'p>(
    base_url: &str,
    posts: impl IntoIterator<Item = &'p Post>,
) -> Vec<FeedEntry> {
    posts
        .into_iter()
        .map(|post| FeedEntry {
            title: post.title.clone(),
            link: post.public_url(base_url),
            description: post.summary.clone(),
            pub_date: post.pub_date,
        })
        .collect()
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s and writes the result to a [`std::io::Write`].
pub fn write_feed<'p, W: Write>(
    config: &FeedConfig,
    posts: impl IntoIterator<Item = &'p Post>,
    mut w: W,
) -> Result<()> {
    let entries = feed_entries(config.link, posts);
    w.write_all(&render(config, &entries)?)?;
    Ok(())
}

/// Serializes `entries` into an RSS document, in order. The output is
/// indented and carries no build timestamp, so identical entries always
/// produce identical bytes.
pub fn render(config: &FeedConfig, entries: &[FeedEntry]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    push_text(&mut writer, "title", config.title)?;
    push_text(&mut writer, "link", config.link)?;
    push_text(&mut writer, "description", config.description)?;
    push_text(&mut writer, "language", config.language)?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        push_text(&mut writer, "title", &entry.title)?;
        push_text(&mut writer, "link", &entry.link)?;
        push_text(&mut writer, "description", &entry.description)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&entry.link)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        push_text(&mut writer, "pubDate", &entry.pub_date.to_rfc2822())?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// The result of a fallible feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned when serializing the XML fails.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}
