//! The library code for the `inkpress` static blog generator. A build runs in
//! three stages:
//!
//! 1. Loading posts from `post.md` files on disk ([`crate::parser`]). Each
//!    file is split into YAML front matter and a Markdown body, which is
//!    rendered to HTML ([`crate::markdown`]).
//! 2. Indexing the loaded posts ([`crate::index`]): newest first, by tag, and
//!    by year and month.
//! 3. Writing the site ([`crate::build`]): the home, archive, tag, and post
//!    pages ([`crate::write`]), the RSS feed ([`crate::feed`]), and the public
//!    assets and post media ([`crate::assets`]).
//!
//! Nothing is written until every post has loaded and indexed cleanly and the
//! templates have parsed, so a broken source tree leaves the previous output
//! in place.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod assets;
pub mod build;
pub mod config;
pub mod feed;
pub mod index;
pub mod markdown;
pub mod optimize;
pub mod parser;
pub mod post;
pub mod slug;
pub mod tag;
pub mod template;
pub mod write;
