//! Defines the [`Tag`] type, which represents a [`crate::post::Post`] tag as
//! it is presented to templates and laid out on disk.

use gtmpl_value::Value;
use std::collections::HashMap;

use crate::slug::slugify;

/// Represents a [`crate::post::Post`] tag. Posts store their tags as plain
/// labels; a [`Tag`] pairs a label with the slug its listing page is named
/// after.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The label as written in the post's front matter.
    pub name: String,

    /// The slugified label. Two labels that normalize to the same slug share
    /// a listing page.
    pub slug: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            slug: slugify(name),
        }
    }

    /// Whether the label has no alphanumeric characters, leaving the page
    /// named just `tags/.html`.
    pub fn has_empty_slug(&self) -> bool {
        self.slug.is_empty()
    }

    /// The tag page's location relative to the site root:
    /// `tags/{slug}.html`.
    pub fn path(&self) -> String {
        format!("tags/{}.html", self.slug)
    }

    /// The fully qualified URL of the tag page.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url, self.path())
    }

    /// Converts the tag into a template [`Value`] with fields `name`, `slug`,
    /// and `url`.
    pub fn to_value(&self, base_url: &str) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::String(self.name.clone()));
        m.insert("slug".to_owned(), Value::String(self.slug.clone()));
        m.insert("url".to_owned(), Value::String(self.url(base_url)));
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tag_path_uses_slug() {
        let tag = Tag::new("Rust Lang");
        assert_eq!("rust-lang", tag.slug);
        assert_eq!("tags/rust-lang.html", tag.path());
        assert_eq!(
            "https://example.com/tags/rust-lang.html",
            tag.url("https://example.com/")
        );
        assert!(!tag.has_empty_slug());
    }

    #[test]
    fn test_punctuation_only_tag() {
        let tag = Tag::new("???");
        assert!(tag.has_empty_slug());
        assert_eq!("tags/.html", tag.path());
    }
}
