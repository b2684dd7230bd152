//! Defines [`slugify`], which maps arbitrary text onto a URL-safe token. Tag
//! page file names are derived with it, and templates reach it through the
//! `slugify` function registered in [`crate::template`].

/// Lowercases `text`, replaces every character that isn't alphanumeric with
/// `-`, and strips leading and trailing hyphens. Runs of separators are not
/// collapsed, so `"a  b"` becomes `"a--b"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        slug.push(if c.is_alphanumeric() { c } else { '-' });
    }
    slug.trim_matches('-').to_owned()
}
