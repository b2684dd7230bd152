//! Converts post bodies from Markdown to HTML.

use pulldown_cmark::{html, Options, Parser};

/// Converts `markdown` to HTML, appending the result to `out`. Tables,
/// footnotes, strikethrough, task lists, and smart punctuation are enabled.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(out, Parser::new_ext(markdown, options));
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> String {
        let mut out = String::new();
        to_html(&mut out, markdown);
        out
    }

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!("<p>Hello <em>world</em></p>\n", render("Hello *world*"));
    }

    #[test]
    fn test_strikethrough_enabled() {
        assert_eq!("<p><del>old</del></p>\n", render("~~old~~"));
    }

    #[test]
    fn test_rule_inside_body_survives() {
        let html = render("before\n\n---\n\nafter\n");
        assert!(html.contains("<hr />"), "html: {}", html);
        assert!(html.contains("<p>after</p>"), "html: {}", html);
    }
}
