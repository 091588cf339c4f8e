//! Markdown rendering for exported documents.
//!
//! Uses pulldown-cmark for CommonMark parsing. Raw HTML in section content is
//! never passed through: block and inline HTML events are re-emitted as text
//! so the HTML writer escapes them.

use pulldown_cmark::{html, Event, Options, Parser};

/// Render markdown (GFM tables, strikethrough, task lists) to an HTML
/// fragment with raw HTML escaped.
pub fn render_to_html(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(input, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut html_output = String::with_capacity(input.len() * 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// Escape HTML special characters
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = render_to_html("Some **bold** and *italic* text");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn test_lists_and_tables() {
        let list = render_to_html("- one\n- two");
        assert!(list.contains("<ul>"));
        assert!(list.contains("<li>one</li>"));

        let table = render_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(table.contains("<table>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_to_html("<script>alert('x')</script>\n\nText with <b>tag</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
    }
}
