//! Markdown to HTML for the result panel.
//!
//! Model output is untrusted: raw HTML blocks and inline tags are emitted as
//! escaped text rather than markup, and link or image destinations are
//! limited to http(s) and relative URLs.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Replacement for destinations with a disallowed scheme.
const BLOCKED_DESTINATION: &str = "#";

/// True for `http:`/`https:` URLs and for URLs without a scheme.
fn is_safe_destination(dest: &str) -> bool {
    // Browsers ignore whitespace and control characters inside a scheme
    let normalized: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match normalized.find(|c| matches!(c, ':' | '/' | '?' | '#')) {
        Some(idx) if normalized[idx..].starts_with(':') => {
            matches!(&normalized[..idx], "http" | "https")
        }
        _ => true,
    }
}

fn sanitize_destination(dest: CowStr<'_>) -> CowStr<'_> {
    if is_safe_destination(&dest) {
        dest
    } else {
        CowStr::Borrowed(BLOCKED_DESTINATION)
    }
}

fn sanitize_tag(tag: Tag<'_>) -> Tag<'_> {
    match tag {
        Tag::Link(kind, dest, title) => Tag::Link(kind, sanitize_destination(dest), title),
        Tag::Image(kind, dest, title) => Tag::Image(kind, sanitize_destination(dest), title),
        other => other,
    }
}

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(tag) => Event::Start(sanitize_tag(tag)),
        Event::End(tag) => Event::End(sanitize_tag(tag)),
        other => other,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_lists() {
        let html = render_markdown("### Bone Level\n\n- Horizontal loss ~30%\n");
        assert!(html.contains("<h3>Bone Level</h3>"));
        assert!(html.contains("<li>Horizontal loss ~30%</li>"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = render_markdown("<script>alert(1)</script>\n\ntext <b>bold</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn script_urls_are_neutralized() {
        let html = render_markdown("[View details](javascript:alert(document.cookie))");
        assert!(!html.contains("href=\"javascript:"));
        assert!(html.contains("<a href=\"#\">View details</a>"));

        let html = render_markdown("[x](JaVaScRiPt:alert(1)) ![scan](data:image/svg+xml,abc)");
        assert!(!html.to_ascii_lowercase().contains("script:"));
        assert!(!html.contains("data:"));

        let html = render_markdown("[ref]\n\n[ref]: vbscript:msgbox(1)");
        assert!(!html.contains("vbscript"));
    }

    #[test]
    fn obfuscated_schemes_are_detected() {
        assert!(!is_safe_destination("java\tscript:alert(1)"));
        assert!(!is_safe_destination(" JAVASCRIPT:alert(1)"));
        assert!(!is_safe_destination("java\u{0}script:alert(1)"));
        assert!(is_safe_destination("images/tooth-36.png"));
        assert!(is_safe_destination("?view=full"));
    }

    #[test]
    fn web_and_relative_links_are_kept() {
        let html = render_markdown(
            "[AAP](https://www.perio.org/) [plain](http://example.com/a:b) [local](/report) [anchor](#bone)",
        );
        assert!(html.contains("href=\"https://www.perio.org/\""));
        assert!(html.contains("href=\"http://example.com/a:b\""));
        assert!(html.contains("href=\"/report\""));
        assert!(html.contains("href=\"#bone\""));
    }

    #[test]
    fn tables_are_supported() {
        let html = render_markdown("| Tooth | Loss |\n|---|---|\n| 36 | 40% |\n");
        assert!(html.contains("<table>"));
    }
}
