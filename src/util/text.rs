use scraper::node::Node;
use scraper::Html;

/// Elements whose boundaries become line breaks in the plain-text rendering.
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

/// Elements whose text never belongs in the plain-text rendering.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Converts an HTML fragment (an RSS `<description>`) to plain text.
///
/// Tags are dropped and entities decoded. Block-level elements start a new
/// line, runs of whitespace inside a line collapse to one space, blank lines
/// are removed and the result is trimmed. Text inside `<script>` and
/// `<style>` is discarded.
///
/// # Examples
///
/// ```
/// use rss_preview::util::sanitize_html;
///
/// assert_eq!(
///     sanitize_html("<p>Hello <b>world</b></p><p>Again &amp; again</p>"),
///     "Hello world\nAgain & again"
/// );
/// ```
pub fn sanitize_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());

    for node in fragment.tree.root().descendants() {
        match node.value() {
            Node::Text(text) => {
                let skipped = node.ancestors().any(|a| match a.value() {
                    Node::Element(e) => SKIPPED_ELEMENTS.contains(&e.name()),
                    _ => false,
                });
                if !skipped {
                    raw.push_str(text);
                }
            }
            Node::Element(e) if BLOCK_ELEMENTS.contains(&e.name()) => raw.push('\n'),
            _ => {}
        }
    }

    raw.lines()
        .map(|line| {
            line.split([' ', '\t', '\r'])
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
