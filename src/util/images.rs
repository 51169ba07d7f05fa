use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Absolute http(s) URLs with a path ending in a raster image extension.
const IMAGE_URL_PATTERN: &str = r"https?://[^/\s]+/\S+\.(jpg|png|gif)";

static IMAGE_URL_RE: OnceLock<Regex> = OnceLock::new();

fn image_url_re() -> &'static Regex {
    IMAGE_URL_RE.get_or_init(|| Regex::new(IMAGE_URL_PATTERN).expect("image URL pattern is valid"))
}

/// Extracts every image URL found in `text`, in order of appearance.
///
/// This is a plain text scan, not an HTML parse: it finds image URLs in
/// `src` attributes, links and bare text alike. Matches that do not parse
/// as a [`Url`] are skipped. Returns an empty vector when nothing matches.
pub fn extract_image_urls(text: &str) -> Vec<Url> {
    image_url_re()
        .find_iter(text)
        .filter_map(|m| Url::parse(m.as_str()).ok())
        .collect()
}
