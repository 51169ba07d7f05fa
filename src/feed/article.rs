use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::parser::RawItem;
use crate::util::sanitize_html;

/// One processed feed entry.
///
/// Fields that fail to parse fall back to `None` rather than failing the
/// read: an unparsable `pubDate` leaves `published` empty and an unparsable
/// `link` leaves `url` empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    /// The item's `<description>` exactly as published.
    pub content_html: String,
    /// `content_html` rendered as plain text.
    pub content: String,
    pub published: Option<DateTime<Utc>>,
    pub url: Option<Url>,
    /// The chosen preview image, if any candidate was large enough.
    pub preview_image: Option<Url>,
}

impl Article {
    pub(crate) fn from_item(item: RawItem, preview_image: Option<Url>) -> Self {
        let published = parse_pub_date(&item.pub_date);
        let url = Url::parse(item.link.trim()).ok();
        let content = sanitize_html(&item.description);

        Self {
            title: item.title,
            content_html: item.description,
            content,
            published,
            url,
            preview_image,
        }
    }
}

/// RSS dates are RFC 822 with four-digit years; RFC 2822 parsing covers
/// both numeric offsets and the legacy zone names.
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn item(pub_date: &str, link: &str) -> RawItem {
        RawItem {
            title: "Hello".to_string(),
            description: "<p>Body <b>text</b></p>".to_string(),
            link: link.to_string(),
            pub_date: pub_date.to_string(),
        }
    }

    #[test]
    fn test_from_item_full() {
        let preview = Url::parse("http://media.example.com/a.png").unwrap();
        let article = Article::from_item(
            item("Tue, 10 Jun 2014 04:02:31 -0400", "http://blog.example.com/post/1"),
            Some(preview.clone()),
        );

        assert_eq!(article.title, "Hello");
        assert_eq!(article.content_html, "<p>Body <b>text</b></p>");
        assert_eq!(article.content, "Body text");
        assert_eq!(
            article.published,
            Some(Utc.with_ymd_and_hms(2014, 6, 10, 8, 2, 31).unwrap())
        );
        assert_eq!(
            article.url.as_ref().map(Url::as_str),
            Some("http://blog.example.com/post/1")
        );
        assert_eq!(article.preview_image, Some(preview));
    }

    #[test]
    fn test_bad_date_is_none() {
        let article = Article::from_item(item("yesterday-ish", "http://x.com/p"), None);
        assert_eq!(article.published, None);
        assert!(article.url.is_some());
    }

    #[test]
    fn test_empty_date_is_none() {
        let article = Article::from_item(item("", "http://x.com/p"), None);
        assert_eq!(article.published, None);
    }

    #[test]
    fn test_gmt_zone_accepted() {
        let article = Article::from_item(item("Mon, 02 Jan 2006 15:04:05 GMT", ""), None);
        assert_eq!(
            article.published,
            Some(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_bad_link_is_none() {
        let article = Article::from_item(item("", "not a link"), None);
        assert_eq!(article.url, None);
        let article = Article::from_item(item("", ""), None);
        assert_eq!(article.url, None);
    }

    #[test]
    fn test_serializes_to_json() {
        let article = Article::from_item(
            item("Mon, 02 Jan 2006 15:04:05 +0000", "http://x.com/p"),
            None,
        );
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["title"], "Hello");
        assert_eq!(json["url"], "http://x.com/p");
        assert_eq!(json["preview_image"], serde_json::Value::Null);
        assert_eq!(json["published"], "2006-01-02T15:04:05Z");
    }
}
