use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feed is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("document root is <{0}>, expected <rss>")]
    NotRss(String),
    #[error("document has no root element")]
    Empty,
    #[error("unexpected RSS structure: {0}")]
    Structure(#[from] quick_xml::de::DeError),
}

/// One `<item>` as it appears in the feed, before any processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
}

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RawItem>,
}

/// Decodes the minimal RSS 2.0 subset: `rss/channel/item{title, description,
/// link, pubDate}`. Everything else in the document is ignored.
pub fn parse_rss(bytes: &[u8]) -> Result<Vec<RawItem>, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    check_root(text)?;
    let document: RssDocument = quick_xml::de::from_str(text)?;
    Ok(document.channel.items)
}

/// The serde layer does not look at the root element's name, so reject
/// non-RSS XML (Atom, XHTML) up front.
fn check_root(text: &str) -> Result<(), ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name();
                return if name.as_ref() == b"rss" {
                    Ok(())
                } else {
                    Err(ParseError::NotRss(
                        String::from_utf8_lossy(name.as_ref()).into_owned(),
                    ))
                };
            }
            Event::Eof => return Err(ParseError::Empty),
            // Declaration, doctype, comments, processing instructions
            _ => {}
        }
    }
}
