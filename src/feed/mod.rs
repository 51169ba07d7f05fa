//! Feed reading: RSS download, parsing and article assembly.
//!
//! - [`fetcher`] - HTTP download with size limits
//! - [`parser`] - Minimal RSS 2.0 decoding (`channel/item`)
//! - [`article`] - The processed [`Article`] record
//! - [`reader`] - [`FeedReader`], which ties the above to image selection
//!   and the result cache
//!
//! # Example
//!
//! ```ignore
//! use rss_preview::{Config, FeedReader};
//!
//! let reader = FeedReader::setup(Config {
//!     rss_url: "http://your.blog.here/rss".to_string(),
//!     max_items: 3,
//!     min_image_width: 200,
//!     use_cache: true,
//!     ..Config::default()
//! });
//!
//! let articles = reader.read_feed().await?;
//! ```

mod article;
mod fetcher;
mod parser;
mod reader;

pub use article::Article;
pub use fetcher::{fetch_feed, FetchError, FEED_TIMEOUT, MAX_FEED_SIZE};
pub use parser::{parse_rss, ParseError, RawItem};
pub use reader::{FeedReader, FeedReaderBuilder, ReadError};
