//! An RSS reader for Tumblr-style blogs that picks a preview image for
//! every article.
//!
//! Each article's HTML description is scanned for image URLs; the candidates
//! are probed concurrently (reading only their headers) and the first one
//! that meets the configured minimum width and height becomes the article's
//! preview image. Results can be cached in memory, which is recommended for
//! feeds with many images.
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
//! for article in reader.read_feed().await? {
//!     println!("{} {:?}", article.title, article.preview_image);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod feed;
pub mod image;
pub mod util;

pub use cache::{MemoryCache, ResultCache, SharedCache};
pub use config::{Config, ConfigError};
pub use feed::{Article, FeedReader, ReadError};
pub use image::{Dimensions, HttpProber, ImageProber, ImageSelector};
