//! Utility functions for common operations.
//!
//! This module provides the small collaborators the feed reader leans on:
//!
//! - **URL validation**: Classifies a feed source as blank, malformed, relative or usable
//! - **Image extraction**: Regex scan for image URLs inside article HTML
//! - **Text processing**: HTML to plain-text conversion for article bodies
//!
//! # Examples
//!
//! ```
//! use rss_preview::util::{extract_image_urls, sanitize_html, validate_source_url};
//!
//! let url = validate_source_url("https://example.tumblr.com/rss").unwrap();
//! assert_eq!(url.host_str(), Some("example.tumblr.com"));
//!
//! let html = r#"<p>Hi</p><img src="http://media.example.com/a/pic.jpg">"#;
//! assert_eq!(extract_image_urls(html).len(), 1);
//! assert_eq!(sanitize_html(html), "Hi");
//! ```

mod images;
mod text;
mod url_validator;

pub use images::extract_image_urls;
pub use text::sanitize_html;
pub use url_validator::{validate_source_url, UrlValidationError};
