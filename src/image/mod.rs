//! Preview image selection.
//!
//! - [`prober`] - Reads an image's pixel size from its container header over HTTP
//! - [`selector`] - Probes every candidate concurrently and keeps the first one
//!   that is large enough
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rss_preview::image::{HttpProber, ImageSelector};
//!
//! let selector = ImageSelector::new(Arc::new(HttpProber::default()));
//! let preview = selector.select(200, 200, candidates).await;
//! ```

mod prober;
mod selector;

pub use prober::{Dimensions, HttpProber, ImageProber, MAX_HEADER_BYTES};
pub use selector::{ImageSelector, DEFAULT_PROBE_TIMEOUT};
