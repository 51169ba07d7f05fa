use async_trait::async_trait;
use futures::StreamExt;
use imagesize::ImageError;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Most bytes read from an image response while looking for its header.
pub const MAX_HEADER_BYTES: usize = 256 * 1024;

/// Bytes needed before an unrecognised signature is treated as "not an image".
const SIGNATURE_BYTES: usize = 64;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pixel size of a probed image.
///
/// [`Dimensions::ZERO`] is the "unusable image" sentinel every failed probe
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const ZERO: Dimensions = Dimensions {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both sides meet the given minimums (inclusive).
    pub fn satisfies(&self, min_width: u32, min_height: u32) -> bool {
        self.width >= min_width && self.height >= min_height
    }
}

/// Reads the pixel dimensions of a remote image.
///
/// Implementations never fail: anything that goes wrong yields
/// [`Dimensions::ZERO`]. The selector spawns one probe per candidate, so
/// implementations must be cheap to share behind an `Arc`.
#[async_trait]
pub trait ImageProber: Send + Sync {
    async fn probe(&self, url: &Url) -> Dimensions;
}

/// Probes images over HTTP, reading only as much of the body as the
/// container header needs.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    max_header_bytes: usize,
}

impl HttpProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_header_bytes: MAX_HEADER_BYTES,
        }
    }

    /// Overrides the header read budget.
    pub fn with_max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes.max(SIGNATURE_BYTES);
        self
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::new(client)
    }
}

#[async_trait]
impl ImageProber for HttpProber {
    async fn probe(&self, url: &Url) -> Dimensions {
        match self.read_dimensions(url).await {
            Ok(dims) => {
                tracing::debug!(url = %url, width = dims.width, height = dims.height, "Probed image");
                dims
            }
            Err(reason) => {
                tracing::debug!(url = %url, reason = %reason, "Image probe failed");
                Dimensions::ZERO
            }
        }
    }
}

impl HttpProber {
    /// Streams the body until the header decodes. The response (and its
    /// connection) is released when `stream` drops on any return path.
    async fn read_dimensions(&self, url: &Url) -> Result<Dimensions, String> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status().as_u16()));
        }

        let mut header = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            let room = self.max_header_bytes.saturating_sub(header.len());
            header.extend_from_slice(&chunk[..chunk.len().min(room)]);

            match decode_header(&header) {
                HeaderState::Decoded(dims) => return Ok(dims),
                HeaderState::NotAnImage => return Err("not an image".to_string()),
                HeaderState::NeedMore if header.len() >= self.max_header_bytes => {
                    return Err(format!("no header within {} bytes", self.max_header_bytes));
                }
                HeaderState::NeedMore => {}
            }
        }

        Err("body ended before the image header".to_string())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum HeaderState {
    Decoded(Dimensions),
    NotAnImage,
    NeedMore,
}

/// Tries to decode a (possibly truncated) image header.
fn decode_header(bytes: &[u8]) -> HeaderState {
    match imagesize::blob_size(bytes) {
        Ok(size) => HeaderState::Decoded(Dimensions::new(
            u32::try_from(size.width).unwrap_or(u32::MAX),
            u32::try_from(size.height).unwrap_or(u32::MAX),
        )),
        Err(ImageError::NotSupported) if bytes.len() >= SIGNATURE_BYTES => {
            HeaderState::NotAnImage
        }
        Err(_) => HeaderState::NeedMore,
    }
}
