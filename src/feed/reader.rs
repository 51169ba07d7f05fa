use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::article::Article;
use super::fetcher::{fetch_feed, FetchError, FEED_TIMEOUT};
use super::parser::parse_rss;
use crate::cache::SharedCache;
use crate::config::Config;
use crate::image::{HttpProber, ImageProber, ImageSelector};
use crate::util::{extract_image_urls, validate_source_url, UrlValidationError};

/// Why a feed read failed.
///
/// Variants are listed in the order they are checked. All of them end the
/// read; nothing here is retried. Failures to probe an image or to parse an
/// item's date or link are not errors and never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The reader was never set up.
    #[error("rssreader: not initialized")]
    NotInitialized,
    #[error("rssreader: no url provided")]
    NoUrlProvided,
    #[error("rssreader: malformed url")]
    MalformedUrl,
    #[error("rssreader: relative url provided")]
    NeededAbsoluteUrl,
    #[error("rssreader: can't connect to the given url")]
    CantConnect,
    /// The body could not be read or is not an RSS document.
    #[error("rssreader: can't parse xml format")]
    CantParseResponse,
}

impl From<UrlValidationError> for ReadError {
    fn from(err: UrlValidationError) -> Self {
        match err {
            UrlValidationError::Blank => ReadError::NoUrlProvided,
            UrlValidationError::Malformed => ReadError::MalformedUrl,
            UrlValidationError::Relative => ReadError::NeededAbsoluteUrl,
        }
    }
}

impl From<FetchError> for ReadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Connect(_) => ReadError::CantConnect,
            FetchError::Body(_)
            | FetchError::ResponseTooLarge
            | FetchError::IncompleteResponse { .. } => ReadError::CantParseResponse,
        }
    }
}

/// Reads one RSS feed and turns its items into [`Article`]s with preview
/// images.
///
/// Build one with [`FeedReader::setup`] or [`FeedReader::builder`]. A
/// `FeedReader::default()` is an unconfigured reader whose reads fail with
/// [`ReadError::NotInitialized`]. Cloning is cheap and clones share the
/// HTTP client, prober and cache.
#[derive(Debug, Clone, Default)]
pub struct FeedReader {
    inner: Option<Arc<ReaderInner>>,
}

#[derive(Debug)]
struct ReaderInner {
    config: Config,
    client: reqwest::Client,
    selector: ImageSelector,
    cache: Option<SharedCache>,
    cache_key: String,
    cache_ttl: Duration,
}

impl FeedReader {
    /// A reader for `config` with default collaborators: a fresh HTTP client,
    /// the HTTP image prober and, when `use_cache` is set, its own in-memory
    /// cache.
    pub fn setup(config: Config) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> FeedReaderBuilder {
        FeedReaderBuilder {
            config,
            client: None,
            prober: None,
            cache: None,
        }
    }

    /// The configuration this reader was set up with.
    pub fn config(&self) -> Option<&Config> {
        self.inner.as_deref().map(|inner| &inner.config)
    }

    /// Fetches, parses and processes the feed.
    ///
    /// With caching enabled, a fresh cached result is returned as is. On a
    /// miss, concurrent reads of the same configuration wait for one fetch
    /// and then share its result.
    pub async fn read_feed(&self) -> Result<Vec<Article>, ReadError> {
        let inner = self.inner.as_deref().ok_or(ReadError::NotInitialized)?;

        let Some(cache) = inner.cache.as_ref() else {
            return inner.fetch_articles().await;
        };

        if let Some(hit) = cache.get(&inner.cache_key) {
            tracing::debug!(key = %inner.cache_key, "Feed served from cache");
            return Ok(hit.as_ref().clone());
        }

        let _flight = cache.lock_key(&inner.cache_key).await;

        // Someone else may have filled the entry while we waited
        if let Some(hit) = cache.get(&inner.cache_key) {
            tracing::debug!(key = %inner.cache_key, "Feed served from cache after waiting");
            return Ok(hit.as_ref().clone());
        }

        let articles = inner.fetch_articles().await?;
        cache.set(&inner.cache_key, Arc::new(articles.clone()), inner.cache_ttl);
        Ok(articles)
    }
}

impl ReaderInner {
    async fn fetch_articles(&self) -> Result<Vec<Article>, ReadError> {
        let source = validate_source_url(&self.config.rss_url).inspect_err(|e| {
            tracing::warn!(url = %self.config.rss_url, error = %e, "Rejected feed URL");
        })?;

        let body = fetch_feed(&self.client, &source).await.inspect_err(|e| {
            tracing::warn!(feed = %source, error = %e, "Feed download failed");
        })?;

        let items = parse_rss(&body).map_err(|e| {
            tracing::warn!(feed = %source, error = %e, "Feed is not a readable RSS document");
            ReadError::CantParseResponse
        })?;

        let total = items.len();
        let mut articles = Vec::with_capacity(total.min(self.config.max_items));

        for item in items.into_iter().take(self.config.max_items) {
            let candidates = extract_image_urls(&item.description);
            let preview = self
                .selector
                .select(
                    self.config.min_image_width,
                    self.config.min_image_height,
                    candidates,
                )
                .await;
            articles.push(Article::from_item(item, preview));
        }

        tracing::info!(
            feed = %source,
            items = total,
            articles = articles.len(),
            with_preview = articles.iter().filter(|a| a.preview_image.is_some()).count(),
            "Read feed"
        );

        Ok(articles)
    }
}

/// Assembles a [`FeedReader`] with custom collaborators.
pub struct FeedReaderBuilder {
    config: Config,
    client: Option<reqwest::Client>,
    prober: Option<Arc<dyn ImageProber>>,
    cache: Option<SharedCache>,
}

impl FeedReaderBuilder {
    /// HTTP client used for the feed itself (and for images, unless a prober
    /// is supplied).
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn prober(mut self, prober: Arc<dyn ImageProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Shares `cache` with other readers. Ignored unless `use_cache` is set.
    pub fn cache(mut self, cache: SharedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> FeedReader {
        let config = self.config;
        let client = self.client.unwrap_or_else(default_client);
        let prober: Arc<dyn ImageProber> = match self.prober {
            Some(prober) => prober,
            None => Arc::new(HttpProber::new(client.clone())),
        };
        let selector = ImageSelector::new(prober).with_probe_timeout(config.probe_timeout());

        let cache = if config.use_cache {
            Some(
                self.cache
                    .unwrap_or_else(|| SharedCache::in_memory(config.cache_capacity)),
            )
        } else {
            None
        };

        let inner = ReaderInner {
            cache_key: config.cache_key(),
            cache_ttl: config.cache_ttl(),
            config,
            client,
            selector,
            cache,
        };

        FeedReader {
            inner: Some(Arc::new(inner)),
        }
    }
}

fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(FEED_TIMEOUT)
        .build()
        .unwrap_or_default()
}
