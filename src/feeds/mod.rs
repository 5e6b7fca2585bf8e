pub mod avito;
pub mod cian;
pub mod domclick;
pub mod realty;
pub mod traits;
pub mod types;

pub use avito::AvitoFeed;
pub use cian::CianFeed;
pub use domclick::DomClickFeed;
pub use realty::RealtyFeed;
pub use traits::{FeedTrait, Schema};
pub use types::ClientConfig;

use crate::error::FeedError;
use crate::models::Source;
use crate::transport::{HttpTransport, Transport, HEADER_LAST_MODIFIED};
use crate::validation;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::{info, warn};

/// One platform feed bound to a URL.
///
/// `get` fetches and decodes the payload, `check` validates it. The same
/// instance can be fetched again; each `get` replaces `data` wholesale.
pub struct Feed<S: Schema> {
    transport: Arc<dyn Transport>,
    url: String,
    is_get: bool,
    /// Freshness timestamp; `None` until a header or the payload provides one.
    pub last_modified: Option<DateTime<Utc>>,
    pub data: S,
}

impl<S: Schema> Feed<S> {
    /// Create a feed with its own default HTTP transport
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new()?), url))
    }

    /// Create a feed on a shared transport
    pub fn with_transport(transport: Arc<dyn Transport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            is_get: false,
            last_modified: None,
            data: S::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_fetched(&self) -> bool {
        self.is_get
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Freshness probe: read `Last-Modified` from a HEAD response.
    ///
    /// An absent header leaves `last_modified` untouched.
    pub async fn get_info(&mut self) -> Result<(), FeedError> {
        let headers = self.transport.fetch_headers(&self.url).await?;

        if let Some(modified) = parse_last_modified(&headers)? {
            self.last_modified = Some(modified);
        }

        Ok(())
    }

    /// Run the freshness probe, fetch the body and decode it.
    pub async fn get(&mut self) -> Result<(), FeedError> {
        self.is_get = false;

        self.get_info()
            .await
            .map_err(|err| FeedError::Info(Box::new(err)))?;

        let payload = self
            .transport
            .fetch_body(&self.url)
            .await
            .map_err(|err| FeedError::Data(Box::new(err)))?;

        self.data = quick_xml::de::from_reader(payload.body.as_slice())?;

        if self.last_modified.is_none() {
            self.apply_generation_date()?;
        }

        self.is_get = true;
        info!(
            "Fetched {} feed with {} listings from {}",
            S::SOURCE,
            self.data.listing_count(),
            self.url
        );

        Ok(())
    }

    fn apply_generation_date(&mut self) -> Result<(), FeedError> {
        let Some(raw) = self.data.generation_date() else {
            return Ok(());
        };

        let raw = raw.trim();
        if raw.is_empty() {
            warn!("Feed has no usable generation-date, last modified time unknown");
            return Ok(());
        }

        let generated =
            DateTime::parse_from_rfc3339(raw).map_err(|source| FeedError::GenerationDate {
                value: raw.to_string(),
                source,
            })?;
        self.last_modified = Some(generated.with_timezone(&Utc));

        Ok(())
    }

    /// Validate the fetched data against the current calendar year.
    pub fn check(&self) -> Result<Vec<String>, FeedError> {
        self.check_in_year(Utc::now().year())
    }

    /// Validate the fetched data; `year` drives the "in the past" rules.
    pub fn check_in_year(&self, year: i32) -> Result<Vec<String>, FeedError> {
        if !self.is_get {
            return Err(FeedError::NotFetched);
        }

        if let Some(finding) = validation::gate(self.data.listing_count()) {
            return Ok(vec![finding]);
        }

        let findings = self.data.diagnostics(year);
        info!("{} feed check found {} problems", S::SOURCE, findings.len());

        Ok(findings)
    }
}

fn parse_last_modified(headers: &HeaderMap) -> Result<Option<DateTime<Utc>>, FeedError> {
    let raw = headers
        .get(HEADER_LAST_MODIFIED)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).trim().to_string())
        .unwrap_or_default();

    // An empty header counts as absent.
    if raw.is_empty() {
        warn!("Header not contains `{}`", HEADER_LAST_MODIFIED);
        return Ok(None);
    }

    let parsed = DateTime::parse_from_rfc2822(&raw)
        .map_err(|source| FeedError::LastModified { value: raw.clone(), source })?;

    Ok(Some(parsed.with_timezone(&Utc)))
}

#[async_trait]
impl<S: Schema> FeedTrait for Feed<S> {
    async fn get(&mut self) -> Result<(), FeedError> {
        Feed::get(self).await
    }

    fn check(&self) -> Result<Vec<String>, FeedError> {
        Feed::check(self)
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    fn listing_count(&self) -> usize {
        self.data.listing_count()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn source(&self) -> Source {
        S::SOURCE
    }
}

/// Build a boxed feed for `source` on a shared transport.
pub fn for_source(
    source: Source,
    transport: Arc<dyn Transport>,
    url: impl Into<String>,
) -> Box<dyn FeedTrait> {
    match source {
        Source::Avito => Box::new(AvitoFeed::with_transport(transport, url)),
        Source::Cian => Box::new(CianFeed::with_transport(transport, url)),
        Source::DomClick => Box::new(DomClickFeed::with_transport(transport, url)),
        Source::Realty => Box::new(RealtyFeed::with_transport(transport, url)),
    }
}
