use crate::error::FeedError;
use crate::models::Source;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Decoded payload of one platform, together with its checks.
pub trait Schema: DeserializeOwned + Default + Send + Sync + 'static {
    const SOURCE: Source;

    /// Number of listings the size gate looks at.
    fn listing_count(&self) -> usize;

    /// Every per-listing finding, in listing order then rule order.
    fn diagnostics(&self, year: i32) -> Vec<String>;

    /// In-payload generation timestamp, used when no header timestamp is known.
    fn generation_date(&self) -> Option<&str> {
        None
    }
}

/// Common trait for all platform feeds
/// Lets callers drive any platform through a `Box<dyn FeedTrait>`
#[async_trait]
pub trait FeedTrait: Send + Sync {
    /// Fetch and decode the feed, replacing previously fetched data
    async fn get(&mut self) -> Result<(), FeedError>;

    /// Validate the fetched data
    fn check(&self) -> Result<Vec<String>, FeedError>;

    fn last_modified(&self) -> Option<DateTime<Utc>>;

    fn listing_count(&self) -> usize;

    fn url(&self) -> &str;

    /// Get the name of the feed platform
    fn source(&self) -> Source;
}
