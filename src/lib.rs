//! Fetch real-estate listing feeds (Avito, CIAN, DomClick, Yandex Realty)
//! and report data-quality problems in them.

pub mod error;
pub mod feeds;
pub mod models;
pub mod transport;
pub mod validation;

pub use error::{FeedError, FormatError};
pub use feeds::{AvitoFeed, CianFeed, ClientConfig, DomClickFeed, Feed, FeedTrait, RealtyFeed, Schema};
pub use models::{Report, Source};
pub use transport::{HttpTransport, Transport};
