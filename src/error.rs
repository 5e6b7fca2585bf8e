use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while fetching, decoding or checking a feed.
///
/// Validation findings are not errors: they are returned as plain strings by
/// `check`. Everything here aborts the call that produced it.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("can't build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("can't get feed {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("feed not available. Status: {status}")]
    Status { status: StatusCode },

    #[error("invalid Last-Modified header {value:?}: {source}")]
    LastModified {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid generation-date {value:?}: {source}")]
    GenerationDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("can't decode feed: {0}")]
    Decode(#[from] quick_xml::DeError),

    #[error("can't get feed info: {0}")]
    Info(#[source] Box<FeedError>),

    #[error("can't get feed data: {0}")]
    Data(#[source] Box<FeedError>),

    #[error("feed not got")]
    NotFetched,
}

impl FeedError {
    /// True for failures of the HTTP exchange itself (network or status).
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Status { .. } => true,
            Self::Info(inner) | Self::Data(inner) => inner.is_transport(),
            _ => false,
        }
    }
}

/// Text that could not be decoded into the expected value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value {text:?}")]
pub struct FormatError {
    pub kind: &'static str,
    pub text: String,
}

impl FormatError {
    pub(crate) fn new(kind: &'static str, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}
