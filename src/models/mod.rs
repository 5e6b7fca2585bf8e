use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified-ad platform a feed is published for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Avito,
    Cian,
    #[value(name = "domclick")]
    DomClick,
    Realty,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Self::Avito => "Avito",
            Self::Cian => "CIAN",
            Self::DomClick => "DomClick",
            Self::Realty => "Yandex Realty",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one fetch + check cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub source: Source,
    pub url: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub checked_at: DateTime<Utc>,
    pub listings: usize,
    pub diagnostics: Vec<String>,
}
