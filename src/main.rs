use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use feed_audit::feeds::{self, avito, AvitoFeed, ClientConfig, FeedTrait};
use feed_audit::{HttpTransport, Report, Source, Transport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Fetch a listing feed and report data-quality problems
#[derive(Debug, Parser)]
#[command(name = "feed-audit", version)]
struct Args {
    /// Platform the feed is published for
    #[arg(value_enum)]
    platform: Source,

    /// Feed URL
    url: String,

    /// Write the report as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// User-Agent header to send
    #[arg(long)]
    user_agent: Option<String>,

    /// Avito only: report NewDevelopmentId values missing from the catalogue
    #[arg(long)]
    developments: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("🏠 Feed Audit - {} feed check", args.platform);
    info!("==========================================");

    let mut config = ClientConfig::default().with_timeout(Duration::from_secs(args.timeout));
    if let Some(user_agent) = &args.user_agent {
        config = config.with_user_agent(user_agent.as_str());
    }
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::with_config(&config).context("Failed to create HTTP client")?);

    let (feed, extra) = fetch(&args, transport).await?;

    let mut diagnostics = feed.check().context("Failed to check feed")?;
    diagnostics.extend(extra);

    match feed.last_modified() {
        Some(modified) => info!("Feed last modified at {}", modified),
        None => warn!("Feed last modified time is unknown"),
    }

    if diagnostics.is_empty() {
        info!("✅ No problems found in {} listings", feed.listing_count());
    } else {
        info!("Found {} problems in {} listings\n", diagnostics.len(), feed.listing_count());
        for (i, finding) in diagnostics.iter().enumerate() {
            println!("{}. {}", i + 1, finding);
        }
    }

    if let Some(path) = &args.output {
        let report = Report {
            source: feed.source(),
            url: feed.url().to_string(),
            last_modified: feed.last_modified(),
            checked_at: Utc::now(),
            listings: feed.listing_count(),
            diagnostics,
        };
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved report to {}", path.display());
    }

    Ok(())
}

/// Fetch the feed; Avito feeds can additionally be matched against the
/// new-developments catalogue.
async fn fetch(
    args: &Args,
    transport: Arc<dyn Transport>,
) -> Result<(Box<dyn FeedTrait>, Vec<String>)> {
    if args.developments && args.platform != Source::Avito {
        warn!("--developments only applies to Avito feeds, ignoring");
    }

    if !(args.developments && args.platform == Source::Avito) {
        let mut feed = feeds::for_source(args.platform, transport, args.url.as_str());
        feed.get()
            .await
            .with_context(|| format!("Failed to fetch {}", args.url))?;
        return Ok((feed, Vec::new()));
    }

    let mut feed = AvitoFeed::with_transport(transport, args.url.as_str());
    feed.get()
        .await
        .with_context(|| format!("Failed to fetch {}", args.url))?;

    let catalogue = feed
        .developments()
        .await
        .with_context(|| format!("Failed to fetch {}", avito::DEVELOPMENTS_URL))?;

    let unknown = feed
        .data
        .unknown_developments(&catalogue)
        .into_iter()
        .map(|id| format!("NewDevelopmentId {id} is not in the Avito catalogue"))
        .collect();

    let feed: Box<dyn FeedTrait> = Box::new(feed);
    Ok((feed, unknown))
}
