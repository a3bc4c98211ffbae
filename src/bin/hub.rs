use std::time::Duration;

use clap::Parser;
use status_comments::{
    actors::{comments::CommentHandle, messages::CommentEvent},
    config::{Config, JournalConfig, read_config_file},
    journal::CommentJournal,
    registry::{EntityRegistry, HostRef, ServiceRef},
};
use tokio::sync::broadcast;
use tracing::{debug, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("status_comments", LevelFilter::TRACE),
        ("hub", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let registry = build_registry(&config)?;
    let journal = open_journal(&config).await?;

    let (event_tx, event_rx) = broadcast::channel(256);
    let handle = CommentHandle::spawn(
        registry,
        journal,
        Duration::from_secs(config.sweep_interval),
        event_tx,
    )
    .await?;

    let stats = handle.stats().await?;
    info!(
        "comment hub running: {} comments restored, {} hosts, {} services",
        stats.live_comments, stats.hosts, stats.services
    );

    tokio::spawn(log_events(event_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    handle.shutdown().await?;

    Ok(())
}

fn build_registry(config: &Config) -> anyhow::Result<EntityRegistry> {
    let mut registry = EntityRegistry::new();

    if let Some(hosts) = &config.hosts {
        for host_config in hosts {
            let host = HostRef::new(&host_config.name);
            registry.add_host(host.clone(), host_config.display.clone());

            for service in &host_config.services {
                registry.add_service(ServiceRef::new(host.clone(), service), None)?;
            }
        }
    }

    debug!(
        "registry initialized with {} hosts, {} services",
        registry.host_count(),
        registry.service_count()
    );
    Ok(registry)
}

async fn open_journal(config: &Config) -> anyhow::Result<Option<Box<dyn CommentJournal>>> {
    match config.journal.clone().unwrap_or_default() {
        JournalConfig::None => {
            info!("journal disabled, comments will not survive restarts");
            Ok(None)
        }

        #[cfg(feature = "journal-sqlite")]
        JournalConfig::Sqlite { path } => {
            let journal = status_comments::journal::sqlite::SqliteJournal::new(&path).await?;
            Ok(Some(Box::new(journal)))
        }

        #[cfg(not(feature = "journal-sqlite"))]
        JournalConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite journal requested, but built without the journal-sqlite feature")
        }
    }
}

async fn log_events(mut event_rx: broadcast::Receiver<CommentEvent>) {
    loop {
        match event_rx.recv().await {
            Ok(CommentEvent::Added(comment)) => {
                info!(
                    "comment {} added on {} by {}",
                    comment.id(),
                    comment.entity(),
                    comment.author()
                );
            }
            Ok(CommentEvent::Removed { comment, reason }) => {
                info!(
                    "comment {} on {} removed ({reason:?})",
                    comment.id(),
                    comment.entity()
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("event logger lagged, skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
