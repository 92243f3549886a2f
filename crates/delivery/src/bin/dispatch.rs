//! One-shot dispatcher run.
//!
//! Examples:
//!   dispatch --channel push
//!   dispatch --channel all --batch-size 100
//!   dispatch --channel email --requeue-failed --max-attempts 5

use std::env;

use clap::{Parser, ValueEnum};
use database::{Channel, Database};
use delivery::{
    BatchReport, ChannelSender, Dispatcher, DispatcherConfig, EmailConfig, EmailSender, LoggingSender, PushConfig,
    PushSender, WhatsAppConfig, WhatsAppSender,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ChannelArg {
    Push,
    Email,
    Whatsapp,
    All,
}

impl ChannelArg {
    fn channels(self) -> Vec<Channel> {
        match self {
            ChannelArg::Push => vec![Channel::Push],
            ChannelArg::Email => vec![Channel::Email],
            ChannelArg::Whatsapp => vec![Channel::Whatsapp],
            ChannelArg::All => Channel::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "dispatch")]
#[command(about = "Deliver queued notifications over push, email or WhatsApp")]
struct Args {
    /// Channel to drain
    #[arg(long, value_enum)]
    channel: ChannelArg,

    /// Entries claimed per channel (overrides DISPATCH_BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<i64>,

    /// Requeue retryable failures before dispatching
    #[arg(long)]
    requeue_failed: bool,

    /// Only requeue entries with fewer attempts than this
    #[arg(long, default_value_t = 5)]
    max_attempts: i64,

    /// Log messages instead of contacting providers
    #[arg(long)]
    log_only: bool,

    /// SQLite database URL. Falls back to SQLITE_PATH env.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = DispatcherConfig::from_env()?;
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size);
    }

    let database_url = args
        .database_url
        .clone()
        .or_else(|| env::var("SQLITE_PATH").ok())
        .unwrap_or_else(|| "sqlite:vitals.db?mode=rwc".to_string());

    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let mut total = BatchReport::default();
    let mut failures = 0;

    for channel in args.channel.channels() {
        match run_channel(&db, channel, &config, &args).await {
            Ok(report) => total.merge(report),
            Err(e) => {
                error!(channel = %channel, error = %e, "Dispatch failed");
                failures += 1;
            }
        }
    }

    info!(
        claimed = total.claimed,
        sent = total.sent,
        failed = total.failed,
        skipped = total.skipped,
        deactivated = total.deactivated,
        "Dispatch finished"
    );

    db.close().await;

    if failures > 0 {
        return Err(format!("{} channel(s) failed", failures).into());
    }
    Ok(())
}

async fn run_channel(
    db: &Database,
    channel: Channel,
    config: &DispatcherConfig,
    args: &Args,
) -> Result<BatchReport, Box<dyn std::error::Error>> {
    if args.log_only {
        return run(db, LoggingSender::new(channel), config, args).await;
    }

    match channel {
        Channel::Push => run(db, PushSender::new(PushConfig::from_env()?)?, config, args).await,
        Channel::Email => run(db, EmailSender::new(EmailConfig::from_env()?)?, config, args).await,
        Channel::Whatsapp => run(db, WhatsAppSender::new(WhatsAppConfig::from_env()?)?, config, args).await,
    }
}

async fn run<S: ChannelSender>(
    db: &Database,
    sender: S,
    config: &DispatcherConfig,
    args: &Args,
) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new(db.clone(), sender, config.clone())?;

    if args.requeue_failed {
        dispatcher.requeue_failed(args.max_attempts).await?;
    }

    Ok(dispatcher.run_batch().await?)
}
