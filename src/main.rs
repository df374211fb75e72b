//! # Gratibot
//!
//! Telegram gratitude journal with timezone-aware daily reminders.
//!
//! Usage:
//!   gratibot                          # Run with ~/.gratibot/config.toml
//!   gratibot --config ./dev.toml      # Custom config path
//!   gratibot --db ./gratibot.db       # Custom database path
//!
//! The bot token comes from the config file, or the GRATIBOT_BOT_TOKEN
//! environment variable if set.

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use gratibot_bot::{BotRouter, GratitudePrompter, SessionRegistry};
use gratibot_channels::{TelegramChannel, TelegramConfig};
use gratibot_core::traits::{
    GratitudeStore, Messenger, ReminderNotifier, ScheduleStore, UserStore,
};
use gratibot_core::GratibotConfig;
use gratibot_scheduler::{ReminderLoop, ScheduleGenerator, TzDatabasePlanner};
use gratibot_store::SqliteStore;

#[derive(Parser)]
#[command(
    name = "gratibot",
    version,
    about = "🌱 Gratibot: a gratitude journal that pings you once a day"
)]
struct Cli {
    /// Config file path (default: ~/.gratibot/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Database path (overrides config)
    #[arg(long)]
    db: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "gratibot=debug"
    } else {
        "gratibot=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => GratibotConfig::load_from(Path::new(&expand_path(path)))?,
        None => GratibotConfig::load()?,
    };
    if let Ok(token) = std::env::var("GRATIBOT_BOT_TOKEN") {
        config.telegram.bot_token = token;
    }
    if config.telegram.bot_token.is_empty() {
        anyhow::bail!(
            "No bot token. Set [telegram].bot_token in the config or GRATIBOT_BOT_TOKEN."
        );
    }

    // Open database
    let db_path = expand_path(cli.db.as_deref().unwrap_or(&config.storage.db_path));
    let store = Arc::new(SqliteStore::open(Path::new(&db_path))?);

    // Connect the channel
    let channel = TelegramChannel::new(TelegramConfig {
        bot_token: config.telegram.bot_token.clone(),
        poll_interval: config.telegram.poll_interval,
    });
    let me = channel.get_me().await?;

    println!("🌱 Gratibot v{}", env!("CARGO_PKG_VERSION"));
    println!("   🤖 Bot:      @{}", me.username.as_deref().unwrap_or("unknown"));
    println!("   🗄️ Database: {db_path}");
    println!("   🌍 Mode:     {:?}", config.reminders.mode);
    println!();

    // Wire everything together
    let sessions = Arc::new(SessionRegistry::new());
    let messenger: Arc<dyn Messenger> = Arc::new(channel.clone());
    let prompter: Arc<dyn ReminderNotifier> =
        Arc::new(GratitudePrompter::new(messenger.clone(), sessions.clone()));
    let users: Arc<dyn UserStore> = store.clone();
    let schedules: Arc<dyn ScheduleStore> = store.clone();
    let gratitude: Arc<dyn GratitudeStore> = store.clone();
    let planner = Arc::new(TzDatabasePlanner);
    let generator = Arc::new(ScheduleGenerator::new(
        users.clone(),
        schedules.clone(),
        planner.clone(),
        config.reminders.mode,
    ));

    let reminder_loop = Arc::new(ReminderLoop::new(
        generator.clone(),
        users.clone(),
        schedules,
        prompter.clone(),
        config.reminders.mode,
    ));
    tokio::spawn(reminder_loop.run());

    let router = BotRouter::new(
        users, gratitude, generator, planner, messenger, sessions, prompter,
    );

    // Poll for updates until ctrl-c
    let mut updates = channel.start_polling();
    loop {
        tokio::select! {
            maybe_message = updates.next() => {
                match maybe_message {
                    Some(message) => router.handle(message).await,
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
