use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use relaybot::cli::{Cli, Commands};
use relaybot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use relaycore::core::{config, init_logger, metrics};
use relaycore::storage::{create_memory_pool, create_pool};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the matching subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics that escape the callback dispatcher instead of losing them
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present; config statics read them lazily
    let _ = dotenv();
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Routes) => print_routes(),
        Some(Commands::Settings { public_only, json }) => print_settings(public_only, json).await,
    }
}

async fn run_bot() -> Result<()> {
    let pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );
    let deps = HandlerDeps::from_pool(pool)?;
    deps.settings.prime_cache().await;

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }
    match bot.get_me().await {
        Ok(me) => log::info!("Starting bot @{}", me.username()),
        Err(e) => log::warn!("Could not fetch bot info: {}", e),
    }

    let dispatcher = Arc::clone(&deps.dispatcher);
    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Bot stopped. {}", dispatcher.routing_stats());
    log::debug!("Final metrics:\n{}", metrics::render());
    Ok(())
}

/// Lists the callback routes without touching the configured database.
fn print_routes() -> Result<()> {
    let deps = HandlerDeps::from_pool(Arc::new(create_memory_pool()?))?;
    let routes = deps.dispatcher.routes();
    for (kind, rule) in routes.rules() {
        println!("{:<8} {}", kind, rule);
    }
    println!("{} routes registered", routes.registered());
    Ok(())
}

async fn print_settings(public_only: bool, json: bool) -> Result<()> {
    let pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    let deps = HandlerDeps::from_pool(pool)?;
    let settings = deps.settings.try_get_all_system(public_only).await?;

    if json {
        let map: serde_json::Map<String, serde_json::Value> = settings
            .iter()
            .map(|s| {
                let value = s
                    .value
                    .as_json()
                    .cloned()
                    .unwrap_or_else(|| serde_json::Value::String(s.value.encode()));
                (s.key.clone(), value)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for setting in &settings {
        println!(
            "{} = {} ({}){}",
            setting.key,
            setting.value,
            setting.value.value_type(),
            if setting.is_public { " public" } else { "" }
        );
    }
    println!("{} settings", settings.len());
    Ok(())
}
