//! Pokémon User Bot - Main Entry Point
//!
//! A Telegram userbot with chat moderation tools and automation for the
//! Pokémon game bot.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Input, Password};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pokemon_user_bot::commands::CommandHandler;
use pokemon_user_bot::config::{BallCatalog, BotSettings, TelegramConfig};
use pokemon_user_bot::telegram::{TelegramBot, TelegramError};

/// Telegram userbot for moderation and Pokémon automation.
#[derive(Parser, Debug)]
#[command(name = "pokemon_bot")]
#[command(about = "Telegram userbot for chat moderation and Pokémon automation")]
#[command(version)]
struct Args {
    /// Path to the ball catalog JSON file (overrides `CATALOG_PATH`).
    #[arg(short, long)]
    catalog: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Generate an example catalog file and exit.
    #[arg(long)]
    generate_catalog: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if args.generate_catalog {
        return generate_example_catalog();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let mut settings = BotSettings::from_env_with_defaults();
    if let Some(path) = args.catalog {
        settings.catalog_path = path.into();
    }

    let catalog = match BallCatalog::load_from_file(&settings.catalog_path) {
        Ok(catalog) => {
            info!("Loaded {} Pokémon from {}", catalog.len(), settings.catalog_path.display());
            catalog
        }
        Err(e) => {
            warn!(
                "Could not load catalog {}: {}. `list` will show empty categories.",
                settings.catalog_path.display(),
                e
            );
            BallCatalog::new()
        }
    };

    let bot = TelegramBot::connect(&tg_config, settings.min_send_interval())
        .await
        .context("Failed to connect to Telegram")?;

    if !bot.is_authorized().await.context("Failed to check authorization")? {
        authenticate(&bot, &tg_config).await?;
    }

    let bot = Arc::new(bot);
    let handler = Arc::new(CommandHandler::new(bot.clone(), &settings, catalog));

    info!("Starting Pokémon bot...");
    info!("Command prefix: {}", settings.command_prefix);
    info!("Bot is running. Use Ctrl+C to stop.");

    tokio::select! {
        result = run_updates(&bot, &handler) => {
            if let Err(e) = result {
                error!("Update stream failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    info!("Shutting down...");
    handler.release().stop().await;
    bot.close_updates().await;
    bot.disconnect();

    Ok(())
}

/// Dispatches every new message on its own task until the stream ends.
async fn run_updates(bot: &TelegramBot, handler: &Arc<CommandHandler>) -> Result<(), TelegramError> {
    while let Some(message) = bot.next_message().await? {
        let handler = Arc::clone(handler);
        tokio::spawn(async move {
            handler.handle(&message).await;
        });
    }

    info!("Update stream closed");
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Generates an example catalog file.
fn generate_example_catalog() -> Result<()> {
    let example = BallCatalog::example();
    example.save_to_file("catalog.example.json")?;

    println!("✓ Example catalog written to: catalog.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy catalog.example.json to catalog.json");
    println!("2. Fill in the Pokémon of each ball category");
    println!("3. Create a .env file with TG_API_ID and TG_API_HASH");
    println!("4. Run: pokemon_bot");

    Ok(())
}

/// Handles Telegram authentication.
async fn authenticate(bot: &TelegramBot, config: &TelegramConfig) -> Result<()> {
    info!("Authentication required");

    let phone: String = Input::new()
        .with_prompt("Enter your phone number (with country code)")
        .interact_text()?;

    let token = bot
        .request_login_code(&phone, &config.api_hash)
        .await
        .context("Failed to request login code")?;

    info!("Login code sent to your Telegram app");

    let code: String = Input::new()
        .with_prompt("Enter the login code")
        .interact_text()?;

    match bot.sign_in(&token, &code).await {
        Ok(()) => {
            info!("Successfully signed in!");
            Ok(())
        }
        Err(TelegramError::PasswordRequired(password_token)) => {
            info!("Two-factor authentication is enabled");

            let hint = password_token.hint().unwrap_or("no hint");
            info!("Password hint: {}", hint);

            let password: String = Password::new()
                .with_prompt("Enter your 2FA password")
                .interact()?;

            bot.check_password(password_token, &password)
                .await
                .context("2FA authentication failed")?;

            info!("Successfully signed in with 2FA!");
            Ok(())
        }
        Err(e) => Err(e).context("Authentication failed"),
    }
}
