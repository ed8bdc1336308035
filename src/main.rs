// Welcomer Bot - Rust Edition
// Greets new server members with an auto-role, an announcement and a DM

mod commands;
mod features;
mod models;
mod storage;
mod utils;

use std::env;
use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::features::welcome::JoinDispatcher;
use crate::storage::config_store::ConfigStore;
use crate::utils::config::Settings;

/// User data shared across all commands and events
pub struct Data {
    pub configs: Arc<ConfigStore>,
    pub dispatcher: JoinDispatcher,
    pub settings: Settings,
}

// Manual Debug impl so the token never ends up in logs
impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("configs", &self.configs.path())
            .field("backup_prefix", &self.settings.backup_prefix)
            .finish()
    }
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all slash commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::config::setup(),
        commands::test_welcome::test_welcome(),
        commands::config::welcome_info(),
        commands::config::reset_config(),
        commands::config::backup_config(),
        commands::help::help(),
    ]
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Bot online as {} - {} servers, configs for {} servers",
                data_about_bot.user.name,
                data_about_bot.guilds.len(),
                data.configs.len().await
            );
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            features::member_join::handle_member_join(ctx, new_member, data).await;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "welcomer_rs=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    info!("Starting Welcomer Bot (Rust Edition)...");
    info!(path = ?settings.config_path, "Using guild config file");

    let configs = Arc::new(ConfigStore::open(&settings.config_path).await);
    let dispatcher = JoinDispatcher::new(configs.clone());
    let token = settings.token.clone();
    let store = configs.clone();

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say(format!("❌ Error: {}", error)).await;
                        }
                        err => {
                            if let Err(e) = poise::builtins::on_error(err).await {
                                error!("Error while handling error: {:?}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready! Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(Data {
                    configs,
                    dispatcher,
                    settings,
                })
            })
        })
        .build();

    // GUILD_MEMBERS is privileged, enable "Server Members Intent" in the Dev Portal
    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Failed to create client")?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutting down...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Failed to register Ctrl+C handler: {:?}", e),
        }
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    if let Err(e) = store.flush().await {
        warn!("Failed to flush guild configs on shutdown: {}", e);
    }

    info!("Goodbye!");
    Ok(())
}
