use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::commands::require_guild;
use crate::models::guild::{ConfigError, ConfigField, ConfigUpdate, GuildConfig};
use crate::utils::config::colors;
use crate::utils::formatters::{channel_mention, code_block, format_color, role_mention};
use crate::{Context, Error};

const NOT_SET: &str = "❌ Not set";

fn label(field: ConfigField) -> &'static str {
    match field {
        ConfigField::WelcomeChannel => "Welcome Channel",
        ConfigField::WelcomeMessage => "Welcome Message",
        ConfigField::WelcomeImageUrl => "Welcome Image",
        ConfigField::EmbedColor => "Embed Color",
        ConfigField::AutoRole => "Auto-Role",
        ConfigField::DmWelcome => "DM Welcome",
        ConfigField::DmMessage => "DM Message",
    }
}

/// Display value for one field; messages are cut at `message_limit` chars
fn describe(field: ConfigField, config: &GuildConfig, message_limit: usize) -> String {
    match field {
        ConfigField::WelcomeChannel => config
            .welcome_channel
            .map(channel_mention)
            .unwrap_or_else(|| NOT_SET.to_string()),
        ConfigField::WelcomeMessage => code_block(&config.welcome_message, message_limit),
        ConfigField::WelcomeImageUrl => match config.welcome_image_url {
            Some(_) => "🖼️ Set".to_string(),
            None => NOT_SET.to_string(),
        },
        ConfigField::EmbedColor => format!("🎨 {}", format_color(config.embed_color)),
        ConfigField::AutoRole => config
            .auto_role
            .map(|id| format!("🔰 {}", role_mention(id)))
            .unwrap_or_else(|| NOT_SET.to_string()),
        ConfigField::DmWelcome => {
            if config.dm_welcome {
                "💬 Enabled".to_string()
            } else {
                "❌ Disabled".to_string()
            }
        }
        ConfigField::DmMessage => code_block(&config.dm_message, 100),
    }
}

/// Configure the welcome bot
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "Welcome channel"] channel: Option<serenity::GuildChannel>,
    #[description = "Custom welcome message (use {user}, {username}, {server})"]
    message: Option<String>,
    #[description = "Image URL for the welcome embed"] image_url: Option<String>,
    #[description = "Embed color as hex, e.g. ff0000 for red"] color: Option<String>,
    #[description = "Role given to new members"] auto_role: Option<serenity::Role>,
    #[description = "Enable or disable the DM welcome"] dm_welcome: Option<bool>,
    #[description = "DM welcome message"] dm_message: Option<String>,
) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    let store = &ctx.data().configs;
    let mut updates = Vec::new();
    if let Some(channel) = channel {
        updates.push(ConfigUpdate::WelcomeChannel(Some(channel.id.get())));
    }
    if let Some(message) = message {
        updates.push(ConfigUpdate::WelcomeMessage(message));
    }
    if let Some(url) = image_url {
        updates.push(ConfigUpdate::WelcomeImageUrl(Some(url)));
    }
    if let Some(role) = auto_role {
        updates.push(ConfigUpdate::AutoRole(Some(role.id.get())));
    }
    if let Some(enabled) = dm_welcome {
        updates.push(ConfigUpdate::DmWelcome(enabled));
    }
    if let Some(message) = dm_message {
        updates.push(ConfigUpdate::DmMessage(message));
    }

    let mut changed: Vec<ConfigField> = updates.iter().map(ConfigUpdate::field).collect();
    let mut config = store.get_or_create(guild_id).await;
    for update in updates {
        config = store.update(guild_id, update).await;
    }

    // Invalid colors are reported in the summary and leave the stored color as is
    let mut color_error: Option<ConfigError> = None;
    if let Some(raw) = color {
        match store.set_field(guild_id, ConfigField::EmbedColor, &raw).await {
            Ok(updated) => {
                config = updated;
                changed.push(ConfigField::EmbedColor);
            }
            Err(e) => color_error = Some(e),
        }
    }

    if !changed.is_empty() {
        info!(guild_id, fields = ?changed, "Welcome setup changed");
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("🛠️ Welcome Bot Setup")
        .description("Welcome configuration");

    for field in ConfigField::ALL {
        if field == ConfigField::EmbedColor {
            if let Some(e) = &color_error {
                embed = embed.field(format!("❌ {}", label(field)), e.to_string(), false);
                continue;
            }
        }
        let marker = if changed.contains(&field) { "✅" } else { "📋" };
        embed = embed.field(
            format!("{} {}", marker, label(field)),
            describe(field, &config, 150),
            false,
        );
    }

    embed = if changed.is_empty() {
        embed
            .color(colors::INFO)
            .footer(serenity::CreateEmbedFooter::new("📋 Showing current configuration"))
    } else {
        embed.color(colors::SUCCESS).footer(serenity::CreateEmbedFooter::new(
            "✅ Configuration updated and saved!",
        ))
    };

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Show the current welcome configuration
#[poise::command(slash_command, guild_only, rename = "welcome-info")]
pub async fn welcome_info(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    let config = ctx.data().configs.get_or_create(guild_id).await;
    let guild_name = ctx
        .guild()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    let mut embed = serenity::CreateEmbed::new()
        .title("📋 Welcome Bot Configuration")
        .description(format!("Current settings for **{}**", guild_name))
        .color(config.embed_color)
        .footer(serenity::CreateEmbedFooter::new("Use /setup to change settings"));

    for field in ConfigField::ALL {
        let inline = !matches!(
            field,
            ConfigField::WelcomeChannel | ConfigField::WelcomeMessage | ConfigField::DmMessage
        );
        embed = embed.field(label(field), describe(field, &config, 200), inline);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Reset the welcome configuration to defaults
#[poise::command(
    slash_command,
    guild_only,
    rename = "reset-config",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn reset_config(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    ctx.data().configs.reset(guild_id).await;

    let embed = serenity::CreateEmbed::new()
        .title("🔄 Configuration reset")
        .description("All welcome settings were reset to their defaults and saved.")
        .color(colors::WARNING)
        .field(
            "ℹ️ Next step",
            "Use `/setup` to configure the bot again.",
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// Back up the current configuration of all servers
#[poise::command(
    slash_command,
    guild_only,
    rename = "backup-config",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn backup_config(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let embed = match data.configs.backup(&data.settings.backup_prefix).await {
        Ok(path) => serenity::CreateEmbed::new()
            .title("💾 Backup created")
            .description(format!(
                "Configuration saved as `{}`",
                path.display()
            ))
            .color(colors::SUCCESS),
        Err(e) => {
            error!("Failed to write config backup: {:?}", e);
            serenity::CreateEmbed::new()
                .title("❌ Backup failed")
                .description(format!("Error while creating the backup: {}", e))
                .color(colors::ERROR)
        }
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
