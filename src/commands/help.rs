// Help command - show usage guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::colors;

/// Show all available commands
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("🤖 Welcome Bot - Help")
        .description("All available commands and information:")
        .color(colors::SUCCESS)
        .field(
            "🛠️ `/setup`",
            "Configure the welcome bot:\n\
            • `channel`: welcome channel\n\
            • `message`: custom welcome message\n\
            • `image_url`: URL for the welcome image\n\
            • `color`: embed color (hex without #)\n\
            • `auto_role`: role for new members\n\
            • `dm_welcome`: enable the DM welcome\n\
            • `dm_message`: DM welcome message",
            false,
        )
        .field(
            "🧪 `/test-welcome`",
            "Preview the welcome message with your current settings",
            false,
        )
        .field("📋 `/welcome-info`", "Show the current welcome configuration", false)
        .field("🔄 `/reset-config`", "Reset all welcome settings", false)
        .field("💾 `/backup-config`", "Back up the current configuration", false)
        .field("❓ `/help`", "Show this help message", false)
        .field(
            "📝 Message variables",
            "• `{user}` - mentions the member\n\
            • `{username}` - name without mention\n\
            • `{server}` - server name (announcements only)",
            false,
        )
        .field(
            "🎨 Color examples",
            "• `ff0000` - Red\n\
            • `00ff00` - Green\n\
            • `0099ff` - Blue\n\
            • `ff9900` - Orange\n\
            • `9900ff` - Purple",
            false,
        )
        .field(
            "💾 Persistent storage",
            "Every change is saved immediately and survives restarts.",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Need more help? Contact an administrator!",
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
