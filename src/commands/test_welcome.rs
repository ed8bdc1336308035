// Test welcome command - post the announcement for the invoking member

use poise::serenity_prelude as serenity;
use tracing::warn;

use crate::commands::require_guild;
use crate::features::gateway::{joining_member, SerenityGateway};
use crate::features::welcome::WelcomeError;
use crate::utils::config::colors;
use crate::utils::formatters::channel_mention;
use crate::{Context, Error};

/// Test the welcome message with yourself
#[poise::command(
    slash_command,
    guild_only,
    rename = "test-welcome",
    required_permissions = "MANAGE_GUILD"
)]
pub async fn test_welcome(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = require_guild(ctx.guild_id())?;

    let member = match ctx.author_member().await {
        Some(member) => member.into_owned(),
        None => {
            ctx.say("Could not load your server membership.").await?;
            return Ok(());
        }
    };

    let serenity_ctx = ctx.serenity_context();
    let joining = joining_member(serenity_ctx, &member);
    let gateway = SerenityGateway::new(serenity_ctx);

    let reply = match ctx
        .data()
        .dispatcher
        .send_test_announcement(&gateway, &joining)
        .await
    {
        Ok(channel_id) => {
            let embed = serenity::CreateEmbed::new()
                .title("✅ Test successful!")
                .description(format!(
                    "Test welcome message sent to {}!",
                    channel_mention(channel_id)
                ))
                .color(colors::SUCCESS);
            poise::CreateReply::default().embed(embed)
        }
        Err(WelcomeError::ChannelNotSet) => poise::CreateReply::default().content(
            "❌ No welcome channel configured! Use `/setup channel:#channel` first.",
        ),
        Err(WelcomeError::Gateway(e)) => {
            warn!(guild_id, "Test welcome failed: {}", e);
            poise::CreateReply::default()
                .content(format!("❌ Welcome channel not reachable: {}", e))
        }
    };

    ctx.send(reply.ephemeral(true)).await?;

    Ok(())
}
