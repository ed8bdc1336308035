// Platform side effects used by the join pipeline
// SerenityGateway is the live implementation, tests use a recording fake

use std::num::NonZeroU64;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use tracing::debug;

use crate::features::announcement::AnnouncementPayload;
use crate::models::member::{GuildInfo, JoiningMember};

const AUTO_ROLE_REASON: &str = "Welcome auto-role";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Role {0} not found")]
    RoleNotFound(u64),
    #[error("Channel {0} not found")]
    ChannelNotFound(u64),
    #[error("Platform error: {0}")]
    Platform(String),
}

impl From<serenity::Error> for GatewayError {
    fn from(e: serenity::Error) -> Self {
        GatewayError::Platform(e.to_string())
    }
}

/// Outbound capabilities of the chat platform
#[async_trait]
pub trait WelcomeGateway: Send + Sync {
    async fn grant_role(&self, guild_id: u64, member_id: u64, role_id: u64)
        -> Result<(), GatewayError>;

    async fn send_announcement(
        &self,
        guild_id: u64,
        channel_id: u64,
        payload: &AnnouncementPayload,
    ) -> Result<(), GatewayError>;

    async fn send_direct_message(&self, member_id: u64, content: &str) -> Result<(), GatewayError>;
}

/// Gateway backed by a live serenity context
pub struct SerenityGateway {
    ctx: serenity::Context,
}

impl SerenityGateway {
    pub fn new(ctx: &serenity::Context) -> Self {
        Self { ctx: ctx.clone() }
    }

    /// `Some(false)` only when the guild is cached and lacks the role
    fn role_cached(&self, guild_id: serenity::GuildId, role_id: serenity::RoleId) -> Option<bool> {
        self.ctx
            .cache
            .guild(guild_id)
            .map(|g| g.roles.contains_key(&role_id))
    }

    fn channel_cached(
        &self,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Option<bool> {
        self.ctx
            .cache
            .guild(guild_id)
            .map(|g| g.channels.contains_key(&channel_id))
    }
}

fn snowflake(id: u64, missing: GatewayError) -> Result<NonZeroU64, GatewayError> {
    NonZeroU64::new(id).ok_or(missing)
}

#[async_trait]
impl WelcomeGateway for SerenityGateway {
    async fn grant_role(
        &self,
        guild_id: u64,
        member_id: u64,
        role_id: u64,
    ) -> Result<(), GatewayError> {
        let role = serenity::RoleId::from(snowflake(role_id, GatewayError::RoleNotFound(role_id))?);
        let guild = serenity::GuildId::from(snowflake(guild_id, GatewayError::RoleNotFound(role_id))?);
        let user = serenity::UserId::from(snowflake(
            member_id,
            GatewayError::Platform("invalid member id".into()),
        )?);

        if self.role_cached(guild, role) == Some(false) {
            return Err(GatewayError::RoleNotFound(role_id));
        }

        self.ctx
            .http
            .add_member_role(guild, user, role, Some(AUTO_ROLE_REASON))
            .await?;
        Ok(())
    }

    async fn send_announcement(
        &self,
        guild_id: u64,
        channel_id: u64,
        payload: &AnnouncementPayload,
    ) -> Result<(), GatewayError> {
        let channel = serenity::ChannelId::from(snowflake(
            channel_id,
            GatewayError::ChannelNotFound(channel_id),
        )?);
        let guild = serenity::GuildId::from(snowflake(
            guild_id,
            GatewayError::ChannelNotFound(channel_id),
        )?);

        if self.channel_cached(guild, channel) == Some(false) {
            return Err(GatewayError::ChannelNotFound(channel_id));
        }

        channel
            .send_message(&self.ctx, serenity::CreateMessage::new().embed(to_embed(payload)))
            .await?;
        Ok(())
    }

    async fn send_direct_message(&self, member_id: u64, content: &str) -> Result<(), GatewayError> {
        let user = serenity::UserId::from(snowflake(
            member_id,
            GatewayError::Platform("invalid member id".into()),
        )?);

        user.direct_message(&self.ctx, serenity::CreateMessage::new().content(content))
            .await?;
        Ok(())
    }
}

/// Convert an announcement into a Discord embed
pub fn to_embed(payload: &AnnouncementPayload) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(&payload.title)
        .description(&payload.description)
        .color(payload.accent_color)
        .thumbnail(&payload.thumbnail_url)
        .footer(serenity::CreateEmbedFooter::new(&payload.footer_text));

    for field in &payload.fields {
        embed = embed.field(&field.label, &field.value, field.inline);
    }

    if let Some(url) = &payload.image_url {
        embed = embed.image(url);
    }

    embed
}

fn to_datetime(ts: serenity::Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}

const UNCACHED_GUILD_NAME: &str = "this server";

/// Guild name and member count, with placeholders when the guild is not cached
fn guild_snapshot(guild_id: u64, cached: Option<(String, u64)>) -> (String, u64) {
    cached.unwrap_or_else(|| {
        debug!(guild_id, "Guild not in cache, using placeholder name and member count");
        (UNCACHED_GUILD_NAME.to_string(), 0)
    })
}

/// Snapshot the member and their guild from the cache at join time
pub fn joining_member(ctx: &serenity::Context, member: &serenity::Member) -> JoiningMember {
    let cached = ctx
        .cache
        .guild(member.guild_id)
        .map(|g| (g.name.clone(), g.member_count));
    let (guild_name, member_count) = guild_snapshot(member.guild_id.get(), cached);

    JoiningMember {
        id: member.user.id.get(),
        name: member.user.name.clone(),
        avatar_url: member.face(),
        joined_at: member.joined_at.map(to_datetime).unwrap_or_else(Utc::now),
        created_at: to_datetime(member.user.id.created_at()),
        guild: GuildInfo {
            id: member.guild_id.get(),
            name: guild_name,
            member_count,
        },
    }
}
