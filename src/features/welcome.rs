// Member join pipeline: auto-role, channel announcement, DM greeting
//
// Each action is attempted exactly once, in that order. A failing action is
// logged at debug level and never stops the ones after it.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::features::announcement::compose;
use crate::features::gateway::{GatewayError, WelcomeGateway};
use crate::models::member::JoiningMember;
use crate::storage::config_store::ConfigStore;
use crate::utils::template::{render, TemplateContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WelcomeAction {
    RoleGrant,
    ChannelAnnouncement,
    DirectMessage,
}

impl fmt::Display for WelcomeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WelcomeAction::RoleGrant => "role grant",
            WelcomeAction::ChannelAnnouncement => "channel announcement",
            WelcomeAction::DirectMessage => "direct message",
        };
        f.write_str(name)
    }
}

/// Result of one welcome action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// Not configured for this guild
    Skipped,
    Failed(GatewayError),
}

impl ActionOutcome {
    fn from_result(result: Result<(), GatewayError>) -> Self {
        match result {
            Ok(()) => ActionOutcome::Completed,
            Err(e) => ActionOutcome::Failed(e),
        }
    }
}

/// Per-action outcomes of one join event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub role_grant: ActionOutcome,
    pub announcement: ActionOutcome,
    pub direct_message: ActionOutcome,
}

impl DispatchReport {
    /// Outcomes in execution order
    pub fn outcomes(&self) -> [(WelcomeAction, &ActionOutcome); 3] {
        [
            (WelcomeAction::RoleGrant, &self.role_grant),
            (WelcomeAction::ChannelAnnouncement, &self.announcement),
            (WelcomeAction::DirectMessage, &self.direct_message),
        ]
    }
}

/// Errors surfaced to whoever requested a test announcement
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WelcomeError {
    #[error("No welcome channel configured")]
    ChannelNotSet,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub struct JoinDispatcher {
    store: Arc<ConfigStore>,
}

impl JoinDispatcher {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Run the welcome actions for a freshly joined member
    pub async fn handle<G>(&self, gateway: &G, member: &JoiningMember) -> DispatchReport
    where
        G: WelcomeGateway + ?Sized,
    {
        let guild_id = member.guild.id;
        let config = self.store.get_or_create(guild_id).await;

        let role_grant = match config.auto_role {
            Some(role_id) => ActionOutcome::from_result(
                gateway.grant_role(guild_id, member.id, role_id).await,
            ),
            None => ActionOutcome::Skipped,
        };

        let announcement = match config.welcome_channel {
            Some(channel_id) => {
                let payload = compose(member, &config);
                ActionOutcome::from_result(
                    gateway.send_announcement(guild_id, channel_id, &payload).await,
                )
            }
            None => ActionOutcome::Skipped,
        };

        let direct_message = if config.dm_welcome {
            // No server name in a DM, {server} stays as typed
            let mention = member.mention();
            let context = TemplateContext {
                mention: Some(&mention),
                plain_name: Some(&member.name),
                server_name: None,
            };
            let content = render(&config.dm_message, &context);
            ActionOutcome::from_result(gateway.send_direct_message(member.id, &content).await)
        } else {
            ActionOutcome::Skipped
        };

        let report = DispatchReport {
            role_grant,
            announcement,
            direct_message,
        };

        for (action, outcome) in report.outcomes() {
            if let ActionOutcome::Failed(e) = outcome {
                debug!(guild_id, member_id = member.id, %action, "Welcome action failed: {}", e);
            }
        }
        info!(guild_id, member_id = member.id, "Processed member join");

        report
    }

    /// Post the announcement for `member` without granting roles or sending DMs.
    /// Returns the channel it was posted in.
    pub async fn send_test_announcement<G>(
        &self,
        gateway: &G,
        member: &JoiningMember,
    ) -> Result<u64, WelcomeError>
    where
        G: WelcomeGateway + ?Sized,
    {
        let config = self.store.get_or_create(member.guild.id).await;
        let channel_id = config.welcome_channel.ok_or(WelcomeError::ChannelNotSet)?;

        let payload = compose(member, &config);
        gateway
            .send_announcement(member.guild.id, channel_id, &payload)
            .await?;
        Ok(channel_id)
    }
}
