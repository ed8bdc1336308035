// Member join handler - runs the welcome pipeline for GuildMemberAddition

use poise::serenity_prelude as serenity;
use tracing::debug;

use crate::features::gateway::{joining_member, SerenityGateway};
use crate::features::welcome::ActionOutcome;
use crate::Data;

/// Handle a new member joining a guild. Never fails: every welcome action
/// is best effort.
pub async fn handle_member_join(
    ctx: &serenity::Context,
    member: &serenity::Member,
    data: &Data,
) {
    let joining = joining_member(ctx, member);
    let gateway = SerenityGateway::new(ctx);
    let report = data.dispatcher.handle(&gateway, &joining).await;

    let completed = report
        .outcomes()
        .iter()
        .filter(|(_, outcome)| matches!(outcome, ActionOutcome::Completed))
        .count();
    debug!(
        guild_id = joining.guild.id,
        member_id = joining.id,
        completed,
        "Welcome pipeline finished"
    );
}
