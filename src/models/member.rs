// Member join data, decoupled from serenity types so the join pipeline
// can be driven by tests

use chrono::{DateTime, Utc};

/// The guild a member joined, as seen at join time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: u64,
    pub name: String,
    pub member_count: u64,
}

/// A member who just joined a guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoiningMember {
    pub id: u64,
    pub name: String,
    pub avatar_url: String,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub guild: GuildInfo,
}

impl JoiningMember {
    /// Platform mention syntax for this member
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

#[cfg(test)]
pub(crate) fn sample_member(guild_id: u64) -> JoiningMember {
    JoiningMember {
        id: 1001,
        name: "alice".to_string(),
        avatar_url: "https://cdn.example/avatar.png".to_string(),
        joined_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        created_at: DateTime::from_timestamp(1_600_000_000, 0).unwrap_or_default(),
        guild: GuildInfo {
            id: guild_id,
            name: "Acme".to_string(),
            member_count: 42,
        },
    }
}
