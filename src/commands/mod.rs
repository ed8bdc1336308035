// Slash commands
pub mod config;
pub mod help;
pub mod test_welcome;

use poise::serenity_prelude as serenity;

use crate::Error;

/// Guild ID of a `guild_only` invocation
pub fn require_guild(guild_id: Option<serenity::GuildId>) -> Result<u64, Error> {
    guild_id
        .map(|id| id.get())
        .ok_or_else(|| Error::from("This command can only be used in a server."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_guild() {
        assert_eq!(require_guild(Some(serenity::GuildId::new(42))).unwrap(), 42);
        assert!(require_guild(None).is_err());
    }

    #[test]
    fn test_commands_are_slash_only() {
        for command in crate::get_commands() {
            assert!(command.slash_action.is_some(), "{}", command.name);
            assert!(command.prefix_action.is_none(), "{}", command.name);
        }
    }

    #[test]
    fn test_guild_commands_are_guild_only() {
        let commands = crate::get_commands();
        for name in ["setup", "test-welcome", "welcome-info", "reset-config", "backup-config"] {
            let command = commands.iter().find(|c| c.name == name).unwrap();
            assert!(command.guild_only, "{}", name);
        }
    }
}
