// Welcome announcement composition (pure, no I/O)

use crate::models::guild::GuildConfig;
use crate::models::member::JoiningMember;
use crate::utils::formatters::relative_timestamp;
use crate::utils::template::{render, TemplateContext};

pub const ANNOUNCEMENT_TITLE: &str = "🎉 New member!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementField {
    pub label: String,
    pub value: String,
    pub inline: bool,
}

/// Structured announcement, converted to an embed by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementPayload {
    pub title: String,
    pub description: String,
    pub accent_color: u32,
    pub fields: Vec<AnnouncementField>,
    pub thumbnail_url: String,
    pub footer_text: String,
    pub image_url: Option<String>,
}

fn inline_field(label: &str, value: String) -> AnnouncementField {
    AnnouncementField {
        label: label.to_string(),
        value,
        inline: true,
    }
}

/// Build the announcement for `member` from the guild's config
pub fn compose(member: &JoiningMember, config: &GuildConfig) -> AnnouncementPayload {
    let mention = member.mention();
    let context = TemplateContext {
        mention: Some(&mention),
        plain_name: Some(&member.name),
        server_name: Some(&member.guild.name),
    };

    AnnouncementPayload {
        title: ANNOUNCEMENT_TITLE.to_string(),
        description: render(&config.welcome_message, &context),
        accent_color: config.embed_color,
        fields: vec![
            inline_field("👤 Member", format!("#{}", member.guild.member_count)),
            inline_field("📅 Joined", relative_timestamp(&member.joined_at)),
            inline_field("📊 Account created", relative_timestamp(&member.created_at)),
        ],
        thumbnail_url: member.avatar_url.clone(),
        footer_text: format!("User ID: {}", member.id),
        image_url: config.welcome_image_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::member::sample_member;

    #[test]
    fn test_compose_defaults() {
        let member = sample_member(1);
        let payload = compose(&member, &GuildConfig::default());

        assert_eq!(payload.title, ANNOUNCEMENT_TITLE);
        assert_eq!(payload.description, "Welcome <@1001> to our server! 🎉");
        assert_eq!(payload.accent_color, 0x00ff00);
        assert_eq!(payload.thumbnail_url, member.avatar_url);
        assert_eq!(payload.footer_text, "User ID: 1001");
        assert_eq!(payload.image_url, None);

        let labels: Vec<_> = payload.fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["👤 Member", "📅 Joined", "📊 Account created"]);
        assert!(payload.fields.iter().all(|f| f.inline));
        assert_eq!(payload.fields[0].value, "#42");
        assert_eq!(payload.fields[1].value, "<t:1700000000:R>");
        assert_eq!(payload.fields[2].value, "<t:1600000000:R>");
    }

    #[test]
    fn test_compose_with_custom_config() {
        let member = sample_member(1);
        let config = GuildConfig {
            welcome_message: "{username} joined {server}".into(),
            welcome_image_url: Some("https://img/banner.png".into()),
            embed_color: 0xff00aa,
            ..GuildConfig::default()
        };
        let payload = compose(&member, &config);

        assert_eq!(payload.description, "alice joined Acme");
        assert_eq!(payload.accent_color, 0xff00aa);
        assert_eq!(payload.image_url.as_deref(), Some("https://img/banner.png"));
    }
}
