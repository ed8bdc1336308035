use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome {user} to our server! 🎉";
pub const DEFAULT_DM_MESSAGE: &str = "Welcome to our Discord server! 🎉";
pub const DEFAULT_EMBED_COLOR: u32 = 0x00ff00;
pub const MAX_EMBED_COLOR: u32 = 0xffffff;

/// Guild (Server) specific welcome configuration.
///
/// Field names match the on-disk keys. Missing keys in storage are backfilled
/// from `Default`, so a loaded config always has every field set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GuildConfig {
    /// Channel ID for welcome announcements
    pub welcome_channel: Option<u64>,
    /// Announcement template (`{user}`, `{username}`, `{server}`)
    pub welcome_message: String,
    /// Image attached to the announcement
    pub welcome_image_url: Option<String>,
    /// 24-bit accent color
    pub embed_color: u32,
    /// Role granted on join
    pub auto_role: Option<u64>,
    pub dm_welcome: bool,
    pub dm_message: String,
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            welcome_channel: None,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            welcome_image_url: None,
            embed_color: DEFAULT_EMBED_COLOR,
            auto_role: None,
            dm_welcome: false,
            dm_message: DEFAULT_DM_MESSAGE.to_string(),
        }
    }
}

impl GuildConfig {
    /// Apply a single typed field change
    pub fn apply(&mut self, update: ConfigUpdate) {
        match update {
            ConfigUpdate::WelcomeChannel(v) => self.welcome_channel = v,
            ConfigUpdate::WelcomeMessage(v) => self.welcome_message = v,
            ConfigUpdate::WelcomeImageUrl(v) => self.welcome_image_url = v,
            ConfigUpdate::EmbedColor(v) => self.embed_color = v.get(),
            ConfigUpdate::AutoRole(v) => self.auto_role = v,
            ConfigUpdate::DmWelcome(v) => self.dm_welcome = v,
            ConfigUpdate::DmMessage(v) => self.dm_message = v,
        }
    }

    /// Rebuild a config from a stored JSON entry field by field.
    ///
    /// Missing keys take their default silently. Keys holding a value of the
    /// wrong type or out of range also take their default and are returned,
    /// so one bad field never costs the rest of the entry.
    pub fn from_stored(value: &Value) -> (Self, Vec<ConfigField>) {
        let mut config = Self::default();
        let mut rejected = Vec::new();

        let Some(entry) = value.as_object() else {
            return (config, ConfigField::ALL.to_vec());
        };

        for field in ConfigField::ALL {
            let Some(raw) = entry.get(field.key()) else {
                continue;
            };
            let update = match field {
                ConfigField::WelcomeChannel => optional_id(raw).map(ConfigUpdate::WelcomeChannel),
                ConfigField::AutoRole => optional_id(raw).map(ConfigUpdate::AutoRole),
                ConfigField::WelcomeMessage => raw
                    .as_str()
                    .map(|v| ConfigUpdate::WelcomeMessage(v.to_string())),
                ConfigField::DmMessage => raw.as_str().map(|v| ConfigUpdate::DmMessage(v.to_string())),
                ConfigField::WelcomeImageUrl => match raw {
                    Value::Null => Some(ConfigUpdate::WelcomeImageUrl(None)),
                    Value::String(url) => Some(ConfigUpdate::WelcomeImageUrl(Some(url.clone()))),
                    _ => None,
                },
                ConfigField::EmbedColor => raw
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .and_then(|v| EmbedColor::new(v).ok())
                    .map(ConfigUpdate::EmbedColor),
                ConfigField::DmWelcome => raw.as_bool().map(ConfigUpdate::DmWelcome),
            };
            match update {
                Some(update) => config.apply(update),
                None => rejected.push(field),
            }
        }

        (config, rejected)
    }
}

/// `null` or an unsigned integer id
fn optional_id(raw: &Value) -> Option<Option<u64>> {
    match raw {
        Value::Null => Some(None),
        _ => raw.as_u64().map(Some),
    }
}

/// Validation failures for user supplied config values
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid hex color '{0}', use e.g. 'ff0000'")]
    InvalidColor(String),
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: ConfigField, value: String },
}

/// A validated 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedColor(u32);

impl EmbedColor {
    pub fn new(value: u32) -> Result<Self, ConfigError> {
        if value > MAX_EMBED_COLOR {
            return Err(ConfigError::InvalidColor(format!("{:x}", value)));
        }
        Ok(Self(value))
    }

    /// Parse `ff00aa` or `#ff00aa`
    pub fn parse_hex(input: &str) -> Result<Self, ConfigError> {
        let hex = input.trim().trim_start_matches('#');
        if hex.is_empty() || hex.len() > 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(input.to_string()));
        }
        let value = u32::from_str_radix(hex, 16)
            .map_err(|_| ConfigError::InvalidColor(input.to_string()))?;
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Names of the configurable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    WelcomeChannel,
    WelcomeMessage,
    WelcomeImageUrl,
    EmbedColor,
    AutoRole,
    DmWelcome,
    DmMessage,
}

impl ConfigField {
    pub const ALL: [ConfigField; 7] = [
        ConfigField::WelcomeChannel,
        ConfigField::WelcomeMessage,
        ConfigField::WelcomeImageUrl,
        ConfigField::EmbedColor,
        ConfigField::AutoRole,
        ConfigField::DmWelcome,
        ConfigField::DmMessage,
    ];

    /// Storage key of this field
    pub fn key(self) -> &'static str {
        match self {
            ConfigField::WelcomeChannel => "welcome_channel",
            ConfigField::WelcomeMessage => "welcome_message",
            ConfigField::WelcomeImageUrl => "welcome_image_url",
            ConfigField::EmbedColor => "embed_color",
            ConfigField::AutoRole => "auto_role",
            ConfigField::DmWelcome => "dm_welcome",
            ConfigField::DmMessage => "dm_message",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One typed field change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigUpdate {
    WelcomeChannel(Option<u64>),
    WelcomeMessage(String),
    WelcomeImageUrl(Option<String>),
    EmbedColor(EmbedColor),
    AutoRole(Option<u64>),
    DmWelcome(bool),
    DmMessage(String),
}

impl ConfigUpdate {
    pub fn field(&self) -> ConfigField {
        match self {
            ConfigUpdate::WelcomeChannel(_) => ConfigField::WelcomeChannel,
            ConfigUpdate::WelcomeMessage(_) => ConfigField::WelcomeMessage,
            ConfigUpdate::WelcomeImageUrl(_) => ConfigField::WelcomeImageUrl,
            ConfigUpdate::EmbedColor(_) => ConfigField::EmbedColor,
            ConfigUpdate::AutoRole(_) => ConfigField::AutoRole,
            ConfigUpdate::DmWelcome(_) => ConfigField::DmWelcome,
            ConfigUpdate::DmMessage(_) => ConfigField::DmMessage,
        }
    }

    /// Parse raw user input for `field`.
    /// Empty or `none` clears optional fields.
    pub fn parse(field: ConfigField, raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let invalid = || ConfigError::InvalidValue {
            field,
            value: raw.to_string(),
        };

        let update = match field {
            ConfigField::WelcomeChannel => {
                ConfigUpdate::WelcomeChannel(parse_optional_id(trimmed).ok_or_else(invalid)?)
            }
            ConfigField::AutoRole => {
                ConfigUpdate::AutoRole(parse_optional_id(trimmed).ok_or_else(invalid)?)
            }
            ConfigField::WelcomeMessage => ConfigUpdate::WelcomeMessage(raw.to_string()),
            ConfigField::DmMessage => ConfigUpdate::DmMessage(raw.to_string()),
            ConfigField::WelcomeImageUrl => {
                if is_clear(trimmed) {
                    ConfigUpdate::WelcomeImageUrl(None)
                } else {
                    ConfigUpdate::WelcomeImageUrl(Some(trimmed.to_string()))
                }
            }
            ConfigField::EmbedColor => ConfigUpdate::EmbedColor(EmbedColor::parse_hex(trimmed)?),
            ConfigField::DmWelcome => {
                let value = match trimmed.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "on" | "1" => true,
                    "false" | "no" | "off" | "0" => false,
                    _ => return Err(invalid()),
                };
                ConfigUpdate::DmWelcome(value)
            }
        };

        Ok(update)
    }
}

fn is_clear(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

/// `Some(None)` clears, `Some(Some(id))` sets, `None` is unparseable
fn parse_optional_id(value: &str) -> Option<Option<u64>> {
    if is_clear(value) {
        return Some(None);
    }
    // Accept channel/role mentions like <#123> or <@&123>
    let digits = value
        .trim_start_matches('<')
        .trim_start_matches(['#', '@', '&'])
        .trim_end_matches('>');
    digits.parse::<u64>().ok().filter(|id| *id != 0).map(Some)
}
